//! Graph API object shapes used by lead enrichment and account discovery.
//!
//! Only the fields requested by the client are modelled. Every field is
//! optional because Graph omits fields the token is not allowed to read.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Field list requested for a lead object.
pub const LEAD_FIELDS: &str = "field_data,ad_id,adset_id,campaign_id,form_id,is_organic,created_time";

/// Field list requested for a lead form.
pub const FORM_FIELDS: &str = "name,status";

/// Field list requested for a page.
pub const PAGE_FIELDS: &str = "name";

/// Field list requested for an ad, including its ad set and campaign names.
pub const AD_FIELDS: &str = "name,adset{name,campaign{name}}";

/// Field list requested for each page the user manages (`/me/accounts`).
pub const PAGE_ACCOUNT_FIELDS: &str =
    "id,name,category,business,global_brand_page_name,location,tasks,access_token";

/// Field list requested for each lead form of a page.
pub const LEADGEN_FORM_FIELDS: &str = "id,name,status,locale";

/// Field list requested for the token owner (`/me`).
pub const USER_FIELDS: &str = "id,name,email";

/// A single question/answer pair submitted through a lead form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldData {
    pub name: String,

    #[serde(default)]
    pub values: Vec<String>,
}

impl FieldData {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// First submitted value, if any.
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Lead object (`GET /{leadgen_id}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LeadData {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub field_data: Vec<FieldData>,

    #[serde(default, deserialize_with = "optional_id")]
    pub ad_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub adset_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub campaign_id: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub form_id: Option<String>,

    #[serde(default)]
    pub is_organic: bool,

    #[serde(default)]
    pub created_time: Option<String>,
}

/// Lead form object (`GET /{form_id}`, or one entry of `/{page_id}/leadgen_forms`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDetails {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,
}

/// Page object (`GET /{page_id}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageDetails {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Ad object with the nested ad set and campaign (`GET /{ad_id}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdDetails {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub adset: Option<AdSetDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdSetDetails {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub campaign: Option<CampaignDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CampaignDetails {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Edge listings
// ============================================================================

/// One page of an edge listing: `{"data": [...], "paging": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub paging: Option<Paging>,
}

impl<T> Paged<T> {
    /// Cursor for the following page.
    ///
    /// Graph keeps returning an `after` cursor on the last page; only a
    /// listing that also carries a `next` link has more data.
    pub fn next_cursor(&self) -> Option<&str> {
        let paging = self.paging.as_ref()?;
        paging.next.as_ref()?;
        paging
            .cursors
            .as_ref()?
            .after
            .as_deref()
            .filter(|cursor| !cursor.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub cursors: Option<Cursors>,

    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub before: Option<String>,

    #[serde(default)]
    pub after: Option<String>,
}

// ============================================================================
// Accounts and tokens
// ============================================================================

/// A Facebook page the token owner manages, with its page access token.
#[derive(Clone, Default, PartialEq, Deserialize)]
pub struct PageAccount {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub global_brand_page_name: Option<String>,

    #[serde(default)]
    pub business: Option<BusinessRef>,

    #[serde(default)]
    pub location: Option<PageLocation>,

    #[serde(default)]
    pub tasks: Vec<String>,

    #[serde(default)]
    pub access_token: Option<String>,
}

impl fmt::Debug for PageAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageAccount")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("business", &self.business)
            .field("tasks", &self.tasks)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessRef {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Street address of a page. Coordinates are decimal degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLocation {
    #[serde(default)]
    pub street: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub zip: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Token owner (`GET /me`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Token introspection (`GET /debug_token`), unwrapped from its `data` field.
///
/// Expiry values are epoch seconds; `0` means the token does not expire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenDebugInfo {
    #[serde(default, deserialize_with = "optional_id")]
    pub app_id: Option<String>,

    #[serde(default, rename = "type")]
    pub token_type: Option<String>,

    #[serde(default)]
    pub application: Option<String>,

    #[serde(default)]
    pub is_valid: bool,

    #[serde(default)]
    pub expires_at: Option<i64>,

    #[serde(default)]
    pub data_access_expires_at: Option<i64>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DebugTokenEnvelope {
    pub data: TokenDebugInfo,
}

/// Graph error envelope: `{"error": {"message": ..., "type": ..., "code": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphErrorEnvelope {
    pub error: GraphErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphErrorBody {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub code: Option<i64>,
}

/// Graph ids are strings, but some payloads carry them as numbers.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) if !s.is_empty() => Some(s),
        Some(RawId::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
