//! Shared test doubles for core unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leadgate_graph::{
    AdDetails, AdSetDetails, CampaignDetails, Cursors, FieldData, FormDetails, GraphApi,
    GraphError, LeadData, PageAccount, PageDetails, Paged, Paging, TokenDebugInfo, UserInfo,
};

/// In-memory Graph API. Unknown ids answer with a Graph "does not exist" error.
#[derive(Clone, Default)]
pub struct FakeGraph {
    leads: HashMap<String, LeadData>,
    forms: HashMap<String, FormDetails>,
    pages: HashMap<String, PageDetails>,
    ads: HashMap<String, AdDetails>,
    account_listing: Vec<Vec<PageAccount>>,
    account_listing_fails_at: Option<usize>,
    page_forms: HashMap<String, Vec<Vec<FormDetails>>>,
    user: Option<UserInfo>,
    token_debug: Option<TokenDebugInfo>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lead(mut self, id: &str, ad_id: Option<&str>, fields: &[(&str, &str)]) -> Self {
        self.leads.insert(
            id.to_string(),
            LeadData {
                id: Some(id.to_string()),
                field_data: fields
                    .iter()
                    .map(|(name, value)| FieldData::new(*name, vec![value.to_string()]))
                    .collect(),
                ad_id: ad_id.map(str::to_string),
                ..LeadData::default()
            },
        );
        self
    }

    pub fn with_organic_lead(mut self, id: &str, ad_id: &str) -> Self {
        self.leads.insert(
            id.to_string(),
            LeadData {
                id: Some(id.to_string()),
                ad_id: Some(ad_id.to_string()),
                is_organic: true,
                ..LeadData::default()
            },
        );
        self
    }

    pub fn with_form(mut self, id: &str, name: Option<&str>, status: Option<&str>) -> Self {
        self.forms.insert(
            id.to_string(),
            FormDetails {
                id: Some(id.to_string()),
                name: name.map(str::to_string),
                status: status.map(str::to_string),
                locale: None,
            },
        );
        self
    }

    pub fn with_page(mut self, id: &str, name: &str) -> Self {
        self.pages.insert(
            id.to_string(),
            PageDetails {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
            },
        );
        self
    }

    pub fn with_ad(mut self, id: &str, name: &str, adset: &str, campaign: &str) -> Self {
        self.ads.insert(
            id.to_string(),
            AdDetails {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                adset: Some(AdSetDetails {
                    id: Some(format!("{}-set", id)),
                    name: Some(adset.to_string()),
                    campaign: Some(CampaignDetails {
                        id: Some(format!("{}-campaign", id)),
                        name: Some(campaign.to_string()),
                    }),
                }),
            },
        );
        self
    }

    /// Serve `/me/accounts` as these cursor pages, in order.
    pub fn with_account_listing(mut self, pages: Vec<Vec<PageAccount>>) -> Self {
        self.account_listing = pages;
        self
    }

    /// Fail the `index`-th `/me/accounts` request with a server error.
    pub fn with_account_listing_failure_at(mut self, index: usize) -> Self {
        self.account_listing_fails_at = Some(index);
        self
    }

    pub fn with_page_forms(mut self, page_id: &str, pages: Vec<Vec<FormDetails>>) -> Self {
        self.page_forms.insert(page_id.to_string(), pages);
        self
    }

    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.user = Some(UserInfo {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            email: None,
        });
        self
    }

    pub fn with_token_debug(mut self, is_valid: bool) -> Self {
        self.token_debug = Some(TokenDebugInfo {
            is_valid,
            token_type: Some("USER".to_string()),
            ..TokenDebugInfo::default()
        });
        self
    }

    /// Calls made so far, as `"{kind}:{id}"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: &str, id: &str) {
        self.calls.lock().unwrap().push(format!("{}:{}", kind, id));
    }

    /// Cursor pages are addressed as `"cursor-{index}"`.
    fn listing<T: Clone>(pages: &[Vec<T>], after: Option<&str>) -> Paged<T> {
        let index = after
            .and_then(|c| c.strip_prefix("cursor-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let has_more = index + 1 < pages.len();

        Paged {
            data: pages.get(index).cloned().unwrap_or_default(),
            paging: Some(Paging {
                cursors: Some(Cursors {
                    before: None,
                    after: Some(format!("cursor-{}", index + 1)),
                }),
                next: has_more.then(|| format!("https://graph.test/next/{}", index + 1)),
            }),
        }
    }

    fn missing(id: &str) -> GraphError {
        GraphError::Api {
            status: 400,
            code: Some(100),
            message: format!("Object with ID '{}' does not exist", id),
        }
    }
}

#[async_trait]
impl GraphApi for FakeGraph {
    async fn get_lead(&self, leadgen_id: &str, _token: &str) -> Result<LeadData, GraphError> {
        self.record("lead", leadgen_id);
        self.leads
            .get(leadgen_id)
            .cloned()
            .ok_or_else(|| Self::missing(leadgen_id))
    }

    async fn get_form(&self, form_id: &str, _token: &str) -> Result<FormDetails, GraphError> {
        self.record("form", form_id);
        self.forms
            .get(form_id)
            .cloned()
            .ok_or_else(|| Self::missing(form_id))
    }

    async fn get_page(&self, page_id: &str, _token: &str) -> Result<PageDetails, GraphError> {
        self.record("page", page_id);
        self.pages
            .get(page_id)
            .cloned()
            .ok_or_else(|| Self::missing(page_id))
    }

    async fn get_ad(&self, ad_id: &str, _token: &str) -> Result<AdDetails, GraphError> {
        self.record("ad", ad_id);
        self.ads.get(ad_id).cloned().ok_or_else(|| Self::missing(ad_id))
    }

    async fn list_pages(
        &self,
        _token: &str,
        after: Option<&str>,
    ) -> Result<Paged<PageAccount>, GraphError> {
        self.record("accounts", after.unwrap_or("start"));
        let request_index = self
            .calls()
            .iter()
            .filter(|c| c.starts_with("accounts:"))
            .count()
            - 1;
        if self.account_listing_fails_at == Some(request_index) {
            return Err(GraphError::Api {
                status: 500,
                code: Some(2),
                message: "An unexpected error has occurred".to_string(),
            });
        }
        Ok(Self::listing(&self.account_listing, after))
    }

    async fn list_leadgen_forms(
        &self,
        page_id: &str,
        token: &str,
        after: Option<&str>,
    ) -> Result<Paged<FormDetails>, GraphError> {
        self.record("forms", &format!("{}@{}", page_id, token));
        let pages = self
            .page_forms
            .get(page_id)
            .ok_or_else(|| Self::missing(page_id))?;
        Ok(Self::listing(pages, after))
    }

    async fn get_me(&self, _token: &str) -> Result<UserInfo, GraphError> {
        self.record("me", "me");
        self.user.clone().ok_or_else(|| GraphError::Api {
            status: 400,
            code: Some(190),
            message: "Error validating access token".to_string(),
        })
    }

    async fn debug_token(&self, _token: &str) -> Result<TokenDebugInfo, GraphError> {
        self.record("debug_token", "me");
        self.token_debug
            .clone()
            .ok_or_else(|| Self::missing("debug_token"))
    }
}
