//! Public web forms generated from Facebook lead forms.
//!
//! When `auto_create_forms` is enabled, every ingested lead that carries
//! field data gets a published form mirroring its questions. Submissions to
//! that form become `FORM-{timestamp}` leads.

use std::sync::Arc;

use async_trait::async_trait;
use leadgate_graph::FieldData;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{StoreError, WebFormError};
use crate::leads::{LeadRecord, LeadStore};
use crate::Timestamp;

/// Maximum length of a generated form title, in characters.
pub const MAX_TITLE_LENGTH: usize = 50;

/// Options offered for the `budget` question.
pub const BUDGET_OPTIONS: [&str; 4] = ["Under $1000", "$1000-$5000", "$5000-$10000", "Over $10000"];

/// Options offered for the `interest` question.
pub const INTEREST_OPTIONS: [&str; 5] = ["Product Information", "Pricing", "Demo", "Support", "Other"];

/// Input widget of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Data,
    Text,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebFormField {
    pub fieldname: String,
    pub fieldtype: FieldType,
    pub label: String,
    pub required: bool,
    pub options: Vec<String>,
    pub read_only: bool,
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebForm {
    pub title: String,
    pub route: String,
    pub published: bool,
    pub introduction_text: String,
    pub success_message: String,
    pub fields: Vec<WebFormField>,
    pub source_lead_id: Option<String>,
}

/// Storage for generated web forms.
#[async_trait]
pub trait WebFormStore: Send + Sync {
    async fn exists_by_title(&self, title: &str) -> Result<bool, StoreError>;

    async fn get_by_route(&self, route: &str) -> Result<Option<WebForm>, StoreError>;

    async fn insert(&self, form: WebForm) -> Result<(), StoreError>;
}

/// Title of the form generated for a lead: URL safe and at most
/// [`MAX_TITLE_LENGTH`] characters.
pub fn form_title(leadgen_id: &str, form_name: Option<&str>) -> String {
    let name = form_name.filter(|n| !n.is_empty()).unwrap_or("Form");
    format!("FB-{}-{}", leadgen_id, name)
        .replace([' ', '/'], "-")
        .chars()
        .take(MAX_TITLE_LENGTH)
        .collect()
}

/// Route of the form generated for a lead.
pub fn form_route(leadgen_id: &str) -> String {
    format!("facebook-lead-{}", leadgen_id)
}

/// Map one submitted answer onto a form field.
pub fn map_field(field: &FieldData) -> WebFormField {
    let fieldname = field.name.to_lowercase().replace(' ', "_");
    let value = field.first_value().unwrap_or_default().to_string();

    let (fieldtype, label, required, options): (FieldType, String, bool, &[&str]) =
        match fieldname.as_str() {
            "full_name" => (FieldType::Data, "Full Name".into(), true, &[]),
            "first_name" => (FieldType::Data, "First Name".into(), true, &[]),
            "last_name" => (FieldType::Data, "Last Name".into(), true, &[]),
            "email" => (FieldType::Data, "Email".into(), true, &[]),
            "phone_number" => (FieldType::Data, "Phone Number".into(), false, &[]),
            "city" => (FieldType::Data, "City".into(), false, &[]),
            "state" => (FieldType::Data, "State".into(), false, &[]),
            "zip_code" => (FieldType::Data, "ZIP Code".into(), false, &[]),
            "country" => (FieldType::Data, "Country".into(), false, &[]),
            "company" => (FieldType::Data, "Company".into(), false, &[]),
            "job_title" => (FieldType::Data, "Job Title".into(), false, &[]),
            "message" => (FieldType::Text, "Message".into(), false, &[]),
            "comments" => (FieldType::Text, "Comments".into(), false, &[]),
            "budget" => (FieldType::Select, "Budget".into(), false, &BUDGET_OPTIONS),
            "interest" => (FieldType::Select, "Interest".into(), false, &INTEREST_OPTIONS),
            "source" => {
                return WebFormField {
                    fieldname,
                    fieldtype: FieldType::Data,
                    label: "Source".to_string(),
                    required: false,
                    options: Vec::new(),
                    read_only: true,
                    default: value,
                }
            }
            _ => (FieldType::Data, title_case(&field.name), false, &[]),
        };

    WebFormField {
        fieldname,
        fieldtype,
        label,
        required,
        options: options.iter().map(|o| o.to_string()).collect(),
        read_only: false,
        default: String::new(),
    }
}

/// Capitalize the first letter of every word, lowercasing the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Build the web form mirroring a lead's questions.
pub fn build_web_form(leadgen_id: &str, form_name: Option<&str>, field_data: &[FieldData]) -> WebForm {
    let label = form_name.filter(|n| !n.is_empty()).unwrap_or("Form");
    WebForm {
        title: form_title(leadgen_id, form_name),
        route: form_route(leadgen_id),
        published: true,
        introduction_text: format!("Facebook Lead Form - {}", label),
        success_message: "Form submitted successfully!".to_string(),
        fields: field_data.iter().map(map_field).collect(),
        source_lead_id: Some(leadgen_id.to_string()),
    }
}

/// Creates forms for leads and turns submissions into leads.
#[derive(Clone)]
pub struct WebFormGenerator {
    forms: Arc<dyn WebFormStore>,
    leads: Arc<dyn LeadStore>,
}

impl WebFormGenerator {
    pub fn new(forms: Arc<dyn WebFormStore>, leads: Arc<dyn LeadStore>) -> Self {
        Self { forms, leads }
    }

    /// Create the form for a lead.
    ///
    /// Returns the new route, or `None` when the lead has no field data or a
    /// form with the same title already exists.
    #[instrument(skip(self, field_data), fields(fields = field_data.len()))]
    pub async fn create_for_lead(
        &self,
        leadgen_id: &str,
        form_name: Option<&str>,
        field_data: &[FieldData],
    ) -> Result<Option<String>, WebFormError> {
        if field_data.is_empty() {
            info!("No field data; skipping web form creation");
            return Ok(None);
        }

        let form = build_web_form(leadgen_id, form_name, field_data);
        if self.forms.exists_by_title(&form.title).await? {
            info!(title = %form.title, "Web form already exists; skipping creation");
            return Ok(None);
        }

        let route = form.route.clone();
        self.forms.insert(form).await?;
        info!(route = %route, "Created web form for lead");
        Ok(Some(route))
    }

    /// Published form at `route`.
    pub async fn get(&self, route: &str) -> Result<WebForm, WebFormError> {
        self.forms
            .get_by_route(route)
            .await?
            .filter(|f| f.published)
            .ok_or_else(|| WebFormError::NotFound {
                route: route.to_string(),
            })
    }

    /// Record a submission of the form at `route` as a new lead.
    #[instrument(skip(self, form_data))]
    pub async fn submit(
        &self,
        route: &str,
        form_data: &serde_json::Value,
    ) -> Result<LeadRecord, WebFormError> {
        let form = self.get(route).await?;
        let fields = form_data
            .as_object()
            .ok_or_else(|| WebFormError::InvalidSubmission {
                message: "form data must be a JSON object".to_string(),
            })?;

        let record = LeadRecord::from_form_submission(&form.title, fields, Timestamp::now());
        self.leads.insert(record.clone()).await?;

        info!(lead = %record.name, form = %form.title, "Created lead from form submission");
        Ok(record)
    }
}

#[cfg(test)]
#[path = "webform_tests.rs"]
mod tests;
