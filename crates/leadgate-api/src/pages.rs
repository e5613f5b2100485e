//! HTML pages shown to administrators in the browser.
//!
//! The OAuth callback and the webhook handshake are opened by Facebook or by
//! a browser redirect, so their outcomes are rendered as small HTML pages.
//! Every interpolated value is escaped.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use leadgate_core::oauth::{AuthorizedToken, CallbackError};
use leadgate_core::VerificationError;
use tracing::error;

/// A rendered HTML page with its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    pub status: StatusCode,
    pub title: String,
    pub message: String,
}

impl HtmlPage {
    pub fn new(status: StatusCode, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Full document with escaped title and message.
    pub fn render(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
             <body>\n<h1>{title}</h1>\n<p>{message}</p>\n</body>\n</html>\n",
            title = html_escape(&self.title),
            message = html_escape(&self.message),
        )
    }
}

impl IntoResponse for HtmlPage {
    fn into_response(self) -> Response {
        (self.status, Html(self.render())).into_response()
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Page shown after a successful authorization.
pub fn authorization_success(token: &AuthorizedToken) -> HtmlPage {
    let expiry = match token.token_expiry {
        Some(expiry) => format!("Expires: {}", expiry),
        None => "Long-lived token (no expiry)".to_string(),
    };
    HtmlPage::new(
        StatusCode::OK,
        "Authorization Successful",
        format!(
            "Facebook Lead Ads has been authorized. {}. You can close this window.",
            expiry
        ),
    )
}

/// Page shown when the callback fails.
pub fn callback_failure(err: &CallbackError) -> HtmlPage {
    match err {
        CallbackError::ProviderDenied { error, description } => HtmlPage::new(
            StatusCode::BAD_REQUEST,
            "Authorization Failed",
            match description {
                Some(description) => format!("Error: {} - {}", error, description),
                None => format!("Error: {}", error),
            },
        ),
        CallbackError::InvalidAccess => {
            HtmlPage::new(StatusCode::BAD_REQUEST, "Invalid Access", err.to_string())
        }
        CallbackError::InvalidState(_) => HtmlPage::new(
            StatusCode::BAD_REQUEST,
            "Invalid State",
            format!("{}. Please start the authorization again.", err),
        ),
        CallbackError::TokenExchange(_) => HtmlPage::new(
            StatusCode::BAD_GATEWAY,
            "Token Exchange Failed",
            format!("Failed to exchange code for token: {}", err),
        ),
        CallbackError::Store(e) => {
            error!(error = %e, "Failed to store access token");
            HtmlPage::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authorization Failed",
                "The access token could not be saved. Please try again later.",
            )
        }
    }
}

/// Page showing the callback URL to register with Facebook.
pub fn callback_test(callback_url: &str) -> HtmlPage {
    HtmlPage::new(
        StatusCode::OK,
        "OAuth Callback Test",
        format!(
            "The OAuth callback endpoint is reachable. Register this redirect URI in your Facebook App: {}",
            callback_url
        ),
    )
}

/// Page shown when the subscription handshake fails.
///
/// The expected verify token is never part of the page.
pub fn verification_failure(err: &VerificationError) -> HtmlPage {
    match err {
        VerificationError::NotEnabled => {
            HtmlPage::new(StatusCode::FORBIDDEN, "Not Enabled", err.to_string())
        }
        VerificationError::TokenMismatch => {
            HtmlPage::new(StatusCode::FORBIDDEN, "Verification Failed", err.to_string())
        }
        VerificationError::InvalidMode { .. } => {
            HtmlPage::new(StatusCode::BAD_REQUEST, "Invalid Request", err.to_string())
        }
        VerificationError::Settings(e) => {
            error!(error = %e, "Failed to persist webhook verification");
            HtmlPage::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification Failed",
                "Webhook verification could not be completed. Please try again later.",
            )
        }
    }
}

#[cfg(test)]
#[path = "pages_tests.rs"]
mod tests;
