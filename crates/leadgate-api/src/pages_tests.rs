//! Tests for HTML page rendering

use super::*;
use leadgate_core::{StateValidationError, Timestamp, TokenExchangeError};

mod escape_tests {
    use super::*;

    #[test]
    fn test_escapes_markup() {
        assert_eq!(
            html_escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#x27;y&#x27;"
        );
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(html_escape("Form 123"), "Form 123");
    }

    /// Verify provider-supplied text cannot inject markup into the page.
    #[test]
    fn test_denied_page_escapes_provider_text() {
        let page = callback_failure(&CallbackError::ProviderDenied {
            error: "<b>access_denied</b>".to_string(),
            description: Some("<img src=x>".to_string()),
        });

        let html = page.render();
        assert!(!html.contains("<b>"));
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;b&gt;access_denied&lt;/b&gt;"));
    }
}

mod callback_page_tests {
    use super::*;

    #[test]
    fn test_success_with_expiry() {
        let expiry = Timestamp::from_rfc3339("2026-01-02T03:04:05Z").unwrap();
        let page = authorization_success(&AuthorizedToken {
            token_expiry: Some(expiry),
        });

        assert_eq!(page.status, StatusCode::OK);
        assert!(page.message.contains("Expires: 2026-01-02 03:04:05"));
    }

    #[test]
    fn test_success_without_expiry() {
        let page = authorization_success(&AuthorizedToken { token_expiry: None });
        assert!(page.message.contains("Long-lived token (no expiry)"));
    }

    /// Verify each callback failure maps onto its status code.
    #[test]
    fn test_failure_status_codes() {
        let denied = CallbackError::ProviderDenied {
            error: "access_denied".to_string(),
            description: None,
        };
        assert_eq!(callback_failure(&denied).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            callback_failure(&CallbackError::InvalidAccess).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            callback_failure(&StateValidationError::UnknownOrExpired.into()).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            callback_failure(&TokenExchangeError::MissingAccessToken.into()).status,
            StatusCode::BAD_GATEWAY
        );
    }
}

mod verification_page_tests {
    use super::*;

    #[test]
    fn test_failure_status_codes() {
        assert_eq!(
            verification_failure(&VerificationError::NotEnabled).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            verification_failure(&VerificationError::TokenMismatch).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            verification_failure(&VerificationError::InvalidMode {
                mode: "unsubscribe".to_string()
            })
            .status,
            StatusCode::BAD_REQUEST
        );
    }
}
