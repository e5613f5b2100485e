//! Tests for token response parsing and the code exchange request.

use super::*;
use crate::client::ClientConfig;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_request(token_url: String) -> TokenRequest {
    TokenRequest {
        token_url,
        client_id: "1234".to_string(),
        client_secret: "app-secret".to_string(),
        redirect_uri: "https://crm.example.com/oauth/callback".to_string(),
        code: "auth-code".to_string(),
    }
}

mod parse_tests {
    use super::*;

    /// Verify a JSON body with integer lifetime.
    #[test]
    fn test_json_with_expires_in() {
        let token = parse_token_response(
            Some("application/json; charset=UTF-8"),
            r#"{"access_token":"abc","token_type":"bearer","expires_in":3600}"#,
        )
        .unwrap();

        assert_eq!(token.access_token.as_deref(), Some("abc"));
        assert_eq!(token.expires_in, Some(ExpiresIn::Seconds(3600)));
        assert_eq!(token.token_type, "bearer");
    }

    /// Verify a JSON body without lifetime and without token type.
    #[test]
    fn test_json_without_expires_in_defaults_token_type() {
        let token = parse_token_response(Some("application/json"), r#"{"access_token":"abc"}"#)
            .unwrap();

        assert_eq!(token.expires_in, None);
        assert_eq!(token.token_type, "Bearer");
    }

    /// Verify the legacy form encoding maps `expires` to the lifetime.
    #[test]
    fn test_form_encoded_body_uses_expires_key() {
        let token =
            parse_token_response(Some("text/plain"), "access_token=abc%2B1&expires=5183999")
                .unwrap();

        assert_eq!(token.access_token.as_deref(), Some("abc+1"));
        assert_eq!(token.expires_in, Some(ExpiresIn::Seconds(5_183_999)));
        assert_eq!(token.token_type, "Bearer");
    }

    /// Verify a JSON body is detected even when the content type is missing.
    #[test]
    fn test_json_detected_without_content_type() {
        let token = parse_token_response(None, r#" {"access_token":"xyz","expires_in":"60"}"#)
            .unwrap();

        assert_eq!(token.expires_in, Some(ExpiresIn::Text("60".to_string())));
    }

    /// Verify a form body without a token parses with no token.
    #[test]
    fn test_form_without_token() {
        let token = parse_token_response(None, "error=invalid_grant").unwrap();
        assert!(token.access_token.is_none());
    }

    /// Verify malformed JSON is reported.
    #[test]
    fn test_malformed_json_is_rejected() {
        let result = parse_token_response(Some("application/json"), "{not json");
        assert!(matches!(
            result,
            Err(TokenExchangeError::InvalidResponse { .. })
        ));
    }

    /// Verify the token never appears in debug output.
    #[test]
    fn test_debug_redacts_access_token() {
        let token = parse_token_response(None, "access_token=super-secret-token").unwrap();
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("super-secret-token"));

        let request = token_request("https://example.com".to_string());
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("app-secret"));
        assert!(!rendered.contains("auth-code"));
    }
}

mod exchange_tests {
    use super::*;

    /// Verify the exchange posts all four form parameters and parses JSON.
    #[tokio::test]
    async fn test_exchange_posts_form_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v24.0/oauth/access_token"))
            .and(body_string_contains("client_id=1234"))
            .and(body_string_contains("client_secret=app-secret"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("redirect_uri=https%3A%2F%2Fcrm.example.com%2Foauth%2Fcallback"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(ClientConfig::default()).unwrap();
        let request = token_request(format!("{}/v24.0/oauth/access_token", server.uri()));

        let token = client.exchange_code(&request).await.unwrap();
        assert_eq!(token.access_token.as_deref(), Some("abc"));
        assert_eq!(token.expires_in, Some(ExpiresIn::Seconds(3600)));
    }

    /// Verify a form encoded success body is parsed.
    #[tokio::test]
    async fn test_exchange_parses_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("access_token=legacy&expires=7200"),
            )
            .mount(&server)
            .await;

        let client = GraphClient::new(ClientConfig::default()).unwrap();
        let request = token_request(format!("{}/oauth/access_token", server.uri()));

        let token = client.exchange_code(&request).await.unwrap();
        assert_eq!(token.access_token.as_deref(), Some("legacy"));
        assert_eq!(token.expires_in, Some(ExpiresIn::Seconds(7200)));
    }

    /// Verify a rejected code surfaces the provider's body.
    #[tokio::test]
    async fn test_exchange_rejection_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "This authorization code has been used.", "code": 100}
            })))
            .mount(&server)
            .await;

        let client = GraphClient::new(ClientConfig::default()).unwrap();
        let request = token_request(format!("{}/oauth/access_token", server.uri()));

        match client.exchange_code(&request).await {
            Err(TokenExchangeError::Rejected { status, detail }) => {
                assert_eq!(status, 400);
                assert!(detail.contains("This authorization code has been used."));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
