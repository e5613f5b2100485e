//! Tests for webhook delivery authentication

use super::*;

const BODY: &[u8] = br#"{"object":"page","entry":[]}"#;

fn settings() -> IntegrationSettings {
    IntegrationSettings {
        enabled: true,
        app_id: "123".to_string(),
        app_secret: "app-secret".into(),
        webhook_verify_token: "shared-token".to_string(),
        ..IntegrationSettings::default()
    }
}

fn signed(signature: Option<&str>) -> InboundRequest<'_> {
    InboundRequest {
        body: BODY,
        signature_header: signature,
        verify_token: None,
    }
}

mod hmac_tests {
    use super::*;

    /// Verify a correctly signed body is accepted.
    #[tokio::test]
    async fn test_valid_signature() {
        let signature = HmacSignatureStrategy::sign("app-secret", BODY).unwrap();

        let result = HmacSignatureStrategy
            .authenticate(&signed(Some(&signature)), &settings())
            .await;

        assert!(result.is_ok());
    }

    /// Verify a signature over different bytes is rejected.
    #[tokio::test]
    async fn test_tampered_body() {
        let signature = HmacSignatureStrategy::sign("app-secret", b"{}").unwrap();

        let result = HmacSignatureStrategy
            .authenticate(&signed(Some(&signature)), &settings())
            .await;

        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    /// Verify a signature made with another secret is rejected.
    #[tokio::test]
    async fn test_wrong_secret() {
        let signature = HmacSignatureStrategy::sign("other", BODY).unwrap();

        let result = HmacSignatureStrategy
            .authenticate(&signed(Some(&signature)), &settings())
            .await;

        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    /// Verify malformed and missing headers.
    #[tokio::test]
    async fn test_missing_and_malformed_headers() {
        let strategy = HmacSignatureStrategy;

        assert!(matches!(
            strategy.authenticate(&signed(None), &settings()).await,
            Err(SignatureError::MissingHeader { .. })
        ));
        assert!(matches!(
            strategy.authenticate(&signed(Some("sha1=abcd")), &settings()).await,
            Err(SignatureError::Malformed { .. })
        ));
        assert!(matches!(
            strategy.authenticate(&signed(Some("sha256=zz")), &settings()).await,
            Err(SignatureError::Malformed { .. })
        ));
    }

    /// Verify a missing app secret cannot validate anything.
    #[tokio::test]
    async fn test_missing_app_secret() {
        let signature = HmacSignatureStrategy::sign("", BODY).unwrap();
        let settings = IntegrationSettings {
            app_secret: Default::default(),
            ..settings()
        };

        let result = HmacSignatureStrategy
            .authenticate(&signed(Some(&signature)), &settings)
            .await;

        assert_eq!(result, Err(SignatureError::MissingSecret));
    }
}

mod verify_token_tests {
    use super::*;

    fn with_token(token: Option<&str>) -> InboundRequest<'_> {
        InboundRequest {
            body: BODY,
            signature_header: None,
            verify_token: token,
        }
    }

    #[tokio::test]
    async fn test_matching_token() {
        let result = VerifyTokenStrategy
            .authenticate(&with_token(Some("shared-token")), &settings())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_or_missing_token() {
        assert_eq!(
            VerifyTokenStrategy
                .authenticate(&with_token(Some("guess")), &settings())
                .await,
            Err(SignatureError::VerifyTokenMismatch)
        );
        assert_eq!(
            VerifyTokenStrategy.authenticate(&with_token(None), &settings()).await,
            Err(SignatureError::MissingVerifyToken)
        );
    }

    /// Verify an unset stored token never matches.
    #[tokio::test]
    async fn test_empty_stored_token() {
        let settings = IntegrationSettings {
            webhook_verify_token: String::new(),
            ..settings()
        };
        assert_eq!(
            VerifyTokenStrategy
                .authenticate(&with_token(Some("anything")), &settings)
                .await,
            Err(SignatureError::VerifyTokenMismatch)
        );
    }
}

mod selection_tests {
    use super::*;

    #[test]
    fn test_kind_builds_matching_strategy() {
        assert_eq!(AuthStrategyKind::default().build().name(), "hmac_signature");
        assert_eq!(AuthStrategyKind::VerifyToken.build().name(), "verify_token");
    }

    #[test]
    fn test_kind_deserializes_from_snake_case() {
        let kind: AuthStrategyKind = serde_json::from_str("\"verify_token\"").unwrap();
        assert_eq!(kind, AuthStrategyKind::VerifyToken);
    }
}
