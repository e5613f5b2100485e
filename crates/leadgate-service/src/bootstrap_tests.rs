//! Tests for configuration loading and wiring

use super::*;
use leadgate_core::notify::LeadNotifier;
use leadgate_core::webhook::WebhookAuthStrategy;
use leadgate_core::SettingsStore;
use std::io::Write;
use tempfile::{Builder, TempDir};

/// Sources that only read files inside `dir`, with an env prefix no test sets.
fn isolated_sources(dir: &TempDir, env_prefix: &str) -> ConfigSources {
    ConfigSources {
        system_file: dir.path().join("system").to_string_lossy().into_owned(),
        local_file: dir.path().join("local").to_string_lossy().into_owned(),
        explicit_file: None,
        env_prefix: env_prefix.to_string(),
    }
}

fn write_yaml(dir: &TempDir, name: &str, contents: &str) -> String {
    let mut file = Builder::new()
        .prefix(name)
        .suffix(".yaml")
        .tempfile_in(dir.path())
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    let (_, path) = file.keep().unwrap();
    path.to_string_lossy().into_owned()
}

mod load_config_tests {
    use super::*;

    /// Verify no files at all yields the built-in defaults.
    #[test]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();

        let config = load_config(&isolated_sources(&dir, "LGTEST_DEFAULTS")).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.webhooks.endpoint_path, "/webhook");
        assert!(!config.integration.enabled);
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = write_yaml(
            &dir,
            "explicit",
            r#"
server:
  port: 9191
integration:
  site_url: https://crm.example.com
  tenant: crm.example.com
  enabled: true
  app_id: "123"
  app_secret: secret
"#,
        );
        let sources = ConfigSources {
            explicit_file: Some(path),
            ..isolated_sources(&dir, "LGTEST_EXPLICIT")
        };

        let config = load_config(&sources).unwrap();

        assert_eq!(config.server.port, 9191);
        assert!(config.integration.enabled);
        assert_eq!(config.integration.app_id, "123");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let sources = ConfigSources {
            explicit_file: Some(dir.path().join("absent.yaml").to_string_lossy().into_owned()),
            ..isolated_sources(&dir, "LGTEST_MISSING")
        };

        assert!(load_config(&sources).is_err());
    }

    /// Verify validation runs after merging.
    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_yaml(&dir, "invalid", "graph:\n  timeout_seconds: 60\n");
        let sources = ConfigSources {
            explicit_file: Some(path),
            ..isolated_sources(&dir, "LGTEST_INVALID")
        };

        let err = load_config(&sources).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    /// Verify environment variables override files.
    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_yaml(&dir, "env", "server:\n  port: 9191\n");
        let sources = ConfigSources {
            explicit_file: Some(path),
            ..isolated_sources(&dir, "LGTEST_ENV")
        };
        std::env::set_var("LGTEST_ENV__SERVER__PORT", "9292");

        let config = load_config(&sources).unwrap();

        std::env::remove_var("LGTEST_ENV__SERVER__PORT");
        assert_eq!(config.server.port, 9292);
    }

    /// Verify the admin token can be supplied through the environment alone.
    #[test]
    fn test_admin_token_from_environment() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("LGTEST_ADMIN__ADMIN__TOKEN", "ops-token");

        let config = load_config(&isolated_sources(&dir, "LGTEST_ADMIN")).unwrap();

        std::env::remove_var("LGTEST_ADMIN__ADMIN__TOKEN");
        let token = config.admin.bearer_token().unwrap();
        assert_eq!(token.expose_secret(), "ops-token");
    }
}

mod wiring_tests {
    use super::*;

    #[tokio::test]
    async fn test_build_state_from_defaults() {
        let state = build_state(ServiceConfig::default(), BroadcastNotifier::default()).unwrap();

        assert_eq!(state.tenant_logger.tenant().as_str(), "default");
        assert_eq!(state.webhook_auth.name(), "hmac_signature");
        assert!(!state.settings.load().await.unwrap().enabled);
    }

    /// Verify an enabled configuration seeds the webhook defaults.
    #[tokio::test]
    async fn test_build_state_seeds_webhook_settings() {
        let mut config = ServiceConfig::default();
        config.integration.site_url = "https://crm.example.com".to_string();
        config.integration.enabled = true;
        config.integration.app_id = "123".to_string();
        config.integration.app_secret = "secret".to_string();

        let state = build_state(config, BroadcastNotifier::default()).unwrap();
        let settings = state.settings.load().await.unwrap();

        assert_eq!(settings.webhook_callback_url, "https://crm.example.com/webhook");
        assert_eq!(settings.webhook_verify_token.len(), 32);
    }

    /// Verify the listener drains events and stops when the channel closes.
    #[tokio::test]
    async fn test_notification_logger_stops_on_close() {
        let notifier = BroadcastNotifier::default();
        let handle = spawn_notification_logger(notifier.subscribe());

        notifier.publish(LeadReceived::new("444", Some("P1"), Some("F1")));
        drop(notifier);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
