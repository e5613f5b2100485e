//! Tests for the in-memory stores

use super::*;
use crate::enrichment::EnrichedLead;
use crate::error::ConfigurationError;
use crate::state_cache::AUTHORIZATION_STATE_TTL;
use crate::webform::build_web_form;
use crate::Timestamp;
use leadgate_graph::FieldData;

fn lead(id: &str) -> LeadRecord {
    LeadRecord::from_webhook(
        id,
        None,
        None,
        serde_json::json!({}),
        EnrichedLead::default(),
        Timestamp::now(),
    )
}

mod settings_store_tests {
    use super::*;

    /// Verify a validated save derives the callback URL and a verify token.
    #[tokio::test]
    async fn test_save_fills_webhook_defaults() {
        let store = InMemorySettingsStore::new(IntegrationSettings::default(), "https://crm.example.com/");
        let settings = IntegrationSettings {
            enabled: true,
            app_id: "123".to_string(),
            app_secret: "shh".into(),
            ..IntegrationSettings::default()
        };

        let saved = store.save(settings).await.unwrap();

        assert_eq!(saved.webhook_callback_url, "https://crm.example.com/webhook");
        assert_eq!(saved.webhook_verify_token.len(), 32);
        assert_eq!(store.load().await.unwrap(), saved);
    }

    /// Verify a validated save rejects an enabled integration without secret.
    #[tokio::test]
    async fn test_save_rejects_missing_secret() {
        let store = InMemorySettingsStore::new(IntegrationSettings::default(), "https://crm.example.com");
        let settings = IntegrationSettings {
            enabled: true,
            app_id: "123".to_string(),
            ..IntegrationSettings::default()
        };

        let result = store.save(settings).await;

        assert!(matches!(
            result,
            Err(SettingsError::Configuration(ConfigurationError::MissingAppSecret))
        ));
        assert!(!store.load().await.unwrap().enabled);
    }

    /// Verify an unchecked save bypasses validation.
    #[tokio::test]
    async fn test_save_unchecked_skips_validation() {
        let store = InMemorySettingsStore::new(IntegrationSettings::default(), "https://crm.example.com");
        let mut settings = IntegrationSettings {
            enabled: true,
            ..IntegrationSettings::default()
        };
        settings.set_access_token("EAAB".to_string(), None);

        store.save_unchecked(settings).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token().unwrap().expose_secret(), "EAAB");
        assert!(loaded.webhook_callback_url.is_empty());
    }
}

mod state_cache_tests {
    use super::*;

    /// Verify a state can be taken exactly once.
    #[tokio::test]
    async fn test_take_is_single_use() {
        let cache = InMemoryStateCache::new();
        cache.put("abc", "Administrator", AUTHORIZATION_STATE_TTL).await.unwrap();

        assert_eq!(cache.take("abc").await.unwrap().as_deref(), Some("Administrator"));
        assert_eq!(cache.take("abc").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    /// Verify an unknown state is absent.
    #[tokio::test]
    async fn test_take_unknown_state() {
        let cache = InMemoryStateCache::new();
        assert_eq!(cache.take("missing").await.unwrap(), None);
    }

    /// Verify entries survive until just before the TTL and not after it.
    #[tokio::test(start_paused = true)]
    async fn test_state_expires_after_ttl() {
        let cache = InMemoryStateCache::new();
        cache.put("early", "alice", AUTHORIZATION_STATE_TTL).await.unwrap();
        cache.put("late", "bob", AUTHORIZATION_STATE_TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(cache.take("early").await.unwrap().as_deref(), Some("alice"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.take("late").await.unwrap(), None);
    }

    /// Verify cleanup only removes expired entries.
    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let cache = InMemoryStateCache::new();
        cache.put("short", "a", Duration::from_secs(10)).await.unwrap();
        cache.put("long", "b", AUTHORIZATION_STATE_TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.cleanup_expired().await.unwrap(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.take("long").await.unwrap().as_deref(), Some("b"));
    }

    /// Verify abandoned states are evicted by later authorizations.
    #[tokio::test(start_paused = true)]
    async fn test_put_evicts_abandoned_states() {
        let cache = InMemoryStateCache::new();
        for i in 0..1000 {
            cache
                .put(&format!("state-{}", i), "alice", AUTHORIZATION_STATE_TTL)
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        cache.put("fresh", "bob", AUTHORIZATION_STATE_TTL).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.take("fresh").await.unwrap().as_deref(), Some("bob"));
    }
}

mod lead_store_tests {
    use super::*;

    /// Verify inserting the same external id twice is a duplicate.
    #[tokio::test]
    async fn test_duplicate_insert() {
        let store = InMemoryLeadStore::new();
        store.insert(lead("444")).await.unwrap();

        let err = store.insert(lead("444")).await.unwrap_err();

        assert!(err.is_duplicate());
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.exists("444").await.unwrap());
    }

    /// Verify updates replace existing records and reject unknown ones.
    #[tokio::test]
    async fn test_update() {
        let store = InMemoryLeadStore::new();
        store.insert(lead("1")).await.unwrap();

        let mut record = lead("1");
        record.auto_created_form = Some("facebook-lead-1".to_string());
        store.update(record).await.unwrap();

        let stored = store.get("1").await.unwrap().unwrap();
        assert_eq!(stored.auto_created_form.as_deref(), Some("facebook-lead-1"));

        let missing = store.update(lead("2")).await.unwrap_err();
        assert!(matches!(missing, PersistenceError::NotFound { .. }));
    }
}

mod web_form_store_tests {
    use super::*;

    /// Verify forms are found by title and by route.
    #[tokio::test]
    async fn test_lookup_by_title_and_route() {
        let store = InMemoryWebFormStore::new();
        let form = build_web_form(
            "444",
            Some("Signup"),
            &[FieldData::new("email", vec!["a@b.c".to_string()])],
        );
        store.insert(form.clone()).await.unwrap();

        assert!(store.exists_by_title("FB-444-Signup").await.unwrap());
        assert!(!store.exists_by_title("FB-445-Signup").await.unwrap());
        assert_eq!(store.get_by_route("facebook-lead-444").await.unwrap(), Some(form.clone()));
        assert!(store.insert(form).await.is_err());
    }
}

mod page_account_store_tests {
    use super::*;
    use leadgate_graph::PageAccount;

    fn page(id: &str, name: &str) -> PageAccountRecord {
        PageAccountRecord::from_account(
            PageAccount {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                ..PageAccount::default()
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    /// Verify upserts replace by page id and listing is ordered.
    #[tokio::test]
    async fn test_upsert_replaces_by_page_id() {
        let store = InMemoryPageAccountStore::new();
        store
            .upsert(vec![page("P2", "Sails"), page("P1", "Boats")])
            .await
            .unwrap();
        store.upsert(vec![page("P2", "Acme Sails")]).await.unwrap();

        let pages = store.list().await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_id, "P1");
        assert_eq!(pages[1].page_name.as_deref(), Some("Acme Sails"));
    }

    #[tokio::test]
    async fn test_deactivate_missing() {
        let store = InMemoryPageAccountStore::new();
        store
            .upsert(vec![page("P1", "Boats"), page("P2", "Sails")])
            .await
            .unwrap();
        let listed: HashSet<String> = ["P1".to_string()].into_iter().collect();

        assert_eq!(store.deactivate_missing(&listed).await.unwrap(), 1);
        assert_eq!(store.deactivate_missing(&listed).await.unwrap(), 0);

        assert!(store.get("P1").await.unwrap().unwrap().is_active);
        assert!(!store.get("P2").await.unwrap().unwrap().is_active);
    }
}
