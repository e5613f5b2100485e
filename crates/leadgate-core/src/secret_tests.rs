//! Tests for [`SecretValue`].

use super::*;

/// Verify the secret never appears in debug output.
#[test]
fn test_debug_redacts_value() {
    let secret = SecretValue::from_string("EAAGm0PX4ZCpsBA".to_string());
    let rendered = format!("{:?}", secret);

    assert!(!rendered.contains("EAAGm0PX4ZCpsBA"));
    assert!(rendered.contains("REDACTED"));
    assert!(rendered.contains("15"));
}

/// Verify equality compares content.
#[test]
fn test_equality_by_content() {
    assert_eq!(SecretValue::from("abc"), SecretValue::from("abc"));
    assert_ne!(SecretValue::from("abc"), SecretValue::from("abd"));
    assert_ne!(SecretValue::from("abc"), SecretValue::from("abcd"));
}

/// Verify the default secret is empty.
#[test]
fn test_default_is_empty() {
    let secret = SecretValue::default();
    assert!(secret.is_empty());
    assert_eq!(secret.expose_secret(), "");
}
