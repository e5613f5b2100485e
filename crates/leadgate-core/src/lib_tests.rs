//! Tests for core shared types.

use super::*;

mod timestamp_tests {
    use super::*;

    /// Verify RFC3339 parsing accepts offsets and normalises to UTC.
    #[test]
    fn test_from_rfc3339_normalises_offset() {
        let ts = Timestamp::from_rfc3339("2025-03-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-03-01T10:00:00+00:00");
    }

    /// Verify invalid input is rejected with the offending text.
    #[test]
    fn test_from_rfc3339_rejects_garbage() {
        let err = Timestamp::from_rfc3339("next tuesday").unwrap_err();
        assert!(err.to_string().contains("next tuesday"));
    }

    /// Verify epoch construction and display formatting.
    #[test]
    fn test_from_unix_seconds_and_display() {
        let ts = Timestamp::from_unix_seconds(1_761_599_000).unwrap();
        assert_eq!(ts.to_string(), "2025-10-27 21:03:20");
    }

    /// Verify second arithmetic in both directions.
    #[test]
    fn test_seconds_until() {
        let start = Timestamp::from_unix_seconds(1_000).unwrap();
        let later = start.add_seconds(3600).unwrap();

        assert_eq!(start.seconds_until(&later), 3600);
        assert_eq!(later.seconds_until(&start), -3600);
    }

    /// Verify out-of-range offsets are reported instead of panicking.
    #[test]
    fn test_add_seconds_out_of_range() {
        let now = Timestamp::now();

        assert!(now.add_seconds(i64::MAX).is_none());
        assert!(now.add_seconds(i64::MIN).is_none());
        assert!(now.add_seconds(400_000 * 365 * 86_400).is_none());
    }
}
