//! Tests for output formatting helpers

use searchbridge::cli::output::{format_bytes, format_duration, format_relative_time};

#[test]
fn test_format_bytes_boundaries() {
    assert_eq!(format_bytes(0), "0 B");
    assert_eq!(format_bytes(1023), "1023 B");
    assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MB");
}

#[test]
fn test_format_duration_minutes() {
    assert_eq!(format_duration(120.0), "2m 0.0s");
    assert_eq!(format_duration(0.0), "0ms");
}

#[test]
fn test_format_relative_time() {
    let now = chrono::Utc::now();
    assert_eq!(format_relative_time(&now), "just now");
    assert_eq!(
        format_relative_time(&(now - chrono::Duration::hours(3))),
        "3h ago"
    );
    assert_eq!(
        format_relative_time(&(now - chrono::Duration::days(2))),
        "2d ago"
    );
    assert_eq!(
        format_relative_time(&(now + chrono::Duration::hours(1))),
        "in the future"
    );
}
