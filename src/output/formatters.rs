//! Reusable formatting utilities for CLI output

use chrono::{Local, NaiveDateTime, TimeZone, Utc};

/// Layout the sandbox uses for `submission_utc` / `completion_utc`
const SANDBOX_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a sandbox UTC timestamp in local time.
///
/// Returns "N/A" for missing or unparsable input.
///
/// # Example output
/// `01/15/2025 14:30`
pub fn format_utc_local(timestamp: Option<&str>) -> String {
    let Some(raw) = timestamp else {
        return "N/A".to_string();
    };

    match NaiveDateTime::parse_from_str(raw.trim(), SANDBOX_TIMESTAMP_FORMAT) {
        Ok(naive) => Utc
            .from_utc_datetime(&naive)
            .with_timezone(&Local)
            .format("%m/%d/%Y %H:%M")
            .to_string(),
        Err(_) => "N/A".to_string(),
    }
}

/// Value or a placeholder when absent/empty
pub fn or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "--".to_string(),
    }
}

/// Shorten `value` to at most `max` characters, ending with an ellipsis
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_utc_local_valid() {
        let result = format_utc_local(Some("2025-01-15 12:00:00"));
        // Exact value depends on the local TZ
        assert!(result.contains("/2025"));
        assert_ne!(result, "N/A");
    }

    #[test]
    fn test_format_utc_local_missing_or_invalid() {
        assert_eq!(format_utc_local(None), "N/A");
        assert_eq!(format_utc_local(Some("yesterday")), "N/A");
    }

    #[test]
    fn test_or_placeholder() {
        assert_eq!(or_placeholder(Some("Example")), "Example");
        assert_eq!(or_placeholder(Some("  ")), "--");
        assert_eq!(or_placeholder(None), "--");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("äöüäöü", 4), "äöü…");
    }
}
