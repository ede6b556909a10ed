//! Inline `key:value` switch parsing for event text
//!
//! Switches are space-delimited tokens anywhere in a declared event line,
//! e.g. `object does something priority:3 ignorecancelled:true`. Keys and
//! values compare case-insensitively. A token without a colon is a key with
//! no value and is invisible to value-based checks.

use tracing::warn;

/// Find the value of the first switch whose key matches `key`.
///
/// Returns `None` when no token carries that key with a value.
pub fn get_switch<'a>(event: &'a str, key: &str) -> Option<&'a str> {
    for token in event.split(' ') {
        if let Some((k, v)) = token.split_once(':') {
            if k.eq_ignore_ascii_case(key) {
                return Some(v);
            }
        }
    }
    None
}

/// Check that every occurrence of `key` carries `expected` as its value.
///
/// A token with the key and a differing value fails the check; absence of
/// the key never fails it.
pub fn check_switch(event: &str, key: &str, expected: &str) -> bool {
    for token in event.split(' ') {
        if let Some((k, v)) = token.split_once(':') {
            if k.eq_ignore_ascii_case(key) && !v.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
    }
    true
}

/// Resolve the `priority:<int>` switch of an event line.
///
/// Missing switch means priority 0. Values that do not parse as an `i32`
/// (non-numeric, fractional, or out of range) are logged and treated as 0.
pub fn parse_priority(event: &str) -> i32 {
    let Some(raw) = get_switch(event, "priority") else {
        return 0;
    };
    match raw.parse::<i32>() {
        Ok(priority) => priority,
        Err(_) => {
            warn!(
                target: "events",
                "Ignoring invalid priority '{}' in event '{}'", raw, event
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_switch_present() {
        assert_eq!(
            get_switch("object does something priority:5 ignorecancelled:true", "priority"),
            Some("5")
        );
        assert_eq!(
            get_switch("object does something priority:5 ignorecancelled:true", "ignorecancelled"),
            Some("true")
        );
    }

    #[test]
    fn test_get_switch_absent() {
        assert_eq!(get_switch("object does something", "priority"), None);
    }

    #[test]
    fn test_get_switch_case_insensitive_key() {
        assert_eq!(get_switch("object PRIORITY:3", "priority"), Some("3"));
    }

    #[test]
    fn test_get_switch_returns_first_valued_token() {
        assert_eq!(get_switch("x priority:1 priority:2", "priority"), Some("1"));
    }

    #[test]
    fn test_get_switch_key_without_value_is_absent() {
        assert_eq!(get_switch("object cancelled", "cancelled"), None);
    }

    #[test]
    fn test_get_switch_value_keeps_later_colons() {
        assert_eq!(get_switch("system time at:14:30", "at"), Some("14:30"));
    }

    #[test]
    fn test_check_switch_matches_case_insensitively() {
        assert!(check_switch("object cancelled:TRUE", "cancelled", "true"));
    }

    #[test]
    fn test_check_switch_fails_on_differing_value() {
        assert!(!check_switch("object cancelled:false", "cancelled", "true"));
    }

    #[test]
    fn test_check_switch_absent_key_passes() {
        assert!(check_switch("object does something", "cancelled", "true"));
    }

    #[test]
    fn test_check_switch_tolerates_malformed_tokens() {
        assert!(check_switch("object cancelled", "cancelled", "true"));
    }

    #[test]
    fn test_parse_priority_default_zero() {
        assert_eq!(parse_priority("object does something"), 0);
    }

    #[test]
    fn test_parse_priority_negative() {
        assert_eq!(parse_priority("object does something priority:-1"), -1);
    }

    #[test]
    fn test_parse_priority_non_numeric_defaults_zero() {
        assert_eq!(parse_priority("object priority:high"), 0);
        assert_eq!(parse_priority("object priority:1.5"), 0);
    }

    #[test]
    fn test_parse_priority_out_of_range_defaults_zero() {
        assert_eq!(parse_priority("object priority:200000000000"), 0);
    }
}
