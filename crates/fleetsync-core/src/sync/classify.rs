//! Auth-class failure heuristic.
//!
//! The backend does not return a stable error code for an expired or invalid
//! session. It answers with free text (sometimes Chinese) or short codes, so
//! the payload is matched against known markers. Best effort only: replace
//! with explicit codes once the backend exposes them.

use regex::Regex;
use std::sync::OnceLock;

static SESSION_FAILURE_REGEX: OnceLock<Regex> = OnceLock::new();

// "登录" = login, "参数不能为空" = parameter must not be empty, C05 = token error code.
fn get_session_failure_regex() -> &'static Regex {
    SESSION_FAILURE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)login|登录|参数不能为空|C05").expect("Session failure regex is valid")
    })
}

/// Whether a backend error payload means the session credential is no longer valid.
pub fn is_session_failure(payload: &str) -> bool {
    get_session_failure_regex().is_match(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_known_markers() {
        assert!(is_session_failure(r#"{"ret":0,"msg":"please LOGIN again"}"#));
        assert!(is_session_failure(r#"{"ret":-1,"msg":"请重新登录"}"#));
        assert!(is_session_failure(r#"{"ret":0,"msg":"参数不能为空"}"#));
        assert!(is_session_failure(r#"{"code":"c05"}"#));
    }

    #[test]
    fn test_ignores_other_failures() {
        assert!(!is_session_failure(r#"{"ret":0,"msg":"server busy"}"#));
        assert!(!is_session_failure("HTTP 502 Bad Gateway"));
        assert!(!is_session_failure(""));
    }
}
