use std::sync::LazyLock;

use regex::Regex;

/// Hard ceiling on message text length, measured in characters after
/// sanitization. The schema CHECK enforces the same bound.
pub const MAX_MESSAGE_LEN: usize = 4096;

static LOGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,50}$").expect("login pattern"));

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("uuid pattern")
});

const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "UNION", "OR", "AND", "WHERE", "FROM",
    "TABLE", "DATABASE", "ALTER", "CREATE", "EXEC", "SCRIPT",
];

const XSS_MARKERS: &[&str] = &[
    "<script",
    "javascript:",
    "onload=",
    "onerror=",
    "onclick=",
    "eval(",
    "alert(",
    "document.cookie",
    "<iframe",
];

/// 3..=50 characters from `[A-Za-z0-9_]`.
pub fn login_valid(login: &str) -> bool {
    LOGIN_RE.is_match(login)
}

/// 6..=128 characters with at least one letter and one digit.
pub fn password_valid(password: &str) -> bool {
    let len = password.chars().count();
    if !(6..=128).contains(&len) {
        return false;
    }
    password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Canonical 8-4-4-4-12 hex form, case-insensitive.
pub fn uuid_valid(candidate: &str) -> bool {
    UUID_RE.is_match(candidate)
}

/// Non-empty and at most [`MAX_MESSAGE_LEN`] characters.
pub fn message_text_valid(text: &str) -> bool {
    let len = text.chars().count();
    (1..=MAX_MESSAGE_LEN).contains(&len)
}

/// Normalize user input: drop NULs, collapse newlines/tabs to single
/// spaces, escape quote and backslash characters, trim outer whitespace.
/// One-shot; a second pass doubles the quote escapes again.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\0' => {}
            '\n' | '\r' | '\t' => out.push(' '),
            '\'' => out.push_str("''"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Advisory guard: true when the input contains a bare SQL keyword with
/// non-word neighbors on both sides. Not a substitute for bound
/// parameters, which every runtime query uses.
pub fn looks_like_sql_injection(input: &str) -> bool {
    let upper = input.to_uppercase();
    let bytes = upper.as_bytes();

    for keyword in SQL_KEYWORDS {
        let mut from = 0;
        while let Some(pos) = upper[from..].find(keyword) {
            let begin = from + pos;
            let end = begin + keyword.len();
            let left_clear = begin == 0 || !is_word_byte(bytes[begin - 1]);
            let right_clear = end == bytes.len() || !is_word_byte(bytes[end]);
            if left_clear && right_clear {
                return true;
            }
            from = begin + 1;
        }
    }
    false
}

/// Advisory guard: true when the lowercased input contains a known
/// script-injection marker.
pub fn looks_like_xss(input: &str) -> bool {
    let lower = input.to_lowercase();
    XSS_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Sanitize, then reject anything the injection heuristics flag. An empty
/// result for non-empty input means the caller must refuse the value.
pub fn security_clean(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let cleaned = sanitize(input);
    if !cleaned.is_empty() && (looks_like_sql_injection(&cleaned) || looks_like_xss(&cleaned)) {
        return String::new();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_length_boundaries() {
        assert!(login_valid("abc"));
        assert!(login_valid(&"a".repeat(50)));
        assert!(!login_valid("ab"));
        assert!(!login_valid(&"a".repeat(51)));
    }

    #[test]
    fn login_charset() {
        assert!(login_valid("alice_01"));
        assert!(!login_valid("alice-01"));
        assert!(!login_valid("alice 01"));
        assert!(!login_valid("алиса"));
    }

    #[test]
    fn password_boundaries() {
        assert!(password_valid("abc123"));
        assert!(password_valid(&format!("a1{}", "x".repeat(126))));
        assert!(!password_valid("ab12"));
        assert!(!password_valid(&format!("a1{}", "x".repeat(127))));
    }

    #[test]
    fn password_requires_letter_and_digit() {
        assert!(!password_valid("abcdef"));
        assert!(!password_valid("123456"));
        assert!(password_valid("abcde1"));
    }

    #[test]
    fn uuid_form() {
        assert!(uuid_valid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(uuid_valid("550E8400-E29B-41D4-A716-446655440000"));
        assert!(!uuid_valid("550e8400e29b41d4a716446655440000"));
        assert!(!uuid_valid("550e8400-e29b-41d4-a716-44665544000"));
        assert!(!uuid_valid("zz0e8400-e29b-41d4-a716-446655440000"));
    }

    #[test]
    fn generated_uuids_validate() {
        for _ in 0..10_000 {
            let id = uuid::Uuid::new_v4().to_string();
            assert_eq!(id.len(), 36);
            assert!(uuid_valid(&id));
        }
    }

    #[test]
    fn generated_uuids_do_not_collide() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(uuid::Uuid::new_v4()));
        }
    }

    #[test]
    fn message_text_boundaries() {
        assert!(message_text_valid("a"));
        assert!(message_text_valid(&"a".repeat(MAX_MESSAGE_LEN)));
        assert!(!message_text_valid(""));
        assert!(!message_text_valid(&"a".repeat(MAX_MESSAGE_LEN + 1)));
    }

    #[test]
    fn sanitize_normalizes_whitespace_and_escapes() {
        assert_eq!(sanitize("  hello\nworld\t"), "hello world");
        assert_eq!(sanitize("it's"), "it''s");
        assert_eq!(sanitize(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(sanitize(r"a\b"), r"a\\b");
        assert_eq!(sanitize("nul\0byte"), "nulbyte");
    }

    #[test]
    fn sanitize_is_one_shot_not_idempotent() {
        let once = sanitize("it's");
        let twice = sanitize(&once);
        assert_eq!(once, "it''s");
        assert_eq!(twice, "it''''s");
    }

    #[test]
    fn sql_heuristic_needs_word_boundaries() {
        assert!(looks_like_sql_injection("1; DROP TABLE users"));
        assert!(looks_like_sql_injection("' or '1'='1"));
        assert!(looks_like_sql_injection("union select secret"));
        // Embedded in a word: no boundary, no match.
        assert!(!looks_like_sql_injection("distorted"));
        assert!(!looks_like_sql_injection("score_board"));
        assert!(!looks_like_sql_injection("hello world"));
    }

    #[test]
    fn xss_heuristic_is_substring_based() {
        assert!(looks_like_xss("<SCRIPT>alert(1)</SCRIPT>"));
        assert!(looks_like_xss("click javascript:void(0)"));
        assert!(looks_like_xss("x onerror=steal()"));
        assert!(!looks_like_xss("a perfectly normal sentence"));
    }

    #[test]
    fn security_clean_rejects_flagged_input() {
        assert_eq!(security_clean(""), "");
        assert_eq!(security_clean("hello"), "hello");
        assert_eq!(security_clean("<script>alert(1)</script>"), "");
        assert_eq!(security_clean("1 OR 1=1"), "");
    }

    #[test]
    fn security_clean_sanitizes_benign_input() {
        assert_eq!(security_clean("  hi\nthere  "), "hi there");
    }
}
