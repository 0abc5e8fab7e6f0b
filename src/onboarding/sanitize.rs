//! Input sanitizer for persisted free text.
//!
//! Applied to values on their way to the backend, never to validation
//! error messages.

/// Characters stripped from persisted text. The validator rejects the same
/// set in name fields.
pub(crate) const FORBIDDEN_CHARS: &[char] = &['<', '>', '"', '\'', ';', '&'];

/// Strip every forbidden character, then trim surrounding whitespace.
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize an optional field, dropping values that end up empty.
pub fn sanitize_opt(input: Option<&str>) -> Option<String> {
    input.map(sanitize).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_forbidden_characters() {
        assert_eq!(sanitize("Jo<hn>"), "John");
        assert_eq!(sanitize(r#"a"b'c;d&e"#), "abcde");
        assert_eq!(sanitize("<script>alert('x')</script>"), "scriptalert(x)/script");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(sanitize("  Ann  "), "Ann");
        assert_eq!(sanitize("\t\n"), "");
    }

    #[test]
    fn idempotent() {
        let inputs = ["Jo<hn>", "  Ann  ", "plain", r#"x<>"';&y"#, ""];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn leaves_clean_text_alone() {
        assert_eq!(sanitize("123 Main St, Apt 4"), "123 Main St, Apt 4");
    }

    #[test]
    fn optional_field_dropped_when_empty() {
        assert_eq!(sanitize_opt(Some("  <> ")), None);
        assert_eq!(sanitize_opt(Some(" ok ")), Some("ok".to_string()));
        assert_eq!(sanitize_opt(None), None);
    }
}
