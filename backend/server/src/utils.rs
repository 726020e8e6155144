use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// Canonical form used as the registration key. Idempotent.
pub fn normalize_email(input: &str) -> String {
    input.trim().to_lowercase()
}

pub fn clean_field(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

pub fn looks_like_email(input: &str) -> bool {
    EMAIL_SHAPE.is_match(input)
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("Foo@Bar.com"), "foo@bar.com");
        assert_eq!(normalize_email("  foo@bar.com \n"), "foo@bar.com");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn test_normalize_email_idempotent() {
        let once = normalize_email("  MiXeD@Example.ORG ");

        assert_eq!(normalize_email(&once), once);
    }

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field("  Jane   Doe "), "Jane Doe");
        assert_eq!(clean_field("X\tSchool\n"), "X School");
        assert_eq!(clean_field("     "), "");
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("a@x.com"));
        assert!(looks_like_email("first.last+tag@sub.example.ng"));

        assert!(!looks_like_email("a@x"));
        assert!(!looks_like_email("ax.com"));
        assert!(!looks_like_email("a b@x.com"));
        assert!(!looks_like_email("a@@x.com"));
        assert!(!looks_like_email(""));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
