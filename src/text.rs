//! Text helpers for post and notification bodies.

use regex::Regex;
use std::sync::LazyLock;

/// Characters kept before the ellipsis in a post summary.
pub const SHORT_CONTENT_LIMIT: usize = 347;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").expect("valid tag regex"));

pub fn strip_tags(content: &str) -> String {
    TAG_RE.replace_all(content, "").into_owned()
}

/// Plain-text summary of a post body, at most `SHORT_CONTENT_LIMIT` chars plus "...".
pub fn short_content(content: &str) -> String {
    let plain = strip_tags(content);
    if plain.chars().count() <= SHORT_CONTENT_LIMIT {
        plain
    } else {
        let head: String = plain.chars().take(SHORT_CONTENT_LIMIT).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags("no tags"), "no tags");
    }

    #[test]
    fn short_content_keeps_short_text() {
        let text = "a".repeat(SHORT_CONTENT_LIMIT);
        assert_eq!(short_content(&format!("<p>{text}</p>")), text);
    }

    #[test]
    fn short_content_truncates_on_char_boundary() {
        let text = "é".repeat(SHORT_CONTENT_LIMIT + 10);
        let summary = short_content(&text);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), SHORT_CONTENT_LIMIT + 3);
    }
}
