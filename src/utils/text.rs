// src/utils/text.rs

//! Plain-text helpers for message previews.

use scraper::Html;

/// Strip markup from an HTML fragment and collapse whitespace.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters without splitting a word.
///
/// Text within the limit is returned whole. Longer text ends at the last
/// whitespace inside the limit, so punctuated tokens such as URLs or
/// hyphenated words stay intact. A single token longer than the limit is
/// cut hard.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let Some((limit, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let cut = if text[limit..].starts_with(char::is_whitespace) {
        limit
    } else {
        text[..limit].rfind(char::is_whitespace).unwrap_or(0)
    };

    let kept = text[..cut].trim_end();
    if kept.is_empty() {
        text[..limit].to_string()
    } else {
        kept.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<p>First   paragraph.</p>\n<p>Second <strong>bold</strong> one.</p>";
        assert_eq!(html_to_text(html), "First paragraph. Second bold one.");
    }

    #[test]
    fn adjacent_blocks_do_not_glue_words() {
        assert_eq!(html_to_text("<p>one</p><p>two</p>"), "one two");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(html_to_text("<p>Fish &amp; chips</p>"), "Fish & chips");
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_at_word("hello world", 1000), "hello world");
    }

    #[test]
    fn text_exactly_at_limit_is_untouched() {
        assert_eq!(truncate_at_word("abcde", 5), "abcde");
    }

    #[test]
    fn backs_off_to_word_boundary() {
        assert_eq!(truncate_at_word("hello wonderful world", 9), "hello");
    }

    #[test]
    fn keeps_word_ending_right_at_limit() {
        assert_eq!(truncate_at_word("hello world", 5), "hello");
    }

    #[test]
    fn hyphenated_word_is_not_split() {
        assert_eq!(truncate_at_word("a well-known fact", 8), "a");
        assert_eq!(truncate_at_word("a well-known fact", 12), "a well-known");
    }

    #[test]
    fn url_is_not_split() {
        let text = "see https://www.theguardian.com/world for more";
        assert_eq!(truncate_at_word(text, 20), "see");
        assert_eq!(truncate_at_word(text, 40), "see https://www.theguardian.com/world");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "café société générale";
        let cut = truncate_at_word(text, 14);
        assert_eq!(cut, "café société");
    }

    #[test]
    fn single_long_token_is_cut_hard() {
        let text = "a".repeat(20);
        assert_eq!(truncate_at_word(&text, 8), "a".repeat(8));
    }

    #[test]
    fn long_prose_stays_within_limit_on_whole_words() {
        let text = "lorem ipsum dolor sit amet ".repeat(80);
        let cut = truncate_at_word(&text, 1000);
        assert!(cut.chars().count() <= 1000);
        assert!(text.starts_with(&cut));
        let next = text[cut.len()..].chars().next();
        assert_eq!(next, Some(' '));
    }
}
