//! Post description sanitizer.
//!
//! Scraped descriptions arrive as a constrained HTML subset. Telegram's
//! `parse_mode: HTML` accepts only a handful of tags, so before a post is
//! previewed or published the description is stripped of quote blocks,
//! line-break tags, bare image tags, and empty anchors, then trimmed.
//! The function is idempotent.

use std::sync::LazyLock;

use regex::Regex;

static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<blockquote\b[^>]*>.*?</blockquote>").unwrap()
});
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img[^>]*>").unwrap());
static EMPTY_ANCHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a\s*[^>]*></a>").unwrap());

/// Strip unsupported markup from a post description.
///
/// Quote blocks are removed together with their content; break tags, image
/// tags, and empty anchors are removed outright. The result is trimmed and
/// may be empty.
pub fn sanitize_description(raw: &str) -> String {
    let text = BLOCKQUOTE.replace_all(raw, "");
    let text = text
        .replace("<br/>", "")
        .replace("<br />", "")
        .replace("</br>", "");
    let text = IMG_TAG.replace_all(&text, "");
    let text = EMPTY_ANCHOR.replace_all(&text, "");
    text.trim().to_string()
}
