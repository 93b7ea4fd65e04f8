//! Server-side HTML for the feed: cards, comment threads and whole pages.

pub mod comments;
pub mod feed_card;
pub mod pages;
pub mod timeago;

pub const DEFAULT_AVATAR: &str = "/images/default-avatar.svg";

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            ch => escaped.push(ch),
        }
    }
    escaped
}

pub fn avatar_src(avatar: Option<&str>) -> String {
    escape(avatar.filter(|a| !a.is_empty()).unwrap_or(DEFAULT_AVATAR))
}
