//! Page record and the inputs used to create and edit it.

use crate::DESCRIPTION_MAX_CHARS;
use crate::timestamp::Timestamp;
use std::fmt;

/// A published page.
///
/// `Debug` never prints the edit secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// Raw Markdown.
    pub content: String,
    pub secret: String,
    pub description: String,
    pub author: String,
    pub created_at: Timestamp,
    pub last_read_at: Timestamp,
}

impl Page {
    /// Description for link previews: the explicit one, or a summary of the content.
    pub fn summary(&self) -> String {
        if self.description.is_empty() {
            describe(&self.content)
        } else {
            self.description.clone()
        }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("slug", &self.slug)
            .field("content_len", &self.content.len())
            .field("secret", &"<redacted>")
            .field("description", &self.description)
            .field("author", &self.author)
            .field("created_at", &self.created_at)
            .field("last_read_at", &self.last_read_at)
            .finish()
    }
}

/// Input for creating a page.
#[derive(Clone, Debug, Default)]
pub struct NewPage {
    pub title: String,
    pub content: String,
    /// Requested slug; `None` or empty after sanitizing means derive from the title.
    pub slug: Option<String>,
    /// Edit secret; generated when absent or empty.
    pub secret: Option<String>,
    pub description: String,
    pub author: String,
    /// Defaults to now.
    pub created_at: Option<Timestamp>,
    /// Defaults to `created_at`.
    pub last_read_at: Option<Timestamp>,
}

impl NewPage {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Backdate the page, mostly useful for imports and tests.
    pub fn with_timestamps(mut self, created_at: Timestamp, last_read_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self.last_read_at = Some(last_read_at);
        self
    }
}

/// Replacement fields for an edit. The secret is supplied separately.
#[derive(Clone, Debug, Default)]
pub struct PageEdit {
    pub title: String,
    pub content: String,
    /// New slug; `None` or empty after sanitizing means regenerate from title and id.
    pub slug: Option<String>,
    pub description: String,
    pub author: String,
}

impl PageEdit {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Start an edit that keeps every field of `page` as it is.
    pub fn from_page(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            content: page.content.clone(),
            slug: Some(page.slug.clone()),
            description: page.description.clone(),
            author: page.author.clone(),
        }
    }
}

/// Check the fields every page must carry.
pub fn validate_required(title: &str, content: &str) -> crate::Result<()> {
    match (title.trim().is_empty(), content.trim().is_empty()) {
        (false, false) => Ok(()),
        (true, true) => Err(crate::Error::Validation(
            "title and content are required".to_string(),
        )),
        (true, false) => Err(crate::Error::Validation("title is required".to_string())),
        (false, true) => Err(crate::Error::Validation("content is required".to_string())),
    }
}

/// Plain-text summary of Markdown content for `<meta name="description">`.
///
/// Block markers and inline emphasis are dropped, whitespace is collapsed
/// and the result is cut at a word boundary.
pub fn describe(content: &str) -> String {
    let mut text = String::new();
    let mut in_fence = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("```") || line.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || line.is_empty() {
            continue;
        }

        let line = strip_block_marker(line);
        for ch in line.chars() {
            match ch {
                '*' | '_' | '`' | '[' | ']' | '#' => {}
                c if c.is_whitespace() => {
                    if !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
                c => text.push(c),
            }
        }
        if !text.is_empty() && !text.ends_with(' ') {
            text.push(' ');
        }
    }

    truncate_words(text.trim_end(), DESCRIPTION_MAX_CHARS)
}

fn strip_block_marker(line: &str) -> &str {
    let stripped = line.trim_start_matches(['#', '>']).trim_start();
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = stripped.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    let digits = stripped.chars().take_while(char::is_ascii_digit).count();
    if digits > 0
        && let Some(rest) = stripped[digits..].strip_prefix(". ")
    {
        return rest.trim_start();
    }
    stripped
}

fn truncate_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let head = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Page {
        Page {
            id: 3,
            title: "Notes".to_string(),
            slug: "notes3".to_string(),
            content: "# Notes\n\nSome *bold* text.".to_string(),
            secret: "maple-otter-reef".to_string(),
            description: String::new(),
            author: String::new(),
            created_at: Timestamp::from_unix(0).unwrap(),
            last_read_at: Timestamp::from_unix(0).unwrap(),
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", sample_page());
        assert!(!rendered.contains("maple-otter-reef"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn summary_falls_back_to_content() {
        let mut page = sample_page();
        assert_eq!(page.summary(), "Notes Some bold text.");
        page.description = "Explicit".to_string();
        assert_eq!(page.summary(), "Explicit");
    }

    #[test]
    fn validate_required_reports_missing_fields() {
        assert!(validate_required("T", "C").is_ok());
        assert!(validate_required("", "C").unwrap_err().to_string().contains("title"));
        assert!(validate_required("T", "  ").unwrap_err().to_string().contains("content"));
        assert!(validate_required(" ", "").is_err());
    }

    #[test]
    fn describe_strips_markdown() {
        let md = "# Heading\n\n> quoted _line_\n\n- item one\n1. first\n\n```\nlet code = 1;\n```\nTail `code`.";
        assert_eq!(describe(md), "Heading quoted line item one first Tail code.");
    }

    #[test]
    fn describe_truncates_on_word_boundary() {
        let md = "word ".repeat(100);
        let desc = describe(&md);
        assert!(desc.ends_with("..."));
        assert!(desc.chars().count() <= DESCRIPTION_MAX_CHARS + 3);
        assert!(!desc.contains("wor..."));
    }

    #[test]
    fn edit_from_page_keeps_fields() {
        let page = sample_page();
        let edit = PageEdit::from_page(&page);
        assert_eq!(edit.slug.as_deref(), Some("notes3"));
        assert_eq!(edit.content, page.content);
    }
}
