//! URL slug normalization.
//!
//! Slugs are the single path segment that addresses a page (`/<slug>`).
//! They are derived either from user input or from the page title, and
//! only ever contain ASCII letters, digits and the style's separator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Top-level path segments owned by the router itself.
pub const ROUTE_SEGMENTS: &[&str] = &["static", "metrics"];

/// Which separator replaces whitespace in a slug.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugStyle {
    /// `first post` becomes `first_post`.
    #[default]
    Underscore,
    /// `first post` becomes `first-post`.
    Hyphen,
}

impl SlugStyle {
    pub fn separator(self) -> char {
        match self {
            Self::Underscore => '_',
            Self::Hyphen => '-',
        }
    }
}

/// Normalize arbitrary text into a URL-safe slug.
///
/// Trims, lower-cases, collapses each whitespace run into one separator and
/// then drops anything that is not an ASCII alphanumeric or the separator.
/// Never fails; empty or all-punctuation input yields an empty slug.
pub fn sanitize(input: &str, style: SlugStyle) -> String {
    let sep = style.separator();
    let mut slug = String::with_capacity(input.len());
    let mut in_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push(sep);
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;

        for lower in ch.to_lowercase() {
            if lower.is_ascii_alphanumeric() || lower == sep {
                slug.push(lower);
            }
        }
    }

    slug
}

/// Slug synthesized for a page that was not given one.
///
/// The first attempt is `{base}{id}`. Later attempts, used only after a
/// collision, append `{sep}{attempt}`.
pub fn auto_slug(base: &str, id: i64, attempt: u32, style: SlugStyle) -> String {
    if attempt == 0 {
        format!("{base}{id}")
    } else {
        format!("{base}{id}{}{attempt}", style.separator())
    }
}

/// Returns true if every character could have been produced by [`sanitize`].
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Slugs that stored pages may never claim.
#[derive(Clone, Debug, Default)]
pub struct ReservedSlugs {
    slugs: BTreeSet<String>,
}

impl ReservedSlugs {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the router's own segments plus the given slugs.
    pub fn with_route_segments<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reserved: Self = slugs.into_iter().collect();
        reserved.extend(ROUTE_SEGMENTS.iter().copied());
        reserved
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.slugs.contains(slug)
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.slugs.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ReservedSlugs {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            slugs: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for ReservedSlugs {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.slugs.extend(iter.into_iter().map(Into::into));
    }
}
