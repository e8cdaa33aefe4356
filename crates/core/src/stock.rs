//! Read-only pages shipped with the deployment.
//!
//! Each regular file in the stock directory becomes one page addressed by
//! its file stem. Stock slugs shadow stored pages and are reserved so no
//! stored page can ever claim them.

use crate::page::describe;
use crate::slug::ReservedSlugs;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A stock page loaded from disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockPage {
    pub slug: String,
    pub title: String,
    /// Raw Markdown.
    pub content: String,
    pub description: String,
}

impl StockPage {
    /// Build a stock page from Markdown, taking the title from the first heading.
    pub fn from_markdown(slug: impl Into<String>, content: impl Into<String>) -> Self {
        let slug = slug.into();
        let content = content.into();
        let title = first_heading(&content).unwrap_or_else(|| slug.clone());
        let description = describe(&content);
        Self {
            slug,
            title,
            content,
            description,
        }
    }
}

/// The set of stock pages keyed by slug.
#[derive(Clone, Debug, Default)]
pub struct StockPages {
    pages: BTreeMap<String, StockPage>,
}

impl StockPages {
    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every regular file in `dir` (non-recursive).
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let io_err = |source| Error::StockPages {
            path: dir.to_path_buf(),
            source,
        };

        let mut pages = BTreeMap::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!(path = %path.display(), "Skipping stock file with non UTF-8 name");
                continue;
            };
            let content = fs::read_to_string(&path).map_err(|source| Error::StockPages {
                path: path.clone(),
                source,
            })?;

            let page = StockPage::from_markdown(stem, content);
            tracing::debug!(slug = %page.slug, title = %page.title, "Loaded stock page");
            pages.insert(page.slug.clone(), page);
        }

        tracing::info!(dir = %dir.display(), count = pages.len(), "Stock pages loaded");
        Ok(Self { pages })
    }

    pub fn get(&self, slug: &str) -> Option<&StockPage> {
        self.pages.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.pages.contains_key(slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Stock slugs plus the router's own path segments.
    pub fn reserved_slugs(&self) -> ReservedSlugs {
        ReservedSlugs::with_route_segments(self.slugs())
    }
}

impl FromIterator<StockPage> for StockPages {
    fn from_iter<I: IntoIterator<Item = StockPage>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().map(|p| (p.slug.clone(), p)).collect(),
        }
    }
}

/// Text of the first ATX heading (`#`, `##`, ...) in `content`.
fn first_heading(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim_start_matches('#');
        if rest.len() == line.len() || !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let text = rest.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}
