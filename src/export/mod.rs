use anyhow::{Context, Result};
use futures::future::try_join_all;

use crate::document::{Page, strip_frontmatter};
use crate::slug::NormalizedSlug;
use crate::source::ContentProvider;

/// First line of every table of contents
pub const TOC_HEADING: &str = "# Documentation Table of Contents";
/// Shown for pages without a title
pub const UNTITLED: &str = "(Untitled)";
/// Body of not-found responses, over HTTP and MCP alike
pub const PAGE_NOT_FOUND: &str = "Page not found";

/// Result of a single page lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageText {
    Found(String),
    NotFound,
}

impl PageText {
    pub fn into_option(self) -> Option<String> {
        match self {
            PageText::Found(text) => Some(text),
            PageText::NotFound => None,
        }
    }
}

/// Read-only plain-text exports of a documentation corpus
pub struct ExportService<P> {
    provider: P,
    base_path: String,
}

impl<P: ContentProvider> ExportService<P> {
    /// `base_path` prefixes page URLs in the table of contents, e.g. `/docs`
    pub fn new(provider: P, base_path: &str) -> Self {
        Self {
            provider,
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Canonical external URL of `page`
    pub fn canonical_url(&self, page: &Page) -> String {
        format!("{}{}", self.base_path, page.url)
    }

    /// The processed text of one page
    pub async fn get_page(&self, slug: &NormalizedSlug) -> Result<PageText> {
        let Some(page) = self.provider.get_page(slug) else {
            tracing::debug!("No page for slug '{}'", slug);
            return Ok(PageText::NotFound);
        };

        let raw = self
            .provider
            .load_content(page)
            .await
            .with_context(|| format!("Failed to load page '{}'", page.url))?;

        Ok(PageText::Found(strip_frontmatter(&raw).to_string()))
    }

    /// Markdown list of every page with its link and description
    pub fn get_table_of_contents(&self) -> String {
        let mut lines = vec![TOC_HEADING.to_string()];

        for page in self.provider.pages() {
            let title = page.title.as_deref().unwrap_or(UNTITLED);
            lines.push(format!("- [{}]({})", title, self.canonical_url(page)));

            if let Some(description) = page.description.as_deref().filter(|d| !d.is_empty()) {
                lines.push(format!("  - {}", description));
            }
        }

        lines.join("\n")
    }

    /// Every page as `(url)` followed by its processed text, in page order
    pub async fn get_full_corpus(&self) -> Result<String> {
        let pages = self.provider.pages();
        tracing::debug!("Exporting {} pages", pages.len());

        // try_join_all polls every load concurrently but yields results in input order
        let blocks = try_join_all(pages.iter().map(|page| self.page_block(page))).await?;

        Ok(blocks.join("\n\n"))
    }

    async fn page_block(&self, page: &Page) -> Result<String> {
        let raw = self
            .provider
            .load_content(page)
            .await
            .with_context(|| format!("Failed to load page '{}'", page.url))?;

        Ok(format!("({})\n\n{}", page.url, strip_frontmatter(&raw)))
    }
}
