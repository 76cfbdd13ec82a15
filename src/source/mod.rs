use anyhow::{Context, Result};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::document::{Page, PageMeta};
use crate::slug::NormalizedSlug;

/// Supplies the page index and raw page content
pub trait ContentProvider: Send + Sync {
    /// Every known page, in provider order
    fn pages(&self) -> &[Page];

    fn get_page(&self, slug: &NormalizedSlug) -> Option<&Page> {
        self.pages().iter().find(|page| &page.slug == slug)
    }

    /// Raw content of `page`, frontmatter included
    fn load_content(&self, page: &Page) -> impl Future<Output = Result<String>> + Send;
}

/// Pages read from a directory of markdown files
pub struct ContentDir {
    root: PathBuf,
    pages: Vec<Page>,
    files: HashMap<NormalizedSlug, PathBuf>,
}

impl ContentDir {
    /// Scan `root` recursively for documentation pages
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            anyhow::bail!("Content directory {:?} does not exist", root);
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || !is_page_file(path) {
                continue;
            }

            let Some(slug) = slug_for_file(&root, path) else {
                continue;
            };

            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Skipping unreadable page {:?}: {}", path, e);
                    continue;
                }
            };

            let meta = PageMeta::from_content(&raw).unwrap_or_else(|e| {
                tracing::warn!("Malformed frontmatter in {:?}: {}", path, e);
                PageMeta::default()
            });

            entries.push((Page::new(slug, meta.title, meta.description), path.to_path_buf()));
        }

        entries.sort_by(|(a, _), (b, _)| a.slug.cmp(&b.slug));
        entries.dedup_by(|(next, path), (kept, _)| {
            let duplicate = next.slug == kept.slug;
            if duplicate {
                tracing::warn!("Ignoring {:?}: slug '{}' is already taken", path, next.slug);
            }
            duplicate
        });

        tracing::info!("Indexed {} pages from {:?}", entries.len(), root);

        let files = entries
            .iter()
            .map(|(page, path)| (page.slug.clone(), path.clone()))
            .collect();
        let pages = entries.into_iter().map(|(page, _)| page).collect();

        Ok(Self { root, pages, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentProvider for ContentDir {
    fn pages(&self) -> &[Page] {
        &self.pages
    }

    async fn load_content(&self, page: &Page) -> Result<String> {
        let path = self
            .files
            .get(&page.slug)
            .with_context(|| format!("No source file for page '{}'", page.url))?;

        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read page {:?}", path))
    }
}

/// Pages held in memory, in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<Page>,
    contents: HashMap<NormalizedSlug, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page; title and description come from its frontmatter
    pub fn add_page(&mut self, slug: &str, raw: &str) -> Result<()> {
        let slug = NormalizedSlug::parse(slug);
        if self.contents.contains_key(&slug) {
            anyhow::bail!("Duplicate page slug '{}'", slug);
        }
        let meta = PageMeta::from_content(raw)
            .with_context(|| format!("Malformed frontmatter for '{}'", slug))?;
        self.pages.push(Page::new(slug.clone(), meta.title, meta.description));
        self.contents.insert(slug, raw.to_string());
        Ok(())
    }

    pub fn with_page(mut self, slug: &str, raw: &str) -> Result<Self> {
        self.add_page(slug, raw)?;
        Ok(self)
    }
}

impl ContentProvider for MemorySource {
    fn pages(&self) -> &[Page] {
        &self.pages
    }

    async fn load_content(&self, page: &Page) -> Result<String> {
        self.contents
            .get(&page.slug)
            .cloned()
            .with_context(|| format!("No content for page '{}'", page.url))
    }
}

fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "md" | "mdx"))
        .unwrap_or(false)
}

/// `a/b.mdx` is `a/b`, `a/index.mdx` is `a`
fn slug_for_file(root: &Path, path: &Path) -> Option<NormalizedSlug> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect::<Option<_>>()?;

    if segments.last().map(String::as_str) == Some("index") {
        segments.pop();
    }

    Some(NormalizedSlug::from_segments(segments))
}
