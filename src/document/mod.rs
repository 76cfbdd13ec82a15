use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::slug::NormalizedSlug;

/// A documentation page as known to the page index
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub slug: NormalizedSlug,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Site-relative URL, `/quick-start/setup`
    pub url: String,
}

impl Page {
    pub fn new(slug: NormalizedSlug, title: Option<String>, description: Option<String>) -> Self {
        let url = slug.to_url();
        Self {
            slug,
            title,
            description,
            url,
        }
    }
}

/// The frontmatter keys the export cares about
#[derive(Debug, Default, Deserialize)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PageMeta {
    /// Read title and description from the leading frontmatter block of `raw`
    pub fn from_content(raw: &str) -> anyhow::Result<Self> {
        match split_frontmatter(raw).0 {
            Some(block) if !block.trim().is_empty() => Ok(serde_yaml::from_str(block)?),
            _ => Ok(Self::default()),
        }
    }
}

/// Leading `---` block: the opening line, an optional block body, then the
/// first line holding only `---` plus at most one newline after it
static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t\r]*\n(?:(.*?)\n)??---[ \t\r]*(?:\n|\z)").unwrap()
    })
}

/// Split `raw` into its leading frontmatter block (without markers) and the
/// remaining body.
///
/// The block must open with a `---` line at the very start of the text and is
/// closed by the first following line that holds only `---`. The closing
/// line's newline belongs to the block. Anything else leaves `raw` whole.
pub fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    match frontmatter_regex().captures(raw) {
        Some(captures) => {
            let block = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            let end = captures.get(0).map(|m| m.end()).unwrap_or(0);
            (Some(block), &raw[end..])
        }
        None => (None, raw),
    }
}

/// Remove a leading frontmatter block, leaving everything else byte-identical
pub fn strip_frontmatter(raw: &str) -> &str {
    if raw.is_empty() {
        return raw;
    }
    split_frontmatter(raw).1
}
