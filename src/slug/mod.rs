use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::fmt;

/// Default prefix the docs site is mounted under
pub const DEFAULT_BASE_PATH: &str = "/docs";
/// Default name of the per-page export file
pub const DEFAULT_EXPORT_FILE: &str = "llms.txt";

/// Characters escaped inside one URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A page identifier made of non-empty path segments.
///
/// The empty slug means "no specific page" and is answered with the table of
/// contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedSlug {
    segments: Vec<String>,
}

impl NormalizedSlug {
    /// Split a `/`-separated string, dropping empty segments
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            segments: segments
                .into_iter()
                .filter(|s| !s.as_ref().is_empty())
                .map(|s| s.as_ref().to_string())
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Site-relative URL for this slug with each segment percent-encoded,
    /// `/` for the empty slug
    pub fn to_url(&self) -> String {
        let encoded: Vec<String> = self
            .segments
            .iter()
            .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
            .collect();
        format!("/{}", encoded.join("/"))
    }
}

impl fmt::Display for NormalizedSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Turns request paths and `?slug=` parameters into [`NormalizedSlug`]s
#[derive(Debug, Clone)]
pub struct SlugResolver {
    base_path: String,
    export_file: String,
}

impl SlugResolver {
    pub fn new(base_path: &str, export_file: &str) -> Self {
        Self {
            base_path: normalize_base_path(base_path),
            export_file: export_file.trim_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn export_file(&self) -> &str {
        &self.export_file
    }

    /// Resolve a page identifier. An explicit, non-blank slug parameter wins
    /// over the pathname, whose segments are percent-decoded. Never fails:
    /// anything unusable becomes the empty slug.
    pub fn resolve(&self, pathname: &str, slug_param: Option<&str>) -> NormalizedSlug {
        if let Some(param) = slug_param.map(str::trim).filter(|p| !p.is_empty()) {
            return NormalizedSlug::parse(param.trim_matches('/'));
        }

        let mut path = pathname.trim_end_matches('/');
        if !self.base_path.is_empty() {
            if path == self.base_path {
                path = "";
            } else if let Some(rest) = path
                .strip_prefix(self.base_path.as_str())
                .filter(|rest| rest.starts_with('/'))
            {
                path = rest;
            }
        }

        if !self.export_file.is_empty() {
            if let Some(rest) = path.strip_suffix(self.export_file.as_str()) {
                // only a whole trailing segment counts as the export file
                if rest.is_empty() || rest.ends_with('/') {
                    path = rest.strip_suffix('/').unwrap_or(rest);
                }
            }
        }

        NormalizedSlug::from_segments(
            path.split('/')
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy()),
        )
    }
}

impl Default for SlugResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PATH, DEFAULT_EXPORT_FILE)
    }
}

/// `docs/` and `/docs/` both become `/docs`; `/` and `` become ``
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
