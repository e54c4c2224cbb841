//! Source identity types.
//!
//! A source is one unit of input content: a web page, a local document,
//! or raw inline text. The kind is resolved once when the source is
//! constructed; downstream code dispatches on the tag, never re-parses.

use serde::{Deserialize, Serialize};

/// What kind of content a source refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A web page addressed by URL
    Url,

    /// A local document addressed by path
    File,

    /// Raw text supplied inline
    Text,
}

/// One unit of input content to extract from.
///
/// Immutable once enqueued for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// The source kind tag
    pub kind: SourceKind,

    /// URL, path, or the raw text itself
    pub value: String,
}

impl Source {
    /// Create a URL source.
    ///
    /// The URL is kept as given; use [`Source::is_well_formed`] to check
    /// it parses before enqueueing.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Url,
            value: url.into(),
        }
    }

    /// Create a file source.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::File,
            value: path.into(),
        }
    }

    /// Create a raw text source.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Text,
            value: text.into(),
        }
    }

    /// Check structural validity (URL sources must parse as URLs).
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            SourceKind::Url => url::Url::parse(&self.value).is_ok(),
            SourceKind::File => !self.value.is_empty(),
            SourceKind::Text => true,
        }
    }

    /// Short label used to tag this source in reports and synthesis
    /// context. Raw text is truncated so labels stay readable.
    pub fn label(&self) -> String {
        match self.kind {
            SourceKind::Url | SourceKind::File => self.value.clone(),
            SourceKind::Text => {
                const MAX: usize = 40;
                if self.value.chars().count() <= MAX {
                    format!("text:{}", self.value)
                } else {
                    let head: String = self.value.chars().take(MAX).collect();
                    format!("text:{}…", head)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_source_well_formed() {
        assert!(Source::url("https://example.com/page").is_well_formed());
        assert!(!Source::url("not a url").is_well_formed());
    }

    #[test]
    fn test_file_source_well_formed() {
        assert!(Source::file("/tmp/doc.pdf").is_well_formed());
        assert!(!Source::file("").is_well_formed());
    }

    #[test]
    fn test_text_label_truncates() {
        let long = "x".repeat(100);
        let label = Source::text(&long).label();
        assert!(label.starts_with("text:"));
        assert!(label.chars().count() < 50);

        let short = Source::text("hello").label();
        assert_eq!(short, "text:hello");
    }
}
