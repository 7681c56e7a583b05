//! Citation parser seam
//!
//! The citation grammar belongs to an external collaborator. Report
//! Validation only needs to know whether a raw citation string parses.

use crate::core::query::LanguageTag;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a citation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    /// Article of a statute or code (e.g. `Art. 20 OR`)
    Statute,
    /// Published court decision (e.g. `BGE 123 III 292`)
    CourtDecision,
}

/// A parsed citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCitation {
    pub kind: CitationKind,
    /// The citation as written, whitespace-normalized
    pub reference: String,
    /// Article number or decision page, as written (may carry suffixes like `a`, `bis`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<String>,
    /// Code abbreviation (`OR`, `ZGB`, `CO`, ...) or decision collection (`BGE`, `ATF`, `DTF`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Why a citation string could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CitationParseError {
    #[error("empty citation")]
    Empty,

    #[error("unrecognized citation format: '{0}'")]
    Unrecognized(String),

    #[error("'{citation}' does not follow {language} citation conventions")]
    LanguageMismatch {
        citation: String,
        language: LanguageTag,
    },
}

/// Pure function: citation string → structured citation or parse error
pub trait CitationParser: Send + Sync {
    fn parse(
        &self,
        citation: &str,
        language: LanguageTag,
    ) -> Result<StructuredCitation, CitationParseError>;
}

/// Normalize a citation for cross-referencing (case-insensitive, collapsed whitespace)
pub fn normalize_citation(citation: &str) -> String {
    citation
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
