//! Quality gates
//!
//! Pure verification functions over workflow data. Each gate takes its input
//! by reference, never mutates it, and returns a [`ValidationVerdict`]. Gates
//! hold only immutable configuration, so one instance can serve any number of
//! concurrent runs.
//!
//! ```text
//! UserQueryPackage ──► InputValidation
//! AgentReport      ──► ReportValidation ──► CitationParser (external)
//! Judicial + both  ──► ObjectivityValidation ──► BalanceScorer (pluggable)
//! ```

pub mod citation;
pub mod input;
pub mod objectivity;
pub mod report;
pub mod verdict;

pub use citation::{
    CitationKind, CitationParseError, CitationParser, StructuredCitation, normalize_citation,
};
pub use input::InputValidation;
pub use objectivity::{BalanceScorer, CitationBalanceScorer, ObjectivityValidation};
pub use report::ReportValidation;
pub use verdict::{GateKind, ValidationVerdict};
