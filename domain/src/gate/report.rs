//! Report Validation gate

use super::citation::CitationParser;
use super::verdict::{GateKind, ValidationVerdict};
use crate::core::query::LanguageTag;
use crate::report::{AgentReport, AgentRole};
use std::sync::Arc;

/// Checks one research report before it may reach the Judicial agent.
///
/// Rules:
/// - the position text is not empty
/// - the report's role matches the adapter that produced it
/// - at least one citation parses
///
/// Unparseable citations are always recorded, but they only fail the gate
/// when none of the report's citations parse. On a passing verdict they are
/// carried as notes, which the workflow copies into the run summary.
#[derive(Clone)]
pub struct ReportValidation {
    parser: Arc<dyn CitationParser>,
}

impl ReportValidation {
    pub fn new(parser: Arc<dyn CitationParser>) -> Self {
        Self { parser }
    }

    pub fn verify(
        &self,
        report: &AgentReport,
        expected: AgentRole,
        language: LanguageTag,
    ) -> ValidationVerdict {
        let mut diagnostics = Vec::new();

        if report.position().trim().is_empty() {
            diagnostics.push("position text must not be empty".to_string());
        }

        if report.role() != expected {
            diagnostics.push(format!(
                "report role '{}' does not match the producing adapter '{}'",
                report.role(),
                expected
            ));
        }

        let mut parsed = 0usize;
        let mut parse_errors = Vec::new();
        for (index, citation) in report.citations().iter().enumerate() {
            match self.parser.parse(citation, language) {
                Ok(_) => parsed += 1,
                Err(e) => parse_errors.push(format!(
                    "citation {} ('{}') could not be parsed: {}",
                    index + 1,
                    citation,
                    e
                )),
            }
        }

        let mut notes = Vec::new();
        if report.citations().is_empty() {
            diagnostics.push("report contains no citations".to_string());
        } else if parsed == 0 {
            diagnostics.push("none of the report's citations could be parsed".to_string());
            diagnostics.extend(parse_errors);
        } else {
            notes = parse_errors;
        }

        ValidationVerdict::from_diagnostics(GateKind::Report, diagnostics)
            .with_notes(notes)
            .with_subject(expected)
    }
}

impl std::fmt::Debug for ReportValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportValidation").finish_non_exhaustive()
    }
}
