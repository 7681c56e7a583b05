//! Output formatter trait

use tribunal_domain::{OutputFormat, WorkflowResult};

/// Trait for formatting workflow results
pub trait OutputFormatter {
    /// Format the complete result: all reports and the run history
    fn format(&self, result: &WorkflowResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &WorkflowResult) -> String;

    /// Format the judicial report only (concise output)
    fn format_report_only(&self, result: &WorkflowResult) -> String;

    /// Format according to `format`
    fn render(&self, result: &WorkflowResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(result),
            OutputFormat::Report => self.format_report_only(result),
            OutputFormat::Json => self.format_json(result),
        }
    }
}
