//! Console output formatter for workflow results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use tribunal_domain::{AgentReport, RunSummary, WorkflowFailure, WorkflowResult, WorkflowState};

/// Formats workflow results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &WorkflowResult) -> String {
        let mut output = String::new();
        let summary = result.summary();

        // Header
        output.push_str(&Self::header("Tribunal Analysis"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Question:".cyan().bold(),
            summary.question
        ));
        output.push_str(&format!(
            "{} {}   {} {}\n",
            "Language:".cyan().bold(),
            summary.language,
            "Run:".cyan().bold(),
            summary.correlation_id
        ));

        match result {
            WorkflowResult::Completed(run) => {
                output.push_str(&Self::section_header("Advocate"));
                output.push_str(&Self::report(&run.advocate));
                output.push_str(&Self::section_header("Adversary"));
                output.push_str(&Self::report(&run.adversary));
                output.push_str(&Self::section_header("Judicial Analysis"));
                output.push_str(&Self::report(&run.judicial));
            }
            WorkflowResult::Failed(failure) => {
                output.push_str(&Self::section_header("Analysis Failed"));
                output.push_str(&Self::failure(failure));
            }
        }

        // Run history
        output.push_str(&Self::section_header("Run History"));
        output.push_str(&Self::history(summary));

        if !summary.diagnostics.is_empty() && result.is_completed() {
            output.push_str(&format!("\n{}\n", "Recovered failures:".yellow().bold()));
            for diagnostic in &summary.diagnostics {
                output.push_str(&format!("  * {}\n", diagnostic.summary()));
            }
        }

        if !summary.notes.is_empty() {
            output.push_str(&format!("\n{}\n", "Notes:".dimmed()));
            for note in &summary.notes {
                output.push_str(&format!("  * {}\n", note));
            }
        }

        output.push_str(&Self::footer(summary));

        output
    }

    /// Format as JSON
    pub fn format_json(result: &WorkflowResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the judicial report only (concise output)
    pub fn format_report_only(result: &WorkflowResult) -> String {
        let mut output = String::new();
        let summary = result.summary();

        match result {
            WorkflowResult::Completed(run) => {
                output.push_str(&format!(
                    "{}\n\n",
                    "=== Judicial Analysis ===".cyan().bold()
                ));
                output.push_str(&format!("{} {}\n\n", "Q:".bold(), summary.question));
                output.push_str(run.judicial.position());
                output.push('\n');
                if !run.judicial.citations().is_empty() {
                    output.push_str(&format!(
                        "\n{} {}\n",
                        "Authorities:".dimmed(),
                        run.judicial.citations().join(", ")
                    ));
                }
            }
            WorkflowResult::Failed(failure) => {
                output.push_str(&format!(
                    "{}\n\n",
                    "=== Analysis Failed ===".red().bold()
                ));
                output.push_str(&format!("{} {}\n\n", "Q:".bold(), summary.question));
                output.push_str(&Self::failure(failure));
            }
        }

        output
    }

    fn report(report: &AgentReport) -> String {
        let mut output = format!("\n{}\n", report.position());
        if !report.citations().is_empty() {
            output.push_str(&format!("\n{}\n", "Citations:".cyan().bold()));
            for citation in report.citations() {
                output.push_str(&format!("  * {}\n", citation));
            }
        }
        output.push_str(&format!(
            "{} {:.2}\n",
            "Confidence:".dimmed(),
            report.confidence().value()
        ));
        output
    }

    fn failure(failure: &WorkflowFailure) -> String {
        let mut output = format!(
            "{} {}\n",
            "Failed in:".red().bold(),
            failure.failed_in.display_name()
        );
        for diagnostic in failure.diagnostics() {
            output.push_str(&format!("  {} {}\n", "x".red(), diagnostic.summary()));
        }
        output
    }

    fn history(summary: &RunSummary) -> String {
        let mut output = String::new();
        for record in &summary.transitions {
            let line = format!("{} -> {}", record.from.display_name(), record.to.display_name());
            match &record.reason {
                Some(reason) => {
                    output.push_str(&format!("  {} {}\n", line, format!("({reason})").dimmed()))
                }
                None => output.push_str(&format!("  {}\n", line)),
            }
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer(summary: &RunSummary) -> String {
        let status = if summary.final_state == WorkflowState::Completed {
            summary.final_state.display_name().green().bold()
        } else {
            summary.final_state.display_name().red().bold()
        };
        format!(
            "\n{} {} in {:.1}s\n{}\n",
            "Status:".bold(),
            status,
            summary.elapsed().num_milliseconds() as f64 / 1000.0,
            "=".repeat(60).cyan()
        )
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &WorkflowResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &WorkflowResult) -> String {
        Self::format_json(result)
    }

    fn format_report_only(&self, result: &WorkflowResult) -> String {
        Self::format_report_only(result)
    }
}
