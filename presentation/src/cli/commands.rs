//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tribunal_application::WorkflowOptions;
use tribunal_domain::{OutputFormat, UserQueryPackage};

/// Output format for tribunal results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliOutputFormat {
    /// Judicial report, both research reports and the run history
    Full,
    /// Only the judicial report
    Report,
    /// JSON output
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Full => OutputFormat::Full,
            CliOutputFormat::Report => OutputFormat::Report,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for tribunal
#[derive(Parser, Debug)]
#[command(name = "tribunal")]
#[command(author, version, about = "Adversarial legal analysis - advocate, adversary and judge")]
#[command(long_about = r#"
Tribunal analyses a legal question with three agents.

The run has three stages:
1. Research: the Advocate and the Adversary argue for and against, in parallel
2. Report Validation: both reports must cite parseable authorities
3. Judicial Synthesis: the Judicial agent weighs both reports, and the
   result must draw evenly on both sides to be accepted

Configuration files are loaded from (in priority order):
1. TRIBUNAL_<SECTION>__<KEY>        Environment variables
2. --config <path>                  Explicit config file
3. ./tribunal.toml                  Project-level config
4. ~/.config/tribunal/config.toml   Global config

Example:
  tribunal "Ist ein Vertrag mit widerrechtlichem Inhalt nach Art. 20 OR nichtig?"
  tribunal -l FR -o full "Le bailleur peut-il résilier le bail sans motif?"
  tribunal --deadline 300 --max-attempts 2 -o json "..."
"#)]
pub struct Cli {
    /// The legal question to analyse
    #[arg(required_unless_present = "show_config")]
    pub question: Option<String>,

    /// Language of the question and its citations (DE, FR or IT)
    #[arg(short, long, default_value = "DE")]
    pub language: String,

    /// Prior context (facts of the case, earlier correspondence)
    #[arg(long, value_name = "TEXT")]
    pub context: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<CliOutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Directory for the run's JSONL message journal
    #[arg(long, value_name = "DIR")]
    pub journal_dir: Option<PathBuf>,

    /// Overall deadline of the run in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline: Option<u64>,

    /// Timeout of a single agent invocation in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub agent_timeout: Option<u64>,

    /// Attempts of a failing stage before the run fails
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Minimum balance score of the judicial report (0.0 - 1.0)
    #[arg(long, value_name = "SCORE", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Reject citations that follow another language's conventions
    #[arg(long)]
    pub strict_citations: bool,
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("{threshold} is not within [0, 1]"))
    }
}

impl Cli {
    /// Build the query package from the positional question and flags
    pub fn query(&self) -> Option<UserQueryPackage> {
        let question = self.question.as_ref()?;
        let mut query = UserQueryPackage::new(question.clone(), self.language.clone());
        if let Some(context) = &self.context {
            query = query.with_prior_context(context.clone());
        }
        Some(query)
    }

    /// Apply workflow flags on top of configured options
    pub fn apply_overrides(&self, mut options: WorkflowOptions) -> WorkflowOptions {
        if let Some(secs) = self.deadline {
            options.deadline = Duration::from_secs(secs);
        }
        if let Some(secs) = self.agent_timeout {
            options.agent_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_attempts {
            options.max_attempts = attempts;
        }
        if let Some(threshold) = self.threshold {
            options.objectivity_threshold = threshold;
        }
        options
    }
}
