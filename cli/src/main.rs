//! CLI entrypoint for tribunal
//!
//! This is the main binary that wires together all layers using
//! dependency injection.
//!
//! Exit status: 0 when the run completed, 1 when it failed, 2 on
//! configuration or infrastructure errors.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tribunal_application::{
    AgentSet, LegalAgent, MessageBus, MessageSink, SubmitQueryUseCase, attach_sink, join_sinks,
};
use tribunal_domain::{AgentRole, CitationParser, CorrelationId};
use tribunal_infrastructure::{
    ConfigLoader, FileAgentsConfig, FileConfig, InProcessMessageBus, JsonlMessageLogger,
    ProcessAgent, SwissCitationParser, TracingSink,
};
use tribunal_presentation::{
    Cli, ConsoleFormatter, OutputConfig, OutputFormatter, ProgressReporter, SimpleProgress,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines reach the file
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    info!("Starting tribunal");

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Configuration error: {}", e))?
    };
    for issue in config.check()? {
        warn!("{}", issue);
    }

    let output = OutputConfig::resolve(&cli, config.output.format, config.output.color);
    output.apply_color();
    let options = cli.apply_overrides(config.to_workflow_options());
    let query = cli.query().context("a question is required")?;
    let correlation_id = query.correlation_id();

    // === Dependency Injection ===
    let bus = Arc::new(InProcessMessageBus::new());
    let agents = build_agents(&config.agents)?;
    let parser: Arc<dyn CitationParser> = if cli.strict_citations {
        Arc::new(SwissCitationParser::strict())
    } else {
        Arc::new(SwissCitationParser::new())
    };

    // Sinks subscribe before the run starts so they see every message
    let sinks = attach_sinks(&cli, &config, &output, bus.as_ref(), correlation_id);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling run");
                cancel.cancel();
            }
        })
    };

    let use_case = SubmitQueryUseCase::new(agents, bus.clone(), parser, options)
        .with_cancellation(cancel);

    let result = use_case.execute(query).await;
    ctrl_c.abort();

    // The run closed its subscriptions; let the sinks drain
    join_sinks(sinks).await;
    bus.shutdown();

    let result = result.context("workflow aborted")?;
    println!("{}", ConsoleFormatter.render(&result, output.format));

    Ok(if result.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Initialize logging based on verbosity level
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("invalid log file path: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// One process agent per role, from `[agents]`
fn build_agents(config: &FileAgentsConfig) -> Result<AgentSet> {
    let build = |role: AgentRole| -> Result<Arc<dyn LegalAgent>> {
        let agent = config
            .command_for(role)
            .with_context(|| format!("no agent command configured for {}", role))?;
        let mut process = ProcessAgent::new(agent.command.clone()).with_args(agent.args.clone());
        for (key, value) in &agent.env {
            process = process.with_env(key.clone(), value.clone());
        }
        info!("{} agent: {} {:?}", role.display_name(), agent.command, agent.args);
        Ok(Arc::new(process))
    };

    Ok(AgentSet::new(
        build(AgentRole::Advocate)?,
        build(AgentRole::Adversary)?,
        build(AgentRole::Judicial)?,
    ))
}

fn attach_sinks(
    cli: &Cli,
    config: &FileConfig,
    output: &OutputConfig,
    bus: &dyn MessageBus,
    correlation_id: CorrelationId,
) -> Vec<JoinHandle<()>> {
    let mut sinks: Vec<Arc<dyn MessageSink>> = vec![Arc::new(TracingSink::new())];

    if output.show_progress {
        if std::io::stderr().is_terminal() {
            sinks.push(Arc::new(ProgressReporter::new()));
        } else {
            sinks.push(Arc::new(SimpleProgress));
        }
    }

    let journal_dir = cli
        .journal_dir
        .clone()
        .or_else(|| config.logging.resolved_journal_dir());
    if let Some(dir) = journal_dir
        && let Some(logger) = JsonlMessageLogger::for_run(&dir, &correlation_id)
    {
        info!("Message journal: {}", logger.path().display());
        sinks.push(Arc::new(logger));
    }

    sinks
        .into_iter()
        .map(|sink| attach_sink(bus, sink, correlation_id))
        .collect()
}
