//! Process-backed legal agent.
//!
//! Each invocation spawns the configured command, writes one JSON request
//! to its stdin and reads one JSON response from its stdout:
//!
//! ```text
//! stdin : {"role":"advocate","context":{"kind":"research","query":{...}}}
//! stdout: {"position":"...","citations":["Art. 20 OR"],"confidence":0.8}
//! ```
//!
//! The role is also exported as `TRIBUNAL_ROLE` so simple scripts can branch
//! on it without parsing the request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tribunal_application::{AgentContext, AgentError, LegalAgent};
use tribunal_domain::{AgentReport, AgentRole, DomainError};

/// Errors raised while talking to an agent process
#[derive(Error, Debug)]
pub enum ProcessAgentError {
    #[error("Failed to spawn agent process '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode agent request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error while talking to agent process: {0}")]
    Io(#[from] std::io::Error),

    #[error("Agent process exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("Failed to parse agent response: {error}\nRaw response: {raw}")]
    Parse { error: String, raw: String },

    #[error("Agent response violates report invariants: {0}")]
    Report(#[from] DomainError),
}

impl From<ProcessAgentError> for AgentError {
    fn from(err: ProcessAgentError) -> Self {
        match err {
            ProcessAgentError::Spawn { .. } => AgentError::Unavailable(err.to_string()),
            ProcessAgentError::Encode(_)
            | ProcessAgentError::Io(_)
            | ProcessAgentError::Exit { .. } => {
                AgentError::InvocationFailed(err.to_string())
            }
            ProcessAgentError::Parse { .. } | ProcessAgentError::Report(_) => {
                AgentError::MalformedOutput(err.to_string())
            }
        }
    }
}

/// Request written to the agent's stdin
#[derive(Debug, Serialize)]
pub struct AgentRequest<'a> {
    pub role: AgentRole,
    pub context: &'a AgentContext,
}

/// Response expected on the agent's stdout
#[derive(Debug, Clone, Deserialize)]
pub struct AgentResponse {
    pub position: String,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Runs an external command as a legal agent
#[derive(Debug, Clone)]
pub struct ProcessAgent {
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

impl ProcessAgent {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self, role: AgentRole) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .env("TRIBUNAL_ROLE", role.as_str())
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        // Linux: the kernel sends SIGTERM to the agent if we die without
        // running drop glue (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        cmd
    }

    async fn run(
        &self,
        role: AgentRole,
        context: &AgentContext,
    ) -> Result<AgentReport, ProcessAgentError> {
        let request = serde_json::to_vec(&AgentRequest { role, context })?;

        debug!("Spawning {} agent: {} {:?}", role, self.command, self.args);
        let mut child = self
            .build_command(role)
            .spawn()
            .map_err(|source| ProcessAgentError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = async {
                stdin.write_all(&request).await?;
                stdin.write_all(b"\n").await?;
                stdin.shutdown().await
            }
            .await;
            match written {
                Ok(()) => {}
                // The agent may legitimately exit without reading its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("{} agent closed stdin early", role);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ProcessAgentError::Exit {
                status: output.status.to_string(),
                stderr,
            });
        }

        let response: AgentResponse =
            serde_json::from_str(stdout.trim()).map_err(|e| ProcessAgentError::Parse {
                error: e.to_string(),
                raw: stdout.trim().to_string(),
            })?;

        let mut report = AgentReport::new(
            role,
            context.query().correlation_id(),
            response.position,
            response.citations,
        )?;
        if let Some(confidence) = response.confidence {
            report = report.with_confidence(confidence);
        }
        Ok(report)
    }
}

#[async_trait]
impl LegalAgent for ProcessAgent {
    async fn invoke(
        &self,
        role: AgentRole,
        context: AgentContext,
        cancel: CancellationToken,
    ) -> Result<AgentReport, AgentError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                // Dropping the run future drops the child, which kills it
                debug!("{} agent cancelled", role);
                Err(AgentError::Cancelled)
            }
            result = self.run(role, &context) => result.map_err(|e| {
                warn!("{} agent failed: {}", role, e);
                AgentError::from(e)
            }),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tribunal_domain::UserQueryPackage;

    fn sh(script: &str) -> ProcessAgent {
        ProcessAgent::new("sh").with_args(["-c", script])
    }

    fn research() -> AgentContext {
        AgentContext::research(UserQueryPackage::new(
            "Ist der Vertrag nach Art. 20 OR nichtig?",
            "DE",
        ))
    }

    #[tokio::test]
    async fn test_parses_response() {
        let agent = sh(
            r#"cat > /dev/null; printf '{"position":"void","citations":["Art. 20 OR"],"confidence":0.8}'"#,
        );
        let context = research();
        let report = agent
            .invoke(AgentRole::Advocate, context.clone(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.role(), AgentRole::Advocate);
        assert_eq!(report.position(), "void");
        assert_eq!(report.citations(), ["Art. 20 OR"]);
        assert_eq!(report.confidence().value(), 0.8);
        assert_eq!(report.correlation_id(), context.query().correlation_id());
    }

    #[tokio::test]
    async fn test_exports_role_and_sends_request() {
        let agent = sh(
            r#"if grep -q '"role":"adversary"'; then printf '{"position":"%s"}' "$TRIBUNAL_ROLE"; else exit 3; fi"#,
        );
        let report = agent
            .invoke(AgentRole::Adversary, research(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.position(), "adversary");
        assert!(report.citations().is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_invocation_failure() {
        let agent = sh("cat > /dev/null; echo boom >&2; exit 4");
        let err = agent
            .invoke(AgentRole::Advocate, research(), CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            AgentError::InvocationFailed(msg) => assert!(msg.contains("boom"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_output_is_malformed() {
        let agent = sh("cat > /dev/null; echo 'not json'");
        let err = agent
            .invoke(AgentRole::Judicial, research(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_empty_citation_is_malformed() {
        let agent = sh(r#"cat > /dev/null; printf '{"position":"p","citations":[""]}'"#);
        let err = agent
            .invoke(AgentRole::Advocate, research(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        let agent = ProcessAgent::new("/nonexistent/tribunal-agent");
        let err = agent
            .invoke(AgentRole::Advocate, research(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_process() {
        let agent = sh("sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = agent
            .invoke(AgentRole::Advocate, research(), cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
