//! Agent command configuration from TOML (`[agents]` section)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tribunal_domain::{AgentRole, ConfigIssue, ConfigIssueCode};

/// Command line of one agent process
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileAgentCommand {
    /// Executable to run
    pub command: String,
    /// Arguments passed to the executable
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

/// Raw agents configuration from TOML
///
/// A role without its own table falls back to `[agents.default]`.
///
/// # Example
///
/// ```toml
/// [agents.default]
/// command = "tribunal-agent"
///
/// [agents.judicial]
/// command = "tribunal-agent"
/// args = ["--careful"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileAgentsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FileAgentCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advocate: Option<FileAgentCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adversary: Option<FileAgentCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judicial: Option<FileAgentCommand>,
}

impl FileAgentsConfig {
    /// The command configured for `role`, falling back to `[agents.default]`
    pub fn command_for(&self, role: AgentRole) -> Option<&FileAgentCommand> {
        let own = match role {
            AgentRole::Advocate => self.advocate.as_ref(),
            AgentRole::Adversary => self.adversary.as_ref(),
            AgentRole::Judicial => self.judicial.as_ref(),
        };
        own.or(self.default.as_ref())
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for role in [AgentRole::Advocate, AgentRole::Adversary, AgentRole::Judicial] {
            match self.command_for(role) {
                None => issues.push(ConfigIssue::error(
                    ConfigIssueCode::MissingAgentCommand,
                    format!(
                        "agents.{}: no command configured (and no [agents.default])",
                        role
                    ),
                )),
                Some(agent) if agent.command.trim().is_empty() => {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::MissingAgentCommand,
                        format!("agents.{}: command cannot be empty", role),
                    ))
                }
                Some(_) => {}
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_for_falls_back_to_default() {
        let config: FileAgentsConfig = toml::from_str(
            r#"
[default]
command = "tribunal-agent"

[judicial]
command = "judge-agent"
args = ["--careful"]
"#,
        )
        .unwrap();

        assert_eq!(
            config.command_for(AgentRole::Advocate).unwrap().command,
            "tribunal-agent"
        );
        let judicial = config.command_for(AgentRole::Judicial).unwrap();
        assert_eq!(judicial.command, "judge-agent");
        assert_eq!(judicial.args, vec!["--careful"]);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_missing_commands_are_reported_per_role() {
        let config: FileAgentsConfig = toml::from_str(
            r#"
[advocate]
command = "advocate-agent"

[adversary]
command = "  "
"#,
        )
        .unwrap();

        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.code == ConfigIssueCode::MissingAgentCommand));
        assert!(issues[0].message.contains("adversary"));
        assert!(issues[1].message.contains("judicial"));
    }
}
