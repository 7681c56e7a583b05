//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Prefix of environment variable overrides (`TRIBUNAL_WORKFLOW__MAX_ATTEMPTS=5`)
pub const ENV_PREFIX: &str = "TRIBUNAL_";

const PROJECT_FILES: [&str; 2] = ["tribunal.toml", ".tribunal.toml"];

/// Where configuration is read from, lowest priority first
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub global: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub explicit: Option<PathBuf>,
    /// Environment prefix; `None` disables environment overrides
    pub env_prefix: Option<String>,
}

impl ConfigSources {
    /// The standard locations for the current process
    pub fn discover(explicit: Option<&Path>) -> Self {
        Self {
            global: ConfigLoader::global_config_path().filter(|p| p.exists()),
            project: ConfigLoader::project_config_path(),
            explicit: explicit.map(Path::to_path_buf),
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables `TRIBUNAL_<SECTION>__<KEY>`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./tribunal.toml` or `./.tribunal.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/tribunal/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::load_from(&ConfigSources::discover(config_path))
    }

    /// Load configuration from explicit sources
    pub fn load_from(sources: &ConfigSources) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = &sources.global {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = &sources.project {
            figment = figment.merge(Toml::file(path));
        }
        // An explicit file must exist
        if let Some(path) = &sources.explicit {
            figment = figment.merge(Toml::file_exact(path));
        }
        if let Some(prefix) = &sources.env_prefix {
            figment = figment.merge(Env::prefixed(prefix).split("__"));
        }

        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/tribunal/config.toml if set,
    /// otherwise falls back to ~/.config/tribunal/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tribunal").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(explicit: Option<&Path>) {
        println!("Configuration sources (in priority order):");

        println!("  [ENV  ] Environment: {}<SECTION>__<KEY>", ENV_PREFIX);

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISS " };
            println!("  [{}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./tribunal.toml or ./.tribunal.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribunal_domain::OutputFormat;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.workflow.max_attempts, 3);
        assert!(config.agents.default.is_none());
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("tribunal"));
    }

    #[test]
    fn test_later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(
            dir.path(),
            "global.toml",
            r#"
[workflow]
max_attempts = 5
deadline_seconds = 900

[agents.default]
command = "global-agent"
"#,
        );
        let project = write(
            dir.path(),
            "project.toml",
            r#"
[workflow]
max_attempts = 2

[output]
format = "json"
"#,
        );

        let config = ConfigLoader::load_from(&ConfigSources {
            global: Some(global),
            project: Some(project),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.workflow.max_attempts, 2);
        assert_eq!(config.workflow.deadline_seconds, 900);
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(
            config.agents.default.as_ref().map(|a| a.command.as_str()),
            Some("global-agent")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_from(&ConfigSources {
            explicit: Some(dir.path().join("absent.toml")),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write(dir.path(), "bad.toml", "[workflow]\nmax_attempts = \"many\"\n");
        let result = ConfigLoader::load_from(&ConfigSources {
            explicit: Some(explicit),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_environment_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write(dir.path(), "explicit.toml", "[workflow]\nmax_attempts = 2\n");

        // Unique prefix so parallel tests cannot interfere
        let prefix = "TRIBUNAL_LOADER_TEST_";
        unsafe {
            std::env::set_var("TRIBUNAL_LOADER_TEST_WORKFLOW__MAX_ATTEMPTS", "7");
            std::env::set_var("TRIBUNAL_LOADER_TEST_OUTPUT__COLOR", "false");
        }

        let config = ConfigLoader::load_from(&ConfigSources {
            explicit: Some(explicit),
            env_prefix: Some(prefix.to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.workflow.max_attempts, 7);
        assert!(!config.output.color);
    }
}
