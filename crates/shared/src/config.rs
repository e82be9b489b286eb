//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::MAX_PAGE_SIZE;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Demo runner configuration.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "tally=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// How persisted journals become visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Persist applies the whole journal atomically; commit is a no-op.
    #[default]
    Immediate,
    /// Persist only stages the journal; commit applies it, cancel discards it.
    Staged,
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Commit behaviour of the journal engine.
    #[serde(default)]
    pub commit_mode: CommitMode,
    /// Largest page size a listing will return.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_max_page_size() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            commit_mode: CommitMode::default(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Demo runner configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoConfig {
    /// JSON scenario to replay. The built-in scenario runs when unset.
    #[serde(default)]
    pub scenario_path: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `TALLY__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("TALLY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
