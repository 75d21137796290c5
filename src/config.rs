//! Database configuration.
//!
//! [`DatabaseConfig`] is loaded from `config/config.toml` or environment
//! variables using `DatabaseConfig::load()`:
//!
//! ```toml
//! [database]
//! url = "sqlite://data/blog.db"
//! log_queries = true
//! default_limit = 500
//! ```
//!
//! or `DRIFTWOOD__DATABASE__URL=sqlite::memory:`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "DRIFTWOOD";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Log every statement at `info` instead of `debug`
    #[serde(default)]
    pub log_queries: bool,
    /// Row cap for repository `find` calls without `take`
    #[serde(default)]
    pub default_limit: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            log_queries: false,
            default_limit: None,
        }
    }
}

fn default_db_url() -> String {
    "sqlite::memory:".to_string()
}

impl DatabaseConfig {
    /// Load the database configuration from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = match Self::builder(true).build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // A file that exists but does not parse is reported, then ignored
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("Failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Self::builder(false).build().map_err(|env_err| {
                    ConfigError::Message(format!(
                        "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                    ))
                })?
            }
        };

        Self::from_settings(&settings)
    }

    /// Deserialize the `database` table of an already built configuration
    ///
    /// A missing table yields the defaults.
    pub fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<DatabaseConfig>("database") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Database configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }

    fn builder(with_file: bool) -> config::ConfigBuilder<config::builder::DefaultState> {
        let mut builder = Config::builder();
        if with_file {
            builder = builder.add_source(File::with_name(CONFIG_FILE).required(false));
        }
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_when_section_missing() {
        let settings = Config::builder().build().unwrap();
        let config = DatabaseConfig::from_settings(&settings).unwrap();

        assert_eq!(config, DatabaseConfig::default());
        assert_eq!(config.url, "sqlite::memory:");
    }

    #[test]
    fn test_reads_database_table() {
        let settings = Config::builder()
            .add_source(File::from_str(
                "[database]\nurl = \"sqlite://blog.db\"\nlog_queries = true\ndefault_limit = 50\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config = DatabaseConfig::from_settings(&settings).unwrap();

        assert_eq!(config.url, "sqlite://blog.db");
        assert!(config.log_queries);
        assert_eq!(config.default_limit, Some(50));
    }

    #[test]
    fn test_partial_table_uses_field_defaults() {
        let settings = Config::builder()
            .add_source(File::from_str("[database]\nlog_queries = true\n", FileFormat::Toml))
            .build()
            .unwrap();
        let config = DatabaseConfig::from_settings(&settings).unwrap();

        assert_eq!(config.url, "sqlite::memory:");
        assert_eq!(config.default_limit, None);
    }
}
