//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ROUTELENS_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ROUTELENS_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database_url` if set
//! 4. **OPENAI_API_KEY** - Special case: overrides `router.api_key` if set
//!
//! The database URL and the router API key are both required: startup fails
//! with a configuration error when either is missing.
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ROUTELENS_ROUTER__ROUTER_ID=bert` sets the `router.router_id` field.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;
use crate::routing::DEFAULT_ROUTER_ID;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ROUTELENS_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// SQLite connection string for the call-record store. Required; there
    /// is no default.
    pub database_url: String,
    /// OpenAI API key override via the conventional OPENAI_API_KEY variable.
    /// Moved into `router.api_key` during loading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    /// Routing backend configuration
    pub router: RouterConfig,
}

/// RouteLLM routing backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Base URL of the OpenAI-compatible RouteLLM endpoint
    pub base_url: Url,
    /// API key for the routing endpoint. Required; there is no default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Which RouteLLM router to use, e.g. "mf" or "bert"
    pub router_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: String::new(),
            openai_api_key: None,
            router: RouterConfig::default(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:6060/v1/").unwrap(),
            api_key: None,
            router_id: DEFAULT_ROUTER_ID.to_string(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // OPENAI_API_KEY is conventionally set as a flat variable; fold it
        // into the nested router config.
        if let Some(key) = config.openai_api_key.take() {
            config.router.api_key = Some(key);
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.database_url.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database_url cannot be empty. \
                     Set DATABASE_URL or add database_url to the config file."
                    .to_string(),
            });
        }

        if self.router.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Internal {
                operation: "Config validation: router.api_key cannot be empty. \
                     Set OPENAI_API_KEY or add router.api_key to the config file."
                    .to_string(),
            });
        }

        if self.router.router_id.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: router.router_id cannot be empty (default: mf)".to_string(),
            });
        }

        if self.router.base_url.cannot_be_a_base() {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: router.base_url {} is not a usable HTTP base URL",
                    self.router.base_url
                ),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("ROUTELENS_").split("__"))
            // Common flat variables for the database and the OpenAI key
            .merge(Env::raw().only(&["DATABASE_URL", "OPENAI_API_KEY"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args_for(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn yaml_values_are_loaded() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
                port: 9000
                database_url: "sqlite://custom.db"
                router:
                  api_key: "sk-yaml"
                  router_id: "bert"
                "#,
            )?;

            let config = Config::load(&args_for("test.yaml")).expect("config should load");
            assert_eq!(config.port, 9000);
            assert_eq!(config.database_url, "sqlite://custom.db");
            assert_eq!(config.router.router_id, "bert");
            // Untouched fields keep their defaults.
            assert_eq!(config.host, "0.0.0.0");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                "port: 9000\ndatabase_url: \"sqlite://custom.db\"\nrouter:\n  api_key: \"sk-yaml\"",
            )?;
            jail.set_env("ROUTELENS_PORT", "9001");
            jail.set_env("ROUTELENS_ROUTER__ROUTER_ID", "causal");

            let config = Config::load(&args_for("test.yaml")).expect("config should load");
            assert_eq!(config.port, 9001);
            assert_eq!(config.router.router_id, "causal");
            Ok(())
        });
    }

    #[test]
    fn flat_openai_api_key_lands_in_router_config() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "")?;
            jail.set_env("OPENAI_API_KEY", "sk-test-123");
            jail.set_env("DATABASE_URL", "sqlite://from-env.db");

            let config = Config::load(&args_for("test.yaml")).expect("config should load");
            assert_eq!(config.router.api_key.as_deref(), Some("sk-test-123"));
            assert_eq!(config.database_url, "sqlite://from-env.db");
            Ok(())
        });
    }

    #[test]
    fn missing_database_url_and_api_key_fail_loading() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "")?;

            // Neither value has a default, so a bare environment cannot load.
            let err = Config::load(&args_for("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("database_url"), "got: {err}");

            jail.set_env("DATABASE_URL", "sqlite://from-env.db");
            let err = Config::load(&args_for("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("api_key"), "got: {err}");

            jail.set_env("OPENAI_API_KEY", "sk-test");
            assert!(Config::load(&args_for("test.yaml")).is_ok());
            Ok(())
        });
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let config = Config {
            database_url: "sqlite://routelens.db".to_string(),
            ..Config::default()
        };
        assert!(config.router.api_key.is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_database_url_fails_validation() {
        let mut config = Config::default();
        config.router.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_err());
    }
}
