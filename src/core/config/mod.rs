use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "helpdesk.toml";
pub const CONFIG_PATH_ENV: &str = "HELPDESK_CONFIG";
pub const ENV_PREFIX: &str = "HELPDESK_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Invalid(e.to_string())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub llm: LlmConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    #[default]
    Rest,
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Rest => write!(f, "rest"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Postgres connection string, used by the `postgres` backend.
    pub database_url: Option<String>,
    /// Base URL of the hosted table API, used by the `rest` backend.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: None,
            url: None,
            api_key: None,
            pool_size: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl AppConfig {
    /// Defaults, then the TOML file named by `HELPDESK_CONFIG` (or `helpdesk.toml`),
    /// then `HELPDESK_*` environment variables with `__` separating nested keys.
    pub fn figment() -> Figment {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::figment_from(path)
    }

    pub fn figment_from(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(), |key| std::env::var(key).ok())
    }

    /// Extracts and validates a configuration. `lookup` resolves the well-known
    /// provider variables (`OPENAI_API_KEY`, `DATABASE_URL`, `SUPABASE_URL`,
    /// `SUPABASE_KEY`) for values the figment left unset.
    pub fn from_figment(
        figment: &Figment,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: Self = figment.extract()?;
        config.apply_fallbacks(lookup);
        config.validate()?;
        Ok(config)
    }

    fn apply_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if is_blank(&self.llm.api_key) {
            self.llm.api_key = lookup("OPENAI_API_KEY");
        }
        if is_blank(&self.store.database_url) {
            self.store.database_url = lookup("DATABASE_URL");
        }
        if is_blank(&self.store.url) {
            self.store.url = lookup("SUPABASE_URL");
        }
        if is_blank(&self.store.api_key) {
            self.store.api_key = lookup("SUPABASE_KEY");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_blank(&self.llm.api_key) {
            return Err(ConfigError::Missing("llm.api_key"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Missing("llm.model"));
        }
        match self.store.backend {
            StoreBackend::Postgres if is_blank(&self.store.database_url) => {
                Err(ConfigError::Missing("store.database_url"))
            }
            StoreBackend::Rest if is_blank(&self.store.url) => {
                Err(ConfigError::Missing("store.url"))
            }
            StoreBackend::Rest if is_blank(&self.store.api_key) => {
                Err(ConfigError::Missing("store.api_key"))
            }
            _ => Ok(()),
        }
    }
}
