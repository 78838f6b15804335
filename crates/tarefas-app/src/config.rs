use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_DIR: &str = ".tarefas";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding `connection.url`.
pub const ENV_URL: &str = "TAREFAS_URL";
/// Environment variable overriding `connection.api_key`.
pub const ENV_API_KEY: &str = "TAREFAS_API_KEY";
/// Key value shipped in sample configuration files.
pub const PLACEHOLDER_KEY: &str = "SUA_CHAVE_AQUI";

const MIN_KEY_LEN: usize = 10;

/// Top-level project configuration loaded from `.tarefas/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Service endpoint and key.
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl ProjectConfig {
    /// Load configuration from `dir`, then apply environment overrides.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let mut fetch = |key: &'static str| env::var(key).ok();
        Self::load_with_env(dir, &mut fetch)
    }

    /// Same as [`Self::load`] with an injectable environment lookup.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load_with_env(
        dir: impl AsRef<Path>,
        fetch: &mut impl FnMut(&'static str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::from_dir(dir)?;
        if let Some(url) = fetch(ENV_URL) {
            config.connection.url = Some(url);
        }
        if let Some(key) = fetch(ENV_API_KEY) {
            config.connection.api_key = Some(key);
        }
        Ok(config)
    }

    /// Load configuration from a known directory, ignoring the environment.
    ///
    /// A missing file yields the default (unconfigured) connection.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        Ok(config)
    }
}

/// `[connection]` block: where the hosted table service lives.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL of the service project.
    #[serde(default)]
    pub url: Option<String>,
    /// Anonymous API key.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ConnectionConfig {
    /// Report the first problem that prevents talking to the service.
    ///
    /// # Errors
    /// Returns the [`ConfigIssue`] describing what is missing or wrong.
    pub fn check(&self) -> Result<(), ConfigIssue> {
        let url = self.url.as_deref().map(str::trim).unwrap_or_default();
        if url.is_empty() {
            return Err(ConfigIssue::MissingUrl);
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigIssue::InvalidUrl(url.to_owned()));
        }

        let key = self.api_key.as_deref().map(str::trim);
        match key {
            None => Err(ConfigIssue::MissingKey),
            Some(key) if key.is_empty() || key == PLACEHOLDER_KEY || key.chars().count() <= MIN_KEY_LEN => {
                Err(ConfigIssue::PlaceholderKey)
            }
            Some(_) => Ok(()),
        }
    }

    /// Trimmed URL and key once [`Self::check`] passes.
    ///
    /// # Errors
    /// Returns the [`ConfigIssue`] reported by [`Self::check`].
    pub fn credentials(&self) -> Result<(&str, &str), ConfigIssue> {
        self.check()?;
        let url = self.url.as_deref().map(str::trim).unwrap_or_default();
        let key = self.api_key.as_deref().map(str::trim).unwrap_or_default();
        Ok((url, key))
    }
}

/// Why the connection cannot be used yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    /// No service URL configured.
    #[error("service URL is not configured")]
    MissingUrl,
    /// URL is not an http(s) address.
    #[error("service URL is not an http(s) address: {0}")]
    InvalidUrl(String),
    /// No API key configured.
    #[error("API key is not configured")]
    MissingKey,
    /// API key is empty, the sample placeholder, or too short to be real.
    #[error("API key looks like a placeholder")]
    PlaceholderKey,
}

impl ConfigIssue {
    /// Setup instructions shown instead of data while the issue persists.
    #[must_use]
    pub fn banner(&self) -> String {
        let headline = match self {
            Self::MissingUrl => "URL do serviço não configurada.".to_owned(),
            Self::InvalidUrl(url) => format!("URL do serviço inválida: {url}"),
            Self::MissingKey => "Chave de API não configurada.".to_owned(),
            Self::PlaceholderKey => "Chave de API não configurada corretamente.".to_owned(),
        };
        format!(
            "⚠ Configuração necessária\n{headline}\n\
             1. Abra o painel do seu projeto e copie a URL e a chave anônima (anon key).\n\
             2. Preencha [connection] url e api_key em {CONFIG_DIR}/{CONFIG_FILE}\n   \
             ou defina {ENV_URL} e {ENV_API_KEY}.\n\
             3. Execute o script SQL de criação das tabelas tasks e subtasks."
        )
    }
}
