use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub contact: ContactConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout_secs(),
            max_connections: default_max_connections(),
        }
    }
}

impl LookupConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

fn default_query_timeout_secs() -> u64 {
    10
}
fn default_max_connections() -> u32 {
    5
}

/// Where audit lines go. Without a path they are emitted on the
/// `forum_archive::audit` tracing target.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuditConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactConfig {
    #[serde(default = "default_contact_email")]
    pub email: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default = "default_contact_name")]
    pub name: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            email: default_contact_email(),
            cc: None,
            name: default_contact_name(),
        }
    }
}

fn default_contact_email() -> String {
    "forum-archive@localhost".to_string()
}
fn default_contact_name() -> String {
    "the archive maintainers".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.lookup.query_timeout_secs == 0 {
        anyhow::bail!("lookup.query_timeout_secs must be > 0");
    }
    if config.lookup.max_connections == 0 {
        anyhow::bail!("lookup.max_connections must be > 0");
    }
    if config.contact.email.trim().is_empty() {
        anyhow::bail!("contact.email must not be empty");
    }
    Ok(())
}
