use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::migrate::DEFAULT_MAX_CONCURRENT;
use crate::providers::asana::DEFAULT_BASE_URL;
use crate::providers::jira::ApiVersion;
use crate::providers::DEFAULT_TIMEOUT_SECS;

/// Optional file layer. Every value can also come from a flag or env var.
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub asana: AsanaConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct AsanaConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    /// Tag gid that marks a task as already migrated
    pub migrated_label: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JiraConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// REST API version, 2 or 3
    pub api_version: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MigrationConfig {
    pub max_concurrent: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one run.
pub struct Settings {
    pub source_project_id: String,
    pub target_project_key: String,
    pub asana_url: String,
    pub asana_token: String,
    pub migrated_label: String,
    pub jira_url: String,
    pub jira_username: String,
    pub jira_password: String,
    pub jira_api_version: ApiVersion,
    pub max_concurrent: usize,
    pub timeout: Duration,
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".work-migrate")
        .join("config.toml")
}

/// Load the config file. A missing file is only an error when it was asked for explicitly.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let path = default_config_path();
            if !path.exists() {
                return Ok(AppConfig::default());
            }
            path
        }
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Merge flags and env vars over the config file. Flags win.
pub fn resolve(cli: Cli, file: AppConfig) -> Result<Settings> {
    let asana_token = require(
        cli.asana_token.or(file.asana.token),
        "Asana token",
        "--asana-token / ASANA_TOKEN / [asana].token",
    )?;
    let migrated_label = require(
        cli.migrated_label.or(file.asana.migrated_label),
        "migrated label gid",
        "--migrated-label / ASANA_LABEL_MIGRATED_GID / [asana].migrated_label",
    )?;
    let jira_url = require(
        cli.jira_url.or(file.jira.url),
        "Jira URL",
        "--jira-url / JIRA_URL / [jira].url",
    )?;
    let jira_username = require(
        cli.jira_username.or(file.jira.username),
        "Jira username",
        "--jira-username / JIRA_USERNAME / [jira].username",
    )?;
    let jira_password = require(
        cli.jira_password.or(file.jira.password),
        "Jira password",
        "--jira-password / JIRA_PASSWORD / [jira].password",
    )?;

    let max_concurrent = cli
        .max_concurrent
        .or(file.migration.max_concurrent)
        .unwrap_or(DEFAULT_MAX_CONCURRENT);
    if max_concurrent == 0 {
        bail!("max_concurrent must be at least 1");
    }

    let timeout_secs = cli
        .timeout
        .or(file.migration.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        bail!("timeout must be at least 1 second");
    }

    let jira_api_version = match cli.jira_api_version.or(file.jira.api_version) {
        None => ApiVersion::default(),
        Some(n) => match ApiVersion::from_number(n) {
            Some(version) => version,
            None => bail!("Unsupported Jira API version {n}: use 2 or 3"),
        },
    };

    Ok(Settings {
        source_project_id: cli.source_project_id,
        target_project_key: cli.target_project_key,
        asana_url: cli
            .asana_url
            .or(file.asana.url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        asana_token,
        migrated_label,
        jira_url,
        jira_username,
        jira_password,
        jira_api_version,
        max_concurrent,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn require(value: Option<String>, what: &str, sources: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("Missing {what}: set {sources}"),
    }
}
