use std::path::PathBuf;

use clap::Parser;

/// Migrate open Asana tasks into Jira Stories.
///
/// Each migrated task gets a comment linking the new issue and the migrated
/// label, so running again only picks up what is left.
#[derive(Debug, Parser)]
#[command(name = "work-migrate", version, about, long_about = None)]
pub struct Cli {
    /// Asana project gid to migrate from
    pub source_project_id: String,

    /// Jira project key to create issues in
    pub target_project_key: String,

    /// Asana personal access token
    #[arg(long, env = "ASANA_TOKEN", hide_env_values = true)]
    pub asana_token: Option<String>,

    /// Asana API base URL [default: https://app.asana.com/api/1.0/]
    #[arg(long, env = "ASANA_URL")]
    pub asana_url: Option<String>,

    /// Gid of the Asana tag marking a task as migrated
    #[arg(long, env = "ASANA_LABEL_MIGRATED_GID")]
    pub migrated_label: Option<String>,

    /// Jira server URL
    #[arg(long, env = "JIRA_URL")]
    pub jira_url: Option<String>,

    #[arg(long, env = "JIRA_USERNAME")]
    pub jira_username: Option<String>,

    #[arg(long, env = "JIRA_PASSWORD", hide_env_values = true)]
    pub jira_password: Option<String>,

    /// Jira REST API version: 2 (Server, Data Center, Cloud) or 3 (Cloud) [default: 2]
    #[arg(long, env = "JIRA_API_VERSION", value_name = "VERSION")]
    pub jira_api_version: Option<u8>,

    /// Maximum number of tasks migrated at the same time
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Per-request timeout in seconds [default: 300]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Config file [default: ~/.work-migrate/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}
