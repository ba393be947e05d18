pub mod asana;
pub mod jira;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{MigrateError, Result};
use crate::model::work_item::WorkItem;

/// The system items are migrated from.
#[async_trait]
pub trait SourceSystem: Send + Sync {
    fn name(&self) -> &str;
    /// Ids of the project's items that are not completed as of now.
    async fn list_incomplete(&self, project_id: &str) -> Result<Vec<String>>;
    async fn get_detail(&self, item_id: &str) -> Result<WorkItem>;
    /// Append a normal, unpinned comment.
    async fn add_comment(&self, item_id: &str, html_body: &str) -> Result<()>;
    /// Attach a label. Attaching one that is already present is a no-op server-side.
    async fn add_label(&self, item_id: &str, label_id: &str) -> Result<()>;
}

/// The system items are migrated to.
#[async_trait]
pub trait TargetSystem: Send + Sync {
    fn name(&self) -> &str;
    /// Create a Story and return its key.
    async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: &str,
    ) -> Result<String>;
    async fn annotate_with_source_link(&self, issue_key: &str, source_link: &str) -> Result<()>;
    fn issue_url(&self, issue_key: &str) -> String;
}

/// Total per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// The HTTP session shared by both adapters. A request that exceeds `timeout`
/// fails instead of stalling its item forever.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("work-migrate/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

/// Map a non-success HTTP status to the source error taxonomy.
pub fn classify_status(
    system: &'static str,
    status: StatusCode,
    item_id: Option<&str>,
    body: &str,
) -> MigrateError {
    let message = format!("HTTP {status}: {}", body.trim());
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return MigrateError::Auth { system, message };
    }
    match (status == StatusCode::NOT_FOUND, item_id) {
        (true, Some(id)) => MigrateError::NotFound {
            system,
            id: id.to_string(),
        },
        _ => MigrateError::Transport { system, message },
    }
}

/// Join a path onto an API base URL regardless of trailing slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
