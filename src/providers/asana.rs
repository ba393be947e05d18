use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{classify_status, join_url, SourceSystem};
use crate::error::{MigrateError, Result};
use crate::model::work_item::WorkItem;

pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0/";

const SYSTEM: &str = "Asana";
const DETAIL_FIELDS: &str = "name,notes,permalink_url,tags";

pub struct AsanaSource {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl AsanaSource {
    /// `client` is the shared HTTP session; clones of it share one connection pool.
    pub fn new(client: reqwest::Client, base_url: String, token: String) -> Self {
        Self {
            base_url,
            auth_header: format!("Bearer {token}"),
            client,
        }
    }

    fn task_url(&self, task_id: &str, suffix: &str) -> String {
        let path = format!("tasks/{}{suffix}", urlencoding::encode(task_id));
        join_url(&self.base_url, &path)
    }

    async fn send(&self, req: RequestBuilder, item_id: Option<&str>) -> Result<Response> {
        let resp = req
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| MigrateError::transport(SYSTEM, e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(SYSTEM, status, item_id, &body))
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    resp.json::<T>()
        .await
        .map_err(|e| MigrateError::transport(SYSTEM, format!("unexpected response body: {e}")))
}

/// Asana wraps every payload in `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Compact {
    gid: String,
}

#[derive(Deserialize)]
struct Task {
    gid: String,
    name: String,
    #[serde(default)]
    notes: Option<String>,
    permalink_url: String,
    #[serde(default)]
    tags: Vec<Compact>,
}

impl From<Task> for WorkItem {
    fn from(task: Task) -> Self {
        WorkItem {
            id: task.gid,
            title: task.name,
            description: task.notes.unwrap_or_default(),
            link: task.permalink_url,
            tags: task.tags.into_iter().map(|t| t.gid).collect(),
        }
    }
}

#[async_trait]
impl SourceSystem for AsanaSource {
    fn name(&self) -> &str {
        SYSTEM
    }

    async fn list_incomplete(&self, project_id: &str) -> Result<Vec<String>> {
        // completed_since=now returns only tasks still open at call time
        let now = chrono::Utc::now().to_rfc3339();
        let req = self
            .client
            .get(join_url(&self.base_url, "tasks"))
            .query(&[("project", project_id), ("completed_since", now.as_str())]);

        let resp = self.send(req, None).await?;
        let listing: Envelope<Vec<Compact>> = decode(resp).await?;
        Ok(listing.data.into_iter().map(|t| t.gid).collect())
    }

    async fn get_detail(&self, item_id: &str) -> Result<WorkItem> {
        let req = self
            .client
            .get(self.task_url(item_id, ""))
            .query(&[("opt_fields", DETAIL_FIELDS)]);

        let resp = self.send(req, Some(item_id)).await?;
        let task: Envelope<Task> = decode(resp).await?;
        Ok(task.data.into())
    }

    async fn add_comment(&self, item_id: &str, html_body: &str) -> Result<()> {
        let body = serde_json::json!({
            "data": { "html_text": html_body, "is_pinned": false }
        });
        let req = self
            .client
            .post(self.task_url(item_id, "/stories"))
            .json(&body);

        self.send(req, Some(item_id)).await?;
        Ok(())
    }

    async fn add_label(&self, item_id: &str, label_id: &str) -> Result<()> {
        let body = serde_json::json!({ "data": { "tag": label_id } });
        let req = self
            .client
            .post(self.task_url(item_id, "/addTag"))
            .json(&body);

        self.send(req, Some(item_id)).await?;
        Ok(())
    }
}
