use async_trait::async_trait;
use base64::Engine;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{join_url, TargetSystem};
use crate::error::{MigrateError, Result};
use crate::util::adf::text_to_adf;

pub const ISSUE_TYPE: &str = "Story";

/// Jira REST API flavour. Server and Data Center only speak v2; Cloud also
/// offers v3, which takes rich text as ADF documents instead of plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V2,
    V3,
}

impl ApiVersion {
    pub fn from_number(version: u8) -> Option<Self> {
        match version {
            2 => Some(ApiVersion::V2),
            3 => Some(ApiVersion::V3),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ApiVersion::V2 => "rest/api/2",
            ApiVersion::V3 => "rest/api/3",
        }
    }

    fn rich_text(self, text: &str) -> Value {
        match self {
            ApiVersion::V2 => Value::String(text.to_string()),
            ApiVersion::V3 => text_to_adf(text),
        }
    }
}

pub struct JiraTarget {
    base_url: String,
    auth_header: String,
    api_version: ApiVersion,
    client: reqwest::Client,
}

impl JiraTarget {
    pub fn new(client: reqwest::Client, base_url: String, username: String, password: String) -> Self {
        let creds = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
            api_version: ApiVersion::default(),
            client,
        }
    }

    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    fn api_url(&self, path: &str) -> String {
        join_url(&self.base_url, &format!("{}/{path}", self.api_version.prefix()))
    }

    async fn send(&self, req: RequestBuilder, action: &str) -> Result<Response> {
        let resp = req
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| MigrateError::Target(format!("{action} failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(MigrateError::Target(format!(
            "{action} failed with HTTP {status}: {}",
            body.trim()
        )))
    }
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

fn create_issue_body(
    version: ApiVersion,
    project_key: &str,
    summary: &str,
    description: &str,
) -> Value {
    json!({
        "fields": {
            "project": { "key": project_key },
            "summary": summary,
            "description": version.rich_text(description),
            "issuetype": { "name": ISSUE_TYPE },
        }
    })
}

fn provenance_comment_body(version: ApiVersion, source_link: &str) -> Value {
    json!({ "body": version.rich_text(&format!("Migrated from Asana: {source_link}")) })
}

#[async_trait]
impl TargetSystem for JiraTarget {
    fn name(&self) -> &str {
        "Jira"
    }

    async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: &str,
    ) -> Result<String> {
        let req = self
            .client
            .post(self.api_url("issue"))
            .json(&create_issue_body(
                self.api_version,
                project_key,
                summary,
                description,
            ));

        let resp = self.send(req, "Creating issue").await?;
        let created: CreatedIssue = resp
            .json()
            .await
            .map_err(|e| MigrateError::Target(format!("Failed to parse created issue: {e}")))?;
        Ok(created.key)
    }

    async fn annotate_with_source_link(&self, issue_key: &str, source_link: &str) -> Result<()> {
        let path = format!("issue/{}/comment", urlencoding::encode(issue_key));
        let req = self
            .client
            .post(self.api_url(&path))
            .json(&provenance_comment_body(self.api_version, source_link));

        self.send(req, "Commenting on issue").await?;
        Ok(())
    }

    fn issue_url(&self, issue_key: &str) -> String {
        format!("{}/browse/{issue_key}", self.base_url)
    }
}
