use std::fmt;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::error::{MigrateError, Result};
use crate::providers::{SourceSystem, TargetSystem};

pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Step of the per-item pipeline. A failed item records the step it failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetched,
    CreatingTarget,
    AnnotatingTarget,
    AnnotatingSource,
    LabelingSource,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Fetched => "fetched",
            Stage::CreatingTarget => "creating_target",
            Stage::AnnotatingTarget => "annotating_target",
            Stage::AnnotatingSource => "annotating_source",
            Stage::LabelingSource => "labeling_source",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum ItemOutcome {
    /// Already carried the migration marker; nothing was written.
    Skipped,
    Done { issue_key: String },
    Failed { stage: Stage, error: MigrateError },
}

#[derive(Debug)]
pub struct ItemReport {
    pub item_id: String,
    pub outcome: ItemOutcome,
}

/// Per-item outcomes of one run, in completion order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ItemReport>,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped))
    }

    pub fn done(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Done { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &ItemReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, ItemOutcome::Failed { .. }))
    }

    #[cfg(test)]
    pub fn outcome_of(&self, item_id: &str) -> Option<&ItemOutcome> {
        self.reports
            .iter()
            .find(|r| r.item_id == item_id)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} migrated, {} already migrated, {} failed",
            self.done(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Drives items from the source into the target.
///
/// Items run concurrently on the caller's task, at most `max_concurrent` at a
/// time. Inside one item every step waits for the previous one, and the
/// migration marker is always the last write: an item that stops half-way has
/// no marker and is picked up again by the next run. A crash between creating
/// the target issue and labeling the source therefore yields a duplicate issue
/// on the rerun.
pub struct Migrator {
    source: Box<dyn SourceSystem>,
    target: Box<dyn TargetSystem>,
    max_concurrent: usize,
}

impl Migrator {
    pub fn new(source: Box<dyn SourceSystem>, target: Box<dyn TargetSystem>) -> Self {
        Self {
            source,
            target,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Migrate every incomplete item of `source_project_id`.
    ///
    /// Only a listing failure is returned as an error. Failures of single items
    /// are reported in the summary and never stop the other items.
    pub async fn migrate_project(
        &self,
        source_project_id: &str,
        target_project_key: &str,
        marker_label_id: &str,
    ) -> Result<RunSummary> {
        info!(
            source = self.source.name(),
            project = source_project_id,
            "Retrieving incomplete items"
        );
        let item_ids = self.source.list_incomplete(source_project_id).await?;
        info!(count = item_ids.len(), "Items to process");

        let reports = stream::iter(item_ids)
            .map(|item_id| async move {
                let outcome = self
                    .migrate_item(&item_id, target_project_key, marker_label_id)
                    .await;
                ItemReport { item_id, outcome }
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        Ok(RunSummary { reports })
    }

    async fn migrate_item(
        &self,
        item_id: &str,
        target_project_key: &str,
        marker_label_id: &str,
    ) -> ItemOutcome {
        match self
            .run_item(item_id, target_project_key, marker_label_id)
            .await
        {
            Ok(Some(issue_key)) => {
                info!(item_id, issue_key = %issue_key, "Done");
                ItemOutcome::Done { issue_key }
            }
            Ok(None) => {
                info!(item_id, "Already migrated, skipping");
                ItemOutcome::Skipped
            }
            Err((stage, error)) => {
                warn!(item_id, stage = %stage, kind = error.kind(), error = %error, "Migration failed");
                ItemOutcome::Failed { stage, error }
            }
        }
    }

    /// Returns the new issue key, or `None` when the item was already migrated.
    async fn run_item(
        &self,
        item_id: &str,
        target_project_key: &str,
        marker_label_id: &str,
    ) -> std::result::Result<Option<String>, (Stage, MigrateError)> {
        info!(item_id, "Fetching");
        let item = self
            .source
            .get_detail(item_id)
            .await
            .map_err(at(Stage::Fetched))?;

        if item.has_tag(marker_label_id) {
            return Ok(None);
        }

        info!(item_id, stage = %Stage::CreatingTarget, target = self.target.name(), "Creating issue");
        let issue_key = self
            .target
            .create_issue(target_project_key, &item.title, &item.description)
            .await
            .map_err(at(Stage::CreatingTarget))?;
        info!(item_id, issue_key = %issue_key, "Issue created");

        info!(item_id, stage = %Stage::AnnotatingTarget, issue_key = %issue_key, "Commenting on issue");
        self.target
            .annotate_with_source_link(&issue_key, &item.link)
            .await
            .map_err(at(Stage::AnnotatingTarget))?;

        info!(item_id, stage = %Stage::AnnotatingSource, "Commenting on source item");
        let body = source_comment_html(&self.target.issue_url(&issue_key), &issue_key);
        self.source
            .add_comment(item_id, &body)
            .await
            .map_err(at(Stage::AnnotatingSource))?;

        info!(item_id, stage = %Stage::LabelingSource, "Labeling source item");
        self.source
            .add_label(item_id, marker_label_id)
            .await
            .map_err(at(Stage::LabelingSource))?;

        Ok(Some(issue_key))
    }
}

fn at(stage: Stage) -> impl FnOnce(MigrateError) -> (Stage, MigrateError) {
    move |err| (stage, err)
}

/// Cross-reference comment left on the source item.
pub fn source_comment_html(issue_url: &str, issue_key: &str) -> String {
    format!(
        "<body>Migrated to Jira as <a href='{}'>{}</a></body>",
        escape_html(issue_url),
        escape_html(issue_key)
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests;
