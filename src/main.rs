mod cli;
mod config;
mod error;
mod migrate;
mod model;
mod providers;
mod util;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use migrate::Migrator;
use providers::asana::AsanaSource;
use providers::jira::JiraTarget;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Load config
    let file = config::load_config(cli.config.as_deref())?;
    let settings = config::resolve(cli, file)?;

    // One HTTP session shared by both adapters
    let client = providers::http_client(settings.timeout).context("Failed to build HTTP client")?;

    let source = AsanaSource::new(
        client.clone(),
        settings.asana_url.clone(),
        settings.asana_token.clone(),
    );
    let target = JiraTarget::new(
        client,
        settings.jira_url.clone(),
        settings.jira_username.clone(),
        settings.jira_password.clone(),
    )
    .with_api_version(settings.jira_api_version);
    let migrator = Migrator::new(Box::new(source), Box::new(target))
        .with_max_concurrent(settings.max_concurrent);

    let run = migrator.migrate_project(
        &settings.source_project_id,
        &settings.target_project_key,
        &settings.migrated_label,
    );

    let summary = tokio::select! {
        result = run => result.context("Failed to list Asana tasks")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; tasks without the migrated label will be picked up by the next run");
            bail!("Migration interrupted");
        }
    };

    for report in summary.failed_items() {
        if let migrate::ItemOutcome::Failed { stage, error } = &report.outcome {
            warn!(item_id = %report.item_id, stage = %stage, error = %error, "Needs rerun");
        }
    }
    info!(
        done = summary.done(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "Migration finished: {summary}"
    );

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
