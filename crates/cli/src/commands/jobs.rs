use anyhow::{Context, Result};
use jenkinsctl_api::JenkinsClient;
use serde::Serialize;

use crate::output::OutputRenderer;

#[derive(Serialize)]
struct JobRow {
    name: String,
    status: String,
    url: String,
}

/// Translate the job color Jenkins reports into a readable status. Colors
/// ending in `_anime` mean a build is currently running.
fn color_to_status(color: Option<&str>) -> String {
    let Some(color) = color else {
        return "folder".to_string();
    };

    let (base, running) = match color.strip_suffix("_anime") {
        Some(base) => (base, true),
        None => (color, false),
    };

    let status = match base {
        "blue" => "success",
        "red" => "failed",
        "yellow" => "unstable",
        "aborted" => "aborted",
        "disabled" => "disabled",
        "notbuilt" => "not built",
        "grey" => "pending",
        other => other,
    };

    if running {
        format!("{status} (running)")
    } else {
        status.to_string()
    }
}

pub async fn list(client: &JenkinsClient, renderer: &OutputRenderer) -> Result<()> {
    let jobs = client.jobs().await.context("Failed to list jobs")?;

    if jobs.is_empty() {
        tracing::info!("No jobs found on this instance");
        return Ok(());
    }

    let rows: Vec<JobRow> = jobs
        .iter()
        .map(|job| JobRow {
            name: job.name.clone(),
            status: color_to_status(job.color.as_deref()),
            url: job.url.clone(),
        })
        .collect();

    tracing::debug!(count = rows.len(), "Listed jobs");

    renderer.render(&rows)
}
