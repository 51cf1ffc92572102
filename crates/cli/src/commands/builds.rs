use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jenkinsctl_api::types::Build;
use jenkinsctl_api::JenkinsClient;
use serde::Serialize;

use crate::output::{OutputFormat, OutputRenderer};

// ============================================================================
// Output Structs
// ============================================================================

#[derive(Serialize)]
struct BuildRow {
    number: i64,
    result: String,
    started: String,
    queue_id: i64,
}

#[derive(Serialize)]
struct BuildView {
    job: String,
    number: i64,
    name: String,
    status: String,
    started: String,
    duration: String,
    queue_id: i64,
    url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    culprits: Vec<String>,
}

#[derive(Serialize)]
struct ResolvedQueue {
    job: String,
    queue_id: i64,
    build_number: Option<i64>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn build_status(result: Option<&str>, building: bool) -> String {
    if building {
        "RUNNING".to_string()
    } else {
        result.unwrap_or("PENDING").to_string()
    }
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default()
}

fn format_duration(ms: i64) -> String {
    if ms <= 0 {
        return String::new();
    }
    let secs = ms / 1000;
    let mins = secs / 60;
    let hours = mins / 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins % 60, secs % 60)
    } else {
        format!("{:02}:{:02}", mins, secs % 60)
    }
}

fn parameter_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn build_view(job: &str, build: &Build, include_details: bool) -> BuildView {
    let (parameters, causes, culprits) = if include_details {
        (
            build
                .parameters()
                .map(|p| format!("{}={}", p.name, parameter_display(&p.value)))
                .collect(),
            build
                .causes()
                .filter_map(|c| c.short_description.clone())
                .collect(),
            build
                .culprits
                .iter()
                .filter_map(|c| c.full_name.clone())
                .collect(),
        )
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    BuildView {
        job: job.to_string(),
        number: build.number,
        name: build
            .full_display_name
            .clone()
            .or_else(|| build.display_name.clone())
            .unwrap_or_else(|| format!("#{}", build.number)),
        status: build_status(build.result.as_deref(), build.building),
        started: format_timestamp(build.timestamp_utc()),
        duration: format_duration(build.duration),
        queue_id: build.queue_id,
        url: build.url.clone().unwrap_or_default(),
        parameters,
        causes,
        culprits,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

pub async fn last_build(job: &str, client: &JenkinsClient, renderer: &OutputRenderer) -> Result<()> {
    let build = client
        .last_build(job)
        .await
        .with_context(|| format!("Failed to fetch the last build of {job}"))?;

    tracing::debug!(job, number = build.number, "Fetched last build");

    renderer.render(&build_view(job, &build, false))
}

pub async fn list(job: &str, client: &JenkinsClient, renderer: &OutputRenderer) -> Result<()> {
    let builds = client
        .builds(job)
        .await
        .with_context(|| format!("Failed to list builds of {job}"))?;

    if builds.is_empty() {
        tracing::info!(job, "No builds recorded for job");
        return Ok(());
    }

    let rows: Vec<BuildRow> = builds
        .iter()
        .map(|b| BuildRow {
            number: b.number,
            result: b.result.clone().unwrap_or_else(|| "RUNNING".to_string()),
            started: format_timestamp(b.timestamp_utc()),
            queue_id: b.queue_id,
        })
        .collect();

    tracing::debug!(job, count = rows.len(), "Listed builds");

    renderer.render(&rows)
}

pub async fn details(
    job: &str,
    number: i64,
    client: &JenkinsClient,
    renderer: &OutputRenderer,
) -> Result<()> {
    let build = client
        .build_details(job, number)
        .await
        .with_context(|| format!("Failed to fetch build #{number} of {job}"))?;

    renderer.render(&build_view(job, &build, true))
}

pub async fn resolve_queue(
    job: &str,
    queue_id: i64,
    client: &JenkinsClient,
    renderer: &OutputRenderer,
) -> Result<()> {
    let number = client
        .build_number_for_queue_id(job, queue_id)
        .await
        .with_context(|| format!("Failed to resolve queue item {queue_id} for {job}"))?;

    if renderer.format() == OutputFormat::Table {
        match number {
            Some(number) => println!("Queue item {queue_id} became build #{number} of {job}"),
            None => println!("Queue item {queue_id} has not become a build of {job} yet"),
        }
        Ok(())
    } else {
        renderer.render(&ResolvedQueue {
            job: job.to_string(),
            queue_id,
            build_number: number,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
