use std::io::Write;

use anyhow::{Context, Result};
use jenkinsctl_api::JenkinsClient;
use serde::Serialize;

use crate::output::{OutputFormat, OutputRenderer};

#[derive(Serialize)]
struct LogsView {
    job: String,
    number: i64,
    text: String,
}

pub async fn execute(
    job: &str,
    number: i64,
    client: &JenkinsClient,
    renderer: &OutputRenderer,
) -> Result<()> {
    let text = client
        .console_text(job, number)
        .await
        .with_context(|| format!("Failed to fetch console output of {job} #{number}"))?;

    tracing::debug!(job, number, bytes = text.len(), "Fetched console output");

    // Table mode dumps the raw log; structured modes wrap it.
    if renderer.format() == OutputFormat::Table {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    } else {
        renderer.render(&LogsView {
            job: job.to_string(),
            number,
            text,
        })
    }
}
