use anyhow::{bail, Context, Result};
use clap::Args;
use jenkinsctl_api::JenkinsClient;
use serde::Serialize;

use crate::output::{OutputFormat, OutputRenderer};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Job to trigger, nested as folder/name for folder jobs
    pub job: String,

    /// Build parameter as KEY=VALUE, repeatable
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

#[derive(Serialize)]
struct Triggered {
    job: String,
    queue_id: Option<i64>,
    location: Option<String>,
}

fn parse_param(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Invalid parameter '{raw}', expected KEY=VALUE");
    };
    if key.is_empty() {
        bail!("Invalid parameter '{raw}', the key is empty");
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn execute(args: RunArgs, client: &JenkinsClient, renderer: &OutputRenderer) -> Result<()> {
    let params = args
        .params
        .iter()
        .map(|p| parse_param(p))
        .collect::<Result<Vec<_>>>()?;

    let trigger = client
        .run_job(&args.job, &params)
        .await
        .with_context(|| format!("Failed to trigger job {}", args.job))?;
    let queue_id = trigger.queue_id();

    tracing::info!(job = %args.job, ?queue_id, "Build triggered");

    if renderer.format() == OutputFormat::Table {
        match queue_id {
            Some(id) => println!("✅ Build queued for {} (queue item {id})", args.job),
            None => println!("✅ Build queued for {}", args.job),
        }
        Ok(())
    } else {
        renderer.render(&Triggered {
            job: args.job,
            queue_id,
            location: trigger.location,
        })
    }
}
