mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use jenkinsctl_api::error::JenkinsError;
use jenkinsctl_api::JenkinsClient;
use jenkinsctl_config::{Config, ServerConfig};
use tracing_subscriber::{fmt, EnvFilter};

use commands::config::ConfigCommand;
use commands::run::RunArgs;
use output::{OutputFormat, OutputRenderer};

#[derive(Parser, Debug)]
#[command(name = "jenkinsctl", version, about = "CLI for the Jenkins REST API", long_about = None)]
struct Cli {
    /// Project entry to use from the config file
    #[arg(short, long, env = "JENKINSCTL_PROJECT")]
    project: Option<String>,

    /// Path to config file (defaults to ~/.config/jenkinsctl/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: JenkinsCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum JenkinsCommand {
    /// List jobs on the instance
    Jobs,
    /// Trigger a parameterized build
    Run(RunArgs),
    /// Show the most recent build of a job
    LastBuild {
        /// Job name, nested as folder/name for folder jobs
        job: String,
    },
    /// List the recorded builds of a job
    Builds {
        /// Job name
        job: String,
    },
    /// Show one build in full, including parameters and causes
    Details {
        /// Job name
        job: String,
        /// Build number
        number: i64,
    },
    /// Print the console output of a build
    Logs {
        /// Job name
        job: String,
        /// Build number
        number: i64,
    },
    /// Resolve a queue item id to the build it became
    Queue {
        /// Job name
        job: String,
        /// Queue item id reported when the job was triggered
        queue_id: i64,
    },
    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let config_path = cli.config.clone();
    let config = Config::load(config_path.as_ref())?;
    let renderer = OutputRenderer::new(cli.output);

    let client = if matches!(cli.command, JenkinsCommand::Config(_)) {
        None
    } else {
        let server = resolve_server(&config, cli.project.as_deref())?;
        tracing::debug!(project = %server.project, url = %server.base_url(), "Using Jenkins server");
        Some(JenkinsClient::new(&server)?)
    };

    match cli.command {
        JenkinsCommand::Jobs => {
            let client = client
                .as_ref()
                .expect("client is available for server commands");
            commands::jobs::list(client, &renderer).await?
        }
        JenkinsCommand::Run(args) => {
            let client = client
                .as_ref()
                .expect("client is available for server commands");
            commands::run::execute(args, client, &renderer).await?
        }
        JenkinsCommand::LastBuild { job } => {
            let client = client
                .as_ref()
                .expect("client is available for server commands");
            commands::builds::last_build(&job, client, &renderer).await?
        }
        JenkinsCommand::Builds { job } => {
            let client = client
                .as_ref()
                .expect("client is available for server commands");
            commands::builds::list(&job, client, &renderer).await?
        }
        JenkinsCommand::Details { job, number } => {
            let client = client
                .as_ref()
                .expect("client is available for server commands");
            commands::builds::details(&job, number, client, &renderer).await?
        }
        JenkinsCommand::Logs { job, number } => {
            let client = client
                .as_ref()
                .expect("client is available for server commands");
            commands::logs::execute(&job, number, client, &renderer).await?
        }
        JenkinsCommand::Queue { job, queue_id } => {
            let client = client
                .as_ref()
                .expect("client is available for server commands");
            commands::builds::resolve_queue(&job, queue_id, client, &renderer).await?
        }
        JenkinsCommand::Config(command) => {
            commands::config::handle(command, config, config_path.as_deref(), &renderer)?
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,jenkinsctl=debug,jenkinsctl_api=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

/// Pick the server entry for this invocation and fill in the password.
/// Lookup order for the password: project-specific env var, generic env var,
/// then the config file value.
fn resolve_server(config: &Config, requested: Option<&str>) -> Result<ServerConfig> {
    let server = if let Some(name) = requested {
        config.server(name).ok_or_else(|| JenkinsError::MissingConfig {
            project: name.to_string(),
        })?
    } else {
        config.resolve_server(None).ok_or_else(|| {
            anyhow!("No Jenkins server configured. Run `jenkinsctl config add` first.")
        })?
    };

    let mut server = server.clone();
    if let Some(password) = resolve_password(&server.project) {
        server.password = Some(password);
    }

    if !server.user.is_empty() && server.password.is_none() {
        bail!(
            "No password or API token for project '{}'. Set {} or add `password:` to the config entry.",
            server.project,
            project_env_var(&server.project)
        );
    }

    Ok(server)
}

fn resolve_password(project: &str) -> Option<String> {
    std::env::var(project_env_var(project))
        .ok()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            std::env::var("JENKINSCTL_PASSWORD")
                .ok()
                .filter(|t| !t.trim().is_empty())
        })
}

fn project_env_var(project: &str) -> String {
    let suffix: String = project
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("JENKINSCTL_PASSWORD_{suffix}")
}
