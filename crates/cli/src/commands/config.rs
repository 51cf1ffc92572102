use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use jenkinsctl_config::{Config, ServerConfig, DEFAULT_TIMEOUT_SECS};
use serde::Serialize;

use crate::output::OutputRenderer;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Create an empty config file
    Init,
    /// List configured servers (passwords are not shown)
    Show,
    /// Add or replace a server entry
    Add(AddArgs),
    /// Remove a server entry
    Remove {
        /// Project name of the entry to remove
        project: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Project name the entry is looked up by
    pub project: String,

    /// Base URL of the Jenkins instance
    #[arg(long)]
    pub url: String,

    /// User to authenticate as; leave empty for anonymous access
    #[arg(long, default_value = "")]
    pub user: String,

    /// Password or API token (prefer the JENKINSCTL_PASSWORD env vars)
    #[arg(long)]
    pub password: Option<String>,

    /// Explicit port, when the URL does not carry one
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Extra path segment the instance is served under
    #[arg(long)]
    pub extra_path: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Make this entry the default project
    #[arg(long)]
    pub default: bool,
}

#[derive(Serialize)]
struct ServerRow {
    project: String,
    url: String,
    user: String,
    auth: String,
    timeout: u64,
    default: String,
}

pub fn handle(
    command: ConfigCommand,
    mut config: Config,
    path: Option<&Path>,
    renderer: &OutputRenderer,
) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            let file = config_file(path);
            if file.exists() {
                bail!("Config file already exists at {}", file.display());
            }
            Config::default().save(Some(&file))?;
            println!("✅ Created config file at {}", file.display());
            Ok(())
        }
        ConfigCommand::Show => show(&config, renderer),
        ConfigCommand::Add(args) => {
            let project = args.project.clone();
            apply_add(&mut config, args);
            config.save(path)?;
            println!("✅ Saved server entry for {project}");
            Ok(())
        }
        ConfigCommand::Remove { project } => {
            apply_remove(&mut config, &project)?;
            config.save(path)?;
            println!("✅ Removed server entry for {project}");
            Ok(())
        }
    }
}

fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

fn show(config: &Config, renderer: &OutputRenderer) -> Result<()> {
    if config.servers.is_empty() {
        println!("No servers configured. Add one with `jenkinsctl config add`.");
        return Ok(());
    }

    let rows: Vec<ServerRow> = config
        .servers
        .iter()
        .map(|s| ServerRow {
            project: s.project.clone(),
            url: s.base_url(),
            user: s.user.clone(),
            auth: if s.password.is_some() {
                "password".to_string()
            } else {
                "none".to_string()
            },
            timeout: s.timeout,
            default: if config.default_project.as_deref() == Some(s.project.as_str()) {
                "*".to_string()
            } else {
                String::new()
            },
        })
        .collect();

    renderer.render(&rows)
}

fn apply_add(config: &mut Config, args: AddArgs) {
    let make_default = args.default;
    let project = args.project.clone();

    config.add_server(ServerConfig {
        project: args.project,
        url: args.url,
        user: args.user,
        password: args.password,
        url_extra_path: args.extra_path,
        port: args.port,
        crumb: None,
        timeout: args.timeout,
    });

    if make_default {
        config.default_project = Some(project);
    }
}

fn apply_remove(config: &mut Config, project: &str) -> Result<()> {
    if !config.remove_server(project) {
        bail!("No server entry for project '{project}'");
    }
    if config.default_project.as_deref() == Some(project) {
        config.default_project = None;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_args(project: &str) -> AddArgs {
        AddArgs {
            project: project.to_string(),
            url: "https://jenkins.example.com".to_string(),
            user: "builder".to_string(),
            password: None,
            port: 0,
            extra_path: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            default: false,
        }
    }

    #[test]
    fn test_apply_add_inserts_entry() {
        let mut config = Config::default();
        apply_add(&mut config, add_args("payments"));

        let server = config.server("payments").unwrap();
        assert_eq!(server.url, "https://jenkins.example.com");
        assert_eq!(server.user, "builder");
        assert!(config.default_project.is_none());
    }

    #[test]
    fn test_apply_add_sets_default() {
        let mut config = Config::default();
        apply_add(
            &mut config,
            AddArgs {
                default: true,
                ..add_args("payments")
            },
        );

        assert_eq!(config.default_project.as_deref(), Some("payments"));
    }

    #[test]
    fn test_apply_remove_clears_default() {
        let mut config = Config::default();
        apply_add(
            &mut config,
            AddArgs {
                default: true,
                ..add_args("payments")
            },
        );

        apply_remove(&mut config, "payments").unwrap();
        assert!(config.servers.is_empty());
        assert!(config.default_project.is_none());
    }

    #[test]
    fn test_apply_remove_unknown_project() {
        let mut config = Config::default();
        let err = apply_remove(&mut config, "ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
