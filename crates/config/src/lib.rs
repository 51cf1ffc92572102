use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Request timeout applied when a server entry does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Represents the full jenkinsctl configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default_project: Option<String>,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

impl Config {
    /// Load the configuration from `path`, or from the default location.
    /// A missing file loads as an empty configuration.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if !path.exists() {
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Malformed config file {}", path.display()))
    }

    /// Write the configuration to disk, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: Option<P>) -> Result<()> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let serialized = serde_yaml::to_string(self)?;
        fs::write(&path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Convenience helper to retrieve a server entry by exact project name.
    pub fn server(&self, project: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.project == project)
    }

    /// Returns the requested server, or falls back to the default project,
    /// or to the only configured entry.
    pub fn resolve_server(&self, requested: Option<&str>) -> Option<&ServerConfig> {
        if let Some(name) = requested {
            self.server(name)
        } else if let Some(default_name) = self.default_project.as_deref() {
            self.server(default_name)
        } else {
            self.servers.first()
        }
    }

    /// Insert a server entry, replacing any existing entry for the same project.
    pub fn add_server(&mut self, server: ServerConfig) {
        self.servers.retain(|s| s.project != server.project);
        self.servers.push(server);
    }

    /// Remove the entry for a project. Returns whether anything was removed.
    pub fn remove_server(&mut self, project: &str) -> bool {
        let before = self.servers.len();
        self.servers.retain(|s| s.project != project);
        self.servers.len() != before
    }

    /// Default on-disk location of the config file.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("jenkinsctl");
        path.push("config.yaml");
        path
    }
}

/// Connection settings for one Jenkins instance, keyed by project name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub project: String,
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub url_extra_path: Option<String>,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub crumb: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            project: String::new(),
            url: String::new(),
            user: String::new(),
            password: None,
            url_extra_path: None,
            port: 0,
            crumb: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Compose the base URL: `url[:port][/extra_path]`, without a trailing slash.
    /// A port of 0 means the URL carries no explicit port.
    pub fn base_url(&self) -> String {
        let mut base = self.url.trim_end_matches('/').to_string();
        if self.port != 0 {
            base.push_str(&format!(":{}", self.port));
        }
        if let Some(extra) = self.url_extra_path.as_deref() {
            let extra = extra.trim_matches('/');
            if !extra.is_empty() {
                base.push('/');
                base.push_str(extra);
            }
        }
        base
    }

    /// Per-request timeout for this server.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
