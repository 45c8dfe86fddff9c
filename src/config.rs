use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "profile-pins")]
#[command(about = "Runs the pinned repositories service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config", env = "PINS_CONFIG")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".profile-pins")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    #[default]
    Libsql,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_port() -> u16 {
    8787
}

fn default_database() -> String {
    "pins.db".to_string()
}

fn default_key_prefix() -> String {
    "pinned:".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_sync_interval() -> u64 {
    60
}

impl Default for App {
    fn default() -> Self {
        App {
            port: default_port(),
            backend: Backend::default(),
            database: default_database(),
            key_prefix: default_key_prefix(),
            request_timeout_seconds: default_request_timeout(),
            turso_url: None,
            turso_auth_token: None,
            sync_interval_seconds: default_sync_interval(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }
}

/// Settings for the `s3` backend. Credentials come from the standard AWS
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Storage {
    pub bucket: String,
    pub aws_region: String,
    #[serde(default)]
    pub aws_endpoint_url_s3: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub storage: Option<Storage>,
}

impl Config {
    pub fn new(path: &Path) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = substitute_env_vars(yaml_str);
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        if config.app.backend == Backend::S3 && config.storage.is_none() {
            anyhow::bail!("backend `s3` needs a `storage` section");
        }
        Ok(config)
    }
}

/// Expands `${VAR}` and `${VAR:-default}`. Unset variables without a default
/// become empty strings.
fn substitute_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after[..end];
        let value = match expr.split_once(":-") {
            Some((name, default)) => env::var(name).unwrap_or_else(|_| default.to_string()),
            None => env::var(expr).unwrap_or_else(|_| {
                tracing::warn!("environment variable '{}' not found", expr);
                String::new()
            }),
        };
        out.push_str(&value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
