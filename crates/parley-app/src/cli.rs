//! CLI argument definitions for the Parley server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Parley - a chat relay that streams answers from a hosted completion model
/// and keeps categorized question history.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory holding the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLEY_CONFIG env var > ~/.parley/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.config_path_from(|key| std::env::var(key).ok())
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > PARLEY_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.port_from(config_port, |key| std::env::var(key).ok())
    }

    /// Resolve the data directory path. Returns `None` when the flag is
    /// absent and the config value should be used.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level. Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    fn config_path_from<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("PARLEY_CONFIG").filter(|p| !p.is_empty()) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    fn port_from<F>(&self, config_port: u16, lookup: F) -> u16
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(p) = lookup("PARLEY_PORT").and_then(|v| v.parse::<u16>().ok()) {
            return p;
        }
        config_port
    }
}

/// Default config file path for the current user.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".parley").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// The current user's home directory, if the environment names one.
pub fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}
