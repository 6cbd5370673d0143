use crate::model::{ServerRecord, demo_servers};
use clap::Parser;
use log::warn;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid servers file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("servers file contains no servers")]
    EmptyServerList,
    #[error("ping ceiling must be a positive number, got {0}")]
    InvalidPingCeiling(f64),
}

#[derive(Debug, Clone, Parser)]
#[command(name = "egui_server_board", version, about = "Simulated server board")]
pub struct Args {
    /// Delay before each add and each ping, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Simulated pings are drawn from [0, ceiling) milliseconds
    #[arg(long, default_value_t = 100.0)]
    pub ping_ceiling: f64,

    /// JSON array of servers to show instead of the built-in list
    #[arg(long, value_name = "FILE")]
    pub servers: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub step_delay: Duration,
    pub ping_ceiling: f64,
    pub servers: Vec<ServerRecord>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(1000),
            ping_ceiling: 100.0,
            servers: demo_servers(),
        }
    }
}

impl Settings {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        if !args.ping_ceiling.is_finite() || args.ping_ceiling <= 0.0 {
            return Err(ConfigError::InvalidPingCeiling(args.ping_ceiling));
        }

        let servers = match args.servers {
            Some(path) => load_servers(&path)?,
            None => demo_servers(),
        };

        Ok(Self {
            step_delay: Duration::from_millis(args.delay_ms),
            ping_ceiling: args.ping_ceiling,
            servers,
        })
    }
}

/// Reads a JSON array of servers. Duplicate ids are kept, with a warning.
pub fn load_servers(path: &Path) -> Result<Vec<ServerRecord>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_servers(&text)
}

pub fn parse_servers(text: &str) -> Result<Vec<ServerRecord>, ConfigError> {
    let servers: Vec<ServerRecord> = serde_json::from_str(text)?;
    if servers.is_empty() {
        return Err(ConfigError::EmptyServerList);
    }

    let mut seen = HashSet::new();
    for server in &servers {
        if !seen.insert(server.id.as_str()) {
            warn!(
                "Server id {:?} appears more than once; it will be listed twice",
                server.id
            );
        }
    }
    Ok(servers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServerStatus;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["egui_server_board"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_use_demo_servers() {
        let settings = Settings::from_args(args(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.servers.len(), 5);
    }

    #[test]
    fn test_delay_and_ceiling_flags() {
        let settings =
            Settings::from_args(args(&["--delay-ms", "250", "--ping-ceiling", "40"])).unwrap();
        assert_eq!(settings.step_delay, Duration::from_millis(250));
        assert_eq!(settings.ping_ceiling, 40.0);
    }

    #[test]
    fn test_rejects_non_positive_ceiling() {
        let err = Settings::from_args(args(&["--ping-ceiling", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPingCeiling(c) if c == 0.0));
    }

    #[test]
    fn test_parse_servers_file() {
        let json = r#"[
            {"id":"a","name":"Edge","status":"maintenance","address":"10.1.0.1","location":"Oslo","uptime":"2 days"},
            {"id":"b","name":"Core","status":"offline","ip":"10.1.0.2","location":"Riga","uptime":"0 days"}
        ]"#;
        let servers = parse_servers(json).unwrap();

        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].status, ServerStatus::Maintenance);
        assert_eq!(servers[1].address, "10.1.0.2");
    }

    #[test]
    fn test_parse_servers_keeps_duplicates() {
        let json = r#"[
            {"id":"a","name":"One","status":"online","address":"1","location":"x","uptime":"1"},
            {"id":"a","name":"Two","status":"online","address":"2","location":"y","uptime":"2"}
        ]"#;
        assert_eq!(parse_servers(json).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_servers_errors() {
        assert!(matches!(parse_servers("[]"), Err(ConfigError::EmptyServerList)));
        assert!(matches!(parse_servers("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_servers(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
