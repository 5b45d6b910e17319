//! Configuration loading for the dashboard.
//!
//! Settings come from a YAML file (`terrorgraph.yaml` by default), then
//! environment variables override the graph-store credentials, then command
//! line flags override everything else. Every field has a default, so an
//! absent default file simply yields the defaults.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "terrorgraph.yaml";

/// Command line flags.
#[derive(Debug, Parser)]
#[command(name = "terrorgraph", version, about = "Explore incident data by group, country and year")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Load events from a CSV snapshot instead of the graph store.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Directory the CSV export is written into.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Directory holding Natural Earth GeoJSON files for the basemap.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Log file (the terminal is owned by the UI).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Generate ROWS synthetic events instead of connecting anywhere.
    #[arg(long, value_name = "ROWS")]
    pub demo: Option<usize>,
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub basemap: BasemapConfig,
}

impl DashboardConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override the graph connection settings:
    /// - `NEO4J_URI` overrides `source.uri`
    /// - `NEO4J_USER` overrides `source.user`
    /// - `NEO4J_PASSWORD` overrides `source.password`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying env overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.source.apply_env_overrides();
        Ok(config)
    }

    /// Resolve the effective configuration for a CLI invocation.
    ///
    /// An explicitly passed `--config` must exist; the default file is
    /// optional.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    let mut config = Self::default();
                    config.source.apply_env_overrides();
                    config
                }
            }
        };
        config.apply_cli(cli);
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.csv {
            self.source.kind = SourceKind::Csv;
            self.source.csv_path = path.clone();
        }
        if let Some(rows) = cli.demo {
            self.source.kind = SourceKind::Demo;
            self.source.demo_rows = rows;
        }
        if let Some(dir) = &cli.export_dir {
            self.export.dir = dir.clone();
        }
        if let Some(dir) = &cli.data_dir {
            self.basemap.data_dir = dir.clone();
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = file.clone();
        }
    }

    /// Emit the effective settings, without the password.
    pub fn log_summary(&self) {
        info!(
            source = ?self.source.kind,
            uri = %self.source.uri,
            user = %self.source.user,
            csv_path = %self.source.csv_path.display(),
            include_geolocation = self.source.include_geolocation,
            export_dir = %self.export.dir.display(),
            data_dir = %self.basemap.data_dir.display(),
            "configuration loaded"
        );
    }
}

/// Where the event table comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Neo4j,
    Csv,
    Demo,
}

/// Data source settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Bolt endpoint, e.g. `neo4j+s://host.databases.neo4j.io`.
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Also fetch `latitude`/`longitude` from the event nodes.
    #[serde(default)]
    pub include_geolocation: bool,

    /// CSV snapshot used when `kind` is `csv`.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    /// Give up connecting to the graph store after this many seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Row count and seed when `kind` is `demo`.
    #[serde(default = "default_demo_rows")]
    pub demo_rows: usize,

    #[serde(default)]
    pub demo_seed: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            uri: default_uri(),
            user: default_user(),
            password: String::new(),
            include_geolocation: false,
            csv_path: default_csv_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            demo_rows: default_demo_rows(),
            demo_seed: 0,
        }
    }
}

impl SourceConfig {
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.password = password;
        }
    }
}

/// CSV export settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

/// Logging settings. `RUST_LOG` wins over `level` when set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Basemap settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasemapConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for BasemapConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_uri() -> String {
    "neo4j://localhost:7687".to_owned()
}

fn default_user() -> String {
    "neo4j".to_owned()
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("events.csv")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_demo_rows() -> usize {
    50_000
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("terrorgraph.log")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: DashboardConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config.source.kind, SourceKind::Neo4j);
        assert_eq!(config.source.uri, "neo4j://localhost:7687");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.export.dir, PathBuf::from("."));
        assert!(!config.source.include_geolocation);
        assert_eq!(config.source.connect_timeout_secs, 10);
    }

    #[test]
    fn parses_csv_source() {
        let yaml = "source:\n  kind: csv\n  csv_path: snapshots/gtd.csv\n  include_geolocation: true\n";
        let config: DashboardConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.source.kind, SourceKind::Csv);
        assert_eq!(config.source.csv_path, PathBuf::from("snapshots/gtd.csv"));
        assert!(config.source.include_geolocation);
    }

    #[test]
    fn env_overrides_replace_credentials() {
        let mut source = SourceConfig::default();
        source.apply_overrides(|key| match key {
            "NEO4J_URI" => Some("neo4j+s://example:7687".to_owned()),
            "NEO4J_PASSWORD" => Some("hunter2".to_owned()),
            _ => None,
        });
        assert_eq!(source.uri, "neo4j+s://example:7687");
        assert_eq!(source.user, "neo4j");
        assert_eq!(source.password, "hunter2");
    }

    #[test]
    fn cli_flags_override_file_settings() {
        let cli = Cli::parse_from([
            "terrorgraph",
            "--csv",
            "dump.csv",
            "--export-dir",
            "out",
        ]);
        let mut config = DashboardConfig::default();
        config.apply_cli(&cli);
        assert_eq!(config.source.kind, SourceKind::Csv);
        assert_eq!(config.source.csv_path, PathBuf::from("dump.csv"));
        assert_eq!(config.export.dir, PathBuf::from("out"));
        assert_eq!(config.basemap.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn demo_flag_selects_synthetic_source() {
        let cli = Cli::parse_from(["terrorgraph", "--demo", "1200"]);
        let mut config = DashboardConfig::default();
        config.apply_cli(&cli);
        assert_eq!(config.source.kind, SourceKind::Demo);
        assert_eq!(config.source.demo_rows, 1200);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(DashboardConfig::parse("source: [unclosed").is_err());
    }
}
