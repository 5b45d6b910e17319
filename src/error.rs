//! Error types for loading, configuring and exporting.
//!
//! Load and config errors are fatal at start-up. Export errors are shown in
//! the status bar and the session carries on.

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while loading the event table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The graph store could not be reached or rejected the credentials.
    #[error("cannot connect to graph store at {uri}: {source}")]
    Connection {
        uri: String,
        #[source]
        source: ConnectError,
    },

    /// The fixed read query failed to run or its result stream broke.
    #[error("event query failed: {0}")]
    Query(#[source] neo4rs::Error),

    /// The CSV snapshot could not be opened.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV snapshot is structurally malformed.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The async runtime used for the graph load could not start.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Why the graph store could not be reached.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Graph(#[from] neo4rs::Error),

    /// The driver kept retrying past the connect timeout.
    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        #[from]
        source: serde_yml::Error,
    },
}

/// Errors raised while writing the CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export encoding error: {0}")]
    Csv(#[from] csv::Error),
}
