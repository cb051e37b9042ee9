use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a [`FileResolverConfig`](crate::FileResolverConfig)
/// or building a resolver from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has the wrong shape.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No `[partitions]` entries were given.
    #[error("no partitions configured")]
    NoPartitions,

    /// A partition root exists but is not a directory.
    #[error("root of partition {partition} is not a directory: {path}")]
    NotADirectory { partition: String, path: PathBuf },

    /// `create_dirs` was set and a partition root could not be created.
    #[error("failed to create root of partition {partition} at {path}: {source}")]
    CreateRoot {
        partition: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
