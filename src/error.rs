//! Process-level errors.
//!
//! Problems inside a rule file are never errors in this sense: they become
//! [`Finding`](crate::finding::Finding)s on that file's report. The types here
//! cover failures that stop a run before any report exists.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    ExcludePattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot read {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no rule files found in {}", display_paths(.0))]
    NoFiles(Vec<PathBuf>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
