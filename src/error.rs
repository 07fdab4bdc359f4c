//! Typed failures for each pipeline stage.
//!
//! Iteration-fatal errors ([`FetchError`], [`ConvertError`], [`PublishError`])
//! are wrapped in [`CycleError`] and logged by the driver loop with their
//! [`CycleError::category`]. [`VcsError`] never leaves the publish step: the
//! publisher logs it and reports a degraded outcome instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode feature collection: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("icon marker in {description:?} has no ',' or '}}' terminator")]
    MalformedIconMarker { description: String },

    #[error("polygon {name:?} has no outer ring")]
    MissingOuterRing { name: String },

    #[error("invalid color {value:?} for {property}, expected #rrggbb")]
    InvalidColor {
        property: &'static str,
        value: String,
    },

    #[error("position {position:?} needs at least longitude and latitude")]
    InvalidPosition { position: Vec<f64> },

    #[error("icon marker pattern failed to compile: {0}")]
    IconPattern(regex::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize KML: {0}")]
    Serialize(#[from] quick_xml::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("failed to launch `git {command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Why one RUNNING iteration of the driver loop produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl CycleError {
    /// Short label used as the `category` field when the loop logs a failure.
    pub fn category(&self) -> &'static str {
        match self {
            CycleError::Fetch(FetchError::Parse(_)) => "parse",
            CycleError::Fetch(_) => "network",
            CycleError::Convert(_) => "convert",
            CycleError::Publish(_) => "publish",
        }
    }
}
