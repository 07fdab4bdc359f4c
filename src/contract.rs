//! # contract: seams between the pipeline and the outside world
//!
//! The driver loop only talks to the network and to version control through
//! the two traits below, so tests can run a full cycle against mocks.
//!
//! - [`Fetcher`]: retrieves the current feature collection (HTTP in
//!   production, see [`crate::fetch::HttpFetcher`]).
//! - [`VersionControl`]: stages, inspects, commits and pushes the working tree
//!   (the `git` binary in production, see [`crate::git::GitCli`]).
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall`; `MockFetcher` and
//! `MockVersionControl` are exported under the default `test-export-mocks`
//! feature so integration tests in `tests/` can use them.

use crate::error::{FetchError, VcsError};
use crate::geojson::FeatureCollection;
use async_trait::async_trait;
use std::path::PathBuf;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Source of the GeoJSON feed.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch and decode the feed once.
    async fn fetch(&self) -> Result<FeatureCollection, FetchError>;
}

/// The small slice of a version-control system the publisher needs.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait VersionControl: Send + Sync {
    /// Add the given paths to the index.
    fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError>;

    /// Whether the index holds changes that are not yet committed.
    fn has_changes(&self) -> Result<bool, VcsError>;

    fn commit(&self, message: &str) -> Result<(), VcsError>;

    /// Push the current branch to its tracked remote.
    fn push(&self) -> Result<(), VcsError>;
}
