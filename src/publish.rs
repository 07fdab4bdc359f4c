//! Writes the KML file and records it in version control.
//!
//! Writing is fatal to the iteration ([`PublishError`]); version-control
//! failures are logged here and reported as
//! [`PublishOutcome::VersionControlFailed`] so the loop keeps going.

use crate::config::PublishConfig;
use crate::contract::VersionControl;
use crate::error::{PublishError, VcsError};
use crate::kml::KmlDocument;
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Changes were committed with `message` and pushed.
    Committed { message: String },
    /// The staged tree matched HEAD; nothing was committed.
    Unchanged,
    /// The file was written but a version-control step failed.
    VersionControlFailed { step: VcsStep, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsStep {
    Stage,
    Status,
    Commit,
    Push,
}

impl std::fmt::Display for VcsStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VcsStep::Stage => "stage",
            VcsStep::Status => "status",
            VcsStep::Commit => "commit",
            VcsStep::Push => "push",
        };
        f.write_str(name)
    }
}

pub struct Publisher<V> {
    config: PublishConfig,
    vcs: V,
}

impl<V: VersionControl> Publisher<V> {
    pub fn new(config: PublishConfig, vcs: V) -> Self {
        Self { config, vcs }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn publish(&self, document: &KmlDocument) -> Result<PublishOutcome, PublishError> {
        self.publish_at(document, Local::now())
    }

    /// Same as [`Publisher::publish`] with an explicit commit timestamp.
    pub fn publish_at(
        &self,
        document: &KmlDocument,
        now: DateTime<Local>,
    ) -> Result<PublishOutcome, PublishError> {
        let path = self.config.output_path();
        write_document(document, &path)?;
        info!(path = %path.display(), placemarks = document.len(), "KML saved");

        let message = commit_message(&self.config.output_file_name(), now);
        let outcome = match self.record(&message) {
            Ok(outcome) => outcome,
            Err((step, e)) => {
                error!(step = %step, error = %e, "Error during git operations");
                PublishOutcome::VersionControlFailed {
                    step,
                    error: e.to_string(),
                }
            }
        };
        Ok(outcome)
    }

    fn record(&self, message: &str) -> Result<PublishOutcome, (VcsStep, VcsError)> {
        let paths = self.config.tracked_paths();
        self.vcs.stage(&paths).map_err(|e| (VcsStep::Stage, e))?;

        if !self.vcs.has_changes().map_err(|e| (VcsStep::Status, e))? {
            info!("No changes to commit, skipping commit and push");
            return Ok(PublishOutcome::Unchanged);
        }

        self.vcs.commit(message).map_err(|e| (VcsStep::Commit, e))?;
        self.vcs.push().map_err(|e| (VcsStep::Push, e))?;
        info!(message = %message, "Committed and pushed");
        Ok(PublishOutcome::Committed {
            message: message.to_string(),
        })
    }
}

/// Serializes `document` to `path`, creating parent directories as needed.
pub fn write_document(document: &KmlDocument, path: &Path) -> Result<(), PublishError> {
    let xml = document.to_xml()?;
    let write_err = |source| PublishError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, xml).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to write KML file");
        write_err(e)
    })
}

/// `Update <file_name> - <YYYY-MM-DD HH:MM:SS>`
pub fn commit_message(file_name: &str, now: DateTime<Local>) -> String {
    format!("Update {} - {}", file_name, now.format("%Y-%m-%d %H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn commit_message_has_file_and_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 2, 24, 6, 5, 9).unwrap();
        assert_eq!(
            commit_message("deepstate.kml", now),
            "Update deepstate.kml - 2024-02-24 06:05:09"
        );
    }
}
