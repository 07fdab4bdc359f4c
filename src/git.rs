use crate::contract::VersionControl;
use crate::error::VcsError;
use std::path::PathBuf;
use std::process::{Command, Output};
use tracing::{debug, error, info};

/// [`VersionControl`] backed by the `git` binary, run as `git -C <repo_dir> ...`.
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_dir);
        cmd
    }

    /// Runs `git <args>` and returns its output, whatever the exit status.
    fn output(&self, args: &[&str], paths: &[PathBuf]) -> Result<Output, VcsError> {
        let command = args.join(" ");
        self.command()
            .args(args)
            .args(paths)
            .output()
            .map_err(|e| {
                error!(
                    error = ?e,
                    command = %command,
                    repo_dir = %self.repo_dir.display(),
                    "Failed to launch git process"
                );
                VcsError::Launch { command, source: e }
            })
    }

    /// Runs `git <args>` and fails on a non-zero exit status.
    fn run(&self, args: &[&str], paths: &[PathBuf]) -> Result<Output, VcsError> {
        let output = self.output(args, paths)?;
        if output.status.success() {
            debug!(command = %args.join(" "), status = ?output.status, "git command succeeded");
            return Ok(output);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(
            command = %args.join(" "),
            repo_dir = %self.repo_dir.display(),
            stderr = %stderr,
            "Git exited with non-zero code: {}", output.status
        );
        Err(VcsError::Failed {
            command: args.join(" "),
            status: output.status,
            stderr,
        })
    }
}

impl VersionControl for GitCli {
    fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
        self.run(&["add", "--"], paths)?;
        info!(files = paths.len(), "Staged files");
        Ok(())
    }

    fn has_changes(&self) -> Result<bool, VcsError> {
        let status = self.run(&["status", "--short"], &[])?;
        info!(
            status = %String::from_utf8_lossy(&status.stdout).trim_end(),
            "Git status"
        );

        // `diff --cached --quiet` exits 1 when the index differs from HEAD.
        let args = ["diff", "--cached", "--quiet"];
        let output = self.output(&args, &[])?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(VcsError::Failed {
                command: args.join(" "),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.run(&["commit", "-m", message], &[])?;
        info!(message = %message, "Committed changes");
        Ok(())
    }

    fn push(&self) -> Result<(), VcsError> {
        self.run(&["push"], &[])?;
        info!(repo_dir = %self.repo_dir.display(), "Pushed to remote");
        Ok(())
    }
}
