// Exercises GitCli against real repositories: a bare "remote" and a clone of it.

use deepstate_kml::config::PublishConfig;
use deepstate_kml::contract::VersionControl;
use deepstate_kml::git::GitCli;
use deepstate_kml::kml::{Coordinate, KmlDocument, Placemark, PlacemarkGeometry, Style};
use deepstate_kml::publish::{PublishOutcome, Publisher, VcsStep};
use std::fs;
use std::path::{Path, PathBuf};
use serial_test::serial;
use std::env;
use std::process::Command;
use tempfile::{tempdir, TempDir};

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("git must be installed for this test");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.email", "publisher@example.com"]);
    git(dir, &["config", "user.name", "Publisher"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Bare remote plus a working clone with one pushed commit and an upstream.
fn checkout_with_remote() -> (TempDir, PathBuf, PathBuf) {
    let tmp = tempdir().unwrap();
    let remote = tmp.path().join("remote.git");
    let work = tmp.path().join("work");
    fs::create_dir(&remote).unwrap();
    git(&remote, &["init", "--bare", "--quiet"]);
    git(
        tmp.path(),
        &["clone", "--quiet", remote.to_str().unwrap(), work.to_str().unwrap()],
    );
    configure_identity(&work);
    fs::write(work.join("README.md"), "front line mirror\n").unwrap();
    git(&work, &["add", "README.md"]);
    git(&work, &["commit", "--quiet", "-m", "init"]);
    git(&work, &["push", "--quiet", "-u", "origin", "HEAD"]);
    (tmp, remote, work)
}

fn document(longitude: f64) -> KmlDocument {
    KmlDocument {
        placemarks: vec![Placemark {
            name: "Front Line".into(),
            description: String::new(),
            style: Style::default(),
            geometry: PlacemarkGeometry::LineString {
                coordinates: vec![Coordinate::new(0.0, 0.0), Coordinate::new(longitude, 1.0)],
            },
        }],
    }
}

fn publisher(work: &Path) -> Publisher<GitCli> {
    let config = PublishConfig {
        repo_dir: work.to_path_buf(),
        ..PublishConfig::default()
    };
    Publisher::new(config, GitCli::new(work))
}

#[test]
fn publishes_then_detects_unchanged_content() {
    let (_tmp, remote, work) = checkout_with_remote();
    let publisher = publisher(&work);

    let first = publisher.publish(&document(1.0)).unwrap();
    assert!(matches!(first, PublishOutcome::Committed { .. }), "got {first:?}");
    let remote_log = git(&remote, &["log", "--format=%s", "-1"]);
    assert!(
        remote_log.starts_with("Update deepstate.kml - "),
        "remote head: {remote_log}"
    );

    let second = publisher.publish(&document(1.0)).unwrap();
    assert_eq!(second, PublishOutcome::Unchanged);
    let commits = git(&remote, &["rev-list", "--count", "HEAD"]);
    assert_eq!(commits.trim(), "2");

    let third = publisher.publish(&document(2.0)).unwrap();
    assert!(matches!(third, PublishOutcome::Committed { .. }));
    let commits = git(&remote, &["rev-list", "--count", "HEAD"]);
    assert_eq!(commits.trim(), "3");
}

#[test]
fn push_without_remote_is_reported_after_local_commit() {
    let tmp = tempdir().unwrap();
    let work = tmp.path().to_path_buf();
    git(&work, &["init", "--quiet"]);
    configure_identity(&work);

    let outcome = publisher(&work).publish(&document(1.0)).unwrap();
    match outcome {
        PublishOutcome::VersionControlFailed { step, .. } => assert_eq!(step, VcsStep::Push),
        other => panic!("expected push failure, got {other:?}"),
    }
    let log = git(&work, &["log", "--format=%s", "-1"]);
    assert!(log.starts_with("Update deepstate.kml - "));
}

#[test]
fn has_changes_reflects_the_index() {
    let (_tmp, _remote, work) = checkout_with_remote();
    let vcs = GitCli::new(&work);

    assert!(!vcs.has_changes().unwrap());
    fs::write(work.join("notes.txt"), "pending\n").unwrap();
    assert!(!vcs.has_changes().unwrap(), "untracked files are not staged");
    vcs.stage(&[work.join("notes.txt")]).unwrap();
    assert!(vcs.has_changes().unwrap());
}

#[test]
fn git_failure_outside_repository_is_an_error() {
    let tmp = tempdir().unwrap();
    let vcs = GitCli::new(tmp.path().join("missing"));
    assert!(vcs.stage(&[PathBuf::from("x")]).is_err());
}

/// Restores the process working directory when dropped.
struct CurrentDirGuard(PathBuf);

impl CurrentDirGuard {
    fn enter(dir: &Path) -> Self {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        CurrentDirGuard(previous)
    }
}

impl Drop for CurrentDirGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.0);
    }
}

#[test]
#[serial]
fn relative_repo_dir_stages_and_commits() {
    let (tmp, remote, work) = checkout_with_remote();
    fs::write(work.join("deepstate-kml.yaml"), "schedule:\n  interval_secs: 600\n").unwrap();
    let _cwd = CurrentDirGuard::enter(tmp.path());

    let mut config = PublishConfig {
        repo_dir: PathBuf::from("work"),
        ..PublishConfig::default()
    };
    assert!(config.track_config_file(Path::new("work/deepstate-kml.yaml")));
    let publisher = Publisher::new(config, GitCli::new("work"));

    let outcome = publisher.publish(&document(1.0)).unwrap();
    assert!(matches!(outcome, PublishOutcome::Committed { .. }), "got {outcome:?}");

    let files = git(&remote, &["show", "--name-only", "--format=", "HEAD"]);
    let mut files: Vec<&str> = files.lines().collect();
    files.sort_unstable();
    assert_eq!(files, vec!["deepstate-kml.yaml", "deepstate.kml"]);
}
