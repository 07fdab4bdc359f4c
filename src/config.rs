use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_FEED_URL: &str = "https://deepstatemap.live/api/history/last.geojson";
pub const DEFAULT_ICON_BASE_URL: &str = "https://deepstatemap.live/images/custom/";
pub const DEFAULT_OUTPUT_FILE: &str = "deepstate.kml";
pub const DEFAULT_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Effective configuration for every pipeline stage.
///
/// All sections are optional in YAML; an absent section takes the defaults,
/// which reproduce the fixed deepstatemap pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub convert: ConvertConfig,
    pub publish: PublishConfig,
    pub schedule: ScheduleConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            url = %self.source.url,
            repo_dir = %self.publish.repo_dir.display(),
            output_file = %self.publish.output_path().display(),
            interval_secs = self.schedule.interval_secs,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// Where the GeoJSON feed is fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Prefix joined with `<icon name>.png` for point icons.
    pub icon_base_url: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Local checkout that receives the KML file and is committed/pushed.
    pub repo_dir: PathBuf,
    /// Relative paths resolve against `repo_dir`.
    pub output_file: PathBuf,
    /// Extra paths staged together with the output file.
    pub extra_paths: Vec<PathBuf>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            extra_paths: Vec::new(),
        }
    }
}

impl PublishConfig {
    pub fn output_path(&self) -> PathBuf {
        self.repo_dir.join(&self.output_file)
    }

    /// Every path handed to `stage`, output file first. Paths are relative
    /// to `repo_dir`, as `git -C <repo_dir>` resolves them.
    pub fn tracked_paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.output_file.clone())
            .chain(self.extra_paths.iter().cloned())
            .collect()
    }

    /// Adds the config file to `extra_paths` when it lives inside `repo_dir`.
    /// Returns whether it will be staged.
    pub fn track_config_file(&mut self, config_path: &Path) -> bool {
        let (repo_dir, config_path) =
            match (self.repo_dir.canonicalize(), config_path.canonicalize()) {
                (Ok(repo_dir), Ok(config_path)) => (repo_dir, config_path),
                _ => {
                    debug!(config_path = %config_path.display(), "Config file not resolvable, not staging it");
                    return false;
                }
            };
        let Ok(relative) = config_path.strip_prefix(&repo_dir) else {
            info!(
                config_path = %config_path.display(),
                repo_dir = %repo_dir.display(),
                "Config file is outside the repository, not staging it"
            );
            return false;
        };
        let relative = relative.to_path_buf();
        if !self.extra_paths.contains(&relative) {
            self.extra_paths.push(relative);
        }
        true
    }

    /// File name used in commit messages.
    pub fn output_file_name(&self) -> String {
        self.output_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.output_file.display().to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_output_file_resolves_against_repo_dir() {
        let publish = PublishConfig {
            repo_dir: PathBuf::from("/srv/maps"),
            output_file: PathBuf::from("out/deepstate.kml"),
            extra_paths: vec![PathBuf::from("deepstate-kml.yaml")],
        };
        assert_eq!(
            publish.output_path(),
            PathBuf::from("/srv/maps/out/deepstate.kml")
        );
        assert_eq!(publish.output_file_name(), "deepstate.kml");
        assert_eq!(
            publish.tracked_paths(),
            vec![
                PathBuf::from("out/deepstate.kml"),
                PathBuf::from("deepstate-kml.yaml"),
            ]
        );
    }

    #[test]
    fn config_file_inside_repo_is_tracked_once() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::create_dir(repo.path().join("conf")).unwrap();
        let config_path = repo.path().join("conf/deepstate-kml.yaml");
        std::fs::write(&config_path, "").unwrap();

        let mut publish = PublishConfig {
            repo_dir: repo.path().to_path_buf(),
            ..PublishConfig::default()
        };
        assert!(publish.track_config_file(&config_path));
        assert!(publish.track_config_file(&config_path));
        assert_eq!(
            publish.tracked_paths(),
            vec![
                PathBuf::from("deepstate.kml"),
                PathBuf::from("conf/deepstate-kml.yaml"),
            ]
        );
    }

    #[test]
    fn config_file_outside_repo_is_not_tracked() {
        let repo = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::NamedTempFile::new().unwrap();

        let mut publish = PublishConfig {
            repo_dir: repo.path().to_path_buf(),
            ..PublishConfig::default()
        };
        assert!(!publish.track_config_file(elsewhere.path()));
        assert!(!publish.track_config_file(&repo.path().join("missing.yaml")));
        assert!(publish.extra_paths.is_empty());
    }

    #[test]
    fn defaults_match_fixed_pipeline() {
        let config = Config::default();
        assert_eq!(config.source.url, DEFAULT_FEED_URL);
        assert_eq!(config.convert.icon_base_url, DEFAULT_ICON_BASE_URL);
        assert_eq!(config.schedule.interval(), Duration::from_secs(600));
        assert_eq!(config.publish.output_path(), PathBuf::from("./deepstate.kml"));
    }
}
