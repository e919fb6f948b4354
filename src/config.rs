//! Runtime configuration
//!
//! All policy knobs live in a single [`Config`] value handed to the
//! orchestrator at construction: the wanted subtitle language, the title
//! alias table, the season-pack threshold, the inter-title pacing delay,
//! and the recognized extension sets. Defaults match the documented
//! behavior; a TOML file can override any subset of them.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Minimum bundled-episode count for a listing with an explicit episode
/// set to be classified as a season pack.
pub const DEFAULT_SEASON_PACK_THRESHOLD: usize = 4;

/// Fixed wait between processing consecutive title groups.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_secs(3);

/// Extensions recognized as video files during discovery.
const VIDEO_EXTENSIONS: &[&str] = &[
    "3g2", "3gp", "3gp2", "3gpp", "60d", "ajp", "asf", "asx", "avchd", "avi", "bik", "bix", "box",
    "cam", "dat", "divx", "dmf", "dv", "dvr-ms", "evo", "flc", "fli", "flic", "flv", "flx", "gvi",
    "gvp", "h264", "m1v", "m2p", "m2ts", "m2v", "m4e", "m4v", "mjp", "mjpeg", "mjpg", "mkv",
    "moov", "mov", "movhd", "movie", "movx", "mp4", "mpe", "mpeg", "mpg", "mpv", "mpv2", "mxf",
    "nsv", "nut", "ogg", "ogm", "ogv", "omf", "ps", "qt", "ram", "rm", "rmvb", "swf", "ts", "vfw",
    "vid", "video", "viv", "vivo", "vob", "vro", "wm", "wmv", "wmx", "wrap", "wvx", "wx", "x264",
    "xvid",
];

/// Extensions recognized as subtitle files for sibling detection.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "smi", "txt", "ssa", "ass", "mpl"];

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// The configuration file is not valid TOML
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Policy knobs for one run
#[derive(Debug, Clone)]
pub struct Config {
    /// The single subtitle language candidates are filtered to
    pub wanted_language: String,
    /// Maps a normalized local title to the title used for searching
    /// (localized or alternate official titles)
    pub title_aliases: HashMap<String, String>,
    /// Minimum bundled-episode count to classify a listing as a pack
    pub season_pack_threshold: usize,
    /// Wait between consecutive title groups
    pub pacing_delay: Duration,
    /// Closed set of extensions treated as video files
    pub video_extensions: BTreeSet<String>,
    /// Closed set of extensions treated as subtitle files
    pub subtitle_extensions: BTreeSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wanted_language: "English".to_string(),
            title_aliases: HashMap::new(),
            season_pack_threshold: DEFAULT_SEASON_PACK_THRESHOLD,
            pacing_delay: DEFAULT_PACING_DELAY,
            video_extensions: VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            subtitle_extensions: SUBTITLE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// On-disk representation; every field optional so a file can override
/// just the knobs it cares about.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    wanted_language: Option<String>,
    title_aliases: Option<HashMap<String, String>>,
    season_pack_threshold: Option<usize>,
    pacing_delay_secs: Option<u64>,
    video_extensions: Option<BTreeSet<String>>,
    subtitle_extensions: Option<BTreeSet<String>>,
}

impl Config {
    /// Loads configuration from `path`, or from the default location when
    /// no path is given. A missing default file just yields the defaults;
    /// an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Config::default()),
            },
        };

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;
        let file: ConfigFile =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed { path, source: e })?;

        let mut config = Config::default();
        if let Some(language) = file.wanted_language {
            config.wanted_language = language;
        }
        if let Some(aliases) = file.title_aliases {
            config.title_aliases = aliases;
        }
        if let Some(threshold) = file.season_pack_threshold {
            config.season_pack_threshold = threshold;
        }
        if let Some(secs) = file.pacing_delay_secs {
            config.pacing_delay = Duration::from_secs(secs);
        }
        if let Some(extensions) = file.video_extensions {
            config.video_extensions = extensions;
        }
        if let Some(extensions) = file.subtitle_extensions {
            config.subtitle_extensions = extensions;
        }
        Ok(config)
    }

    /// Resolves the title to search for, applying the alias table.
    pub fn search_title<'a>(&'a self, title: &'a str) -> &'a str {
        self.title_aliases
            .get(title)
            .map(String::as_str)
            .unwrap_or(title)
    }
}

/// Default config file location in the platform config directory.
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "subscout")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_the_documented_knobs() {
        let config = Config::default();
        assert_eq!(config.wanted_language, "English");
        assert_eq!(config.season_pack_threshold, 4);
        assert_eq!(config.pacing_delay, Duration::from_secs(3));
        assert!(config.video_extensions.contains("mkv"));
        assert!(config.subtitle_extensions.contains("srt"));
        assert!(config.title_aliases.is_empty());
    }

    #[test]
    fn file_overrides_are_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "wanted_language = \"German\"\nseason_pack_threshold = 6\n\n[title_aliases]\n\"Der Film\" = \"The Movie\"\n"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.wanted_language, "German");
        assert_eq!(config.season_pack_threshold, 6);
        assert_eq!(config.search_title("Der Film"), "The Movie");
        assert_eq!(config.search_title("Unmapped"), "Unmapped");
        // untouched knobs keep their defaults
        assert_eq!(config.pacing_delay, Duration::from_secs(3));
        assert!(config.video_extensions.contains("mkv"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/subscout.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wanted_language = [not toml").unwrap();
        let result = Config::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }
}
