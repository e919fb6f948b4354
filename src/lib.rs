//! subscout - Find and download matching subtitles for local video files
//!
//! This library provides the core functionality for discovering video files
//! that still need subtitles, matching them against remote subtitle
//! listings, and downloading the best match for each file. Season-pack
//! archives take priority over single-file subtitles.

mod archive;
mod config;
mod discovery;
mod downloader;
mod matcher;
mod metadata;
mod name_parser;
mod search;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use thiserror::Error;

// Re-export error types
pub use archive::ArchiveError;
pub use config::ConfigError;
pub use discovery::DiscoveryError;
pub use downloader::DownloadError;
pub use search::SearchError;

pub use archive::{ArchiveEntry, SubtitleArchive};
pub use config::{Config, DEFAULT_PACING_DELAY, DEFAULT_SEASON_PACK_THRESHOLD};
pub use downloader::{LocalFile, RemoteCandidate, TitleGroup};
pub use matcher::{is_exact_match, is_match};
pub use metadata::{ContentType, Episodes, MediaMetadata};
pub use search::{SubSourceClient, SubtitleListing, SubtitleSearch};

/// Progress event emitted while subtitles are being resolved
///
/// These events allow library users to track progress and provide feedback;
/// the CLI renders them as console lines.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Discovery started under the given path
    Started { path: PathBuf },

    /// Candidate video files found
    VideosFound { count: usize },

    /// Processing of a title group begins
    ProcessingTitle {
        title: String,
        index: usize,
        total: usize,
        file_count: usize,
    },

    /// Remote candidates available for the current title after the
    /// language filter
    CandidatesFound { title: String, count: usize },

    /// A season-pack archive is being fetched and resolved
    TryingPack { name: String },

    /// A pack candidate was skipped because its declared episodes do not
    /// overlap the outstanding files
    PackSkipped { name: String },

    /// A subtitle file was written
    Downloaded { destination: PathBuf },

    /// A title group is done
    TitleComplete { title: String, written: usize },

    /// The whole run is done
    Complete { written: usize },
}

/// Top-level error type for subscout operations
#[derive(Debug, Error)]
pub enum SubscoutError {
    /// Error while loading configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Error during video file discovery
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Error while searching the subtitle service
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Error while resolving a title group
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Finds video files under `path` that still need subtitles and downloads
/// the best match for each from the given subtitle service.
///
/// Files are grouped by normalized title; per group, season-pack archives
/// are tried first in service order, then the remaining files fall back to
/// first-match single listings. A fixed pacing delay separates consecutive
/// title groups. Subtitles land next to their videos, or in `output_dir`
/// when given.
///
/// Progress events are emitted through the provided callback, allowing
/// library users to track progress, display status, or remain silent.
///
/// # Arguments
///
/// * `path` - Video file or directory to resolve subtitles for
/// * `output_dir` - Optional directory to place subtitles in instead of
///   next to each video
/// * `search` - The subtitle service to query
/// * `config` - Policy knobs for this run (language, aliases, thresholds)
/// * `progress_callback` - Closure called with progress events
///
/// # Returns
///
/// The number of subtitle files written.
pub fn download_subtitles<S, F>(
    path: &Path,
    output_dir: Option<&Path>,
    search: &S,
    config: &Config,
    mut progress_callback: F,
) -> Result<usize, SubscoutError>
where
    S: SubtitleSearch,
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Started {
        path: path.to_path_buf(),
    });

    let videos = discovery::find_video_files(path, config)?;
    progress_callback(ProgressEvent::VideosFound {
        count: videos.len(),
    });

    if videos.is_empty() {
        progress_callback(ProgressEvent::Complete { written: 0 });
        return Ok(0);
    }

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }

    let mut groups = downloader::group_by_title(videos);
    let total = groups.len();
    let mut written_total = 0;

    for (index, group) in groups.iter_mut().enumerate() {
        progress_callback(ProgressEvent::ProcessingTitle {
            title: group.title.clone(),
            index,
            total,
            file_count: group.files.len(),
        });

        let listings = search.search(config.search_title(&group.title))?;
        let candidates = downloader::collect_candidates(listings, config);
        progress_callback(ProgressEvent::CandidatesFound {
            title: group.title.clone(),
            count: candidates.len(),
        });

        let written = downloader::process_group(
            group,
            &candidates,
            search,
            output_dir,
            &mut progress_callback,
        )?;
        written_total += written;

        progress_callback(ProgressEvent::TitleComplete {
            title: group.title.clone(),
            written,
        });

        // Pace requests so consecutive title groups do not hammer the
        // remote service.
        if index + 1 < total {
            thread::sleep(config.pacing_delay);
        }
    }

    progress_callback(ProgressEvent::Complete {
        written: written_total,
    });

    Ok(written_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::zip_fixture;
    use crate::search::testing::{ScriptedSearch, listing};
    use std::collections::HashMap;
    use std::time::Duration;

    fn quiet_config() -> Config {
        Config {
            pacing_delay: Duration::ZERO,
            ..Config::default()
        }
    }

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn runs_title_groups_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Show.S01E01.mkv"));
        touch(&dir.path().join("Show.S01E02.mkv"));

        let archives = HashMap::from([(
            "pack".to_string(),
            zip_fixture(&[
                ("Show.S01E01.srt", b"one".as_slice()),
                ("Show.S01E02.srt", b"two".as_slice()),
            ]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("Show.S01.Complete", "English", "pack")],
            archives,
        );

        let written =
            download_subtitles(dir.path(), None, &search, &quiet_config(), |_| {}).unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("Show.S01E01.srt").exists());
        assert!(dir.path().join("Show.S01E02.srt").exists());
    }

    #[test]
    fn second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Show.S01E01.mkv"));

        let archives = HashMap::from([(
            "e1".to_string(),
            zip_fixture(&[("Show.S01E01.srt", b"one".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("Show.S01E01.WEB", "English", "e1")],
            archives,
        );

        let config = quiet_config();
        let first = download_subtitles(dir.path(), None, &search, &config, |_| {}).unwrap();
        assert_eq!(first, 1);

        // all targets now have subtitles; nothing to discover, fetch, or write
        let second = download_subtitles(dir.path(), None, &search, &config, |_| {}).unwrap();
        assert_eq!(second, 0);
        assert_eq!(search.fetch_count(), 1);
    }

    #[test]
    fn alias_table_redirects_the_search_query() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Der Film.2019.mkv"));

        let mut config = quiet_config();
        config
            .title_aliases
            .insert("Der Film".to_string(), "The Movie".to_string());

        let search = ScriptedSearch::new(Vec::new(), HashMap::new());
        download_subtitles(dir.path(), None, &search, &config, |_| {}).unwrap();

        assert_eq!(search.searches.borrow().as_slice(), ["The Movie"]);
    }

    #[test]
    fn output_directory_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Show.S01E01.mkv"));
        let out = dir.path().join("subs").join("nested");

        let archives = HashMap::from([(
            "e1".to_string(),
            zip_fixture(&[("Show.S01E01.srt", b"one".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("Show.S01E01.WEB", "English", "e1")],
            archives,
        );

        let written =
            download_subtitles(dir.path(), Some(&out), &search, &quiet_config(), |_| {}).unwrap();
        assert_eq!(written, 1);
        assert!(out.join("Show.S01E01.srt").exists());
    }

    #[test]
    fn progress_reports_one_line_per_write() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Show.S01E01.mkv"));
        touch(&dir.path().join("Show.S01E02.mkv"));

        let archives = HashMap::from([(
            "pack".to_string(),
            zip_fixture(&[
                ("Show.S01E01.srt", b"one".as_slice()),
                ("Show.S01E02.srt", b"two".as_slice()),
            ]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("Show.S01.Complete", "English", "pack")],
            archives,
        );

        let mut downloads = Vec::new();
        download_subtitles(dir.path(), None, &search, &quiet_config(), |event| {
            if let ProgressEvent::Downloaded { destination } = event {
                downloads.push(destination);
            }
        })
        .unwrap();

        assert_eq!(downloads.len(), 2);
    }
}
