//! Per-title download workflow
//!
//! Owns the only mutable state of a run: the `downloaded` flag on each
//! local file. Season-pack archives are tried first in service order; files
//! the packs leave unsatisfied fall back to first-match single listings.
//! Files already written stay written even if a later step fails.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ProgressEvent;
use crate::archive::{ArchiveError, SubtitleArchive};
use crate::config::Config;
use crate::matcher;
use crate::metadata::{Episodes, MediaMetadata};
use crate::search::{SearchError, SubtitleListing, SubtitleSearch};

/// Errors that can occur while resolving a title group
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Error talking to the subtitle service
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Error handling a fetched archive
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Error writing a subtitle file
    #[error("Failed to write subtitle {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// A local video file waiting for a subtitle
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub meta: MediaMetadata,
    pub path: PathBuf,
    /// Set once a subtitle has been written for this file; checked before
    /// every matching attempt so no file is written twice
    pub downloaded: bool,
}

/// All local files sharing one normalized title, processed together.
/// Membership never changes after construction; only the members'
/// `downloaded` flags mutate.
#[derive(Debug)]
pub struct TitleGroup {
    pub title: String,
    pub files: Vec<LocalFile>,
}

impl TitleGroup {
    pub fn is_satisfied(&self) -> bool {
        self.files.iter().all(|f| f.downloaded)
    }

    /// Episode numbers of the files still waiting for a subtitle.
    fn outstanding_episodes(&self) -> BTreeSet<u32> {
        self.files
            .iter()
            .filter(|f| !f.downloaded)
            .filter_map(|f| f.meta.episodes.as_ref())
            .flat_map(|e| e.to_set())
            .collect()
    }
}

/// A remote listing together with its normalized metadata
#[derive(Debug)]
pub struct RemoteCandidate {
    pub meta: MediaMetadata,
    pub listing: SubtitleListing,
}

/// Groups discovered video paths by normalized title. Paths whose names
/// yield no usable metadata are silently excluded.
pub fn group_by_title(paths: Vec<PathBuf>) -> Vec<TitleGroup> {
    let mut groups: BTreeMap<String, Vec<LocalFile>> = BTreeMap::new();

    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(meta) = MediaMetadata::from_local_name(name) else {
            continue;
        };
        groups.entry(meta.title.clone()).or_default().push(LocalFile {
            meta,
            path,
            downloaded: false,
        });
    }

    groups
        .into_iter()
        .map(|(title, files)| TitleGroup { title, files })
        .collect()
}

/// Turns raw listings into matchable candidates: drops listings in other
/// languages before they ever reach the matcher, then normalizes the rest.
pub fn collect_candidates(listings: Vec<SubtitleListing>, config: &Config) -> Vec<RemoteCandidate> {
    listings
        .into_iter()
        .filter(|listing| listing.language == config.wanted_language)
        .filter_map(|listing| {
            MediaMetadata::from_listing_name(&listing.title, config.season_pack_threshold)
                .map(|meta| RemoteCandidate { meta, listing })
        })
        .collect()
}

/// Runs the full per-title workflow: pack pass, then single-file fallback.
/// Returns the number of subtitles written.
pub fn process_group<S, F>(
    group: &mut TitleGroup,
    candidates: &[RemoteCandidate],
    search: &S,
    out_dir: Option<&Path>,
    progress: &mut F,
) -> Result<usize, DownloadError>
where
    S: SubtitleSearch,
    F: FnMut(ProgressEvent),
{
    let mut written = 0;

    // Season packs have priority: one archive can satisfy the whole group.
    for candidate in candidates.iter().filter(|c| c.meta.is_season_pack) {
        if group.is_satisfied() {
            break;
        }

        // A pack declaring its episodes is only worth fetching when it
        // overlaps what is still outstanding.
        if let Some(Episodes::Set(declared)) = &candidate.meta.episodes {
            let outstanding = group.outstanding_episodes();
            if declared.is_disjoint(&outstanding) {
                progress(ProgressEvent::PackSkipped {
                    name: candidate.listing.title.clone(),
                });
                continue;
            }
        }

        progress(ProgressEvent::TryingPack {
            name: candidate.listing.title.clone(),
        });
        let bytes = search.fetch_archive(&candidate.listing)?;
        let mut archive = SubtitleArchive::open(bytes)?;
        written += resolve_pack(group, &mut archive, out_dir, progress)?;
    }

    // Single-file fallback for whatever the packs did not cover:
    // first match wins, no best-match scoring.
    for file in group.files.iter_mut().filter(|f| !f.downloaded) {
        for candidate in candidates.iter().filter(|c| !c.meta.is_season_pack) {
            if !matcher::is_exact_match(&file.meta, &candidate.meta) {
                continue;
            }
            let bytes = search.fetch_archive(&candidate.listing)?;
            let mut archive = SubtitleArchive::open(bytes)?;
            if let Some(entry) = archive.first_entry()? {
                if let Some(destination) = subtitle_destination(&file.path, &entry.name, out_dir) {
                    write_subtitle(&destination, &entry.bytes)?;
                    file.downloaded = true;
                    written += 1;
                    progress(ProgressEvent::Downloaded { destination });
                }
            }
            break;
        }
    }

    Ok(written)
}

/// Writes every archive entry that matches a pending file in the group.
///
/// One entry may satisfy several pending files (ambiguous episode sets),
/// so the inner loop never short-circuits after the first hit.
fn resolve_pack<F>(
    group: &mut TitleGroup,
    archive: &mut SubtitleArchive,
    out_dir: Option<&Path>,
    progress: &mut F,
) -> Result<usize, DownloadError>
where
    F: FnMut(ProgressEvent),
{
    let mut written = 0;

    for entry in archive.entries()? {
        let Some(entry_meta) = MediaMetadata::from_entry_name(&entry.name) else {
            continue;
        };
        for file in group.files.iter_mut().filter(|f| !f.downloaded) {
            if !matcher::is_match(&file.meta, &entry_meta) {
                continue;
            }
            let Some(destination) = subtitle_destination(&file.path, &entry.name, out_dir) else {
                continue;
            };
            write_subtitle(&destination, &entry.bytes)?;
            file.downloaded = true;
            written += 1;
            progress(ProgressEvent::Downloaded { destination });
        }
    }

    Ok(written)
}

/// Derives the destination path: the video's stem with the entry's own
/// subtitle extension, next to the video or in the override directory.
/// Entries without an extension have no usable destination.
fn subtitle_destination(video: &Path, entry_name: &str, out_dir: Option<&Path>) -> Option<PathBuf> {
    let extension = Path::new(entry_name).extension().and_then(|e| e.to_str())?;
    let stem = video.file_stem().and_then(|s| s.to_str())?;

    // Built by concatenation: the stem usually contains dots itself, so
    // Path::with_extension would eat part of it.
    let file_name = format!("{stem}.{extension}");
    Some(match out_dir {
        Some(dir) => dir.join(file_name),
        None => video.with_file_name(file_name),
    })
}

fn write_subtitle(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    fs::write(path, bytes).map_err(|e| DownloadError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::zip_fixture;
    use crate::search::testing::{ScriptedSearch, listing};
    use std::collections::HashMap;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    fn group_for(dir: &Path, names: &[&str]) -> TitleGroup {
        let paths = names.iter().map(|n| {
            let path = dir.join(n);
            touch(&path);
            path
        });
        let mut groups = group_by_title(paths.collect());
        assert_eq!(groups.len(), 1, "fixture names must share one title");
        groups.remove(0)
    }

    fn run(
        group: &mut TitleGroup,
        search: &ScriptedSearch,
        config: &Config,
    ) -> Result<usize, DownloadError> {
        let listings = search.search(&group.title).unwrap();
        let candidates = collect_candidates(listings, config);
        process_group(group, &candidates, search, None, &mut |_| {})
    }

    #[test]
    fn groups_by_normalized_title_and_skips_unparseable_names() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ["Show.S01E01.mkv", "Show.S01E02.mkv", "Other.S01E01.mkv", "S01E01.mkv"]
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                touch(&p);
                p
            })
            .collect();

        let groups = group_by_title(paths);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Other");
        assert_eq!(groups[1].title, "Show");
        assert_eq!(groups[1].files.len(), 2);
    }

    #[test]
    fn candidates_in_other_languages_never_reach_the_matcher() {
        let config = Config::default();
        let listings = vec![
            listing("Show.S01E01", "English", "a"),
            listing("Show.S01E01", "French", "b"),
        ];
        let candidates = collect_candidates(listings, &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].listing.download_url, "a");
    }

    // Scenario A: two files, below the pack threshold, resolved per file.
    #[test]
    fn small_group_falls_through_to_single_file_matching() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["Show.S01E01.mkv", "Show.S01E02.mkv"]);

        let archives = HashMap::from([
            ("e1".to_string(), zip_fixture(&[("Show.S01E01.srt", b"one".as_slice())])),
            ("e2".to_string(), zip_fixture(&[("Show.S01E02.srt", b"two".as_slice())])),
        ]);
        let search = ScriptedSearch::new(
            vec![
                listing("Show.S01E01.WEB", "English", "e1"),
                listing("Show.S01E02.WEB", "English", "e2"),
            ],
            archives,
        );

        let written = run(&mut group, &search, &Config::default()).unwrap();
        assert_eq!(written, 2);
        assert!(group.is_satisfied());
        assert_eq!(search.fetch_count(), 2);
        assert_eq!(fs::read(dir.path().join("Show.S01E01.srt")).unwrap(), b"one");
        assert_eq!(fs::read(dir.path().join("Show.S01E02.srt")).unwrap(), b"two");
    }

    // Scenario B: six files, one matching pack, one archive fetch total.
    #[test]
    fn season_pack_satisfies_whole_group_with_one_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = (1..=6).map(|n| format!("Show.S01E{n:02}.mkv")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut group = group_for(dir.path(), &name_refs);

        let entries: Vec<(String, Vec<u8>)> = (1..=6)
            .map(|n| (format!("Show.S01E{n:02}.srt"), format!("sub {n}").into_bytes()))
            .collect();
        let entry_refs: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(n, b)| (n.as_str(), b.as_slice()))
            .collect();

        let archives = HashMap::from([
            ("pack".to_string(), zip_fixture(&entry_refs)),
            ("e3".to_string(), zip_fixture(&[("Show.S01E03.srt", b"decoy".as_slice())])),
        ]);
        let search = ScriptedSearch::new(
            vec![
                listing("Show.S01.Complete.720p", "English", "pack"),
                listing("Show.S01E03.WEB", "English", "e3"),
            ],
            archives,
        );

        let written = run(&mut group, &search, &Config::default()).unwrap();
        assert_eq!(written, 6);
        assert!(group.is_satisfied());
        // the whole group came out of the single pack fetch
        assert_eq!(search.fetched.borrow().as_slice(), ["pack"]);
        assert_eq!(fs::read(dir.path().join("Show.S01E04.srt")).unwrap(), b"sub 4");
    }

    // Scenario C: a pack declaring a disjoint episode set is skipped
    // without a network call.
    #[test]
    fn disjoint_pack_is_skipped_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["Show.S01E05.mkv"]);

        let config = Config {
            season_pack_threshold: 2,
            ..Config::default()
        };

        let archives = HashMap::from([(
            "e5".to_string(),
            zip_fixture(&[("Show.S01E05.srt", b"five".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![
                listing("Show.S01E01-E02.pack", "English", "early-pack"),
                listing("Show.S01E05.WEB", "English", "e5"),
            ],
            archives,
        );

        let written = run(&mut group, &search, &config).unwrap();
        assert_eq!(written, 1);
        // the declared {1,2} pack was never fetched
        assert_eq!(search.fetched.borrow().as_slice(), ["e5"]);
    }

    // Scenario D: date-based identity for content without episode numbers.
    #[test]
    fn daily_show_matches_by_air_date() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["NewsShow.2021-05-01.mkv"]);

        let archives = HashMap::from([(
            "daily".to_string(),
            zip_fixture(&[("NewsShow.2021.05.01.srt", b"daily".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("NewsShow.2021.05.01.720p", "English", "daily")],
            archives,
        );

        let written = run(&mut group, &search, &Config::default()).unwrap();
        assert_eq!(written, 1);
        assert_eq!(fs::read(dir.path().join("NewsShow.2021-05-01.srt")).unwrap(), b"daily");
    }

    #[test]
    fn one_entry_may_satisfy_several_pending_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["Show.S01E01-E02.mkv", "Show.S01E02.mkv"]);

        let archives = HashMap::from([(
            "pack".to_string(),
            zip_fixture(&[("Show.S01E02.srt", b"two".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("Show.S01.Complete", "English", "pack")],
            archives,
        );

        let written = run(&mut group, &search, &Config::default()).unwrap();
        // the double-episode file intersects {2}, the single file equals it
        assert_eq!(written, 2);
        assert!(group.is_satisfied());
        assert!(dir.path().join("Show.S01E01-E02.srt").exists());
        assert!(dir.path().join("Show.S01E02.srt").exists());
    }

    #[test]
    fn satisfied_group_stops_consuming_pack_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["Show.S01E01.mkv"]);

        let archives = HashMap::from([(
            "pack1".to_string(),
            zip_fixture(&[("Show.S01E01.srt", b"one".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![
                listing("Show.S01.Complete", "English", "pack1"),
                listing("Show.S01.REPACK.Complete", "English", "pack2"),
            ],
            archives,
        );

        let written = run(&mut group, &search, &Config::default()).unwrap();
        assert_eq!(written, 1);
        // pack2 was never needed, hence never fetched
        assert_eq!(search.fetched.borrow().as_slice(), ["pack1"]);
    }

    #[test]
    fn downloaded_files_are_excluded_from_every_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["Show.S01E01.mkv"]);
        group.files[0].downloaded = true;

        let archives = HashMap::from([
            ("pack".to_string(), zip_fixture(&[("Show.S01E01.srt", b"p".as_slice())])),
            ("e1".to_string(), zip_fixture(&[("Show.S01E01.srt", b"s".as_slice())])),
        ]);
        let search = ScriptedSearch::new(
            vec![
                listing("Show.S01.Complete", "English", "pack"),
                listing("Show.S01E01.WEB", "English", "e1"),
            ],
            archives,
        );

        let written = run(&mut group, &search, &Config::default()).unwrap();
        assert_eq!(written, 0);
        assert_eq!(search.fetch_count(), 0);
    }

    #[test]
    fn output_directory_override_redirects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["Show.S01E01.mkv"]);

        let archives = HashMap::from([(
            "e1".to_string(),
            zip_fixture(&[("Subs/Show.S01E01.ass", b"styled".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("Show.S01E01.WEB", "English", "e1")],
            archives,
        );

        let listings = search.search(&group.title).unwrap();
        let candidates = collect_candidates(listings, &Config::default());
        let written =
            process_group(&mut group, &candidates, &search, Some(out.path()), &mut |_| {}).unwrap();

        assert_eq!(written, 1);
        // stem from the video, extension from the archive entry
        assert_eq!(fs::read(out.path().join("Show.S01E01.ass")).unwrap(), b"styled");
        assert!(!dir.path().join("Show.S01E01.ass").exists());
    }

    #[test]
    fn movie_groups_match_on_title_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = group_for(dir.path(), &["Some.Film.2019.1080p.mkv"]);

        let archives = HashMap::from([(
            "m".to_string(),
            zip_fixture(&[("Some.Film.2019.BluRay.srt", b"movie".as_slice())]),
        )]);
        let search = ScriptedSearch::new(
            vec![listing("Some.Film.2019.BluRay", "English", "m")],
            archives,
        );

        let written = run(&mut group, &search, &Config::default()).unwrap();
        assert_eq!(written, 1);
        assert!(dir.path().join("Some.Film.2019.1080p.srt").exists());
    }
}
