//! Video file discovery
//!
//! Enumerates candidate video files that still need subtitles. A file
//! qualifies when its extension is in the configured video set and no
//! sibling file shares its stem prefix with a subtitle extension. The
//! result is a finite sequence consumed exactly once per run.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::Config;

/// Errors that can occur during discovery
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Failed to walk the directory tree
    #[error("Failed to walk directory {path}: {source}")]
    WalkFailed {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Failed to list a directory
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed { path: PathBuf, source: io::Error },
}

/// Finds the video files under `path` that still need a subtitle.
///
/// A directory is searched recursively; a single file is checked against
/// its own siblings; anything else yields an empty sequence.
pub fn find_video_files(path: &Path, config: &Config) -> Result<Vec<PathBuf>, DiscoveryError> {
    if path.is_dir() {
        find_in_tree(path, config)
    } else if path.is_file() && has_extension_in(path, &config.video_extensions) {
        find_single(path, config)
    } else {
        Ok(Vec::new())
    }
}

fn find_in_tree(root: &Path, config: &Config) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| DiscoveryError::WalkFailed {
            path: root.to_path_buf(),
            source: e,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    let mut names_by_dir: HashMap<&Path, Vec<&str>> = HashMap::new();
    for file in &files {
        if let (Some(parent), Some(name)) = (file.parent(), file.file_name().and_then(|n| n.to_str())) {
            names_by_dir.entry(parent).or_default().push(name);
        }
    }

    Ok(files
        .iter()
        .filter(|file| has_extension_in(file, &config.video_extensions))
        .filter(|file| {
            let siblings = file.parent().and_then(|p| names_by_dir.get(p));
            match siblings {
                Some(names) => !has_subtitle_sibling(file, names, config),
                None => true,
            }
        })
        .cloned()
        .collect())
}

fn find_single(path: &Path, config: &Config) -> Result<Vec<PathBuf>, DiscoveryError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut names = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| DiscoveryError::ReadDirectoryFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| DiscoveryError::ReadDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    if has_subtitle_sibling(path, &name_refs, config) {
        Ok(Vec::new())
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

/// True when any sibling name starts with the video's stem and carries a
/// subtitle extension.
fn has_subtitle_sibling(video: &Path, sibling_names: &[&str], config: &Config) -> bool {
    let Some(stem) = video.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    sibling_names.iter().any(|name| {
        name.starts_with(stem)
            && Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| config.subtitle_extensions.contains(&ext.to_ascii_lowercase()))
    })
}

fn has_extension_in(path: &Path, extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_ascii_lowercase()))
}
