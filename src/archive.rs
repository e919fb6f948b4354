//! In-memory zip archive facility
//!
//! Remote subtitle downloads arrive as zip archives; this module wraps the
//! response body and exposes the entries in archive order. Handles are
//! scoped per candidate: opened, consumed, and dropped before the next one.

use std::io::{self, Cursor, Read};
use thiserror::Error;
use zip::ZipArchive;

/// Errors that can occur while handling a subtitle archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The response body is not a readable zip archive
    #[error("Response body is not a usable zip archive: {0}")]
    InvalidArchive(#[from] zip::result::ZipError),

    /// An entry's bytes could not be read
    #[error("Failed to read archive entry {name}: {source}")]
    EntryReadFailed { name: String, source: io::Error },
}

/// One file inside a subtitle archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name as stored, possibly with an internal directory prefix
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A fetched subtitle archive held fully in memory
pub struct SubtitleArchive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl SubtitleArchive {
    pub fn open(bytes: Vec<u8>) -> Result<SubtitleArchive, ArchiveError> {
        Ok(SubtitleArchive {
            archive: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// All file entries in archive order; directory entries are skipped.
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut entries = Vec::new();
        for index in 0..self.archive.len() {
            if let Some(entry) = self.read_entry(index)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// The first file entry, if the archive contains one.
    pub fn first_entry(&mut self) -> Result<Option<ArchiveEntry>, ArchiveError> {
        for index in 0..self.archive.len() {
            if let Some(entry) = self.read_entry(index)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    fn read_entry(&mut self, index: usize) -> Result<Option<ArchiveEntry>, ArchiveError> {
        let mut file = self.archive.by_index(index)?;
        if file.is_dir() {
            return Ok(None);
        }
        let name = file.name().to_string();
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::EntryReadFailed {
                name: name.clone(),
                source: e,
            })?;
        Ok(Some(ArchiveEntry { name, bytes }))
    }
}

/// Builds an in-memory zip for tests.
#[cfg(test)]
pub(crate) fn zip_fixture(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
