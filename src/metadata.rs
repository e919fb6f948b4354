//! Canonical media metadata shared by local video files, remote subtitle
//! listings, and archive entries.
//!
//! The normalizer turns raw names into [`MediaMetadata`] records: titles are
//! NFKD-folded so visually identical strings group together, a missing season
//! marker means season 1, and remote listings are classified as season packs
//! once, at construction.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

use crate::name_parser::{self, NameKind};

/// Content classification; names that fit neither kind are excluded from
/// matching before they get here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Movie,
    Episode,
}

/// Episode numbering of a file or listing: a single episode or an ordered
/// set of them (multi-episode file, bundled release).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Episodes {
    Single(u32),
    Set(BTreeSet<u32>),
}

impl Episodes {
    pub fn contains(&self, episode: u32) -> bool {
        match self {
            Episodes::Single(n) => *n == episode,
            Episodes::Set(set) => set.contains(&episode),
        }
    }

    /// True when the two values share at least one episode number,
    /// treating scalars as singleton sets.
    pub fn intersects(&self, other: &Episodes) -> bool {
        match self {
            Episodes::Single(n) => other.contains(*n),
            Episodes::Set(set) => set.iter().any(|n| other.contains(*n)),
        }
    }

    pub fn to_set(&self) -> BTreeSet<u32> {
        match self {
            Episodes::Single(n) => BTreeSet::from([*n]),
            Episodes::Set(set) => set.clone(),
        }
    }

    fn from_numbers(numbers: Vec<u32>) -> Option<Episodes> {
        let set: BTreeSet<u32> = numbers.into_iter().collect();
        match set.len() {
            0 => None,
            1 => set.first().copied().map(Episodes::Single),
            _ => Some(Episodes::Set(set)),
        }
    }
}

/// Canonical metadata record produced for every name entering the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub content_type: ContentType,
    /// NFKD-normalized title, the grouping key for local files
    pub title: String,
    /// Season number; names without a season marker are treated as season 1
    pub season: u32,
    /// None means "whole season or unspecified"
    pub episodes: Option<Episodes>,
    /// Alternate identity key for content without reliable episode numbers
    pub air_date: Option<NaiveDate>,
    /// Whether a remote listing is believed to bundle a season's worth of
    /// subtitles; decided once at construction, never recomputed
    pub is_season_pack: bool,
}

impl MediaMetadata {
    /// Normalizes a local video file name. Returns None when no usable
    /// title can be extracted; such files are skipped, not retried.
    pub fn from_local_name(raw: &str) -> Option<MediaMetadata> {
        Self::from_parsed(name_parser::parse(raw), false)
    }

    /// Normalizes a remote listing name. Scraped titles use inconsistent
    /// typography, so punctuation variants are canonicalized before
    /// parsing, and the pack heuristic runs against `pack_threshold`.
    pub fn from_listing_name(raw: &str, pack_threshold: usize) -> Option<MediaMetadata> {
        let canonical = canonicalize_punctuation(raw);
        let mut meta = Self::from_parsed(name_parser::parse(&canonical), false)?;
        meta.is_season_pack = is_season_pack(&meta, pack_threshold);
        Some(meta)
    }

    /// Normalizes an archive entry name. An entry is never itself a pack.
    pub fn from_entry_name(raw: &str) -> Option<MediaMetadata> {
        let file_name = raw.rsplit('/').next().unwrap_or(raw);
        let canonical = canonicalize_punctuation(file_name);
        Self::from_parsed(name_parser::parse(&canonical), false)
    }

    fn from_parsed(parsed: name_parser::ParsedName, is_season_pack: bool) -> Option<MediaMetadata> {
        let title: String = parsed.title?.nfkd().collect();

        let content_type = match parsed.kind {
            NameKind::Movie => ContentType::Movie,
            NameKind::Episode => ContentType::Episode,
        };

        Some(MediaMetadata {
            content_type,
            title,
            season: parsed.season.unwrap_or(1),
            episodes: Episodes::from_numbers(parsed.episodes),
            air_date: parsed.date,
            is_season_pack,
        })
    }
}

/// Season-pack heuristic: an episode listing with no episode marker at all,
/// or one bundling at least `threshold` episodes. False positives and
/// negatives are possible and accepted.
fn is_season_pack(meta: &MediaMetadata, threshold: usize) -> bool {
    if meta.content_type != ContentType::Episode {
        return false;
    }
    match &meta.episodes {
        None => true,
        Some(Episodes::Set(set)) => set.len() >= threshold,
        Some(Episodes::Single(_)) => false,
    }
}

/// Maps the punctuation variants seen in scraped listing titles (em/en
/// dashes, CJK vowel fillers, interpuncts, general-punctuation spaces and
/// dots) onto plain `-` and `.` so the parser tokenizes them consistently.
fn canonicalize_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{3161}' | '\u{1173}' | '\u{FFDA}' => '-',
            '\u{00B7}' | '\u{22C5}' | '\u{318D}' => '.',
            '\u{2000}'..='\u{206F}' => '.',
            other => other,
        })
        .collect()
}
