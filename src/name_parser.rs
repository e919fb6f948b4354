//! Scene-style release name parser
//!
//! Extracts the fields the matcher cares about from names like:
//! - "Show.Name.S01E03.1080p.WEB.h264-GROUP.mkv"
//! - "Show Name - S02E01E02 - Double Feature.srt"
//! - "The.News.Hour.2021.05.01.720p.HDTV.mkv"
//! - "Some Film 2019 BluRay x264.mkv"

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// What kind of content a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameKind {
    Movie,
    Episode,
}

/// Raw extraction result, before normalization
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedName {
    /// Extracted title, None when nothing usable was found
    pub title: Option<String>,
    pub kind: NameKind,
    pub season: Option<u32>,
    /// Episode numbers in the order they appear; empty when the name
    /// carries no episode marker
    pub episodes: Vec<u32>,
    /// Air date for daily-show style names
    pub date: Option<NaiveDate>,
}

static SEASON_EPISODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[\s._-]*\bs(?P<season>\d{1,2})(?P<eps>(?:[\s._-]*e\d{1,3})*)")
        .unwrap()
});

static NXNN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[\s._-]*\b(?P<season>\d{1,2})x(?P<episode>\d{2,3})\b").unwrap()
});

static VERBOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<title>.*?)[\s._-]*\bseason[\s._-]*(?P<season>\d{1,2})(?:[\s._-]*episode[\s._-]*(?P<episode>\d{1,3}))?",
    )
    .unwrap()
});

static BARE_EPISODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[\s._-]*\be(?:p(?:isode)?)?[\s._-]*(?P<episode>\d{1,3})\b")
        .unwrap()
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<title>.*?)[\s._-]*\b(?P<y>19\d{2}|20\d{2})[\s._-](?P<m>\d{2})[\s._-](?P<d>\d{2})\b")
        .unwrap()
});

static EPISODE_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)e(\d{1,3})").unwrap());

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

static QUALITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|720p|480p|4k|uhd|blu[\s._-]?ray|bdrip|web[\s._-]?dl|webrip|hdtv|x26[45]|h[\s._-]?26[45]|hevc|xvid|divx)\b",
    )
    .unwrap()
});

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z][A-Za-z0-9]{1,4}$").unwrap());

/// Parses a file or listing name into its media fields.
///
/// The ladder goes from the most to the least specific marker: SxxEyy
/// (including multi-episode runs and ranges), NxNN, verbose
/// "Season X Episode Y", a full air date, and finally the movie fallback.
pub(crate) fn parse(raw: &str) -> ParsedName {
    let name = EXTENSION_RE.replace(raw, "");

    if let Some(caps) = SEASON_EPISODE_RE.captures(&name) {
        let episodes = parse_episode_run(&caps["eps"]);
        return ParsedName {
            title: clean_title(&caps["title"]),
            kind: NameKind::Episode,
            season: caps["season"].parse().ok(),
            episodes,
            date: None,
        };
    }

    if let Some(caps) = NXNN_RE.captures(&name) {
        return ParsedName {
            title: clean_title(&caps["title"]),
            kind: NameKind::Episode,
            season: caps["season"].parse().ok(),
            episodes: caps["episode"].parse().into_iter().collect(),
            date: None,
        };
    }

    if let Some(caps) = VERBOSE_RE.captures(&name) {
        let episodes = caps
            .name("episode")
            .and_then(|m| m.as_str().parse().ok())
            .into_iter()
            .collect();
        return ParsedName {
            title: clean_title(&caps["title"]),
            kind: NameKind::Episode,
            season: caps["season"].parse().ok(),
            episodes,
            date: None,
        };
    }

    if let Some(caps) = BARE_EPISODE_RE.captures(&name) {
        return ParsedName {
            title: clean_title(&caps["title"]),
            kind: NameKind::Episode,
            season: None,
            episodes: caps["episode"].parse().into_iter().collect(),
            date: None,
        };
    }

    if let Some(caps) = DATE_RE.captures(&name) {
        let date = NaiveDate::from_ymd_opt(
            caps["y"].parse().unwrap_or(0),
            caps["m"].parse().unwrap_or(0),
            caps["d"].parse().unwrap_or(0),
        );
        if let Some(date) = date {
            return ParsedName {
                title: clean_title(&caps["title"]),
                kind: NameKind::Episode,
                season: None,
                episodes: Vec::new(),
                date: Some(date),
            };
        }
    }

    ParsedName {
        title: clean_title(movie_title(&name)),
        kind: NameKind::Movie,
        season: None,
        episodes: Vec::new(),
        date: None,
    }
}

/// Expands an episode-marker run ("E01", "E01E02", "E01-E03") into numbers.
///
/// A dash between exactly two markers is treated as an inclusive range.
fn parse_episode_run(run: &str) -> Vec<u32> {
    let numbers: Vec<u32> = EPISODE_NUM_RE
        .captures_iter(run)
        .filter_map(|caps| caps[1].parse().ok())
        .collect();

    if numbers.len() == 2 && run.contains('-') && numbers[0] < numbers[1] {
        return (numbers[0]..=numbers[1]).collect();
    }

    numbers
}

/// Cuts a movie name down to its title: everything before the first
/// year or quality token.
fn movie_title(name: &str) -> &str {
    let cut = YEAR_RE
        .find(name)
        .map(|m| m.start())
        .into_iter()
        .chain(QUALITY_RE.find(name).map(|m| m.start()))
        .min()
        .unwrap_or(name.len());
    &name[..cut]
}

/// Turns the raw title prefix into a displayable title, or None when
/// nothing remains after cleanup.
fn clean_title(raw: &str) -> Option<String> {
    let cleaned = raw.replace(['.', '_'], " ");
    let cleaned = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string();

    if cleaned.is_empty() { None } else { Some(cleaned) }
}
