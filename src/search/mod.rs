/// Remote subtitle search.
///
/// This module provides the seam to the external subtitle service: a trait
/// for searching listings by title and fetching a listing's zipped archive,
/// plus the HTTP implementation against the SubSource API.
mod subsource;
mod subsource_types;

pub use subsource::SubSourceClient;

use thiserror::Error;

/// Errors that can occur while talking to the subtitle service.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Request to the subtitle service failed
    #[error("Search request failed: {0}")]
    RequestError(String),

    /// Failed to parse the service's JSON response
    #[error("Failed to parse search response: {0}")]
    ParseError(String),

    /// The service knows no listings for the searched title
    #[error("No subtitle listings found for: {0}")]
    TitleNotFound(String),

    /// A listing's archive could not be downloaded
    #[error("Failed to download subtitle archive from {url}: {reason}")]
    DownloadFailed { url: String, reason: String },
}

/// One remote subtitle listing as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleListing {
    /// Listing title as published; the input to metadata normalization
    pub title: String,
    /// Subtitle language as published by the service
    pub language: String,
    /// Where the zipped subtitle can be fetched
    pub download_url: String,
}

/// Trait for subtitle services that can be searched by title.
///
/// Listings come back in service order and are consumed once per title
/// group; re-iterating a search result is not part of the contract.
pub trait SubtitleSearch {
    /// Searches the service for listings under the given title.
    fn search(&self, title: &str) -> Result<Vec<SubtitleListing>, SearchError>;

    /// Fetches the zipped archive behind a listing.
    fn fetch_archive(&self, listing: &SubtitleListing) -> Result<Vec<u8>, SearchError>;
}
