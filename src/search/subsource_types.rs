/// SubSource API response types for deserialization.
///
/// These structures mirror the JSON response format of the search endpoint.
use serde::Deserialize;

/// The top-level response from the subtitle search endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    /// All listings known for the searched title
    pub subtitles: Vec<WireListing>,
}

/// A single subtitle listing from the API.
#[derive(Debug, Deserialize)]
pub(super) struct WireListing {
    /// The release name the subtitle was published under
    pub release_name: String,
    /// Language the subtitle is written in
    pub language: String,
    /// Direct link to the zipped subtitle
    pub download_url: String,
}
