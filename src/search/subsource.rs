/// SubSource search provider implementation.
use super::subsource_types::SearchResponse;
use super::{SearchError, SubtitleListing, SubtitleSearch};

/// Subtitle provider for the SubSource API.
///
/// Searches https://api.subsource.net for listings by title and downloads
/// the zipped subtitles it links to.
pub struct SubSourceClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl SubSourceClient {
    /// Creates a new SubSource client instance.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: "https://api.subsource.net/v1".to_string(),
        }
    }
}

impl Default for SubSourceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SubtitleSearch for SubSourceClient {
    fn search(&self, title: &str) -> Result<Vec<SubtitleListing>, SearchError> {
        let url = format!("{}/subtitles/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("title", title)])
            .send()
            .map_err(|e| SearchError::RequestError(e.to_string()))?;

        if response.status() == 404 {
            return Err(SearchError::TitleNotFound(title.to_string()));
        }

        if !response.status().is_success() {
            return Err(SearchError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        Ok(parsed
            .subtitles
            .into_iter()
            .map(|listing| SubtitleListing {
                title: listing.release_name,
                language: listing.language,
                download_url: listing.download_url,
            })
            .collect())
    }

    fn fetch_archive(&self, listing: &SubtitleListing) -> Result<Vec<u8>, SearchError> {
        let response = self
            .client
            .get(&listing.download_url)
            .send()
            .map_err(|e| SearchError::DownloadFailed {
                url: listing.download_url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::DownloadFailed {
                url: listing.download_url.clone(),
                reason: format!("HTTP {}", response.status().as_u16()),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| SearchError::DownloadFailed {
                url: listing.download_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(bytes.to_vec())
    }
}
