use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::config::{ApiKey, Settings};
use crate::error::PosterError;

/// The metadata provider's way of saying "no poster".
pub const POSTER_NOT_AVAILABLE: &str = "N/A";

/// One movie record as returned by the metadata provider.
///
/// Every field is optional; the provider omits fields freely and reports
/// failed lookups through `Response`/`Error` instead of an HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieRecord {
    pub title: Option<String>,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub poster: Option<String>,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl MovieRecord {
    /// The poster URL, treating absent, empty and `"N/A"` alike.
    pub fn poster_url(&self) -> Option<&str> {
        self.poster
            .as_deref()
            .map(str::trim)
            .filter(|poster| !poster.is_empty() && *poster != POSTER_NOT_AVAILABLE)
    }
}

/// Looks up a movie by title and year.
pub trait MovieLookup {
    fn lookup(&self, title: &str, year: &str) -> Result<MovieRecord, PosterError>;
}

/// Client for the OMDb-style metadata endpoint.
#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: Url,
    api_key: ApiKey,
}

impl OmdbClient {
    pub fn new(client: Client, base_url: Url, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub fn from_settings(client: Client, settings: &Settings) -> Self {
        Self::new(client, settings.base_url.clone(), settings.api_key.clone())
    }

    /// Builds `base?apikey=..&t=..&y=..` with every value escaped on its own.
    pub fn request_url(&self, title: &str, year: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("apikey", self.api_key.as_str())
            .append_pair("t", title)
            .append_pair("y", year);
        url
    }
}

impl MovieLookup for OmdbClient {
    fn lookup(&self, title: &str, year: &str) -> Result<MovieRecord, PosterError> {
        info!("Looking up {:?} ({})", title, year);
        let url = self.request_url(title, year);
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        decode_record(&body, title, year)
    }
}

/// Decodes a response body, turning `"Response":"False"` into `MovieNotFound`.
pub fn decode_record(body: &str, title: &str, year: &str) -> Result<MovieRecord, PosterError> {
    let record: MovieRecord = serde_json::from_str(body)?;
    if record.response.as_deref() == Some("False") {
        return Err(PosterError::MovieNotFound {
            title: title.to_string(),
            year: year.to_string(),
            reason: record
                .error
                .unwrap_or_else(|| "provider returned no record".to_string()),
        });
    }
    debug!("Decoded record {:?}", record);
    Ok(record)
}
