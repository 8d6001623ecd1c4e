use log::debug;
use reqwest::blocking::Client;

use crate::config::Settings;
use crate::error::PosterError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the one HTTP client shared by the metadata lookup and image downloads.
pub fn build_client(settings: &Settings) -> Result<Client, PosterError> {
    debug!("Building HTTP client with timeout {:?}", settings.timeout);
    Ok(Client::builder()
        .timeout(settings.timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Somewhere image bytes can be fetched from.
pub trait ImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PosterError>;
}

/// Downloads images over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PosterError> {
        debug!("Downloading image from {}", url);
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
