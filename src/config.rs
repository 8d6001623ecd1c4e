use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use url::Url;

use crate::error::PosterError;
use crate::sizes::ThumbnailSize;

/// Environment variable holding the metadata API key.
pub const API_KEY_VAR: &str = "OMDBAPIKEY";
/// Optional override of the metadata endpoint.
pub const BASE_URL_VAR: &str = "OMDB_URL";
pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_JPEG_QUALITY: u8 = 90;
/// Destination used by single-URL mode.
pub const DEFAULT_OUTPUT: &str = "thumbnail.jpg";

/// The metadata API key. `Debug` does not print the value.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Runtime settings gathered from the environment and command-line flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: ApiKey,
    pub base_url: Url,
    pub timeout: Duration,
    pub size: ThumbnailSize,
    pub jpeg_quality: u8,
}

impl Settings {
    pub fn new(api_key: ApiKey, base_url: Url) -> Self {
        Self {
            api_key,
            base_url,
            timeout: DEFAULT_TIMEOUT,
            size: ThumbnailSize::POSTER,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Reads `OMDBAPIKEY` (required) and `OMDB_URL` (optional).
    pub fn from_env() -> Result<Self, PosterError> {
        let api_key = env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(PosterError::MissingApiKey(API_KEY_VAR))?;

        let base_url = match env::var(BASE_URL_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Url::parse(raw.trim())?,
            _ => Url::parse(DEFAULT_BASE_URL)?,
        };
        debug!("Using metadata endpoint {}", base_url);

        Ok(Self::new(ApiKey::new(api_key.trim()), base_url))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

/// What a single run does, decided from the optional command-line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Download one image and write it to a fixed destination.
    SingleUrl(Url),
    /// Walk a directory tree for disc images.
    Scan(PathBuf),
}

impl Mode {
    /// Arguments starting with `http://` or `https://` are image URLs; anything
    /// else is a scan root, made absolute against `cwd`. No argument scans `cwd`.
    ///
    /// The prefix check does not recognise other absolute URL forms (e.g. `ftp://`),
    /// which are treated as paths.
    pub fn from_arg(arg: Option<&str>, cwd: &Path) -> Result<Self, PosterError> {
        let Some(arg) = arg else {
            return Ok(Mode::Scan(cwd.to_path_buf()));
        };

        if is_http_url(arg) {
            let url = Url::parse(arg).map_err(|e| PosterError::InvalidUrl {
                url: arg.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Mode::SingleUrl(url));
        }

        let path = Path::new(arg);
        if path.is_absolute() {
            Ok(Mode::Scan(path.to_path_buf()))
        } else {
            Ok(Mode::Scan(cwd.join(path)))
        }
    }
}

/// Literal `http://` / `https://` prefix check.
pub fn is_http_url(candidate: &str) -> bool {
    candidate.starts_with("http://") || candidate.starts_with("https://")
}
