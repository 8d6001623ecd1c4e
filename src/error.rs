use std::path::PathBuf;

use thiserror::Error;

/// A unified error type for the poster library.
#[derive(Error, Debug)]
pub enum PosterError {
    /// Wraps errors originating from the `image` crate.
    #[error("Image crate error: {0}")]
    Image(#[from] image::ImageError),

    /// Wraps errors originating from the `fast_image_resize` crate.
    #[error("Fast image resize error: {0}")]
    FastResize(#[from] fast_image_resize::ResizeError),

    /// Wraps standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("File persistence error: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The API key environment variable is unset or empty.
    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(&'static str),

    #[error("Invalid image URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The metadata provider answered but had no record for the query.
    #[error("No movie record found for {title:?} ({year}): {reason}")]
    MovieNotFound {
        title: String,
        year: String,
        reason: String,
    },

    #[error("Thumbnail already exists at {0:?}")]
    ThumbnailExists(PathBuf),

    #[error("Scan root is not a directory: {0:?}")]
    NotADirectory(PathBuf),
}

impl PosterError {
    /// True when the error only means the destination was already taken.
    pub fn is_thumbnail_exists(&self) -> bool {
        matches!(self, PosterError::ThumbnailExists(_))
    }
}
