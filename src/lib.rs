pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod metadata;
pub mod parser;
pub mod scanner;
pub mod sizes;
pub mod thumbnail;

pub use config::{Mode, Settings};
pub use error::PosterError;
pub use file::{get_thumbnail_path, write_out_thumbnail};
pub use http::{HttpImageSource, ImageSource, build_client};
pub use metadata::{MovieLookup, MovieRecord, OmdbClient};
pub use parser::{ParsedName, parse_file_name, sanitize_title};
pub use scanner::{PosterPrompt, ScanEntry, ScanSummary, Scanner, find_candidates};
pub use sizes::ThumbnailSize;
pub use thumbnail::{Thumbnailer, generate_thumbnail};
