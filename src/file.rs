use log::{debug, info};
use std::{
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder};

use crate::error::PosterError;

/// Extension every thumbnail is written with.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Gets the sibling thumbnail path: same directory and stem, `.jpg` extension.
pub fn get_thumbnail_path(source: &Path) -> PathBuf {
    let path = source.with_extension(THUMBNAIL_EXTENSION);
    debug!("Thumbnail path for {:?} is {:?}", source, path);
    path
}

/// Writes out the thumbnail as a JPEG.
///
/// The image is encoded into a temporary file next to `image_path` and then moved
/// into place without replacing anything, so an existing file at `image_path` is
/// left untouched and reported as [`PosterError::ThumbnailExists`].
pub fn write_out_thumbnail(
    image_path: &Path,
    img: RgbImage,
    quality: u8,
) -> Result<(), PosterError> {
    info!("Writing out thumbnail to {:?}", image_path);

    let dir = match image_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let named_temp = tempfile::Builder::new()
        .prefix(".thumb-")
        .suffix(".jpg.tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(named_temp.as_file());
        let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        DynamicImage::ImageRgb8(img).write_with_encoder(encoder)?;
        writer.flush()?;
    }

    named_temp.persist_noclobber(image_path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            PosterError::ThumbnailExists(image_path.to_path_buf())
        } else {
            PosterError::Persist(e)
        }
    })?;

    debug!("Successfully wrote thumbnail file to {:?}", image_path);
    Ok(())
}
