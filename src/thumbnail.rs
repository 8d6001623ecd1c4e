use std::path::Path;

use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, imageops};
use log::{debug, info};

use crate::config::Settings;
use crate::error::PosterError;
use crate::file::write_out_thumbnail;
use crate::http::ImageSource;
use crate::sizes::ThumbnailSize;

/// Colour of the letterbox bars around a fitted image.
pub const PADDING: Rgb<u8> = Rgb([0, 0, 0]);

/// Resizes the given image so it fits inside `size` while keeping its aspect ratio,
/// then centres it on a `size` canvas filled with [`PADDING`].
///
/// Sources smaller than the box are scaled up by the same rule.
pub fn generate_thumbnail(
    img: &DynamicImage,
    size: ThumbnailSize,
) -> Result<RgbImage, PosterError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(PosterError::Image(image::ImageError::Parameter(
            image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::Generic("Source image has no size.".into()),
            ),
        )));
    }

    let (dst_width, dst_height) = size.fit(width, height);
    debug!(
        "Fitting {}x{} into {} as {}x{}",
        width, height, size, dst_width, dst_height
    );

    let src_image = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut dst_image = DynamicImage::new_rgb8(dst_width, dst_height);

    let mut resizer = Resizer::new();
    resizer.resize(
        &src_image,
        &mut dst_image,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
    )?;

    let mut canvas = RgbImage::from_pixel(size.width, size.height, PADDING);
    let x = (size.width - dst_width) / 2;
    let y = (size.height - dst_height) / 2;
    imageops::overlay(&mut canvas, &dst_image.to_rgb8(), x.into(), y.into());

    Ok(canvas)
}

/// Downloads, fits and writes poster thumbnails.
#[derive(Debug, Clone)]
pub struct Thumbnailer {
    size: ThumbnailSize,
    jpeg_quality: u8,
}

impl Thumbnailer {
    pub fn new(size: ThumbnailSize, jpeg_quality: u8) -> Self {
        Self { size, jpeg_quality }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.size, settings.jpeg_quality)
    }

    /// Decodes `bytes` (format sniffed from content) and fits it to the box.
    pub fn render(&self, bytes: &[u8]) -> Result<RgbImage, PosterError> {
        let img = image::load_from_memory(bytes)?;
        generate_thumbnail(&img, self.size)
    }

    /// Fetches `source_url` and writes the thumbnail to `destination` as JPEG.
    ///
    /// Fails with [`PosterError::ThumbnailExists`] if `destination` is already
    /// present, both before downloading and at the moment of writing.
    pub fn generate(
        &self,
        source: &dyn ImageSource,
        source_url: &str,
        destination: &Path,
    ) -> Result<(), PosterError> {
        if destination.exists() {
            return Err(PosterError::ThumbnailExists(destination.to_path_buf()));
        }

        info!("Generating thumbnail {:?} from {}", destination, source_url);
        let bytes = source.fetch(source_url)?;
        let thumb = self.render(&bytes)?;
        write_out_thumbnail(destination, thumb, self.jpeg_quality)
    }
}
