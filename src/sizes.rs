use std::fmt;

/// The bounding box a thumbnail is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    /// The fixed 600x600 poster box.
    pub const POSTER: ThumbnailSize = ThumbnailSize {
        width: 600,
        height: 600,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scales `(width, height)` so it fits entirely inside the box, keeping the
    /// aspect ratio. Smaller sources are scaled up by the same rule.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = f64::min(
            self.width as f64 / width as f64,
            self.height as f64 / height as f64,
        );
        let dst_width = ((width as f64 * scale).round() as u32).clamp(1, self.width);
        let dst_height = ((height as f64 * scale).round() as u32).clamp(1, self.height);
        (dst_width, dst_height)
    }
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self::POSTER
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
