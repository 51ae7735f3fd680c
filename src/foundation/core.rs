//! Core value types: pixel dimensions, aspect ratios, geometry re-exports.

use crate::foundation::error::{PosterError, PosterResult};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Output bitmap dimensions in physical pixels.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a validated pixel size (both dimensions non-zero).
    pub fn new(width: u32, height: u32) -> PosterResult<Self> {
        if width == 0 || height == 0 {
            return Err(PosterError::validation("pixel dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Total pixel count.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Aspect ratio expressed as a `width:height` pair of non-zero integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AspectRatio {
    /// Width component.
    pub w: u32,
    /// Height component, must be non-zero.
    pub h: u32,
}

impl AspectRatio {
    /// The fixed 2:3 portrait ratio every poster is produced at.
    pub const POSTER: Self = Self { w: 2, h: 3 };

    /// Create a validated ratio.
    pub fn new(w: u32, h: u32) -> PosterResult<Self> {
        if w == 0 || h == 0 {
            return Err(PosterError::validation("aspect ratio terms must be > 0"));
        }
        Ok(Self { w, h })
    }

    /// Height that keeps this ratio for the given width, rounded to a pixel.
    pub fn height_for_width(self, width: f64) -> f64 {
        (width * f64::from(self.h) / f64::from(self.w)).round()
    }

    /// Ratio as the scalar `h / w`.
    pub fn as_f64(self) -> f64 {
        f64::from(self.h) / f64::from(self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(PixelSize::new(0, 10).is_err());
        assert!(AspectRatio::new(2, 0).is_err());
    }

    #[test]
    fn poster_ratio_height() {
        assert_eq!(AspectRatio::POSTER.height_for_width(1000.0), 1500.0);
        assert_eq!(AspectRatio::POSTER.height_for_width(761.0), 1142.0);
    }
}
