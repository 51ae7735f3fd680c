//! Rasterization of a composed poster scene and PNG export.

pub mod blur;
pub mod export;
pub mod fit;
pub mod raster;
pub(crate) mod text;

pub use export::{EXPORT_BASE_WIDTH_PX, ExportOpts, Exporter, poster_filename, target_pixel_size};
pub use fit::{fitted_rect, size_for_fit};
pub use raster::{ArtworkPixels, RasterImage, Rasterizer};
