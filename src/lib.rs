//! Posterforge turns catalog metadata and a handful of style choices into a
//! fixed-ratio, high-resolution poster bitmap, and guards the export behind a
//! single-use purchase token.
//!
//! The pipeline is a chain of pure derivations feeding a CPU rasterizer:
//!
//! - [`style::resolve`] maps a [`style::StyleConfig`] to concrete visual
//!   tokens
//! - [`palette`] extracts representative artwork colors (with a constant
//!   fallback)
//! - [`waveform`] synthesizes deterministic decoration from track metadata
//! - [`compose`] lays everything out as an abstract scene graph
//! - [`render`] rasterizes the scene at any export resolution and writes the
//!   PNG
//! - [`token`] holds the authoritative single-use token store, its HTTP
//!   surface, and the client-side gate around the export step
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod catalog;
pub mod compose;
pub mod foundation;
pub mod palette;
pub mod render;
pub mod style;
pub mod token;
pub mod waveform;

pub use crate::foundation::core::{AspectRatio, PixelSize};
pub use crate::foundation::error::{PosterError, PosterResult};

pub use crate::catalog::model::CatalogItem;
pub use crate::compose::build::compose;
pub use crate::compose::model::PosterScene;
pub use crate::render::export::{ExportOpts, Exporter, poster_filename};
pub use crate::render::raster::{ArtworkPixels, RasterImage};
pub use crate::style::config::StyleConfig;
pub use crate::style::resolve::{ResolvedTheme, resolve};
pub use crate::token::gate::{ExportOutcome, GateState, TokenGate};
