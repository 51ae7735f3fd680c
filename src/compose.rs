//! Composition of catalog metadata and resolved style into a poster scene.

pub mod build;
pub mod model;

pub use build::{DensityTier, compose, density_tier};
pub use model::{
    ArtworkBlock, BackgroundLayer, ChipRow, ImageFit, PlaceholderBlock, PosterScene, TextBlock,
    TextRole, WaveformBlock,
};
