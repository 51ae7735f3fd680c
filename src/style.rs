//! User-facing style choices and their resolution into concrete visual tokens.

pub mod color;
pub mod config;
pub mod resolve;

pub use color::Rgba;
pub use config::{
    BackgroundMode, BlurIntensity, ColumnMode, FontConfig, FrameStyle, LayoutRatio, PaletteShape,
    StyleConfig,
};
pub use resolve::{BackgroundSpec, ResolvedTheme, ShadowSpec, resolve};
