//! Representative-color extraction from artwork pixels.

pub mod extract;

pub use extract::{FALLBACK_PALETTE, PALETTE_SIZE, extract_from_bytes, extract_from_url};
