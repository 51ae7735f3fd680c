//! Catalog records and the lookup client they come from.

pub mod client;
pub mod model;

pub use client::{CatalogAuth, CatalogClient};
pub use model::{CatalogItem, ItemKind, SubItem};
