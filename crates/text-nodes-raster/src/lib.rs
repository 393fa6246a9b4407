//! # text-nodes-raster
//!
//! [`text_nodes::AtlasRasterizer`] implementations.
//!
//! - [`BitmapRasterizer`]: procedural stroke font, no font files needed. Always available.
//! - `CosmicRasterizer`: system fonts shaped and rasterized with cosmic-text (`cosmic` feature).
//!
//! Both render each character into a [`GlyphCell`] (advance x line height) and hand the cells
//! to [`compose`], which packs them with a [`ShelfPacker`] and paints the RGBA surface.

mod bitmap;
mod compose;
#[cfg(feature = "cosmic")]
mod cosmic;
mod shelf;

pub use bitmap::*;
pub use compose::*;
#[cfg(feature = "cosmic")]
pub use cosmic::*;
pub use shelf::*;
