//! # text-nodes
//!
//! GPU text labels for node-link graph renderers.
//!
//! Every node is a short label drawn as one textured quad per character. Glyphs come from a
//! single shared atlas that is re-rasterized whenever the set of used characters changes.
//! Geometry for all labels lives in two packed `f32` buffers (positions and glyph coordinates)
//! that are uploaded in full once per frame and drawn with a single call.
//!
//! The crate is backend agnostic:
//! - [`GraphicsContext`] is implemented by a GPU backend (see `text-nodes-wgpu`)
//! - [`AtlasRasterizer`] turns a character set into glyph bitmaps (see `text-nodes-raster`)
//!
//! [`TextNodeProgram`] ties the pieces together and is what a host engine talks to.

mod atlas;
mod color;
mod context;
mod error;
mod geometry;
mod node;
mod options;
pub mod packed;
mod program;
mod slots;

#[cfg(test)]
mod test_support;

pub use atlas::*;
pub use color::*;
pub use context::*;
pub use error::*;
pub use geometry::*;
pub use node::*;
pub use options::*;
pub use program::*;
pub use slots::*;
