//! # text-nodes-wgpu
//!
//! [`text_nodes::GraphicsContext`] implemented on wgpu.
//!
//! [`WgpuContext`] wraps a device/queue pair. Each frame the host hands it the view to draw
//! into with [`WgpuContext::set_target`]; label draws load the existing contents, so labels
//! are composited over whatever the host rendered first.

mod buffer;
mod context;
mod layout;
mod mipmap;

pub use buffer::*;
pub use context::*;
pub use layout::*;
pub use mipmap::*;
