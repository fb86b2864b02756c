//! Core rendering abstractions
//!
//! This module provides mid-level abstractions over wgpu primitives.

pub mod buffer;
pub mod pipeline;
pub mod texture;

pub use buffer::{RawUniformBuffer, ReadbackBuffer};
pub use pipeline::ComputePipelineBuilder;
pub use texture::{DepthTexture, StorageTexture2D, Texture2D};
