//! Umbra: screen-space contact shadows
//!
//! A screen-space contact-shadow resolver for wgpu-based renderers:
//! for every pixel, a short ray is marched from the surface toward the
//! light through the already-rendered depth buffer, and a binary
//! occlusion factor is written to a two-channel mask consumed by the
//! host's lighting composition.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **context** - Core wgpu wrapper (Device, Queue)
//! 2. **core** - GPU primitives (buffers, textures, compute pipelines)
//! 3. **compute** - Compute dispatch and readback utilities
//! 4. **space** - Named coordinate spaces and the transforms between them
//! 5. **gbuffer** - Depth/normal input contract and CPU scene buffers
//! 6. **resolver** - The contact-shadow ray march (CPU reference path)
//! 7. **pass** - The GPU compute pass running the same march

pub mod compute;
pub mod context;
pub mod core;
pub mod gbuffer;
pub mod pass;
pub mod resolver;
pub mod space;

// Re-export commonly used types
pub use context::WgpuContext;

pub use core::{
    ComputePipelineBuilder, DepthTexture, RawUniformBuffer, ReadbackBuffer, StorageTexture2D,
    Texture2D,
};

pub use compute::{compute_workgroup_count, read_back_texture};

pub use space::{Ndc, ScreenUv, TranslatedWorldPos, ViewPos, ViewTransforms, WorldPos};

pub use gbuffer::{DepthNormalSample, DepthNormalSource, SceneBuffers};

pub use resolver::{
    ConfigError, ContactShadowConfig, ContactShadowResolver, LightDescriptor, Quality, ShadowMask,
    ShadowTexel, ViewDescriptor,
};

pub use pass::ContactShadowPass;

// Re-export glam for convenience
pub use glam;
