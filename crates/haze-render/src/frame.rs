//! The published inter-stage contract for one frame.

use crate::graph::{ResourceHandle, TextureInfo};
use glam::UVec3;

/// What the scattering stage publishes.
#[derive(Debug, Clone, Copy)]
pub struct ScatteringOutput {
    /// The 3D in-scattering texture.
    pub texture: ResourceHandle,
    /// Froxel grid dimensions (width, height, slices).
    pub froxel_count: UVec3,
}

/// What the accumulation stage publishes.
#[derive(Debug, Clone)]
pub struct AccumulationOutput {
    /// The 2D accumulated transmittance/inscatter buffer.
    pub texture: ResourceHandle,
    pub info: TextureInfo,
}

/// Per-frame blackboard the stages publish to and read from.
///
/// Every field is written by exactly one stage and read by the next;
/// nothing here survives the frame. `camera_color` is special: the driver
/// seeds it with the imported camera color target and the integration stage
/// replaces it with its own output, so whatever runs afterwards observes a
/// single authoritative current-color chain.
#[derive(Default)]
pub struct FrameContext {
    pub scattering: Option<ScatteringOutput>,
    pub accumulation: Option<AccumulationOutput>,
    /// The filtered result. Same handle identity as `accumulation`'s
    /// texture: the filter stage mutates it in place.
    pub filtered: Option<ResourceHandle>,
    /// The frame's current camera color target.
    pub camera_color: Option<ResourceHandle>,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
