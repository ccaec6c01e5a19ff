//! Haze render: a froxel-based volumetric lighting and fog pipeline on
//! wgpu.
//!
//! Four GPU stages run per eligible camera per frame, strictly in order:
//!
//! - **Scattering** fills a frustum-aligned 3D grid with in-scattered
//!   light from the visible lights and local fog volumes.
//! - **Accumulation** integrates the grid along depth into one 2D buffer.
//! - **Filter** softens that buffer through a five-level downsample chain
//!   and writes the combined result back in place.
//! - **Integration** composites the result onto the camera color and
//!   republishes the current-color handle for everything downstream.
//!
//! Stages communicate only through the per-frame [`FrameContext`]; GPU
//! work is recorded through the per-frame [`graph::RenderGraph`], which
//! orders passes by declared read/write intent.

pub mod frame;
pub mod graph;
pub mod passes;
pub mod resources;
pub mod shaders;

mod feature;
mod renderer;

pub use feature::{SceneInputs, VolumetricLighting};
pub use frame::{AccumulationOutput, FrameContext, ScatteringOutput};
pub use renderer::VolumetricRenderer;

pub use haze_core::{HazeError, Result};
