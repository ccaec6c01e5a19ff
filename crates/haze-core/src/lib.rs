//! Core types for the Haze volumetric lighting and fog pipeline.
//!
//! This crate holds everything the render stages share but that does not
//! touch the GPU: resolved settings, quality levels, froxel grid math,
//! the fog volume and light registries, and the camera/view description.

mod camera;
mod error;
mod flags;
mod fog;
mod froxel;
mod light;
mod quality;
mod settings;

pub use camera::{CameraKind, ViewDesc};
pub use error::{HazeError, Result};
pub use flags::KernelFlags;
pub use fog::{FogVolume, FogVolumeId, FogVolumeRegistry};
pub use froxel::{ceil_mul_of_8, FroxelGrid, SliceBand};
pub use light::{
    GpuLight, LightKind, VisibleLight, VolumetricLightProps, VolumetricLightRegistry,
};
pub use quality::{FeatureOverride, QualityLevel};
pub use settings::VolumetricSettings;

/// Depth of the froxel volume, in slices.
pub const FROXEL_SLICE_COUNT: u32 = 64;
/// Maximum number of realtime lights sent to the scattering kernel per frame.
pub const MAX_VISIBLE_LIGHTS: usize = 256;
/// Maximum number of fog volumes sent to the scattering kernel per frame.
pub const MAX_VISIBLE_FOG_VOLUMES: usize = 256;
/// Per-slice weight applied by the accumulation kernel.
pub const ACCUM_MUL: f32 = 1.0 / FROXEL_SLICE_COUNT as f32;

// Dispatch group size is 8 in every axis, so the slice count has to divide evenly.
const _: () = assert!(FROXEL_SLICE_COUNT % 8 == 0);
