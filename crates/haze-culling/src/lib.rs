//! Visibility queries for the Haze volumetric pipeline.
//!
//! Culling here is conservative by contract: a volume that is actually
//! visible must never be rejected. False positives only cost GPU time and
//! are bounded by the per-frame volume cap.

mod frustum;
mod volume;

pub use frustum::{Frustum, Plane};
pub use volume::{is_volume_visible, unit_cube_corners, visible_volumes};
