use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Host-supplied identity of a scene light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// One visible light for the current frame, as reported by the host.
#[derive(Debug, Clone, Copy)]
pub struct VisibleLight {
    pub id: LightId,
    /// The frame's main (usually directional) light.
    pub is_main: bool,
    pub kind: LightKind,
    pub position: Vec3,
    /// Normalized direction the light points at (directional/spot).
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Falloff range for point/spot lights, world units.
    pub range: f32,
    /// Spot cone angles in radians (inner, outer).
    pub spot_angles: (f32, f32),
}

impl VisibleLight {
    pub fn directional(id: LightId, direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            id,
            is_main: false,
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            color,
            intensity,
            range: f32::INFINITY,
            spot_angles: (0.0, 0.0),
        }
    }

    pub fn point(id: LightId, position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            id,
            is_main: false,
            kind: LightKind::Point,
            position,
            direction: Vec3::NEG_Y,
            color,
            intensity,
            range,
            spot_angles: (0.0, 0.0),
        }
    }
}

/// GPU layout of one light in the scattering kernel's storage array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz = world position, w = range.
    pub position_range: [f32; 4],
    /// xyz = direction, w = kind (0 directional, 1 point, 2 spot).
    pub direction_kind: [f32; 4],
    /// xyz = color, w = intensity.
    pub color_intensity: [f32; 4],
    /// x = cos(inner), y = cos(outer), z/w unused.
    pub cone_cos: [f32; 4],
}

impl From<&VisibleLight> for GpuLight {
    fn from(light: &VisibleLight) -> Self {
        let kind = match light.kind {
            LightKind::Directional => 0.0,
            LightKind::Point => 1.0,
            LightKind::Spot => 2.0,
        };
        let (inner, outer) = light.spot_angles;
        Self {
            position_range: [
                light.position.x,
                light.position.y,
                light.position.z,
                light.range,
            ],
            direction_kind: [
                light.direction.x,
                light.direction.y,
                light.direction.z,
                kind,
            ],
            color_intensity: [light.color.x, light.color.y, light.color.z, light.intensity],
            cone_cos: [inner.cos(), outer.cos(), 0.0, 0.0],
        }
    }
}

/// Per-light volumetric annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumetricLightProps {
    /// Exclude this light from the volumetric effect: it still lights
    /// nearby surfaces but gets no halo or beam.
    pub excluded: bool,
}

/// Side-table of volumetric annotations, keyed by light identity.
///
/// Lights without an entry are included in the effect; exclusion is always
/// an explicit opt-out. Like the fog registry, mutation happens outside the
/// render path and reads during it.
#[derive(Default)]
pub struct VolumetricLightRegistry {
    lights: RwLock<HashMap<LightId, VolumetricLightProps>>,
}

impl VolumetricLightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: LightId, props: VolumetricLightProps) {
        self.lights.write().insert(id, props);
    }

    pub fn unregister(&self, id: LightId) {
        self.lights.write().remove(&id);
    }

    /// Whether a light opted out of the volumetric effect. Lights without
    /// an annotation are included.
    pub fn excluded(&self, id: LightId) -> bool {
        self.lights
            .read()
            .get(&id)
            .map(|props| props.excluded)
            .unwrap_or(false)
    }
}
