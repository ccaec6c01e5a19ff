use glam::{Mat4, Vec3};
use parking_lot::{RwLock, RwLockReadGuard};

/// A cubic local fog volume.
///
/// The volume occupies the unit cube `[-0.5, 0.5]^3` in its local space and
/// is placed in the scene by `local_to_world`, which may scale and rotate it
/// arbitrarily.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogVolume {
    /// Tint color of the fog.
    pub color: Vec3,
    /// Fog density multiplier, >= 0.
    pub density: f32,
    /// Placement of the unit cube in the scene.
    pub local_to_world: Mat4,
}

impl Default for FogVolume {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            density: 1.0,
            local_to_world: Mat4::IDENTITY,
        }
    }
}

/// Identity of a registered fog volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FogVolumeId(u64);

/// The live set of fog volumes.
///
/// The registry is an explicit context object owned by the host and handed
/// to the pipeline each frame; registration follows the owning object's
/// lifecycle (register on activation, unregister on deactivation). Iteration
/// order is registration order, which makes per-frame truncation stable.
///
/// Mutation happens outside the render path; the render path only reads, so
/// concurrent cameras can gather volumes from the same registry.
#[derive(Default)]
pub struct FogVolumeRegistry {
    volumes: RwLock<Vec<(FogVolumeId, FogVolume)>>,
    next_id: RwLock<u64>,
}

impl FogVolumeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a volume to the live set, returning its identity.
    pub fn register(&self, volume: FogVolume) -> FogVolumeId {
        let mut next_id = self.next_id.write();
        let id = FogVolumeId(*next_id);
        *next_id += 1;
        self.volumes.write().push((id, volume));
        id
    }

    /// Update a registered volume in place. Unknown ids are ignored.
    pub fn update(&self, id: FogVolumeId, volume: FogVolume) {
        let mut volumes = self.volumes.write();
        if let Some(entry) = volumes.iter_mut().find(|(vid, _)| *vid == id) {
            entry.1 = volume;
        }
    }

    /// Remove a volume from the live set. Remaining volumes keep their
    /// registration order.
    pub fn unregister(&self, id: FogVolumeId) {
        self.volumes.write().retain(|(vid, _)| *vid != id);
    }

    /// Read access to the live set, in registration order.
    pub fn volumes(&self) -> RwLockReadGuard<'_, Vec<(FogVolumeId, FogVolume)>> {
        self.volumes.read()
    }

    pub fn len(&self) -> usize {
        self.volumes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_order_is_stable_across_unregister() {
        let registry = FogVolumeRegistry::new();
        let ids: Vec<_> = (0..5)
            .map(|i| {
                registry.register(FogVolume {
                    density: i as f32,
                    ..Default::default()
                })
            })
            .collect();
        registry.unregister(ids[2]);

        let volumes = registry.volumes();
        let order: Vec<_> = volumes.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![ids[0], ids[1], ids[3], ids[4]]);
    }

    #[test]
    fn update_replaces_in_place() {
        let registry = FogVolumeRegistry::new();
        let id = registry.register(FogVolume::default());
        registry.update(
            id,
            FogVolume {
                density: 3.0,
                ..Default::default()
            },
        );
        assert_eq!(registry.volumes()[0].1.density, 3.0);
        assert_eq!(registry.len(), 1);
    }
}
