use crate::Frustum;
use glam::{Mat4, Vec3};
use haze_core::{FogVolume, FogVolumeId, FogVolumeRegistry};

const CORNERS_LOCAL: [Vec3; 8] = [
    Vec3::new(-0.5, -0.5, -0.5),
    Vec3::new(-0.5, 0.5, -0.5),
    Vec3::new(0.5, 0.5, -0.5),
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(-0.5, -0.5, 0.5),
    Vec3::new(-0.5, 0.5, 0.5),
    Vec3::new(0.5, 0.5, 0.5),
    Vec3::new(0.5, -0.5, 0.5),
];

/// The 8 corners of the unit cube `[-0.5, 0.5]^3` in world space.
pub fn unit_cube_corners(local_to_world: &Mat4) -> [Vec3; 8] {
    CORNERS_LOCAL.map(|corner| local_to_world.transform_point3(corner))
}

/// Check whether a unit-cube volume under `local_to_world` may intersect
/// the frustum.
///
/// The volume is rejected only when all 8 corners lie strictly behind one
/// frustum plane; a corner exactly on a plane keeps the volume visible.
/// Partially visible volumes and some fully invisible ones pass the test —
/// the one guarantee is that a volume overlapping the frustum is never
/// rejected.
pub fn is_volume_visible(frustum: &Frustum, local_to_world: &Mat4) -> bool {
    let corners = unit_cube_corners(local_to_world);
    for plane in &frustum.planes {
        let all_behind = corners
            .iter()
            .all(|&corner| plane.signed_distance(corner) < 0.0);
        if all_behind {
            return false;
        }
    }
    true
}

/// Collect the frustum-visible fog volumes in registration order.
///
/// `out` is cleared and refilled; reusing the same buffer across frames
/// avoids steady-state allocation.
pub fn visible_volumes(
    frustum: &Frustum,
    registry: &FogVolumeRegistry,
    out: &mut Vec<(FogVolumeId, FogVolume)>,
) {
    out.clear();
    for (id, volume) in registry.volumes().iter() {
        if is_volume_visible(frustum, &volume.local_to_world) {
            out.push((*id, *volume));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Plane;

    /// A hand-built frustum for a camera at the origin looking down +Z:
    /// near plane at z = 5, far at z = 100, with 45 degree side planes.
    fn forward_frustum() -> Frustum {
        let s = std::f32::consts::FRAC_1_SQRT_2;
        Frustum {
            planes: [
                Plane::new(Vec3::new(s, 0.0, s), 0.0),   // Left
                Plane::new(Vec3::new(-s, 0.0, s), 0.0),  // Right
                Plane::new(Vec3::new(0.0, s, s), 0.0),   // Bottom
                Plane::new(Vec3::new(0.0, -s, s), 0.0),  // Top
                Plane::new(Vec3::new(0.0, 0.0, 1.0), -5.0), // Near
                Plane::new(Vec3::new(0.0, 0.0, -1.0), 100.0), // Far
            ],
        }
    }

    #[test]
    fn cube_touching_near_plane_is_visible() {
        // Scale-10 cube centered at the origin: its +z face sits exactly on
        // the near plane at z = 5 and must not be rejected.
        let frustum = forward_frustum();
        let transform = Mat4::from_scale(Vec3::splat(10.0));
        assert!(is_volume_visible(&frustum, &transform));
    }

    #[test]
    fn cube_inside_is_visible() {
        let frustum = forward_frustum();
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 20.0));
        assert!(is_volume_visible(&frustum, &transform));
    }

    #[test]
    fn cube_behind_camera_is_rejected() {
        let frustum = forward_frustum();
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0));
        assert!(!is_volume_visible(&frustum, &transform));
    }

    #[test]
    fn cube_past_far_plane_is_rejected() {
        let frustum = forward_frustum();
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 150.0));
        assert!(!is_volume_visible(&frustum, &transform));
    }

    #[test]
    fn rotated_straddling_cube_is_visible() {
        let frustum = forward_frustum();
        let transform = Mat4::from_rotation_y(0.7)
            * Mat4::from_scale(Vec3::splat(30.0))
            * Mat4::from_translation(Vec3::new(0.0, 0.0, 0.2));
        assert!(is_volume_visible(&frustum, &transform));
    }

    #[test]
    fn volumes_containing_interior_points_are_never_rejected() {
        // Conservative-culling sweep: for a batch of pseudo-random
        // transforms, any cube whose center lands inside the frustum must
        // be reported visible.
        let frustum = forward_frustum();
        let mut state = 0x2545f4914f6cdd1du64;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 40) as f32 / (1u32 << 24) as f32
        };

        let mut checked = 0;
        for _ in 0..500 {
            let translation = Vec3::new(
                (next() - 0.5) * 120.0,
                (next() - 0.5) * 120.0,
                next() * 150.0 - 20.0,
            );
            let scale = Vec3::new(
                0.1 + next() * 20.0,
                0.1 + next() * 20.0,
                0.1 + next() * 20.0,
            );
            let rotation = glam::Quat::from_euler(
                glam::EulerRot::XYZ,
                next() * std::f32::consts::TAU,
                next() * std::f32::consts::TAU,
                next() * std::f32::consts::TAU,
            );
            let transform =
                Mat4::from_scale_rotation_translation(scale, rotation, translation);

            let center_inside = frustum
                .planes
                .iter()
                .all(|plane| plane.signed_distance(translation) > 0.0);
            if center_inside {
                checked += 1;
                assert!(
                    is_volume_visible(&frustum, &transform),
                    "visible cube rejected: {transform:?}"
                );
            }
        }
        assert!(checked > 20, "sweep produced too few interior cases");
    }

    #[test]
    fn gather_preserves_registration_order_and_reuses_buffer() {
        let frustum = forward_frustum();
        let registry = FogVolumeRegistry::new();
        let inside = Mat4::from_translation(Vec3::new(0.0, 0.0, 20.0));
        let outside = Mat4::from_translation(Vec3::new(0.0, 0.0, -50.0));

        let a = registry.register(FogVolume { local_to_world: inside, ..Default::default() });
        let _b = registry.register(FogVolume { local_to_world: outside, ..Default::default() });
        let c = registry.register(FogVolume { local_to_world: inside, ..Default::default() });

        let mut out = Vec::new();
        visible_volumes(&frustum, &registry, &mut out);
        let ids: Vec<_> = out.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![a, c]);

        // A second gather must clear and refill, not append.
        visible_volumes(&frustum, &registry, &mut out);
        assert_eq!(out.len(), 2);
    }
}
