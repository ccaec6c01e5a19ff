use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

/// A plane in constant-normal form. `normal` points at the inside of
/// whatever the plane bounds; `d` is chosen so that
/// `normal.dot(p) + d == 0` for points on the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Positive in front of the plane (inside), negative behind.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    fn from_row(row: Vec4) -> Self {
        let length = row.xyz().length();
        Self {
            normal: row.xyz() / length,
            d: row.w / length,
        }
    }
}

/// Six camera frustum planes with inward-facing normals,
/// ordered left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix using the
    /// wgpu clip conventions (depth 0..1).
    pub fn from_view_projection(view_projection: Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        Self {
            planes: [
                Plane::from_row(r3 + r0), // Left
                Plane::from_row(r3 - r0), // Right
                Plane::from_row(r3 + r1), // Bottom
                Plane::from_row(r3 - r1), // Top
                Plane::from_row(r2),      // Near (z = 0 in clip space)
                Plane::from_row(r3 - r2), // Far
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_frustum() -> Frustum {
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 1.0, 100.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        Frustum::from_view_projection(proj * view)
    }

    #[test]
    fn extracted_planes_contain_interior_points() {
        let frustum = simple_frustum();
        // Points clearly inside the frustum of a camera looking down -Z.
        for p in [
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::new(2.0, 2.0, -50.0),
            Vec3::new(-3.0, 1.0, -99.0),
        ] {
            for (i, plane) in frustum.planes.iter().enumerate() {
                assert!(
                    plane.signed_distance(p) > 0.0,
                    "point {p:?} should be inside plane {i}"
                );
            }
        }
    }

    #[test]
    fn points_outside_are_behind_some_plane() {
        let frustum = simple_frustum();
        for p in [
            Vec3::new(0.0, 0.0, 10.0),   // behind the camera
            Vec3::new(0.0, 0.0, -200.0), // past the far plane
            Vec3::new(500.0, 0.0, -10.0),
        ] {
            let outside = frustum
                .planes
                .iter()
                .any(|plane| plane.signed_distance(p) < 0.0);
            assert!(outside, "point {p:?} should be outside");
        }
    }
}
