use glam::Mat4;

/// What kind of camera is asking for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    /// The primary game view.
    Game,
    /// An editor scene view.
    SceneView,
    /// Asset/material preview rendering.
    Preview,
    /// Reflection probe capture.
    Reflection,
}

impl CameraKind {
    /// Volumetric passes are only recorded for game and scene view cameras.
    pub fn is_volumetric_eligible(self) -> bool {
        matches!(self, CameraKind::Game | CameraKind::SceneView)
    }
}

/// Everything the pipeline reads from the camera for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewDesc {
    pub kind: CameraKind,
    /// Render resolution after dynamic scaling, in pixels.
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Near clip plane distance, world units.
    pub near: f32,
    /// Far clip plane distance, world units.
    pub far: f32,
    /// Vertical field of view, degrees.
    pub fov_y_degrees: f32,
    /// Width over height.
    pub aspect: f32,
    /// Combined view-projection matrix (wgpu 0..1 depth convention).
    pub view_projection: Mat4,
    /// View-to-world matrix, used by the kernel to place froxels in the scene.
    pub inverse_view: Mat4,
}
