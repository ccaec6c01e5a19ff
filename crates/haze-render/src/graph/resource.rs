//! Resource identities and shape metadata for graph textures.

/// Handle to a texture registered with the frame's render graph.
///
/// Handles are plain per-graph indices; they are only meaningful for the
/// graph (and frame) that created them and never outlive it.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct ResourceHandle(pub(crate) usize);

/// Shape metadata carried by every graph texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub depth_or_layers: u32,
    pub dimension: wgpu::TextureDimension,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl TextureInfo {
    /// Convenience constructor for a 2D texture.
    pub fn d2(
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        Self {
            label,
            width,
            height,
            depth_or_layers: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
        }
    }

    /// Convenience constructor for a 3D texture.
    pub fn d3(
        label: &'static str,
        width: u32,
        height: u32,
        depth: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        Self {
            label,
            width,
            height,
            depth_or_layers: depth,
            dimension: wgpu::TextureDimension::D3,
            format,
            usage,
        }
    }

    pub fn to_descriptor(&self) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some(self.label),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: self.depth_or_layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: self.dimension,
            format: self.format,
            usage: self.usage,
            view_formats: &[],
        }
    }
}
