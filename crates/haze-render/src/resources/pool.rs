//! Texture pooling for transient frame resources.
//!
//! The froxel volume, the accumulation buffer and the filter chain are
//! recreated every frame; pooling them by shape keeps the steady state free
//! of GPU allocation.

use crate::graph::TextureInfo;
use std::collections::HashMap;
use std::sync::Arc;

/// Key for texture pool lookup.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub struct TextureKey {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub dimension: wgpu::TextureDimension,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl TextureKey {
    pub fn from_info(info: &TextureInfo) -> Self {
        Self {
            width: info.width,
            height: info.height,
            depth: info.depth_or_layers,
            dimension: info.dimension,
            format: info.format,
            usage: info.usage,
        }
    }

    pub fn from_texture(texture: &wgpu::Texture) -> Self {
        Self {
            width: texture.width(),
            height: texture.height(),
            depth: texture.depth_or_array_layers(),
            dimension: texture.dimension(),
            format: texture.format(),
            usage: texture.usage(),
        }
    }

    fn to_descriptor(&self, label: &'static str) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: self.depth,
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

/// Pool of reusable textures keyed by shape.
pub struct TexturePool {
    device: Arc<wgpu::Device>,
    available: HashMap<TextureKey, Vec<(wgpu::Texture, u64)>>,
    frame: u64,
}

impl TexturePool {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            available: HashMap::new(),
            frame: 0,
        }
    }

    /// Reuse a pooled texture with this shape, or create a new one.
    /// Contents are undefined; the first pass using it must overwrite fully.
    pub fn acquire(&mut self, key: &TextureKey, label: &'static str) -> wgpu::Texture {
        if let Some(entries) = self.available.get_mut(key) {
            if let Some((texture, _)) = entries.pop() {
                log::trace!("reusing pooled texture {key:?}");
                return texture;
            }
        }
        log::debug!("creating pooled texture {key:?}");
        self.device.create_texture(&key.to_descriptor(label))
    }

    /// Return a texture to the pool.
    pub fn release(&mut self, key: TextureKey, texture: wgpu::Texture) {
        let frame = self.frame;
        self.available.entry(key).or_default().push((texture, frame));
    }

    /// Advance the pool's frame counter and drop textures that sat unused
    /// for too long (a resize or quality change orphans old shapes).
    pub fn end_frame(&mut self) {
        const MAX_AGE: u64 = 60;
        self.frame += 1;
        let frame = self.frame;
        self.available.retain(|_, entries| {
            entries.retain(|(_, released)| frame - released < MAX_AGE);
            !entries.is_empty()
        });
    }
}
