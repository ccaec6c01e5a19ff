//! Standalone driver: records, compiles and submits the volumetric
//! pipeline for hosts that do not run their own render graph.

use crate::feature::{SceneInputs, VolumetricLighting};
use crate::frame::FrameContext;
use crate::graph::{RenderGraph, ResourceHandle, TextureInfo};
use crate::resources::{TextureKey, TexturePool};
use crate::shaders::KernelSet;
use haze_core::{Result, ViewDesc};
use std::sync::Arc;

/// Owns the GPU-side state of the pipeline and drives one camera's frame
/// end to end: import camera color, record the feature, compile the graph,
/// execute onto a fresh encoder and submit.
pub struct VolumetricRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    kernels: Option<Arc<KernelSet>>,
    pool: TexturePool,
    pub feature: VolumetricLighting,
    warned_missing_kernels: bool,
}

impl VolumetricRenderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let kernels = Arc::new(KernelSet::new(&device, &queue, color_format)?);
        Ok(Self {
            pool: TexturePool::new(device.clone()),
            device,
            queue,
            kernels: Some(kernels),
            feature: VolumetricLighting::new(),
            warned_missing_kernels: false,
        })
    }

    /// Construct without a kernel bundle. Every frame is skipped; useful
    /// when the host wants the feature present but its shaders failed to
    /// load.
    pub fn without_kernels(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            pool: TexturePool::new(device.clone()),
            device,
            queue,
            kernels: None,
            feature: VolumetricLighting::new(),
            warned_missing_kernels: false,
        }
    }

    /// Render one frame for one camera.
    ///
    /// `camera_color` is the host's current color target matching
    /// `camera_color_info`. Returns the integrated color texture (the new
    /// "current camera color"), or `None` when the frame was skipped. Hand
    /// the texture back via [`recycle`] once the host is done with it.
    ///
    /// A frame is best effort: nothing is retried on failure, the next
    /// frame simply starts fresh.
    ///
    /// [`recycle`]: VolumetricRenderer::recycle
    pub fn render(
        &mut self,
        view: &ViewDesc,
        scene: &SceneInputs<'_>,
        camera_color: &wgpu::TextureView,
        camera_color_info: TextureInfo,
    ) -> Result<Option<wgpu::Texture>> {
        let Some(kernels) = self.kernels.clone() else {
            // Missing kernel bundle disables the whole pipeline; warn once
            // instead of spamming every frame.
            if !self.warned_missing_kernels {
                log::warn!("volumetric kernel bundle missing, skipping volumetric lighting");
                self.warned_missing_kernels = true;
            }
            return Ok(None);
        };

        let mut graph = RenderGraph::new();
        let mut frame = FrameContext::new();
        let imported = graph.import_texture(camera_color_info);
        frame.camera_color = Some(imported);

        self.feature.record_frame(&mut graph, &mut frame, view, scene)?;
        if graph.pass_count() == 0 {
            return Ok(None);
        }
        graph.compile()?;

        // Keep the integration output out of the pool: it is the frame's
        // new current camera color and belongs to the host now.
        let keep: Vec<ResourceHandle> = frame
            .camera_color
            .into_iter()
            .filter(|&handle| handle != imported)
            .collect();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("haze volumetric"),
            });
        let mut kept = graph.execute(
            &self.device,
            &self.queue,
            &mut encoder,
            &kernels,
            &mut self.pool,
            &[(imported, camera_color.clone())],
            &keep,
        )?;
        self.queue.submit(std::iter::once(encoder.finish()));
        self.pool.end_frame();

        Ok(kept.pop().map(|(_, texture)| texture))
    }

    /// Return a texture obtained from [`render`] to the pool for reuse.
    ///
    /// [`render`]: VolumetricRenderer::render
    pub fn recycle(&mut self, texture: wgpu::Texture) {
        self.pool.release(TextureKey::from_texture(&texture), texture);
    }
}
