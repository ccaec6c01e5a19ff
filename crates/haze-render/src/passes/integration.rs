//! Integration stage: composites the volumetric buffer onto camera color.

use crate::frame::FrameContext;
use crate::graph::RenderGraph;
use crate::shaders::IntegrationUniform;
use haze_core::{Result, VolumetricSettings};

/// Draws the full-screen composite of scene color and the filtered
/// volumetric buffer into a fresh color target, then republishes that
/// target as the frame's current camera color. Everything recorded after
/// this stage observes the new handle.
pub struct IntegrationStage;

impl IntegrationStage {
    pub fn new() -> Self {
        Self
    }

    pub fn record<'fr>(
        &mut self,
        graph: &mut RenderGraph<'fr>,
        frame: &mut FrameContext,
        settings: &VolumetricSettings,
    ) -> Result<()> {
        let Some(camera_color) = frame.camera_color else {
            log::warn!("integration skipped: no camera color target");
            return Ok(());
        };
        let settings = settings.clamped();
        // An absent volumetric buffer downgrades the composite to an
        // identity blit instead of failing the frame.
        let filtered = frame.filtered;

        let mut info = graph.texture_info(camera_color).clone();
        info.label = "haze integration target";
        info.usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let destination = graph.create_texture(info);

        let mut reads = vec![camera_color];
        if let Some(filtered) = filtered {
            reads.push(filtered);
        }

        let uniform = IntegrationUniform {
            tone: [settings.dark, settings.bright, 0.0, 0.0],
        };

        graph.add_pass("haze integration", reads, vec![destination], move |ctx| {
            let kernels = ctx.kernels;
            ctx.queue.write_buffer(
                &kernels.integration_uniforms,
                0,
                bytemuck::bytes_of(&uniform),
            );

            let scene_view = ctx.resources.view(camera_color)?;
            let fog_view = match filtered {
                Some(handle) => ctx.resources.view(handle)?,
                None => &kernels.neutral_view,
            };
            let destination_view = ctx.resources.view(destination)?;

            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("haze integration"),
                layout: &kernels.integration_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: kernels.integration_uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(scene_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(fog_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&kernels.linear_sampler),
                    },
                ],
            });

            let mut rpass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("haze integration"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: destination_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&kernels.integration_pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.draw(0..3, 0..1);
            Ok(())
        });

        // Swap the frame's camera color to the freshly written target so
        // later passes pick up the composited image.
        frame.camera_color = Some(destination);
        Ok(())
    }
}

impl Default for IntegrationStage {
    fn default() -> Self {
        Self::new()
    }
}
