//! Accumulation stage: collapses the froxel volume into a 2D buffer.

use crate::frame::{AccumulationOutput, FrameContext};
use crate::graph::{RenderGraph, TextureInfo};
use crate::shaders::AccumUniform;
use haze_core::Result;

/// Integrates the 3D scattering texture along its depth axis into a single
/// 2D transmittance/inscatter buffer of the same width and height.
pub struct AccumulationStage;

impl AccumulationStage {
    pub fn new() -> Self {
        Self
    }

    pub fn record<'fr>(
        &mut self,
        graph: &mut RenderGraph<'fr>,
        frame: &mut FrameContext,
    ) -> Result<()> {
        let Some(scattering) = frame.scattering else {
            log::warn!("accumulation skipped: no scattering output this frame");
            return Ok(());
        };

        let froxel_count = scattering.froxel_count;
        let info = TextureInfo::d2(
            "haze accumulation",
            froxel_count.x,
            froxel_count.y,
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let texture = graph.create_texture(info.clone());
        let source = scattering.texture;

        graph.add_pass(
            "haze accumulation",
            vec![source],
            vec![texture],
            move |ctx| {
                let kernels = ctx.kernels;
                let uniform = AccumUniform {
                    froxel_count: [froxel_count.x, froxel_count.y, froxel_count.z, 0],
                };
                ctx.queue.write_buffer(
                    &kernels.accumulation_uniforms,
                    0,
                    bytemuck::bytes_of(&uniform),
                );

                let volume_view = ctx.resources.view(source)?;
                let accum_view = ctx.resources.view(texture)?;
                let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("haze accumulation"),
                    layout: &kernels.accumulation_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: kernels.accumulation_uniforms.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(volume_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(accum_view),
                        },
                    ],
                });

                let mut cpass = ctx
                    .encoder
                    .begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some("haze accumulation"),
                        timestamp_writes: None,
                    });
                cpass.set_pipeline(&kernels.accumulation_pipeline);
                cpass.set_bind_group(0, &bind_group, &[]);
                cpass.dispatch_workgroups(
                    froxel_count.x.div_ceil(8),
                    froxel_count.y.div_ceil(8),
                    1,
                );
                Ok(())
            },
        );

        frame.accumulation = Some(AccumulationOutput { texture, info });
        Ok(())
    }
}

impl Default for AccumulationStage {
    fn default() -> Self {
        Self::new()
    }
}
