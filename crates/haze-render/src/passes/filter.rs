//! Filter stage: mip-chain blur over the accumulated buffer.

use crate::frame::FrameContext;
use crate::graph::{RenderGraph, ResourceHandle, TextureInfo};
use crate::shaders::{BlurUniform, FILTER_BLITS, UNIFORM_STRIDE};
use haze_core::{Result, VolumetricSettings};

const LEVEL_LABELS: [&str; FILTER_BLITS] = [
    "haze accum full",
    "haze accum half",
    "haze accum fourth",
    "haze accum eighth",
    "haze accum sixteenth",
];

/// Pure description of the filter chain for one frame.
///
/// Five levels at full, half, fourth, eighth and sixteenth of the base
/// resolution, each floor-divided from the previous (clamped to 1 texel so
/// tiny grids stay valid), blurred in strict coarse-ward order and then
/// combined back into the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterPlan {
    pub blur_radius: f32,
    pub levels: [(u32, u32); FILTER_BLITS],
}

impl FilterPlan {
    pub fn new(base_width: u32, base_height: u32, softness: f32) -> Self {
        let mut levels = [(0u32, 0u32); FILTER_BLITS];
        let mut width = base_width;
        let mut height = base_height;
        for level in levels.iter_mut() {
            *level = (width.max(1), height.max(1));
            width /= 2;
            height /= 2;
        }
        Self {
            blur_radius: softness * 3.0,
            levels,
        }
    }
}

/// Softens the accumulated buffer with a downsample chain and writes the
/// combined result back over the original texture. Downstream stages keep
/// the same handle and only ever observe the filtered contents.
pub struct FilterStage;

impl FilterStage {
    pub fn new() -> Self {
        Self
    }

    pub fn record<'fr>(
        &mut self,
        graph: &mut RenderGraph<'fr>,
        frame: &mut FrameContext,
        settings: &VolumetricSettings,
    ) -> Result<()> {
        let Some(accum) = frame.accumulation.clone() else {
            log::warn!("filter skipped: no accumulation output this frame");
            return Ok(());
        };

        let settings = settings.clamped();
        let plan = FilterPlan::new(accum.info.width, accum.info.height, settings.softness);

        let mut levels = [accum.texture; FILTER_BLITS];
        for (i, level) in levels.iter_mut().enumerate() {
            *level = graph.create_texture(TextureInfo::d2(
                LEVEL_LABELS[i],
                plan.levels[i].0,
                plan.levels[i].1,
                wgpu::TextureFormat::Rgba16Float,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            ));
        }

        let source = accum.texture;
        let mut writes = vec![source];
        writes.extend_from_slice(&levels);

        graph.add_pass("haze filter", vec![source], writes, move |ctx| {
            let kernels = ctx.kernels;

            // Blit chain: source -> full -> half -> fourth -> eighth ->
            // sixteenth. Each blit samples the previous level, so order is
            // load-bearing.
            let chain_sources: [ResourceHandle; FILTER_BLITS] =
                [source, levels[0], levels[1], levels[2], levels[3]];

            for (i, &src) in chain_sources.iter().enumerate() {
                let src_info = ctx.resources.info(src);
                let uniform = BlurUniform {
                    radius_texel: [
                        plan.blur_radius,
                        1.0 / src_info.width as f32,
                        1.0 / src_info.height as f32,
                        0.0,
                    ],
                };
                ctx.queue.write_buffer(
                    &kernels.blur_uniforms,
                    i as u64 * UNIFORM_STRIDE,
                    bytemuck::bytes_of(&uniform),
                );
            }

            for (i, (&src, &dst)) in chain_sources.iter().zip(levels.iter()).enumerate() {
                let src_view = ctx.resources.view(src)?;
                let dst_view = ctx.resources.view(dst)?;
                let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("haze filter blur"),
                    layout: &kernels.blur_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                                buffer: &kernels.blur_uniforms,
                                offset: 0,
                                size: wgpu::BufferSize::new(
                                    std::mem::size_of::<BlurUniform>() as u64
                                ),
                            }),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(src_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&kernels.linear_sampler),
                        },
                    ],
                });

                let mut rpass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("haze filter blur"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: dst_view,
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
                rpass.set_pipeline(&kernels.blur_pipeline);
                rpass.set_bind_group(0, &bind_group, &[i as u32 * UNIFORM_STRIDE as u32]);
                rpass.draw(0..3, 0..1);
            }

            // Combine all five levels back into the original source texture.
            let level_views = [
                ctx.resources.view(levels[0])?,
                ctx.resources.view(levels[1])?,
                ctx.resources.view(levels[2])?,
                ctx.resources.view(levels[3])?,
                ctx.resources.view(levels[4])?,
            ];
            let source_view = ctx.resources.view(source)?;
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("haze filter combine"),
                layout: &kernels.combine_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(level_views[0]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(level_views[1]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(level_views[2]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(level_views[3]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(level_views[4]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::Sampler(&kernels.linear_sampler),
                    },
                ],
            });

            let mut rpass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("haze filter combine"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: source_view,
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
            rpass.set_pipeline(&kernels.combine_pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.draw(0..3, 0..1);

            Ok(())
        });

        // Same handle identity as the accumulation output: the contents
        // were mutated in place.
        frame.filtered = Some(source);
        Ok(())
    }
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_levels_floor_halve_in_order() {
        let plan = FilterPlan::new(240, 136, 0.35);
        assert_eq!(plan.levels, [(240, 136), (120, 68), (60, 34), (30, 17), (15, 8)]);
        assert!((plan.blur_radius - 1.05).abs() < 1e-6);
    }

    #[test]
    fn plan_clamps_tiny_levels_to_one_texel() {
        let plan = FilterPlan::new(8, 8, 1.0);
        assert_eq!(plan.levels, [(8, 8), (4, 4), (2, 2), (1, 1), (1, 1)]);
        assert_eq!(plan.blur_radius, 3.0);
    }
}
