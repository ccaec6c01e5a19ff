//! Scattering stage: fills the 3D froxel volume with in-scattered light.

use crate::feature::SceneInputs;
use crate::frame::{FrameContext, ScatteringOutput};
use crate::graph::{RenderGraph, TextureInfo};
use crate::shaders::{ScatterUniform, SCATTERING_BANDS, UNIFORM_STRIDE};
use bytemuck::Zeroable;
use glam::{Mat4, UVec3};
use haze_core::{
    FeatureOverride, FogVolume, FogVolumeId, FroxelGrid, GpuLight, KernelFlags, QualityLevel,
    Result, ViewDesc, MAX_VISIBLE_FOG_VOLUMES, MAX_VISIBLE_LIGHTS,
};
use haze_culling::{visible_volumes, Frustum};

/// Records the scattering dispatches and publishes the froxel volume.
///
/// The gather buffers are fixed capacity and reused every frame; steady
/// state does not allocate. When more lights or fog volumes are visible
/// than the caps allow, the excess is silently dropped in registration
/// order — the scene just loses volumetric treatment for the overflow.
pub struct ScatteringStage {
    pub quality: QualityLevel,
    pub use_additional_lights: FeatureOverride,
    pub use_cookies: FeatureOverride,
    pub use_local_fogs: bool,
    pub use_height_attenuation: bool,
    pub use_noise_attenuation: bool,

    gpu_lights: Box<[GpuLight; MAX_VISIBLE_LIGHTS]>,
    lights_additional: Box<[[f32; 4]; MAX_VISIBLE_LIGHTS]>,
    fog_colors: Box<[[f32; 4]; MAX_VISIBLE_FOG_VOLUMES]>,
    fog_matrices: Box<[Mat4; MAX_VISIBLE_FOG_VOLUMES]>,
    visible_fogs: Vec<(FogVolumeId, FogVolume)>,
    submitted_fog_count: usize,
}

impl ScatteringStage {
    pub fn new() -> Self {
        Self {
            quality: QualityLevel::default(),
            use_additional_lights: FeatureOverride::default(),
            use_cookies: FeatureOverride::default(),
            use_local_fogs: false,
            use_height_attenuation: true,
            use_noise_attenuation: true,
            gpu_lights: Box::new([GpuLight::zeroed(); MAX_VISIBLE_LIGHTS]),
            lights_additional: Box::new([[0.0; 4]; MAX_VISIBLE_LIGHTS]),
            fog_colors: Box::new([[0.0; 4]; MAX_VISIBLE_FOG_VOLUMES]),
            fog_matrices: Box::new([Mat4::IDENTITY; MAX_VISIBLE_FOG_VOLUMES]),
            visible_fogs: Vec::new(),
            submitted_fog_count: 0,
        }
    }

    /// Fog volumes sent to the kernel in the last recorded frame.
    pub fn submitted_fog_count(&self) -> usize {
        self.submitted_fog_count
    }

    pub fn record<'fr>(
        &'fr mut self,
        graph: &mut RenderGraph<'fr>,
        frame: &mut FrameContext,
        view: &ViewDesc,
        scene: &SceneInputs<'_>,
        time: f32,
    ) -> Result<()> {
        let settings = scene.settings.clamped();
        let grid = FroxelGrid::for_view(view.scaled_width, view.scaled_height, self.quality);
        debug_assert!(grid.width >= 8 && grid.width % 8 == 0);
        debug_assert!(grid.height >= 8 && grid.height % 8 == 0);
        debug_assert!(grid.depth >= 8 && grid.depth % 8 == 0);

        let texture = graph.create_texture(TextureInfo::d3(
            "haze scattering 3d",
            grid.width,
            grid.height,
            grid.depth,
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        ));

        // Per-light data. The main light rides in the uniform block; the
        // punctual array is capped and truncated in visibility order.
        let mut main_light_direction = [0.0, -1.0, 0.0, 0.0];
        let mut main_light_color = [0.0f32; 4];
        let mut main_light_data = [0.0, 0.0, 0.0, 1.0];
        let mut punctual = 0usize;
        for light in scene.lights {
            let weight = if scene.light_props.excluded(light.id) { 0.0 } else { 1.0 };
            if light.is_main {
                main_light_direction = [
                    light.direction.x,
                    light.direction.y,
                    light.direction.z,
                    0.0,
                ];
                main_light_color = [
                    light.color.x * light.intensity,
                    light.color.y * light.intensity,
                    light.color.z * light.intensity,
                    0.0,
                ];
                main_light_data = [0.0, 0.0, 0.0, weight];
            } else if punctual < MAX_VISIBLE_LIGHTS {
                self.gpu_lights[punctual] = GpuLight::from(light);
                self.lights_additional[punctual] = [0.0, 0.0, 0.0, weight];
                punctual += 1;
            }
        }

        let mut fog_count = 0usize;
        if self.use_local_fogs {
            let frustum = Frustum::from_view_projection(view.view_projection);
            visible_volumes(&frustum, scene.fog_volumes, &mut self.visible_fogs);
            fog_count = self.visible_fogs.len().min(MAX_VISIBLE_FOG_VOLUMES);
            for (i, (_, volume)) in self.visible_fogs.iter().take(fog_count).enumerate() {
                self.fog_colors[i] = [
                    volume.color.x,
                    volume.color.y,
                    volume.color.z,
                    volume.density.max(0.0),
                ];
                self.fog_matrices[i] = volume.local_to_world.inverse();
            }
        }
        self.submitted_fog_count = fog_count;
        log::trace!(
            "scattering gather: {punctual} punctual lights, {fog_count} fog volumes ({} visible)",
            self.visible_fogs.len()
        );

        let mut flags = KernelFlags::empty();
        if self.use_additional_lights != FeatureOverride::Off {
            flags |= KernelFlags::ADDITIONAL_LIGHTS;
        }
        if self.use_cookies != FeatureOverride::Off {
            flags |= KernelFlags::LIGHT_COOKIES;
        }
        if self.use_local_fogs {
            flags |= KernelFlags::LOCAL_FOGS;
        }
        if self.use_height_attenuation {
            flags |= KernelFlags::HEIGHT_ATTENUATION;
        }
        if self.use_noise_attenuation {
            flags |= KernelFlags::NOISE_ATTENUATION;
        }

        let wind = settings.fog_noise_wind_direction;
        let base = ScatterUniform {
            inv_view: view.inverse_view.to_cols_array_2d(),
            froxel_count: [grid.width, grid.height, grid.depth, 0],
            camera: [
                view.near,
                settings.max_distance,
                view.fov_y_degrees.to_radians(),
                view.aspect,
            ],
            height_fog: [
                if self.use_height_attenuation { 1.0 } else { 0.0 },
                settings.fog_min_height,
                settings.fog_max_height,
                settings.fog_height_attenuation,
            ],
            noise_fog: [
                if self.use_noise_attenuation { 1.0 } else { 0.0 },
                settings.fog_noise_frequency,
                0.0,
                0.0,
            ],
            noise_wind: [wind.x, wind.y, wind.z, settings.fog_noise_wind_strength],
            main_light_direction,
            main_light_color,
            main_light_data,
            scatter: [
                settings.intensity,
                settings.anisotropy,
                settings.depth_bias,
                time,
            ],
            counts: [0, 0, punctual as u32, fog_count as u32],
            flags: [flags.bits(), 0, 0, 0],
        };

        let bands = grid.slice_bands();
        let mut band_uniforms = [base; SCATTERING_BANDS];
        for (slot, band) in band_uniforms.iter_mut().zip(bands) {
            slot.counts[0] = band.sample_count;
            slot.counts[1] = band.start;
        }

        let use_local_fogs = self.use_local_fogs;
        let gpu_lights: &'fr [GpuLight] = &self.gpu_lights[..];
        let lights_additional: &'fr [[f32; 4]] = &self.lights_additional[..];
        let fog_colors: &'fr [[f32; 4]] = &self.fog_colors[..];
        let fog_matrices: &'fr [Mat4] = &self.fog_matrices[..];

        graph.add_pass("haze scattering", vec![], vec![texture], move |ctx| {
            let kernels = ctx.kernels;
            for (i, slot) in band_uniforms.iter().enumerate() {
                ctx.queue.write_buffer(
                    &kernels.scattering_uniforms,
                    i as u64 * UNIFORM_STRIDE,
                    bytemuck::bytes_of(slot),
                );
            }
            ctx.queue
                .write_buffer(&kernels.lights_buffer, 0, bytemuck::cast_slice(gpu_lights));
            ctx.queue.write_buffer(
                &kernels.lights_additional_buffer,
                0,
                bytemuck::cast_slice(lights_additional),
            );
            if use_local_fogs {
                ctx.queue.write_buffer(
                    &kernels.fog_colors_buffer,
                    0,
                    bytemuck::cast_slice(fog_colors),
                );
                ctx.queue.write_buffer(
                    &kernels.fog_matrices_buffer,
                    0,
                    bytemuck::cast_slice(fog_matrices),
                );
            }

            let volume_view = ctx.resources.view(texture)?;
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("haze scattering"),
                layout: &kernels.scattering_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &kernels.scattering_uniforms,
                            offset: 0,
                            size: wgpu::BufferSize::new(
                                std::mem::size_of::<ScatterUniform>() as u64
                            ),
                        }),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: kernels.lights_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: kernels.lights_additional_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: kernels.fog_colors_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: kernels.fog_matrices_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(volume_view),
                    },
                ],
            });

            let mut cpass = ctx
                .encoder
                .begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("haze scattering"),
                    timestamp_writes: None,
                });
            cpass.set_pipeline(&kernels.scattering_pipeline);
            for (i, band) in bands.iter().enumerate() {
                if band.count == 0 {
                    continue;
                }
                cpass.set_bind_group(0, &bind_group, &[i as u32 * UNIFORM_STRIDE as u32]);
                cpass.dispatch_workgroups(grid.width / 8, grid.height / 8, band.count / 8);
            }
            Ok(())
        });

        frame.scattering = Some(ScatteringOutput {
            texture,
            froxel_count: UVec3::new(grid.width, grid.height, grid.depth),
        });
        Ok(())
    }
}

impl Default for ScatteringStage {
    fn default() -> Self {
        Self::new()
    }
}
