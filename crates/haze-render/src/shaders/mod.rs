//! Kernel bundle: pipelines, bind group layouts and the per-frame GPU
//! buffers shared by all stages.
//!
//! The WGSL sources are embedded; [`KernelSet::new`] compiles everything up
//! front so per-frame recording is pipeline-lookup free. Uniform buffers
//! that need several values per frame (the four scattering depth bands, the
//! five filter blits) are sliced with dynamic offsets at a fixed stride.

use bytemuck::{Pod, Zeroable};
use haze_core::{Result, MAX_VISIBLE_FOG_VOLUMES, MAX_VISIBLE_LIGHTS};

/// Stride between dynamic-offset uniform slots. 256 is the largest
/// alignment any backend requires, so offsets at this stride always bind.
pub const UNIFORM_STRIDE: u64 = 256;

/// Number of depth bands the scattering stage dispatches.
pub const SCATTERING_BANDS: usize = 4;
/// Number of blur blits the filter chain records.
pub const FILTER_BLITS: usize = 5;

/// Per-band uniform block of the scattering kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ScatterUniform {
    pub inv_view: [[f32; 4]; 4],
    pub froxel_count: [u32; 4],
    /// near, max scattering distance, vertical fov (radians), aspect
    pub camera: [f32; 4],
    /// enabled, min height, max height, attenuation factor
    pub height_fog: [f32; 4],
    /// enabled, frequency, unused, unused
    pub noise_fog: [f32; 4],
    /// wind direction xyz, wind strength
    pub noise_wind: [f32; 4],
    pub main_light_direction: [f32; 4],
    pub main_light_color: [f32; 4],
    /// w = volumetric weight of the main light
    pub main_light_data: [f32; 4],
    /// intensity, anisotropy, depth bias, time
    pub scatter: [f32; 4],
    /// band sample count, band first slice, light count, fog count
    pub counts: [u32; 4],
    pub flags: [u32; 4],
}

/// Uniform block of the accumulation kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AccumUniform {
    pub froxel_count: [u32; 4],
}

/// Per-blit uniform block of the filter chain.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BlurUniform {
    /// x = blur radius, yz = source texel size, w unused
    pub radius_texel: [f32; 4],
}

/// Uniform block of the integration pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct IntegrationUniform {
    /// x = dark, y = bright, zw unused
    pub tone: [f32; 4],
}

/// Everything the stages need on the GPU side, built once at startup.
pub struct KernelSet {
    pub scattering_pipeline: wgpu::ComputePipeline,
    pub scattering_layout: wgpu::BindGroupLayout,
    pub scattering_uniforms: wgpu::Buffer,
    pub lights_buffer: wgpu::Buffer,
    pub lights_additional_buffer: wgpu::Buffer,
    pub fog_colors_buffer: wgpu::Buffer,
    pub fog_matrices_buffer: wgpu::Buffer,

    pub accumulation_pipeline: wgpu::ComputePipeline,
    pub accumulation_layout: wgpu::BindGroupLayout,
    pub accumulation_uniforms: wgpu::Buffer,

    pub blur_pipeline: wgpu::RenderPipeline,
    pub blur_layout: wgpu::BindGroupLayout,
    pub blur_uniforms: wgpu::Buffer,

    pub combine_pipeline: wgpu::RenderPipeline,
    pub combine_layout: wgpu::BindGroupLayout,

    pub integration_pipeline: wgpu::RenderPipeline,
    pub integration_layout: wgpu::BindGroupLayout,
    pub integration_uniforms: wgpu::Buffer,

    pub linear_sampler: wgpu::Sampler,
    /// 1x1 (0, 0, 0, 1) texture bound when a frame input is absent, making
    /// the integration composite an identity.
    pub neutral_view: wgpu::TextureView,

    pub color_format: wgpu::TextureFormat,
}

impl KernelSet {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        log::info!("building volumetric kernel set (color format {color_format:?})");

        let scattering_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("haze scattering"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scattering.wgsl").into()),
        });
        let accumulation_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("haze accumulation"),
            source: wgpu::ShaderSource::Wgsl(include_str!("accumulation.wgsl").into()),
        });
        let blur_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("haze filter blur"),
            source: wgpu::ShaderSource::Wgsl(include_str!("filter_blur.wgsl").into()),
        });
        let combine_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("haze filter combine"),
            source: wgpu::ShaderSource::Wgsl(include_str!("filter_combine.wgsl").into()),
        });
        let integration_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("haze integration"),
            source: wgpu::ShaderSource::Wgsl(include_str!("integration.wgsl").into()),
        });

        // ── Scattering ───────────────────────────────────────────────────
        let scattering_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("haze scattering layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::COMPUTE, true),
                storage_entry(1, wgpu::ShaderStages::COMPUTE),
                storage_entry(2, wgpu::ShaderStages::COMPUTE),
                storage_entry(3, wgpu::ShaderStages::COMPUTE),
                storage_entry(4, wgpu::ShaderStages::COMPUTE),
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba16Float,
                        view_dimension: wgpu::TextureViewDimension::D3,
                    },
                    count: None,
                },
            ],
        });
        let scattering_pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("haze scattering"),
                layout: Some(&device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("haze scattering"),
                    bind_group_layouts: &[&scattering_layout],
                    push_constant_ranges: &[],
                })),
                module: &scattering_module,
                entry_point: "main",
                compilation_options: Default::default(),
                cache: None,
            });

        let scattering_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze scattering uniforms"),
            size: SCATTERING_BANDS as u64 * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze lights"),
            size: (MAX_VISIBLE_LIGHTS * std::mem::size_of::<haze_core::GpuLight>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lights_additional_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze lights additional data"),
            size: (MAX_VISIBLE_LIGHTS * 16) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let fog_colors_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze fog colors"),
            size: (MAX_VISIBLE_FOG_VOLUMES * 16) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let fog_matrices_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze fog matrices"),
            size: (MAX_VISIBLE_FOG_VOLUMES * 64) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── Accumulation ─────────────────────────────────────────────────
        let accumulation_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("haze accumulation layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::COMPUTE, false),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D3,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: wgpu::TextureFormat::Rgba16Float,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                ],
            });
        let accumulation_pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("haze accumulation"),
                layout: Some(&device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("haze accumulation"),
                    bind_group_layouts: &[&accumulation_layout],
                    push_constant_ranges: &[],
                })),
                module: &accumulation_module,
                entry_point: "main",
                compilation_options: Default::default(),
                cache: None,
            });
        let accumulation_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze accumulation uniforms"),
            size: std::mem::size_of::<AccumUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── Filter ───────────────────────────────────────────────────────
        let blur_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("haze blur layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT, true),
                texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                sampler_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let blur_pipeline = render_pipeline(
            device,
            "haze filter blur",
            &blur_layout,
            &blur_module,
            "fs_blur",
            wgpu::TextureFormat::Rgba16Float,
        );
        let blur_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze blur uniforms"),
            size: FILTER_BLITS as u64 * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let combine_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("haze combine layout"),
            entries: &[
                texture_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                texture_entry(2, wgpu::ShaderStages::FRAGMENT),
                texture_entry(3, wgpu::ShaderStages::FRAGMENT),
                texture_entry(4, wgpu::ShaderStages::FRAGMENT),
                sampler_entry(5, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let combine_pipeline = render_pipeline(
            device,
            "haze filter combine",
            &combine_layout,
            &combine_module,
            "fs_combine",
            wgpu::TextureFormat::Rgba16Float,
        );

        // ── Integration ──────────────────────────────────────────────────
        let integration_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("haze integration layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false),
                    texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                    texture_entry(2, wgpu::ShaderStages::FRAGMENT),
                    sampler_entry(3, wgpu::ShaderStages::FRAGMENT),
                ],
            });
        let integration_pipeline = render_pipeline(
            device,
            "haze integration",
            &integration_layout,
            &integration_module,
            "fs_main",
            color_format,
        );
        let integration_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("haze integration uniforms"),
            size: std::mem::size_of::<IntegrationUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("haze linear clamp"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let neutral_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("haze neutral"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        // f16 texel (0, 0, 0, 1): alpha bits are 0x3C00
        let neutral_texel: [u8; 8] = [0, 0, 0, 0, 0, 0, 0x00, 0x3C];
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &neutral_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &neutral_texel,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(8),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let neutral_view = neutral_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            scattering_pipeline,
            scattering_layout,
            scattering_uniforms,
            lights_buffer,
            lights_additional_buffer,
            fog_colors_buffer,
            fog_matrices_buffer,
            accumulation_pipeline,
            accumulation_layout,
            accumulation_uniforms,
            blur_pipeline,
            blur_layout,
            blur_uniforms,
            combine_pipeline,
            combine_layout,
            integration_pipeline,
            integration_layout,
            integration_uniforms,
            linear_sampler,
            neutral_view,
            color_format,
        })
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    module: &wgpu::ShaderModule,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: "vs_main",
            compilation_options: Default::default(),
            buffers: &[],
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: fragment_entry,
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_blocks_fit_their_slots() {
        assert!(std::mem::size_of::<ScatterUniform>() as u64 <= UNIFORM_STRIDE);
        assert_eq!(std::mem::size_of::<ScatterUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<AccumUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<BlurUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<IntegrationUniform>() % 16, 0);
    }
}
