//! Record-level tests of the full pipeline: stage ordering, the published
//! inter-stage handles and the per-frame gather limits, all without a GPU
//! device. Kernel execution is covered by the host's GPU test rig.

use glam::{Mat4, Vec3};
use haze_core::{
    CameraKind, FogVolume, FogVolumeRegistry, LightId, QualityLevel, ViewDesc, VisibleLight,
    VolumetricLightRegistry, VolumetricSettings,
};
use haze_render::graph::{RenderGraph, TextureInfo};
use haze_render::passes::{AccumulationStage, FilterStage, IntegrationStage};
use haze_render::{FrameContext, SceneInputs, VolumetricLighting};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn game_view(width: u32, height: u32) -> ViewDesc {
    let aspect = width as f32 / height as f32;
    let projection = Mat4::perspective_rh(60f32.to_radians(), aspect, 0.1, 1000.0);
    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
    ViewDesc {
        kind: CameraKind::Game,
        scaled_width: width,
        scaled_height: height,
        near: 0.1,
        far: 1000.0,
        fov_y_degrees: 60.0,
        aspect,
        view_projection: projection * view,
        inverse_view: view.inverse(),
    }
}

fn camera_color_info() -> TextureInfo {
    TextureInfo::d2(
        "camera color",
        1920,
        1080,
        wgpu::TextureFormat::Rgba16Float,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
    )
}

fn scene_lights() -> Vec<VisibleLight> {
    let mut main = VisibleLight::directional(
        LightId(0),
        Vec3::new(0.2, -0.8, 0.1),
        Vec3::ONE,
        2.0,
    );
    main.is_main = true;
    vec![
        main,
        VisibleLight::point(LightId(1), Vec3::new(0.0, 2.0, -5.0), Vec3::X, 10.0, 8.0),
        VisibleLight::point(LightId(2), Vec3::new(3.0, 1.0, -9.0), Vec3::Z, 10.0, 8.0),
    ]
}

#[test]
fn records_all_four_stages_in_order() {
    init_logger();
    let fog_volumes = FogVolumeRegistry::new();
    let light_props = VolumetricLightRegistry::new();
    let lights = scene_lights();
    let scene = SceneInputs {
        lights: &lights,
        fog_volumes: &fog_volumes,
        light_props: &light_props,
        settings: VolumetricSettings {
            intensity: 1.0,
            ..Default::default()
        },
    };

    let mut feature = VolumetricLighting::new();
    let mut graph = RenderGraph::new();
    let mut frame = FrameContext::new();
    let imported = graph.import_texture(camera_color_info());
    frame.camera_color = Some(imported);

    feature
        .record_frame(&mut graph, &mut frame, &game_view(1920, 1080), &scene)
        .unwrap();
    graph.compile().unwrap();

    assert_eq!(
        graph.pass_names_in_order(),
        vec![
            "haze scattering",
            "haze accumulation",
            "haze filter",
            "haze integration"
        ]
    );

    // The integration output replaced the imported camera color handle.
    let current = frame.camera_color.unwrap();
    assert_ne!(current, imported);

    // The filtered handle is the accumulation texture, mutated in place.
    let accumulation = frame.accumulation.as_ref().unwrap();
    assert_eq!(frame.filtered.unwrap(), accumulation.texture);
}

#[test]
fn zero_intensity_still_publishes_valid_handles() {
    init_logger();
    let fog_volumes = FogVolumeRegistry::new();
    let light_props = VolumetricLightRegistry::new();
    let lights = scene_lights();
    let scene = SceneInputs {
        lights: &lights,
        fog_volumes: &fog_volumes,
        light_props: &light_props,
        // Default settings have intensity 0: the effect is inactive but
        // every stage still records so downstream handles stay valid.
        settings: VolumetricSettings::default(),
    };

    let mut feature = VolumetricLighting::new();
    let mut graph = RenderGraph::new();
    let mut frame = FrameContext::new();
    frame.camera_color = Some(graph.import_texture(camera_color_info()));

    feature
        .record_frame(&mut graph, &mut frame, &game_view(1920, 1080), &scene)
        .unwrap();

    assert_eq!(graph.pass_count(), 4);
    assert!(frame.scattering.is_some());
    assert!(frame.accumulation.is_some());
    assert!(frame.filtered.is_some());
}

#[test]
fn ineligible_cameras_record_nothing() {
    init_logger();
    let fog_volumes = FogVolumeRegistry::new();
    let light_props = VolumetricLightRegistry::new();
    let scene = SceneInputs {
        lights: &[],
        fog_volumes: &fog_volumes,
        light_props: &light_props,
        settings: VolumetricSettings::default(),
    };

    for kind in [CameraKind::Preview, CameraKind::Reflection] {
        let mut view = game_view(1920, 1080);
        view.kind = kind;

        let mut feature = VolumetricLighting::new();
        let mut graph = RenderGraph::new();
        let mut frame = FrameContext::new();
        let imported = graph.import_texture(camera_color_info());
        frame.camera_color = Some(imported);

        feature
            .record_frame(&mut graph, &mut frame, &view, &scene)
            .unwrap();

        assert_eq!(graph.pass_count(), 0, "{kind:?}");
        assert_eq!(frame.camera_color.unwrap(), imported);
        assert!(frame.scattering.is_none());
    }
}

#[test]
fn froxel_grid_matches_quality_and_resolution() {
    init_logger();
    let fog_volumes = FogVolumeRegistry::new();
    let light_props = VolumetricLightRegistry::new();
    let scene = SceneInputs {
        lights: &[],
        fog_volumes: &fog_volumes,
        light_props: &light_props,
        settings: VolumetricSettings::default(),
    };

    let mut feature = VolumetricLighting::new();
    feature.quality = QualityLevel::InGame;
    let mut graph = RenderGraph::new();
    let mut frame = FrameContext::new();
    frame.camera_color = Some(graph.import_texture(camera_color_info()));

    feature
        .record_frame(&mut graph, &mut frame, &game_view(1920, 1080), &scene)
        .unwrap();

    let scattering = frame.scattering.unwrap();
    assert_eq!(scattering.froxel_count.x, 240);
    assert_eq!(scattering.froxel_count.y, 136);
    assert_eq!(scattering.froxel_count.z, 64);

    let accumulation = frame.accumulation.as_ref().unwrap();
    assert_eq!(accumulation.info.width, 240);
    assert_eq!(accumulation.info.height, 136);
    assert_eq!(accumulation.info.depth_or_layers, 1);
}

#[test]
fn visible_fog_volumes_truncate_at_capacity() {
    init_logger();
    let fog_volumes = FogVolumeRegistry::new();
    // 300 volumes, all inside the frustum of a camera looking down -Z.
    for _ in 0..300 {
        fog_volumes.register(FogVolume {
            local_to_world: Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),
            ..Default::default()
        });
    }
    let light_props = VolumetricLightRegistry::new();
    let scene = SceneInputs {
        lights: &[],
        fog_volumes: &fog_volumes,
        light_props: &light_props,
        settings: VolumetricSettings {
            intensity: 1.0,
            ..Default::default()
        },
    };

    let mut feature = VolumetricLighting::new();
    feature.use_local_fogs = true;
    let mut graph = RenderGraph::new();
    let mut frame = FrameContext::new();
    frame.camera_color = Some(graph.import_texture(camera_color_info()));

    feature
        .record_frame(&mut graph, &mut frame, &game_view(1920, 1080), &scene)
        .unwrap();

    // The graph holds borrows of the stage gather buffers; let go of it
    // before inspecting the feature.
    drop(graph);
    assert_eq!(feature.submitted_fog_count(), 256);
}

#[test]
fn downstream_stages_degrade_without_upstream_outputs() {
    init_logger();
    let mut graph = RenderGraph::new();
    let mut frame = FrameContext::new();

    // No scattering output: accumulation and filter record nothing.
    AccumulationStage::new().record(&mut graph, &mut frame).unwrap();
    FilterStage::new()
        .record(&mut graph, &mut frame, &VolumetricSettings::default())
        .unwrap();
    assert_eq!(graph.pass_count(), 0);
    assert!(frame.accumulation.is_none());
    assert!(frame.filtered.is_none());

    // Integration still runs with only a camera color target; the missing
    // volumetric term is omitted rather than an error.
    let imported = graph.import_texture(camera_color_info());
    frame.camera_color = Some(imported);
    IntegrationStage::new()
        .record(&mut graph, &mut frame, &VolumetricSettings::default())
        .unwrap();
    assert_eq!(graph.pass_count(), 1);
    assert_ne!(frame.camera_color.unwrap(), imported);
}
