//! The volumetric lighting feature: per-frame orchestration of the four
//! stages.

use crate::frame::FrameContext;
use crate::graph::RenderGraph;
use crate::passes::{AccumulationStage, FilterStage, IntegrationStage, ScatteringStage};
use haze_core::{
    FeatureOverride, FogVolumeRegistry, QualityLevel, Result, ViewDesc, VisibleLight,
    VolumetricLightRegistry, VolumetricSettings,
};
use std::time::Instant;

/// Per-frame scene state the host hands to the pipeline.
///
/// The registries are owned by the host and read-only for the duration of
/// the frame; the settings are already resolved by whatever override stack
/// the host runs.
pub struct SceneInputs<'a> {
    pub lights: &'a [VisibleLight],
    pub fog_volumes: &'a FogVolumeRegistry,
    pub light_props: &'a VolumetricLightRegistry,
    pub settings: VolumetricSettings,
}

/// Froxel volumetric lighting and fog, recorded as four graph passes:
/// scattering, accumulation, filter, integration.
pub struct VolumetricLighting {
    pub quality: QualityLevel,
    pub use_additional_lights: FeatureOverride,
    pub use_cookies: FeatureOverride,
    pub use_local_fogs: bool,
    pub use_height_attenuation: bool,
    pub use_noise_attenuation: bool,

    scattering: ScatteringStage,
    accumulation: AccumulationStage,
    filter: FilterStage,
    integration: IntegrationStage,
    started: Instant,
}

impl VolumetricLighting {
    pub fn new() -> Self {
        Self {
            quality: QualityLevel::default(),
            use_additional_lights: FeatureOverride::default(),
            use_cookies: FeatureOverride::default(),
            use_local_fogs: false,
            use_height_attenuation: true,
            use_noise_attenuation: true,
            scattering: ScatteringStage::new(),
            accumulation: AccumulationStage::new(),
            filter: FilterStage::new(),
            integration: IntegrationStage::new(),
            started: Instant::now(),
        }
    }

    /// Fog volumes sent to the kernel in the last recorded frame.
    pub fn submitted_fog_count(&self) -> usize {
        self.scattering.submitted_fog_count()
    }

    /// Record the whole pipeline for one camera.
    ///
    /// Ineligible camera kinds record nothing. A zero-intensity frame still
    /// records every stage: downstream consumers always get valid handles,
    /// the kernels just produce empty results.
    pub fn record_frame<'fr>(
        &'fr mut self,
        graph: &mut RenderGraph<'fr>,
        frame: &mut FrameContext,
        view: &ViewDesc,
        scene: &SceneInputs<'_>,
    ) -> Result<()> {
        if !view.kind.is_volumetric_eligible() {
            return Ok(());
        }

        let time = self.started.elapsed().as_secs_f32();
        self.scattering.quality = self.quality;
        self.scattering.use_additional_lights = self.use_additional_lights;
        self.scattering.use_cookies = self.use_cookies;
        self.scattering.use_local_fogs = self.use_local_fogs;
        self.scattering.use_height_attenuation = self.use_height_attenuation;
        self.scattering.use_noise_attenuation = self.use_noise_attenuation;

        self.scattering.record(graph, frame, view, scene, time)?;
        self.accumulation.record(graph, frame)?;
        self.filter.record(graph, frame, &scene.settings)?;
        self.integration.record(graph, frame, &scene.settings)?;
        Ok(())
    }
}

impl Default for VolumetricLighting {
    fn default() -> Self {
        Self::new()
    }
}
