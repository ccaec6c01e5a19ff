use serde::{Deserialize, Serialize};

/// Quality level for the volumetric lighting and fog effect.
///
/// The level decides the screen-space footprint of one froxel column:
/// lower quality means larger froxels and a smaller simulation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    /// Lowest quality, for performance-constrained targets.
    InGameLow,
    /// Balance between quality and performance, the usual in-game choice.
    InGame,
    /// For high end machines or pre-recorded video.
    Cinematic,
    /// Highest quality, heavy on VRAM and fill rate.
    CinematicHigh,
}

impl QualityLevel {
    /// Number of screen pixels covered by one froxel. Larger = lower quality.
    pub fn froxel_size_pixels(self) -> u32 {
        match self {
            QualityLevel::InGameLow => 16,
            QualityLevel::InGame => 8,
            QualityLevel::Cinematic => 4,
            QualityLevel::CinematicHigh => 2,
        }
    }

    /// Map an untyped level index (e.g. from a config file) to a quality
    /// level. Unrecognized indices fall back to [`QualityLevel::InGame`].
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => QualityLevel::InGameLow,
            1 => QualityLevel::InGame,
            2 => QualityLevel::Cinematic,
            3 => QualityLevel::CinematicHigh,
            _ => QualityLevel::InGame,
        }
    }
}

impl Default for QualityLevel {
    fn default() -> Self {
        QualityLevel::InGame
    }
}

/// Override the host pipeline's settings for a specific kernel feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureOverride {
    /// Follow whatever the host render pipeline has configured.
    UsePipelineSettings,
    /// Force the feature off regardless of pipeline configuration.
    Off,
}

impl Default for FeatureOverride {
    fn default() -> Self {
        FeatureOverride::UsePipelineSettings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn froxel_size_table() {
        assert_eq!(QualityLevel::InGameLow.froxel_size_pixels(), 16);
        assert_eq!(QualityLevel::InGame.froxel_size_pixels(), 8);
        assert_eq!(QualityLevel::Cinematic.froxel_size_pixels(), 4);
        assert_eq!(QualityLevel::CinematicHigh.froxel_size_pixels(), 2);
    }

    #[test]
    fn unrecognized_index_defaults_to_8px() {
        assert_eq!(QualityLevel::from_index(7).froxel_size_pixels(), 8);
        assert_eq!(QualityLevel::from_index(u32::MAX).froxel_size_pixels(), 8);
    }
}
