use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Resolved volumetric lighting settings for one frame.
///
/// Settings resolution (profile stacking, blending, per-volume overrides)
/// is the host's business; the pipeline reads one resolved struct per frame
/// and applies the documented clamp ranges through [`clamped`].
///
/// [`clamped`]: VolumetricSettings::clamped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricSettings {
    /// Overall strength of the effect. Zero or below disables scattering
    /// for the frame. Too high might cause visual artifacts.
    pub intensity: f32,
    /// Scatter angle of incoming light. Low values scatter photons mostly
    /// forward, high values scatter in all directions. Clamped to [0.05, 1].
    pub anisotropy: f32,
    /// Maximum distance from the camera to simulate scattering, in world
    /// units. Clamped to [1, 100].
    pub max_distance: f32,
    /// Minimum world-space height where fog is visible.
    pub fog_min_height: f32,
    /// Maximum world-space height where fog is visible.
    pub fog_max_height: f32,
    /// Strength of the height-based fog attenuation. Clamped to >= 0.
    pub fog_height_attenuation: f32,
    /// Frequency of the 3D noise used for fog attenuation. Clamped to >= 1.
    pub fog_noise_frequency: f32,
    /// Wind direction advecting the fog noise.
    pub fog_noise_wind_direction: Vec3,
    /// Wind strength advecting the fog noise. Clamped to >= 0.
    pub fog_noise_wind_strength: f32,
    /// Softens the result, hiding aliasing from the low resolution grid.
    /// Clamped to [0, 1].
    pub softness: f32,
    /// Helps remove banding/acne artifacts near surfaces. Clamped to >= 0.
    pub depth_bias: f32,
    /// Emphasize the dark areas of the scattering result. Clamped to [0, 1].
    pub dark: f32,
    /// Emphasize the bright areas of the scattering result. Clamped to [0, 1].
    pub bright: f32,
}

impl Default for VolumetricSettings {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            anisotropy: 0.85,
            max_distance: 64.0,
            fog_min_height: 0.0,
            fog_max_height: 100.0,
            fog_height_attenuation: 1.0,
            fog_noise_frequency: 5.0,
            fog_noise_wind_direction: Vec3::Y,
            fog_noise_wind_strength: 1.0,
            softness: 0.35,
            depth_bias: 0.4,
            dark: 0.0,
            bright: 0.0,
        }
    }
}

impl VolumetricSettings {
    /// Is the effect active for this frame?
    pub fn is_active(&self) -> bool {
        self.intensity > 0.0
    }

    /// A copy with every documented clamp range applied.
    pub fn clamped(&self) -> Self {
        Self {
            intensity: self.intensity.max(0.0),
            anisotropy: self.anisotropy.clamp(0.05, 1.0),
            max_distance: self.max_distance.clamp(1.0, 100.0),
            fog_min_height: self.fog_min_height,
            fog_max_height: self.fog_max_height,
            fog_height_attenuation: self.fog_height_attenuation.max(0.0),
            fog_noise_frequency: self.fog_noise_frequency.max(1.0),
            fog_noise_wind_direction: self.fog_noise_wind_direction,
            fog_noise_wind_strength: self.fog_noise_wind_strength.max(0.0),
            softness: self.softness.clamp(0.0, 1.0),
            depth_bias: self.depth_bias.max(0.0),
            dark: self.dark.clamp(0.0, 1.0),
            bright: self.bright.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = VolumetricSettings::default();
        assert_eq!(s.intensity, 0.0);
        assert_eq!(s.anisotropy, 0.85);
        assert_eq!(s.max_distance, 64.0);
        assert_eq!(s.softness, 0.35);
        assert_eq!(s.depth_bias, 0.4);
        assert_eq!(s.dark, 0.0);
        assert_eq!(s.bright, 0.0);
        assert!(!s.is_active());
    }

    #[test]
    fn clamps_apply_documented_ranges() {
        let s = VolumetricSettings {
            intensity: -2.0,
            anisotropy: 0.0,
            max_distance: 5000.0,
            fog_noise_frequency: 0.0,
            softness: 1.5,
            depth_bias: -1.0,
            dark: 7.0,
            bright: -7.0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(s.intensity, 0.0);
        assert_eq!(s.anisotropy, 0.05);
        assert_eq!(s.max_distance, 100.0);
        assert_eq!(s.fog_noise_frequency, 1.0);
        assert_eq!(s.softness, 1.0);
        assert_eq!(s.depth_bias, 0.0);
        assert_eq!(s.dark, 1.0);
        assert_eq!(s.bright, 0.0);
    }
}
