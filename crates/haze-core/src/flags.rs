use bitflags::bitflags;

bitflags! {
    /// Feature flags handed to the scattering kernel as a uniform word.
    ///
    /// The WGSL side declares the same constants; keep both in sync.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KernelFlags: u32 {
        /// Evaluate punctual lights in addition to the main light.
        const ADDITIONAL_LIGHTS = 1 << 0;
        /// Sample light cookie textures where the host provides them.
        const LIGHT_COOKIES = 1 << 1;
        /// Evaluate local fog volumes.
        const LOCAL_FOGS = 1 << 2;
        /// Attenuate fog by world-space height.
        const HEIGHT_ATTENUATION = 1 << 3;
        /// Attenuate fog by animated 3D noise.
        const NOISE_ATTENUATION = 1 << 4;
    }
}
