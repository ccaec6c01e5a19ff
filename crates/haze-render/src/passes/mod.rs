//! The four stages of the volumetric pipeline.

pub mod accumulation;
pub mod filter;
pub mod integration;
pub mod scattering;

pub use accumulation::AccumulationStage;
pub use filter::{FilterPlan, FilterStage};
pub use integration::IntegrationStage;
pub use scattering::ScatteringStage;
