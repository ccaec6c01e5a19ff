//! GPU resource reuse.

mod pool;

pub use pool::{TextureKey, TexturePool};
