pub mod disk;
pub mod error;
pub mod stats;
pub mod validate;

pub use meshlet_payload_shader::{meshlet, payload};
