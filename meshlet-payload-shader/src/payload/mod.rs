pub mod bitplane;
pub mod buffers;
pub mod decode;
#[cfg(feature = "disk")]
pub mod encode;
pub mod packed;
pub mod predict;
pub mod resolve;
pub mod subgroup;
pub mod workgroup;
