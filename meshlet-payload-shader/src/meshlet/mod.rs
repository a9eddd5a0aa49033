use static_assertions::const_assert;
use static_assertions::const_assert_eq;

pub mod meta;
pub mod stream;

/// Lanes of a subgroup. A payload word carries exactly one bit-plane for all lanes of a subgroup, so this is fixed to
/// the bit width of a word and does not follow the hardware.
pub const MESHLET_PAYLOAD_SUBGROUP_SIZE: usize = 32;

/// Chunks of [`MESHLET_PAYLOAD_SUBGROUP_SIZE`] elements per meshlet stream
pub const MESHLET_PAYLOAD_NUM_CHUNKS: usize = 8;

pub const MESHLET_PAYLOAD_MAX_ELEMENTS: usize = MESHLET_PAYLOAD_SUBGROUP_SIZE * MESHLET_PAYLOAD_NUM_CHUNKS;

/// Largest bit-plane count a single component of a chunk can declare, limited by its 4 bit field.
pub const MESHLET_PAYLOAD_MAX_BITPLANES: u32 = 15;

/// Components of an element, each 8 bits wide and packed into a single u32.
pub const MESHLET_PAYLOAD_COMPONENTS: usize = 4;

const_assert_eq!(MESHLET_PAYLOAD_SUBGROUP_SIZE, u32::BITS as usize);
const_assert!(MESHLET_PAYLOAD_NUM_CHUNKS <= MESHLET_PAYLOAD_SUBGROUP_SIZE);
// linear indices are fed into 16 bit predictors
const_assert!(MESHLET_PAYLOAD_MAX_ELEMENTS <= u16::MAX as usize);
