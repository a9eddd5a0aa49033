use crate::meshlet::stream::MeshletStream;
use crate::payload::packed::PackedU16x4;

/// Linear prediction of a single component in 8.8 fixed point, wrapping in 16 bits.
#[inline]
pub fn predict_component(a: u16, b: u16, linear_index: u32) -> u16 {
	a.wrapping_add(b.wrapping_mul(linear_index as u16)) >> 8
}

#[inline]
pub fn predict(a: [u16; 4], b: [u16; 4], linear_index: u32) -> [u16; 4] {
	core::array::from_fn(|i| predict_component(a[i], b[i], linear_index))
}

/// Per stream state that turns decoded residuals into values ready to be prefix summed.
#[derive(Copy, Clone, Debug)]
pub struct StreamPredictor {
	pub predictor_a: [u16; 4],
	pub predictor_b: [u16; 4],
	pub initial_value: PackedU16x4,
}

impl StreamPredictor {
	pub fn new(stream: &MeshletStream) -> Self {
		Self {
			predictor_a: stream.predictor_a,
			predictor_b: stream.predictor_b,
			initial_value: PackedU16x4::from_u8x4(stream.initial_value),
		}
	}

	/// `linear_index` is the index within the entire meshlet stream, not within the chunk.
	#[inline]
	pub fn reconstruct(&self, deltas: [i32; 4], linear_index: u32) -> PackedU16x4 {
		let mut value = PackedU16x4::pack(deltas.map(|d| d as u16)).low_bytes();
		if linear_index == 0 {
			value = value + self.initial_value;
		}
		value + PackedU16x4::pack(predict(self.predictor_a, self.predictor_b, linear_index))
	}
}
