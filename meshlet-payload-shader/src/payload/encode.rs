use crate::meshlet::stream::{BitplaneMeta, MeshletStream};
use crate::meshlet::{
	MESHLET_PAYLOAD_COMPONENTS, MESHLET_PAYLOAD_MAX_ELEMENTS, MESHLET_PAYLOAD_NUM_CHUNKS, MESHLET_PAYLOAD_SUBGROUP_SIZE,
};
use crate::payload::bitplane::write_bitplanes;
use crate::payload::predict::predict_component;
use std::vec::Vec;

/// A single encoded stream. `stream.offset_from_base` is 0 and must be moved to where `bitplanes` end up within the
/// payload.
#[derive(Clone, Debug)]
pub struct EncodedStream {
	pub stream: MeshletStream,
	pub bitplanes: Vec<u32>,
}

/// Encodes the `u8x4` elements of a meshlet stream.
///
/// Components are delta coded against the previous element. A linear predictor is fitted onto the deltas per component
/// and the residuals stored with as few bit-planes as each chunk needs. All arithmetic is modulo 256, just as decoding is.
#[profiling::function]
pub fn encode_stream(values: &[u32; MESHLET_PAYLOAD_MAX_ELEMENTS]) -> EncodedStream {
	let elements = values.map(u32::to_le_bytes);
	let mut stream = MeshletStream::default();

	let mut residuals = [[0i8; MESHLET_PAYLOAD_MAX_ELEMENTS]; MESHLET_PAYLOAD_COMPONENTS];
	for c in 0..MESHLET_PAYLOAD_COMPONENTS {
		let mut prev = 0u8;
		let deltas: [u8; MESHLET_PAYLOAD_MAX_ELEMENTS] = core::array::from_fn(|i| {
			let delta = elements[i][c].wrapping_sub(prev);
			prev = elements[i][c];
			delta
		});
		let (a, b) = predictor_candidates(&deltas)
			.into_iter()
			.min_by_key(|(a, b)| component_cost(&component_residuals(&deltas, *a, *b)))
			.unwrap_or((0, 0));
		stream.predictor_a[c] = a;
		stream.predictor_b[c] = b;
		// the first element is reconstructed as initial_value + prediction, leaving no residual
		stream.initial_value[c] = deltas[0].wrapping_sub(predict_component(a, b, 0) as u8);
		residuals[c] = component_residuals(&deltas, a, b);
	}

	let mut bitplanes = Vec::new();
	for chunk in 0..MESHLET_PAYLOAD_NUM_CHUNKS {
		let lanes = chunk * MESHLET_PAYLOAD_SUBGROUP_SIZE..(chunk + 1) * MESHLET_PAYLOAD_SUBGROUP_SIZE;
		let mut bit_counts = [0; MESHLET_PAYLOAD_COMPONENTS];
		for c in 0..MESHLET_PAYLOAD_COMPONENTS {
			let chunk_residuals = &residuals[c][lanes.clone()];
			let bits = signed_bits(chunk_residuals);
			let values = core::array::from_fn(|lane| chunk_residuals[lane] as i32);
			write_bitplanes(&values, bits, &mut bitplanes);
			bit_counts[c] = bits;
		}
		stream.bitplane_meta[chunk] = BitplaneMeta::from_bit_counts(bit_counts);
	}

	EncodedStream { stream, bitplanes }
}

/// Residuals of a component given its deltas and predictor, wrapped into `i8`. The first element is covered by the
/// initial value.
fn component_residuals(deltas: &[u8; MESHLET_PAYLOAD_MAX_ELEMENTS], a: u16, b: u16) -> [i8; MESHLET_PAYLOAD_MAX_ELEMENTS] {
	core::array::from_fn(|i| {
		if i == 0 {
			0
		} else {
			deltas[i].wrapping_sub(predict_component(a, b, i as u32) as u8) as i8
		}
	})
}

/// Total bit-planes a component's residuals occupy across all chunks.
fn component_cost(residuals: &[i8; MESHLET_PAYLOAD_MAX_ELEMENTS]) -> u32 {
	residuals.chunks(MESHLET_PAYLOAD_SUBGROUP_SIZE).map(signed_bits).sum()
}

/// Smallest two's complement width holding all values, 0 if all values are 0.
pub fn signed_bits(values: &[i8]) -> u32 {
	if values.iter().all(|v| *v == 0) {
		return 0;
	}
	values
		.iter()
		.map(|v| {
			let v = *v as i32;
			let magnitude = if v < 0 { !v } else { v };
			u32::BITS - magnitude.leading_zeros() + 1
		})
		.max()
		.unwrap_or(0)
}

/// Predictors worth trying, ordered from simplest to most complex so ties pick the simpler one.
fn predictor_candidates(deltas: &[u8; MESHLET_PAYLOAD_MAX_ELEMENTS]) -> [(u16, u16); 3] {
	// element 0 is covered by the initial value
	let samples = &deltas[1..];

	let mut histogram = [0u32; 256];
	for d in samples {
		histogram[*d as usize] += 1;
	}
	let most_common = (0..256).max_by_key(|d| (histogram[*d], core::cmp::Reverse(*d))).unwrap_or(0);
	let constant = ((most_common as u16) << 8, 0);

	// least squares fit of the signed deltas over their index, in 8.8 fixed point
	let n = samples.len() as f64;
	let (mut sum_x, mut sum_y, mut sum_xx, mut sum_xy) = (0., 0., 0., 0.);
	for (i, d) in samples.iter().enumerate() {
		let x = (i + 1) as f64;
		let y = *d as i8 as f64;
		sum_x += x;
		sum_y += y;
		sum_xx += x * x;
		sum_xy += x * y;
	}
	let denominator = n * sum_xx - sum_x * sum_x;
	let slope = if denominator != 0. {
		(n * sum_xy - sum_x * sum_y) / denominator
	} else {
		0.
	};
	let intercept = (sum_y - slope * sum_x) / n;
	// +0.5 turns the decoder's floor into rounding
	let a = ((intercept + 0.5) * 256.).round() as i64 as u16;
	let b = (slope * 256.).round() as i64 as u16;

	[(0, 0), constant, (a, b)]
}
