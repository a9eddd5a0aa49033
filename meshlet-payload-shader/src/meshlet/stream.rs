use crate::meshlet::{MESHLET_PAYLOAD_COMPONENTS, MESHLET_PAYLOAD_MAX_BITPLANES, MESHLET_PAYLOAD_NUM_CHUNKS};
use core::fmt::{Debug, Formatter};
use core::mem::size_of;
use static_assertions::const_assert_eq;

/// Bit-plane counts of the four components of one chunk, 4 bits each with x in the lowest bits.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, bytemuck_derive::Zeroable, bytemuck_derive::Pod)]
#[cfg_attr(feature = "disk", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
pub struct BitplaneMeta(pub u16);
const_assert_eq!(size_of::<BitplaneMeta>(), 2);

impl BitplaneMeta {
	#[allow(clippy::needless_range_loop)]
	pub fn from_bit_counts(bit_counts: [u32; MESHLET_PAYLOAD_COMPONENTS]) -> Self {
		let mut out = 0;
		for i in 0..MESHLET_PAYLOAD_COMPONENTS {
			let count = bit_counts[i];
			assert!(
				count <= MESHLET_PAYLOAD_MAX_BITPLANES,
				"bit count {} of component {} exceeds {} bit-planes",
				count,
				i,
				MESHLET_PAYLOAD_MAX_BITPLANES
			);
			out |= (count as u16) << (i * 4);
		}
		Self(out)
	}

	#[inline]
	pub fn bit_counts(self) -> [u32; MESHLET_PAYLOAD_COMPONENTS] {
		let f = |i: u32| (self.0 as u32 >> (i * 4)) & 0xf;
		[f(0), f(1), f(2), f(3)]
	}

	/// Payload words this chunk occupies.
	#[inline]
	pub fn total_bits(self) -> u32 {
		let [x, y, z, w] = self.bit_counts();
		(x + y) + (z + w)
	}
}

impl Debug for BitplaneMeta {
	fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
		write!(f, "{:?}", self.bit_counts())
	}
}

/// Decoding parameters of one u32 attribute stream of one meshlet.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, bytemuck_derive::Zeroable, bytemuck_derive::Pod)]
#[cfg_attr(feature = "disk", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
pub struct MeshletStream {
	/// linear predictor intercept in 8.8 fixed point
	pub predictor_a: [u16; 4],
	/// linear predictor slope in 8.8 fixed point
	pub predictor_b: [u16; 4],
	/// added to the very first element only
	pub initial_value: [u8; 4],
	/// payload word where chunk 0 of this stream starts
	pub offset_from_base: u32,
	pub bitplane_meta: [BitplaneMeta; MESHLET_PAYLOAD_NUM_CHUNKS],
}
const_assert_eq!(size_of::<MeshletStream>(), 40);

impl MeshletStream {
	/// Payload words of all chunks of this stream.
	pub fn total_bitplanes(&self) -> u32 {
		self.bitplane_meta.iter().map(|m| m.total_bits()).sum()
	}

	/// One past the last payload word this stream reads.
	pub fn end_offset(&self) -> Option<u32> {
		self.offset_from_base.checked_add(self.total_bitplanes())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bit_counts_field_order() {
		let meta = BitplaneMeta(0x4321);
		assert_eq!(meta.bit_counts(), [1, 2, 3, 4]);
		assert_eq!(meta.total_bits(), 10);
		assert_eq!(BitplaneMeta::from_bit_counts([1, 2, 3, 4]), meta);
	}

	#[test]
	fn max_bit_counts() {
		let meta = BitplaneMeta::from_bit_counts([15; 4]);
		assert_eq!(meta.0, 0xffff);
		assert_eq!(meta.total_bits(), 60);
	}

	#[test]
	#[should_panic(expected = "exceeds 15 bit-planes")]
	fn bit_count_too_large() {
		BitplaneMeta::from_bit_counts([0, 16, 0, 0]);
	}

	#[test]
	fn stream_total_bitplanes() {
		let mut stream = MeshletStream {
			offset_from_base: 7,
			..MeshletStream::default()
		};
		stream.bitplane_meta[0] = BitplaneMeta::from_bit_counts([1, 0, 0, 0]);
		stream.bitplane_meta[7] = BitplaneMeta::from_bit_counts([2, 3, 0, 1]);
		assert_eq!(stream.total_bitplanes(), 7);
		assert_eq!(stream.end_offset(), Some(14));
	}

	#[test]
	fn wire_layout() {
		let stream = MeshletStream {
			predictor_a: [1, 2, 3, 4],
			predictor_b: [5, 6, 7, 8],
			initial_value: [9, 10, 11, 12],
			offset_from_base: 13,
			bitplane_meta: [BitplaneMeta(14); MESHLET_PAYLOAD_NUM_CHUNKS],
		};
		let bytes = bytemuck::bytes_of(&stream);
		assert_eq!(&bytes[0..2], &[1, 0]);
		assert_eq!(&bytes[8..10], &[5, 0]);
		assert_eq!(&bytes[16..20], &[9, 10, 11, 12]);
		assert_eq!(&bytes[20..24], &[13, 0, 0, 0]);
		assert_eq!(&bytes[24..26], &[14, 0]);
		assert_eq!(&bytes[38..40], &[14, 0]);
	}
}
