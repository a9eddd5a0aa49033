use core::fmt::{Debug, Formatter};
use core::mem::size_of;
use core::ops::Range;
use static_assertions::const_assert_eq;

/// Per meshlet information on how decoded streams map onto primitives and attributes. Counts are stored minus one, so
/// a meshlet always has between 1 and 256 of each.
#[repr(C)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, bytemuck_derive::Zeroable, bytemuck_derive::Pod)]
#[cfg_attr(feature = "disk", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
pub struct MeshletMeta {
	pub base_vertex_offset: u32,
	pub num_primitives_minus_1: u8,
	pub num_attributes_minus_1: u8,
	/// must be ignored when decoding
	pub reserved: u16,
}
const_assert_eq!(size_of::<MeshletMeta>(), 8);

impl MeshletMeta {
	pub const MAX_COUNT: usize = u8::MAX as usize + 1;

	#[inline]
	pub fn new(base_vertex_offset: u32, num_primitives: usize, num_attributes: usize) -> Self {
		assert!(
			(1..=Self::MAX_COUNT).contains(&num_primitives),
			"num_primitives {} must be within 1..={}",
			num_primitives,
			Self::MAX_COUNT
		);
		assert!(
			(1..=Self::MAX_COUNT).contains(&num_attributes),
			"num_attributes {} must be within 1..={}",
			num_attributes,
			Self::MAX_COUNT
		);
		Self {
			base_vertex_offset,
			num_primitives_minus_1: (num_primitives - 1) as u8,
			num_attributes_minus_1: (num_attributes - 1) as u8,
			reserved: 0,
		}
	}

	#[inline]
	pub fn num_primitives(&self) -> usize {
		self.num_primitives_minus_1 as usize + 1
	}

	#[inline]
	pub fn num_attributes(&self) -> usize {
		self.num_attributes_minus_1 as usize + 1
	}

	/// The vertices this meshlet's decoded attributes belong to. Decoded elements past `num_attributes` are padding.
	/// Clamped to `u32::MAX`, as metas read from disk may carry any offset.
	#[inline]
	pub fn vertex_range(&self) -> Range<u32> {
		self.base_vertex_offset..self.base_vertex_offset.saturating_add(self.num_attributes() as u32)
	}
}

impl Debug for MeshletMeta {
	fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("MeshletMeta")
			.field("base_vertex_offset", &self.base_vertex_offset)
			.field("num_primitives", &self.num_primitives())
			.field("num_attributes", &self.num_attributes())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_are_stored_minus_one() {
		let meta = MeshletMeta::new(100, 1, 256);
		assert_eq!(meta.num_primitives_minus_1, 0);
		assert_eq!(meta.num_attributes_minus_1, 255);
		assert_eq!(meta.num_primitives(), 1);
		assert_eq!(meta.num_attributes(), 256);
		assert_eq!(meta.vertex_range(), 100..356);
	}

	#[test]
	fn vertex_range_saturates() {
		let meta = MeshletMeta::new(u32::MAX - 10, 1, 256);
		assert_eq!(meta.vertex_range(), u32::MAX - 10..u32::MAX);
		let meta = MeshletMeta::new(u32::MAX - 256, 1, 256);
		assert_eq!(meta.vertex_range(), u32::MAX - 256..u32::MAX);
	}

	#[test]
	fn wire_layout() {
		let meta = MeshletMeta {
			base_vertex_offset: 0x04030201,
			num_primitives_minus_1: 5,
			num_attributes_minus_1: 6,
			reserved: 0xffff,
		};
		assert_eq!(bytemuck::bytes_of(&meta), &[1, 2, 3, 4, 5, 6, 0xff, 0xff]);
	}

	#[test]
	#[should_panic(expected = "num_attributes 257 must be within")]
	fn too_many_attributes() {
		MeshletMeta::new(0, 1, 257);
	}

	#[test]
	#[should_panic(expected = "num_primitives 0 must be within")]
	fn zero_primitives() {
		MeshletMeta::new(0, 0, 1);
	}
}
