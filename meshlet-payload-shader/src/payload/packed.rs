use core::ops::Add;
use glam::UVec2;
use num_traits::WrappingAdd;

/// Four 16 bit values packed two per u32, component x in the low half of the first word. This is the precision lane
/// values are reconstructed in before being narrowed down to 8 bits per component.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PackedU16x4(pub UVec2);

impl PackedU16x4 {
	pub const ZERO: Self = Self(UVec2::ZERO);

	/// Keeps the low byte of every 16 bit value.
	pub const LOW_BYTE_MASK: u32 = 0x00ff_00ff;

	#[inline]
	pub fn pack(v: [u16; 4]) -> Self {
		Self(UVec2::new(pack32(v[0], v[1]), pack32(v[2], v[3])))
	}

	#[inline]
	pub fn from_u8x4(v: [u8; 4]) -> Self {
		Self::pack(v.map(u16::from))
	}

	#[inline]
	pub fn unpack(self) -> [u16; 4] {
		let [x, y] = unpack32(self.0.x);
		let [z, w] = unpack32(self.0.y);
		[x, y, z, w]
	}

	#[inline]
	pub fn low_bytes(self) -> Self {
		Self(UVec2::new(
			self.0.x & Self::LOW_BYTE_MASK,
			self.0.y & Self::LOW_BYTE_MASK,
		))
	}

	/// Narrows every component to its low byte and packs them as `u8x4`, x in the lowest byte.
	#[inline]
	pub fn repack_u8x4(self) -> u32 {
		u32::from_le_bytes(self.unpack().map(|v| v as u8))
	}
}

#[inline]
fn pack32(low: u16, high: u16) -> u32 {
	low as u32 | ((high as u32) << 16)
}

#[inline]
fn unpack32(v: u32) -> [u16; 2] {
	[v as u16, (v >> 16) as u16]
}

/// Splits a decoded `u8x4` element into its components.
#[inline]
pub fn unpack_u8x4(v: u32) -> [u8; 4] {
	v.to_le_bytes()
}

/// Wraps on the packed words, so a carry out of the low half spills into the high half. Reconstruction keeps every
/// half small enough that this never happens.
impl Add for PackedU16x4 {
	type Output = Self;

	#[inline]
	fn add(self, rhs: Self) -> Self::Output {
		Self(self.0.wrapping_add(rhs.0))
	}
}

impl WrappingAdd for PackedU16x4 {
	#[inline]
	fn wrapping_add(&self, v: &Self) -> Self {
		*self + *v
	}
}
