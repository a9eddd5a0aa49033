//! Lockstep subgroup emulation: a subgroup's registers are an array with one entry per lane, and the cross lane
//! reductions operate on the whole array at once.

use crate::meshlet::MESHLET_PAYLOAD_SUBGROUP_SIZE;
use num_traits::WrappingAdd;

pub type Lanes<T> = [T; MESHLET_PAYLOAD_SUBGROUP_SIZE];

#[inline]
pub fn lanes_from_fn<T>(f: impl FnMut(usize) -> T) -> Lanes<T> {
	core::array::from_fn(f)
}

/// Lane `i` receives the sum of lanes `0..i`, lane 0 receives zero.
pub fn subgroup_exclusive_add<T: Copy + Default + WrappingAdd>(values: &Lanes<T>) -> Lanes<T> {
	let mut acc = T::default();
	lanes_from_fn(|i| {
		let out = acc;
		acc = acc.wrapping_add(&values[i]);
		out
	})
}

/// Lane `i` receives the sum of lanes `0..=i`.
pub fn subgroup_inclusive_add<T: Copy + Default + WrappingAdd>(values: &Lanes<T>) -> Lanes<T> {
	let mut acc = T::default();
	lanes_from_fn(|i| {
		acc = acc.wrapping_add(&values[i]);
		acc
	})
}
