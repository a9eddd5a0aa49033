use crate::meshlet::{MESHLET_PAYLOAD_NUM_CHUNKS, MESHLET_PAYLOAD_SUBGROUP_SIZE};
use crate::payload::packed::PackedU16x4;
use crate::payload::resolve::ChunkBitplanes;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::Relaxed;
use glam::UVec2;

/// How many subgroups cooperate on a single meshlet.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum MeshletPayloadTeam {
	/// One subgroup of 32 lanes walks all chunks one after another.
	Single,
	/// One subgroup per chunk, 256 lanes decode a stream in a single pass.
	#[default]
	Wide,
}

impl MeshletPayloadTeam {
	pub const fn num_subgroups(self) -> usize {
		match self {
			MeshletPayloadTeam::Single => 1,
			MeshletPayloadTeam::Wide => MESHLET_PAYLOAD_NUM_CHUNKS,
		}
	}

	pub const fn workgroup_size(self) -> usize {
		self.num_subgroups() * MESHLET_PAYLOAD_SUBGROUP_SIZE
	}
}

/// The execution context of one subgroup within its team.
pub trait Workgroup {
	fn subgroup_id(&self) -> usize;

	fn num_subgroups(&self) -> usize;

	/// Blocks until every subgroup of the team has arrived. Writes to [`MeshletPayloadShared`] before the barrier are
	/// visible to all subgroups after it.
	fn barrier(&self);
}

/// A team consisting of a single subgroup, barriers are a no-op.
#[derive(Copy, Clone, Debug, Default)]
pub struct SingleSubgroup;

impl Workgroup for SingleSubgroup {
	#[inline]
	fn subgroup_id(&self) -> usize {
		0
	}

	#[inline]
	fn num_subgroups(&self) -> usize {
		1
	}

	#[inline]
	fn barrier(&self) {}
}

/// Slots for chunk aggregates, one per stream decoded at the same time.
pub const MESHLET_PAYLOAD_CHUNK_VALUE_SLOTS: usize = 2;

/// Workgroup shared memory of a team. Only ever accessed by the team owning it, and only between barriers, so relaxed
/// atomics suffice.
pub struct MeshletPayloadShared<const NUM_U32_STREAMS: usize> {
	chunk_bit_counts: [[AtomicU32; MESHLET_PAYLOAD_NUM_CHUNKS]; NUM_U32_STREAMS],
	chunk_offset: [[AtomicU32; MESHLET_PAYLOAD_NUM_CHUNKS]; NUM_U32_STREAMS],
	chunk_values: [[[AtomicU32; 2]; MESHLET_PAYLOAD_NUM_CHUNKS]; MESHLET_PAYLOAD_CHUNK_VALUE_SLOTS],
}

impl<const NUM_U32_STREAMS: usize> MeshletPayloadShared<NUM_U32_STREAMS> {
	pub fn new() -> Self {
		Self {
			chunk_bit_counts: core::array::from_fn(|_| core::array::from_fn(|_| AtomicU32::new(0))),
			chunk_offset: core::array::from_fn(|_| core::array::from_fn(|_| AtomicU32::new(0))),
			chunk_values: core::array::from_fn(|_| {
				core::array::from_fn(|_| core::array::from_fn(|_| AtomicU32::new(0)))
			}),
		}
	}

	#[inline]
	pub fn store_chunk(&self, stream_index: usize, chunk_id: usize, chunk: ChunkBitplanes) {
		let counts = u32::from_le_bytes(chunk.bit_counts.map(|c| c as u8));
		self.chunk_bit_counts[stream_index][chunk_id].store(counts, Relaxed);
		self.chunk_offset[stream_index][chunk_id].store(chunk.offset, Relaxed);
	}

	#[inline]
	pub fn load_chunk(&self, stream_index: usize, chunk_id: usize) -> ChunkBitplanes {
		let counts = self.chunk_bit_counts[stream_index][chunk_id].load(Relaxed);
		ChunkBitplanes {
			bit_counts: counts.to_le_bytes().map(u32::from),
			offset: self.chunk_offset[stream_index][chunk_id].load(Relaxed),
		}
	}

	#[inline]
	pub fn store_chunk_value(&self, slot: usize, chunk_id: usize, value: PackedU16x4) {
		let [x, y] = &self.chunk_values[slot][chunk_id];
		x.store(value.0.x, Relaxed);
		y.store(value.0.y, Relaxed);
	}

	#[inline]
	pub fn load_chunk_value(&self, slot: usize, chunk_id: usize) -> PackedU16x4 {
		let [x, y] = &self.chunk_values[slot][chunk_id];
		PackedU16x4(UVec2::new(x.load(Relaxed), y.load(Relaxed)))
	}
}

impl<const NUM_U32_STREAMS: usize> Default for MeshletPayloadShared<NUM_U32_STREAMS> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn team_sizes() {
		assert_eq!(MeshletPayloadTeam::Single.workgroup_size(), 32);
		assert_eq!(MeshletPayloadTeam::Wide.workgroup_size(), 256);
		assert_eq!(MESHLET_PAYLOAD_NUM_CHUNKS % MeshletPayloadTeam::Wide.num_subgroups(), 0);
	}

	#[test]
	fn shared_chunk_roundtrip() {
		let shared = MeshletPayloadShared::<2>::new();
		let chunk = ChunkBitplanes {
			bit_counts: [15, 0, 3, 7],
			offset: 123456,
		};
		shared.store_chunk(1, 7, chunk);
		assert_eq!(shared.load_chunk(1, 7), chunk);
		assert_eq!(shared.load_chunk(0, 7), ChunkBitplanes::default());

		let value = PackedU16x4::pack([1, 2, 3, 4]);
		shared.store_chunk_value(1, 3, value);
		assert_eq!(shared.load_chunk_value(1, 3), value);
		assert_eq!(shared.load_chunk_value(0, 3), PackedU16x4::ZERO);
	}
}
