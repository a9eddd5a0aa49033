use crate::meshlet::stream::MeshletStream;
use crate::meshlet::{MESHLET_PAYLOAD_COMPONENTS, MESHLET_PAYLOAD_NUM_CHUNKS};
use crate::payload::subgroup::{lanes_from_fn, subgroup_exclusive_add};

/// Where a chunk's bit-planes start and how many each component has.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ChunkBitplanes {
	pub bit_counts: [u32; MESHLET_PAYLOAD_COMPONENTS],
	pub offset: u32,
}

/// Resolves the bit-plane layout of every chunk of a stream. Lane `c` of the subgroup handles chunk `c`, an
/// exclusive add over the chunk sizes yields each chunk's start relative to the stream's first word.
pub fn resolve_chunk_bitplanes(stream: &MeshletStream) -> [ChunkBitplanes; MESHLET_PAYLOAD_NUM_CHUNKS] {
	let active = |lane: usize| lane < MESHLET_PAYLOAD_NUM_CHUNKS;
	let total_bits = lanes_from_fn(|lane| {
		if active(lane) {
			stream.bitplane_meta[lane].total_bits()
		} else {
			0
		}
	});
	let offsets = subgroup_exclusive_add(&total_bits);
	core::array::from_fn(|chunk| ChunkBitplanes {
		bit_counts: stream.bitplane_meta[chunk].bit_counts(),
		offset: offsets[chunk].wrapping_add(stream.offset_from_base),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::meshlet::stream::BitplaneMeta;

	#[test]
	fn offsets_follow_previous_chunks() {
		let mut stream = MeshletStream {
			offset_from_base: 100,
			..MeshletStream::default()
		};
		stream.bitplane_meta[0] = BitplaneMeta::from_bit_counts([1, 2, 3, 4]);
		stream.bitplane_meta[1] = BitplaneMeta::from_bit_counts([0, 0, 0, 0]);
		stream.bitplane_meta[2] = BitplaneMeta::from_bit_counts([15, 15, 15, 15]);
		stream.bitplane_meta[3] = BitplaneMeta::from_bit_counts([0, 1, 0, 0]);

		let chunks = resolve_chunk_bitplanes(&stream);
		assert_eq!(
			chunks[0],
			ChunkBitplanes {
				bit_counts: [1, 2, 3, 4],
				offset: 100
			}
		);
		assert_eq!(chunks[1].offset, 110);
		assert_eq!(chunks[1].bit_counts, [0; 4]);
		assert_eq!(chunks[2].offset, 110);
		assert_eq!(chunks[3].offset, 170);
		assert_eq!(chunks[3].bit_counts, [0, 1, 0, 0]);
		for chunk in &chunks[4..] {
			assert_eq!(chunk.offset, 171);
		}
	}

	#[test]
	fn empty_stream() {
		let stream = MeshletStream::default();
		for chunk in resolve_chunk_bitplanes(&stream) {
			assert_eq!(chunk, ChunkBitplanes::default());
		}
	}
}
