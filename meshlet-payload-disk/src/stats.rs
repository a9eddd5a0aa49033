use meshlet_payload_shader::meshlet::meta::MeshletMeta;
use meshlet_payload_shader::meshlet::stream::MeshletStream;
use meshlet_payload_shader::payload::buffers::MeshletPayloadBuffers;
use rkyv::{Archive, Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Archive, Serialize, Deserialize)]
pub struct MeshletPayloadStats {
	pub meshlets: u64,
	pub streams: u64,
	/// elements within the attribute count of their meshlet, padding is not counted
	pub elements: u64,
	/// payload words referenced by streams
	pub payload_words: u64,
	pub component_chunks: u64,
	/// component chunks that did not need a single bit-plane
	pub zero_plane_chunks: u64,
}

impl MeshletPayloadStats {
	pub fn from_meshlet(meta: MeshletMeta, streams: &[MeshletStream]) -> Self {
		let component_chunks = streams.iter().flat_map(|s| s.bitplane_meta.iter().flat_map(|m| m.bit_counts()));
		Self {
			meshlets: 1,
			streams: streams.len() as u64,
			elements: (meta.num_attributes() * streams.len()) as u64,
			payload_words: streams.iter().map(|s| s.total_bitplanes() as u64).sum(),
			component_chunks: component_chunks.clone().count() as u64,
			zero_plane_chunks: component_chunks.filter(|bits| *bits == 0).count() as u64,
		}
	}

	pub fn from_buffers(buffers: MeshletPayloadBuffers<'_>, num_u32_streams: usize) -> Self {
		(0..buffers.num_meshlets())
			.map(|meshlet| {
				let streams = &buffers.streams[meshlet * num_u32_streams..(meshlet + 1) * num_u32_streams];
				Self::from_meshlet(buffers.meta(meshlet), streams)
			})
			.sum()
	}

	/// Average payload bits spent per element, 32 would be uncompressed.
	pub fn bits_per_element(&self) -> f64 {
		if self.elements == 0 {
			0.
		} else {
			(self.payload_words * u32::BITS as u64) as f64 / self.elements as f64
		}
	}
}

impl Add for MeshletPayloadStats {
	type Output = MeshletPayloadStats;

	fn add(self, rhs: Self) -> Self::Output {
		Self {
			meshlets: self.meshlets + rhs.meshlets,
			streams: self.streams + rhs.streams,
			elements: self.elements + rhs.elements,
			payload_words: self.payload_words + rhs.payload_words,
			component_chunks: self.component_chunks + rhs.component_chunks,
			zero_plane_chunks: self.zero_plane_chunks + rhs.zero_plane_chunks,
		}
	}
}

impl AddAssign for MeshletPayloadStats {
	fn add_assign(&mut self, rhs: Self) {
		*self = *self + rhs;
	}
}

impl Sum for MeshletPayloadStats {
	fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.fold(Self::default(), |acc, x| acc + x)
	}
}
