use crate::meshlet::error::MeshletError;
use meshlet_payload_disk::meshlet::MESHLET_PAYLOAD_MAX_ELEMENTS;
use meshlet_payload_disk::meshlet::meta::MeshletMeta;
use smallvec::SmallVec;

/// Uncompressed attributes of a single meshlet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MeshletAttributes {
	pub base_vertex_offset: u32,
	pub num_primitives: usize,
	/// `u8x4` elements of every stream, all streams of a meshlet have the same length
	pub streams: SmallVec<[Vec<u32>; 4]>,
}

impl MeshletAttributes {
	pub fn num_attributes(&self) -> usize {
		self.streams.first().map_or(0, Vec::len)
	}
}

const RAW_MESHLET_STREAM_BYTES: usize = MESHLET_PAYLOAD_MAX_ELEMENTS * size_of::<u32>();

pub fn read_raw_words(bytes: &[u8]) -> Result<Vec<u32>, MeshletError> {
	if bytes.len() % size_of::<u32>() != 0 {
		return Err(MeshletError::RawWordSize { len: bytes.len() });
	}
	Ok(bytes
		.chunks_exact(size_of::<u32>())
		.map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
		.collect())
}

pub fn write_raw_words(words: &[u32]) -> Vec<u8> {
	words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Reads raw attributes, little endian u32 words laid out `[meshlet][stream][256]`. Raw meshlets are always full.
#[profiling::function]
pub fn read_raw_attributes(bytes: &[u8], num_u32_streams: usize) -> Result<Vec<MeshletAttributes>, MeshletError> {
	if num_u32_streams == 0 {
		return Err(MeshletError::NoStreams);
	}
	let meshlet_bytes = num_u32_streams * RAW_MESHLET_STREAM_BYTES;
	if bytes.len() % meshlet_bytes != 0 {
		return Err(MeshletError::RawSizeMismatch {
			len: bytes.len(),
			meshlet_bytes,
		});
	}
	let words = read_raw_words(bytes)?;
	Ok(words
		.chunks_exact(num_u32_streams * MESHLET_PAYLOAD_MAX_ELEMENTS)
		.enumerate()
		.map(|(meshlet, words)| MeshletAttributes {
			base_vertex_offset: (meshlet * MESHLET_PAYLOAD_MAX_ELEMENTS) as u32,
			num_primitives: MeshletMeta::MAX_COUNT,
			streams: words.chunks_exact(MESHLET_PAYLOAD_MAX_ELEMENTS).map(<[u32]>::to_vec).collect(),
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn raw_words() {
		let bytes = write_raw_words(&[0x04030201, 0xdeadbeef]);
		assert_eq!(bytes[..4], [1, 2, 3, 4]);
		assert_eq!(read_raw_words(&bytes).unwrap(), [0x04030201, 0xdeadbeef]);
		assert!(read_raw_words(&bytes[1..]).is_err());
	}

	#[test]
	fn raw_attributes() {
		let words = (0..2 * 3 * 256).collect::<Vec<u32>>();
		let meshlets = read_raw_attributes(&write_raw_words(&words), 3).unwrap();
		assert_eq!(meshlets.len(), 2);
		assert_eq!(meshlets[1].base_vertex_offset, 256);
		assert_eq!(meshlets[1].num_attributes(), 256);
		assert_eq!(meshlets[1].streams.len(), 3);
		assert_eq!(meshlets[1].streams[2][5], (3 + 2) * 256 + 5);
	}

	#[test]
	fn raw_words_must_be_whole() {
		let err = read_raw_words(&[1, 2, 3, 4, 5]).unwrap_err();
		assert!(matches!(err, MeshletError::RawWordSize { len: 5 }), "{err}");
		assert_eq!(err.to_string(), "Raw data of 5 bytes is not a multiple of 4 byte words");
		assert_eq!(read_raw_words(&[1, 0, 0, 0, 2, 0, 0, 0]).unwrap(), [1, 2]);
	}

	#[test]
	fn raw_attributes_size_mismatch() {
		let bytes = write_raw_words(&[0; 256 * 3]);
		let err = read_raw_attributes(&bytes, 2).unwrap_err();
		assert!(matches!(err, MeshletError::RawSizeMismatch { meshlet_bytes: 2048, .. }), "{err}");
		assert!(matches!(read_raw_attributes(&bytes, 0), Err(MeshletError::NoStreams)));
	}
}
