use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum MeshletError {
	NoStreams,
	RawWordSize {
		len: usize,
	},
	RawSizeMismatch {
		len: usize,
		meshlet_bytes: usize,
	},
	StreamCountMismatch {
		meshlet: usize,
		expected: usize,
		found: usize,
	},
	ElementCount {
		meshlet: usize,
		stream: usize,
		count: usize,
	},
	ElementCountMismatch {
		meshlet: usize,
		stream: usize,
		expected: usize,
		found: usize,
	},
	PrimitiveCount {
		meshlet: usize,
		count: usize,
	},
	PayloadTooLarge,
}

impl Display for MeshletError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			MeshletError::NoStreams => f.write_str("Meshlets must have at least one stream"),
			MeshletError::RawWordSize { len } => {
				write!(f, "Raw data of {len} bytes is not a multiple of 4 byte words")
			}
			MeshletError::RawSizeMismatch { len, meshlet_bytes } => write!(
				f,
				"Raw attributes of {len} bytes are not a multiple of {meshlet_bytes} bytes per meshlet"
			),
			MeshletError::StreamCountMismatch {
				meshlet,
				expected,
				found,
			} => write!(f, "Meshlet {meshlet} has {found} streams instead of {expected}"),
			MeshletError::ElementCount { meshlet, stream, count } => write!(
				f,
				"Stream {stream} of meshlet {meshlet} has {count} elements, must be within 1..=256"
			),
			MeshletError::ElementCountMismatch {
				meshlet,
				stream,
				expected,
				found,
			} => write!(
				f,
				"Stream {stream} of meshlet {meshlet} has {found} elements while stream 0 has {expected}"
			),
			MeshletError::PrimitiveCount { meshlet, count } => write!(
				f,
				"Meshlet {meshlet} has {count} primitives, must be within 1..=256"
			),
			MeshletError::PayloadTooLarge => f.write_str("Payload exceeds what u32 offsets can address"),
		}
	}
}

impl std::error::Error for MeshletError {}
