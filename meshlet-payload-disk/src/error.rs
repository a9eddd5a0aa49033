use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
	#[error("io error: {0}")]
	Io(#[from] io::Error),

	#[error("archive error: {0}")]
	Archive(#[from] rkyv::rancor::Error),

	#[error("meshlets must have at least one stream")]
	NoStreams,

	#[error("{meshlets} meshlets with {num_u32_streams} streams each require {expected} streams, found {found}")]
	StreamCountMismatch {
		meshlets: usize,
		num_u32_streams: usize,
		expected: usize,
		found: usize,
	},

	#[error("stream {stream} of meshlet {meshlet} reads payload words {start}..{end}, payload has {payload_len}")]
	PayloadOutOfBounds {
		meshlet: usize,
		stream: usize,
		start: u64,
		end: u64,
		payload_len: usize,
	},

	#[error("payload of {len} words can't be addressed by u32 offsets")]
	PayloadTooLarge { len: usize },
}
