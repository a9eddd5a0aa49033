use crate::error::PayloadError;
use meshlet_payload_shader::payload::buffers::MeshletPayloadBuffers;

/// Checks buffers from an untrusted source before handing them to the decoder, which assumes well-formed input and
/// panics on out of bounds reads. Verifies the stream count and that every stream's bit-planes lie within the payload.
#[profiling::function]
pub fn validate_buffers(buffers: MeshletPayloadBuffers<'_>, num_u32_streams: usize) -> Result<(), PayloadError> {
	if num_u32_streams == 0 {
		return Err(PayloadError::NoStreams);
	}
	let meshlets = buffers.num_meshlets();
	let expected = meshlets.saturating_mul(num_u32_streams);
	if buffers.streams.len() != expected {
		return Err(PayloadError::StreamCountMismatch {
			meshlets,
			num_u32_streams,
			expected,
			found: buffers.streams.len(),
		});
	}
	let payload_len = buffers.payload.len();
	if payload_len > u32::MAX as usize {
		return Err(PayloadError::PayloadTooLarge { len: payload_len });
	}

	for meshlet in 0..meshlets {
		for stream in 0..num_u32_streams {
			let s = buffers.stream(num_u32_streams, meshlet, stream);
			let start = s.offset_from_base as u64;
			let end = start + s.total_bitplanes() as u64;
			if end > payload_len as u64 {
				return Err(PayloadError::PayloadOutOfBounds {
					meshlet,
					stream,
					start,
					end,
					payload_len,
				});
			}
		}
	}
	Ok(())
}
