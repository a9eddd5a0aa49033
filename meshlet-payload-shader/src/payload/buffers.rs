use crate::meshlet::meta::MeshletMeta;
use crate::meshlet::stream::MeshletStream;
use bytemuck::PodCastError;

/// The three read-only buffers a decode runs over. Streams are laid out meshlet major, `NUM_U32_STREAMS` consecutive
/// entries per meshlet.
#[derive(Copy, Clone, Debug)]
pub struct MeshletPayloadBuffers<'a> {
	pub metas: &'a [MeshletMeta],
	pub streams: &'a [MeshletStream],
	pub payload: &'a [u32],
}

impl<'a> MeshletPayloadBuffers<'a> {
	pub fn new(metas: &'a [MeshletMeta], streams: &'a [MeshletStream], payload: &'a [u32]) -> Self {
		Self {
			metas,
			streams,
			payload,
		}
	}

	/// Reinterprets raw buffer contents, as they would be uploaded to a device.
	pub fn try_from_bytes(metas: &'a [u8], streams: &'a [u8], payload: &'a [u8]) -> Result<Self, PodCastError> {
		Ok(Self {
			metas: bytemuck::try_cast_slice(metas)?,
			streams: bytemuck::try_cast_slice(streams)?,
			payload: bytemuck::try_cast_slice(payload)?,
		})
	}

	#[inline]
	pub fn num_meshlets(&self) -> usize {
		self.metas.len()
	}

	#[inline]
	pub fn meta(&self, meshlet_index: usize) -> MeshletMeta {
		self.metas[meshlet_index]
	}

	#[inline]
	pub fn stream(&self, num_u32_streams: usize, meshlet_index: usize, stream_index: usize) -> &'a MeshletStream {
		&self.streams[num_u32_streams * meshlet_index + stream_index]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_bytes() {
		let metas = [MeshletMeta::new(3, 4, 5)];
		let streams = [MeshletStream::default(), MeshletStream {
			offset_from_base: 42,
			..MeshletStream::default()
		}];
		let payload = [1u32, 2, 3];
		let buffers = MeshletPayloadBuffers::try_from_bytes(
			bytemuck::cast_slice(&metas),
			bytemuck::cast_slice(&streams),
			bytemuck::cast_slice(&payload),
		)
		.unwrap();
		assert_eq!(buffers.num_meshlets(), 1);
		assert_eq!(buffers.meta(0), metas[0]);
		assert_eq!(buffers.stream(2, 0, 1).offset_from_base, 42);
		assert_eq!(buffers.payload, &payload);
	}

	#[test]
	fn from_bytes_wrong_size() {
		let bytes = [0u32; 3];
		let err = MeshletPayloadBuffers::try_from_bytes(bytemuck::cast_slice(&bytes), &[], &[]).unwrap_err();
		assert_eq!(err, PodCastError::OutputSliceWouldHaveSlop);
	}
}
