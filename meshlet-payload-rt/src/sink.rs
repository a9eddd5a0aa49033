use meshlet_payload_shader::meshlet::MESHLET_PAYLOAD_MAX_ELEMENTS;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering::Relaxed;

/// Receives decoded elements. Called concurrently from many threads, each element exactly once.
pub trait DecodeSink<T>: Sync {
	fn report(&self, meshlet_index: usize, stream_index: usize, linear_index: u32, value: T);
}

impl<T, F> DecodeSink<T> for F
where
	F: Fn(usize, usize, u32, T) + Sync,
{
	#[inline]
	fn report(&self, meshlet_index: usize, stream_index: usize, linear_index: u32, value: T) {
		self(meshlet_index, stream_index, linear_index, value)
	}
}

/// Collects decoded elements laid out `[meshlet][stream][element]`, the same way raw attribute files are.
pub struct VecSink {
	num_u32_streams: usize,
	values: Vec<AtomicU32>,
}

impl VecSink {
	pub fn new(num_meshlets: usize, num_u32_streams: usize) -> Self {
		let len = num_meshlets * num_u32_streams * MESHLET_PAYLOAD_MAX_ELEMENTS;
		Self {
			num_u32_streams,
			values: (0..len).map(|_| AtomicU32::new(0)).collect(),
		}
	}

	#[inline]
	fn index(&self, meshlet_index: usize, stream_index: usize, linear_index: u32) -> usize {
		(meshlet_index * self.num_u32_streams + stream_index) * MESHLET_PAYLOAD_MAX_ELEMENTS + linear_index as usize
	}

	pub fn into_vec(self) -> Vec<u32> {
		self.values.into_iter().map(AtomicU32::into_inner).collect()
	}
}

impl DecodeSink<u32> for VecSink {
	#[inline]
	fn report(&self, meshlet_index: usize, stream_index: usize, linear_index: u32, value: u32) {
		self.values[self.index(meshlet_index, stream_index, linear_index)].store(value, Relaxed);
	}
}

impl DecodeSink<[u32; 2]> for VecSink {
	#[inline]
	fn report(&self, meshlet_index: usize, stream_index: usize, linear_index: u32, value: [u32; 2]) {
		for (i, value) in value.into_iter().enumerate() {
			self.values[self.index(meshlet_index, stream_index + i, linear_index)].store(value, Relaxed);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn layout() {
		let sink = VecSink::new(2, 3);
		DecodeSink::<u32>::report(&sink, 1, 2, 7, 42);
		DecodeSink::<[u32; 2]>::report(&sink, 0, 1, 255, [1, 2]);
		let vec = sink.into_vec();
		assert_eq!(vec.len(), 2 * 3 * 256);
		assert_eq!(vec[(3 + 2) * 256 + 7], 42);
		assert_eq!(vec[256 + 255], 1);
		assert_eq!(vec[2 * 256 + 255], 2);
		assert_eq!(vec.iter().filter(|v| **v != 0).count(), 3);
	}
}
