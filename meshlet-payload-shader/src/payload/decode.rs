use crate::meshlet::meta::MeshletMeta;
use crate::meshlet::stream::MeshletStream;
use crate::meshlet::{MESHLET_PAYLOAD_NUM_CHUNKS, MESHLET_PAYLOAD_SUBGROUP_SIZE};
use crate::payload::bitplane::BitTransposedReader;
use crate::payload::buffers::MeshletPayloadBuffers;
use crate::payload::packed::PackedU16x4;
use crate::payload::predict::StreamPredictor;
use crate::payload::resolve::resolve_chunk_bitplanes;
use crate::payload::subgroup::{Lanes, lanes_from_fn, subgroup_inclusive_add};
use crate::payload::workgroup::{MESHLET_PAYLOAD_CHUNK_VALUE_SLOTS, MeshletPayloadShared, Workgroup};

/// Decodes meshlet streams on behalf of one subgroup of a team.
///
/// Every subgroup of the team must construct its own decoder over the same buffers and [`MeshletPayloadShared`] and
/// issue the exact same sequence of calls, as the calls contain barriers. A team of `W` subgroups decodes `W` chunks
/// per pass, subgroup `i` taking chunk `pass * W + i`, so a single subgroup team loops over all chunks while a wide team
/// of [`MESHLET_PAYLOAD_NUM_CHUNKS`] subgroups finishes in one pass. Either way the results are identical.
pub struct MeshletPayloadDecoder<'a, W: Workgroup, const NUM_U32_STREAMS: usize> {
	buffers: MeshletPayloadBuffers<'a>,
	shared: &'a MeshletPayloadShared<NUM_U32_STREAMS>,
	workgroup: &'a W,
}

impl<'a, W: Workgroup, const NUM_U32_STREAMS: usize> MeshletPayloadDecoder<'a, W, NUM_U32_STREAMS> {
	pub fn new(
		buffers: MeshletPayloadBuffers<'a>,
		shared: &'a MeshletPayloadShared<NUM_U32_STREAMS>,
		workgroup: &'a W,
	) -> Self {
		const { assert!(NUM_U32_STREAMS > 0, "NUM_U32_STREAMS must be at least 1") };
		let num_subgroups = workgroup.num_subgroups();
		assert!(
			num_subgroups > 0 && MESHLET_PAYLOAD_NUM_CHUNKS % num_subgroups == 0,
			"a team of {} subgroups can't evenly split {} chunks",
			num_subgroups,
			MESHLET_PAYLOAD_NUM_CHUNKS
		);
		assert!(workgroup.subgroup_id() < num_subgroups);
		Self {
			buffers,
			shared,
			workgroup,
		}
	}

	#[inline]
	pub fn buffers(&self) -> MeshletPayloadBuffers<'a> {
		self.buffers
	}

	#[inline]
	pub fn meta(&self, meshlet_index: usize) -> MeshletMeta {
		self.buffers.meta(meshlet_index)
	}

	#[inline]
	fn stream(&self, meshlet_index: usize, stream_index: usize) -> &'a MeshletStream {
		self.buffers.stream(NUM_U32_STREAMS, meshlet_index, stream_index)
	}

	/// Resolves the bit-plane offsets of every chunk of every stream of the meshlet into shared memory. Must be called
	/// once per meshlet before decoding any of its streams.
	pub fn init_workgroup(&self, meshlet_index: usize) {
		profiling::function_scope!();
		let subgroup_id = self.workgroup.subgroup_id();
		let num_subgroups = self.workgroup.num_subgroups();
		for stream_index in (subgroup_id..NUM_U32_STREAMS).step_by(num_subgroups) {
			let chunks = resolve_chunk_bitplanes(self.stream(meshlet_index, stream_index));
			for (chunk_id, chunk) in chunks.into_iter().enumerate() {
				self.shared.store_chunk(stream_index, chunk_id, chunk);
			}
		}
		self.workgroup.barrier();
	}

	/// Reads, predicts and prefix sums a single chunk. The result lacks the carry of all preceding chunks.
	fn process_chunk(
		&self,
		stream_index: usize,
		predictor: &StreamPredictor,
		chunk_id: usize,
	) -> Lanes<PackedU16x4> {
		let chunk = self.shared.load_chunk(stream_index, chunk_id);
		let values = lanes_from_fn(|lane| {
			let mut reader = BitTransposedReader::new(self.buffers.payload, chunk.offset, lane);
			let deltas = chunk.bit_counts.map(|bits| reader.read_signed(bits));
			let linear_index = (chunk_id * MESHLET_PAYLOAD_SUBGROUP_SIZE + lane) as u32;
			predictor.reconstruct(deltas, linear_index)
		});
		subgroup_inclusive_add(&values)
	}

	/// Decodes `N` consecutive streams starting at `first_stream` side by side, sharing the barriers between them.
	fn decode_streams<const N: usize>(
		&self,
		meshlet_index: usize,
		first_stream: usize,
		mut report: impl FnMut(u32, [u32; N]),
	) {
		const { assert!(N > 0 && N <= MESHLET_PAYLOAD_CHUNK_VALUE_SLOTS) };
		assert!(
			first_stream + N <= NUM_U32_STREAMS,
			"streams {}..{} out of bounds for {} streams",
			first_stream,
			first_stream + N,
			NUM_U32_STREAMS
		);
		let subgroup_id = self.workgroup.subgroup_id();
		let num_subgroups = self.workgroup.num_subgroups();
		let predictors: [StreamPredictor; N] =
			core::array::from_fn(|s| StreamPredictor::new(self.stream(meshlet_index, first_stream + s)));

		// masked aggregate of all chunks of previous passes
		let mut pass_carry = [PackedU16x4::ZERO; N];
		for pass in 0..MESHLET_PAYLOAD_NUM_CHUNKS / num_subgroups {
			let chunk_id = pass * num_subgroups + subgroup_id;
			let mut decoded: [Lanes<PackedU16x4>; N] =
				core::array::from_fn(|s| self.process_chunk(first_stream + s, &predictors[s], chunk_id));

			// resolve WAR hazard on chunk values from the last pass or stream
			self.workgroup.barrier();
			for s in 0..N {
				let last = decoded[s][MESHLET_PAYLOAD_SUBGROUP_SIZE - 1];
				self.shared.store_chunk_value(s, subgroup_id, last.low_bytes());
			}
			self.workgroup.barrier();
			for s in 0..N {
				// spread the slots over the subgroups, a single subgroup does them all
				if subgroup_id == s % num_subgroups {
					let values = lanes_from_fn(|lane| {
						if lane < num_subgroups {
							self.shared.load_chunk_value(s, lane)
						} else {
							PackedU16x4::ZERO
						}
					});
					let scanned = subgroup_inclusive_add(&values);
					for (lane, value) in scanned.into_iter().take(num_subgroups).enumerate() {
						self.shared.store_chunk_value(s, lane, value);
					}
				}
			}
			self.workgroup.barrier();

			for s in 0..N {
				let mut carry = pass_carry[s];
				if subgroup_id != 0 {
					carry = carry + self.shared.load_chunk_value(s, subgroup_id - 1);
				}
				for value in &mut decoded[s] {
					*value = *value + carry;
				}
				let pass_total = self.shared.load_chunk_value(s, num_subgroups - 1);
				pass_carry[s] = (pass_carry[s] + pass_total).low_bytes();
			}

			for lane in 0..MESHLET_PAYLOAD_SUBGROUP_SIZE {
				let linear_index = (chunk_id * MESHLET_PAYLOAD_SUBGROUP_SIZE + lane) as u32;
				report(linear_index, core::array::from_fn(|s| decoded[s][lane].repack_u8x4()));
			}
		}
	}

	/// Decodes a single stream, reporting the `u8x4` element of every lane this subgroup decoded by its linear index
	/// within the meshlet stream.
	pub fn decode_stream_32(&self, meshlet_index: usize, stream_index: usize, mut report: impl FnMut(u32, u32)) {
		self.decode_streams::<1>(meshlet_index, stream_index, |linear_index, [value]| {
			report(linear_index, value)
		});
	}

	/// Decodes streams `stream_index` and `stream_index + 1` at the same time.
	pub fn decode_stream_64(&self, meshlet_index: usize, stream_index: usize, report: impl FnMut(u32, [u32; 2])) {
		self.decode_streams::<2>(meshlet_index, stream_index, report);
	}

	/// Initializes the workgroup and decodes all streams of a meshlet, reporting `(stream_index, linear_index, value)`.
	pub fn decode_meshlet_32(&self, meshlet_index: usize, mut report: impl FnMut(usize, u32, u32)) {
		self.init_workgroup(meshlet_index);
		for stream_index in 0..NUM_U32_STREAMS {
			self.decode_stream_32(meshlet_index, stream_index, |linear_index, value| {
				report(stream_index, linear_index, value)
			});
		}
	}

	/// Initializes the workgroup and decodes all streams of a meshlet pairwise, reporting
	/// `(first_stream_index, linear_index, values)`.
	pub fn decode_meshlet_64(&self, meshlet_index: usize, mut report: impl FnMut(usize, u32, [u32; 2])) {
		const { assert!(NUM_U32_STREAMS % 2 == 0, "NUM_U32_STREAMS must be even to decode streams pairwise") };
		self.init_workgroup(meshlet_index);
		for stream_index in (0..NUM_U32_STREAMS).step_by(2) {
			self.decode_stream_64(meshlet_index, stream_index, |linear_index, values| {
				report(stream_index, linear_index, values)
			});
		}
	}
}
