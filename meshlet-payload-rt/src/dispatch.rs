use crate::error::DispatchError;
use crate::sink::{DecodeSink, VecSink};
use crate::team::{TeamPoisoned, ThreadTeam};
use meshlet_payload_disk::validate::validate_buffers;
use meshlet_payload_shader::payload::buffers::MeshletPayloadBuffers;
use meshlet_payload_shader::payload::decode::MeshletPayloadDecoder;
use meshlet_payload_shader::payload::workgroup::{MeshletPayloadShared, MeshletPayloadTeam, SingleSubgroup, Workgroup};
use rayon::prelude::*;

/// Highest stream count [`decode_32_to_vec_dyn`] dispatches to.
pub const MESHLET_PAYLOAD_MAX_DYN_STREAMS: usize = 8;

/// Decodes all meshlets of some validated buffers on the CPU.
///
/// [`MeshletPayloadTeam::Single`] runs one single subgroup decoder per rayon worker. [`MeshletPayloadTeam::Wide`] spawns
/// `num_teams` teams of one thread per subgroup, each team decoding every `num_teams`-th meshlet. The decoded values
/// are identical either way.
#[derive(Copy, Clone, Debug)]
pub struct MeshletPayloadDispatch<'a, const NUM_U32_STREAMS: usize> {
	buffers: MeshletPayloadBuffers<'a>,
	team: MeshletPayloadTeam,
	num_teams: usize,
}

/// Something to run on every meshlet. Generic over the workgroup, which closures can't be.
trait MeshletKernel<const NUM_U32_STREAMS: usize>: Sync {
	fn run<W: Workgroup>(&self, decoder: &MeshletPayloadDecoder<'_, W, NUM_U32_STREAMS>, meshlet_index: usize);
}

struct Decode32<'s, S>(&'s S);

impl<const NUM_U32_STREAMS: usize, S: DecodeSink<u32>> MeshletKernel<NUM_U32_STREAMS> for Decode32<'_, S> {
	fn run<W: Workgroup>(&self, decoder: &MeshletPayloadDecoder<'_, W, NUM_U32_STREAMS>, meshlet_index: usize) {
		decoder.decode_meshlet_32(meshlet_index, |stream_index, linear_index, value| {
			self.0.report(meshlet_index, stream_index, linear_index, value)
		});
	}
}

struct Decode64<'s, S>(&'s S);

impl<const NUM_U32_STREAMS: usize, S: DecodeSink<[u32; 2]>> MeshletKernel<NUM_U32_STREAMS> for Decode64<'_, S> {
	fn run<W: Workgroup>(&self, decoder: &MeshletPayloadDecoder<'_, W, NUM_U32_STREAMS>, meshlet_index: usize) {
		decoder.decode_meshlet_64(meshlet_index, |stream_index, linear_index, values| {
			self.0.report(meshlet_index, stream_index, linear_index, values)
		});
	}
}

impl<'a, const NUM_U32_STREAMS: usize> MeshletPayloadDispatch<'a, NUM_U32_STREAMS> {
	pub fn new(buffers: MeshletPayloadBuffers<'a>, team: MeshletPayloadTeam) -> Result<Self, DispatchError> {
		validate_buffers(buffers, NUM_U32_STREAMS)?;
		let threads = std::thread::available_parallelism().map_or(1, |n| n.get());
		Ok(Self {
			buffers,
			team,
			num_teams: (threads / team.num_subgroups()).max(1),
		})
	}

	/// Sets how many [`MeshletPayloadTeam::Wide`] teams decode concurrently. Single subgroup decoders are scheduled by
	/// rayon instead.
	pub fn with_num_teams(self, num_teams: usize) -> Self {
		Self {
			num_teams: num_teams.max(1),
			..self
		}
	}

	#[inline]
	pub fn buffers(&self) -> MeshletPayloadBuffers<'a> {
		self.buffers
	}

	#[inline]
	pub fn team(&self) -> MeshletPayloadTeam {
		self.team
	}

	#[inline]
	pub fn num_teams(&self) -> usize {
		self.num_teams
	}

	fn run(&self, kernel: &impl MeshletKernel<NUM_U32_STREAMS>) {
		let num_meshlets = self.buffers.num_meshlets();
		if num_meshlets == 0 {
			return;
		}
		match self.team {
			MeshletPayloadTeam::Single => self.run_single(kernel, num_meshlets),
			MeshletPayloadTeam::Wide => self.run_teams(kernel, num_meshlets),
		}
	}

	fn run_single(&self, kernel: &impl MeshletKernel<NUM_U32_STREAMS>, num_meshlets: usize) {
		(0..num_meshlets)
			.into_par_iter()
			.for_each_init(MeshletPayloadShared::<NUM_U32_STREAMS>::new, |shared, meshlet_index| {
				let decoder = MeshletPayloadDecoder::new(self.buffers, shared, &SingleSubgroup);
				kernel.run(&decoder, meshlet_index);
			});
	}

	fn run_teams(&self, kernel: &impl MeshletKernel<NUM_U32_STREAMS>, num_meshlets: usize) {
		let num_teams = self.num_teams.min(num_meshlets);
		let num_subgroups = self.team.num_subgroups();
		let teams = (0..num_teams)
			.map(|_| ThreadTeam::<NUM_U32_STREAMS>::new(num_subgroups))
			.collect::<Vec<_>>();
		let mut panics = std::thread::scope(|scope| {
			let mut handles = Vec::with_capacity(num_teams * num_subgroups);
			for (team_id, team) in teams.iter().enumerate() {
				for subgroup_id in 0..num_subgroups {
					let buffers = self.buffers;
					handles.push(scope.spawn(move || {
						profiling::register_thread!("meshlet payload team");
						let subgroup = team.subgroup(subgroup_id);
						let decoder = MeshletPayloadDecoder::new(buffers, team.shared(), &subgroup);
						for meshlet_index in (team_id..num_meshlets).step_by(num_teams) {
							kernel.run(&decoder, meshlet_index);
						}
					}));
				}
			}
			handles
				.into_iter()
				.filter_map(|handle| handle.join().err())
				.collect::<Vec<_>>()
		});

		// rethrow the panic that poisoned a team, not the teammates unwinding because of it
		if !panics.is_empty() {
			let index = panics.iter().position(|payload| !payload.is::<TeamPoisoned>()).unwrap_or(0);
			std::panic::resume_unwind(panics.swap_remove(index));
		}
	}

	/// Decodes every stream of every meshlet, reporting each `u8x4` element to `sink`.
	#[profiling::function]
	pub fn decode_32(&self, sink: &impl DecodeSink<u32>) {
		self.run(&Decode32(sink));
	}

	/// Decodes streams pairwise, reporting the first stream index of each pair.
	#[profiling::function]
	pub fn decode_64(&self, sink: &impl DecodeSink<[u32; 2]>) {
		const { assert!(NUM_U32_STREAMS % 2 == 0, "NUM_U32_STREAMS must be even to decode streams pairwise") };
		self.run(&Decode64(sink));
	}

	/// Decodes into a `Vec` laid out `[meshlet][stream][element]`.
	pub fn decode_32_to_vec(&self) -> Vec<u32> {
		let sink = VecSink::new(self.buffers.num_meshlets(), NUM_U32_STREAMS);
		self.decode_32(&sink);
		sink.into_vec()
	}
}

/// [`MeshletPayloadDispatch::decode_32_to_vec`] for a stream count only known at runtime.
pub fn decode_32_to_vec_dyn(
	buffers: MeshletPayloadBuffers<'_>,
	num_u32_streams: usize,
	team: MeshletPayloadTeam,
	num_teams: Option<usize>,
) -> Result<Vec<u32>, DispatchError> {
	fn decode<const N: usize>(
		buffers: MeshletPayloadBuffers<'_>,
		team: MeshletPayloadTeam,
		num_teams: Option<usize>,
	) -> Result<Vec<u32>, DispatchError> {
		let mut dispatch = MeshletPayloadDispatch::<N>::new(buffers, team)?;
		if let Some(num_teams) = num_teams {
			dispatch = dispatch.with_num_teams(num_teams);
		}
		Ok(dispatch.decode_32_to_vec())
	}

	match num_u32_streams {
		1 => decode::<1>(buffers, team, num_teams),
		2 => decode::<2>(buffers, team, num_teams),
		3 => decode::<3>(buffers, team, num_teams),
		4 => decode::<4>(buffers, team, num_teams),
		5 => decode::<5>(buffers, team, num_teams),
		6 => decode::<6>(buffers, team, num_teams),
		7 => decode::<7>(buffers, team, num_teams),
		8 => decode::<8>(buffers, team, num_teams),
		found => Err(DispatchError::UnsupportedStreamCount {
			found,
			max: MESHLET_PAYLOAD_MAX_DYN_STREAMS,
		}),
	}
}
