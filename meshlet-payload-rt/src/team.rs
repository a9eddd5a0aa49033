use meshlet_payload_shader::payload::workgroup::{MeshletPayloadShared, Workgroup};
use parking_lot::{Condvar, Mutex};

/// Panic payload of subgroups unwinding because a teammate panicked.
#[derive(Copy, Clone, Debug)]
pub struct TeamPoisoned;

#[derive(Debug, Default)]
struct BarrierState {
	arrived: usize,
	generation: u64,
	poisoned: bool,
}

/// A [`std::sync::Barrier`] that can be poisoned. Once poisoned every waiting and every future arrival unwinds with
/// [`TeamPoisoned`] instead of waiting for a subgroup that will never arrive.
#[derive(Debug)]
struct TeamBarrier {
	state: Mutex<BarrierState>,
	condvar: Condvar,
	num_subgroups: usize,
}

impl TeamBarrier {
	fn new(num_subgroups: usize) -> Self {
		Self {
			state: Mutex::new(BarrierState::default()),
			condvar: Condvar::new(),
			num_subgroups,
		}
	}

	fn wait(&self) {
		let mut state = self.state.lock();
		if !state.poisoned {
			state.arrived += 1;
			if state.arrived == self.num_subgroups {
				state.arrived = 0;
				state.generation = state.generation.wrapping_add(1);
				self.condvar.notify_all();
				return;
			}
			let generation = state.generation;
			self.condvar.wait_while(&mut state, |s| s.generation == generation && !s.poisoned);
			if state.generation != generation {
				return;
			}
		}
		drop(state);
		std::panic::panic_any(TeamPoisoned);
	}

	fn poison(&self) {
		let mut state = self.state.lock();
		state.poisoned = true;
		self.condvar.notify_all();
	}

	fn is_poisoned(&self) -> bool {
		self.state.lock().poisoned
	}
}

/// A team of OS threads, one per subgroup, emulating a workgroup. Each thread drives a [`ThreadSubgroup`] and all of
/// them share the team's scratch memory.
///
/// A subgroup panicking poisons the team's barrier, so its teammates unwind with [`TeamPoisoned`] instead of hanging.
pub struct ThreadTeam<const NUM_U32_STREAMS: usize> {
	shared: MeshletPayloadShared<NUM_U32_STREAMS>,
	barrier: TeamBarrier,
	num_subgroups: usize,
}

impl<const NUM_U32_STREAMS: usize> ThreadTeam<NUM_U32_STREAMS> {
	pub fn new(num_subgroups: usize) -> Self {
		assert!(num_subgroups > 0, "a team needs at least one subgroup");
		Self {
			shared: MeshletPayloadShared::new(),
			barrier: TeamBarrier::new(num_subgroups),
			num_subgroups,
		}
	}

	#[inline]
	pub fn shared(&self) -> &MeshletPayloadShared<NUM_U32_STREAMS> {
		&self.shared
	}

	#[inline]
	pub fn num_subgroups(&self) -> usize {
		self.num_subgroups
	}

	/// Whether a subgroup of this team has panicked.
	pub fn is_poisoned(&self) -> bool {
		self.barrier.is_poisoned()
	}

	pub fn subgroup(&self, subgroup_id: usize) -> ThreadSubgroup<'_> {
		assert!(
			subgroup_id < self.num_subgroups,
			"subgroup {} out of bounds for a team of {}",
			subgroup_id,
			self.num_subgroups
		);
		ThreadSubgroup {
			subgroup_id,
			num_subgroups: self.num_subgroups,
			barrier: &self.barrier,
		}
	}
}

/// One subgroup of a [`ThreadTeam`]. Must only be used by a single thread, as every subgroup has to arrive at each
/// barrier exactly once. Dropping it while panicking poisons the team.
pub struct ThreadSubgroup<'a> {
	subgroup_id: usize,
	num_subgroups: usize,
	barrier: &'a TeamBarrier,
}

impl Drop for ThreadSubgroup<'_> {
	fn drop(&mut self) {
		if std::thread::panicking() {
			self.barrier.poison();
		}
	}
}

impl Workgroup for ThreadSubgroup<'_> {
	#[inline]
	fn subgroup_id(&self) -> usize {
		self.subgroup_id
	}

	#[inline]
	fn num_subgroups(&self) -> usize {
		self.num_subgroups
	}

	#[inline]
	fn barrier(&self) {
		profiling::scope!("barrier");
		self.barrier.wait();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::AtomicU32;
	use std::sync::atomic::Ordering::Relaxed;

	#[test]
	fn barrier_publishes_writes() {
		let team = ThreadTeam::<1>::new(4);
		let slots: [AtomicU32; 4] = core::array::from_fn(|_| AtomicU32::new(0));
		std::thread::scope(|scope| {
			for id in 0..team.num_subgroups() {
				let subgroup = team.subgroup(id);
				let slots = &slots;
				scope.spawn(move || {
					for round in 1..=100 {
						slots[subgroup.subgroup_id()].store(round * 10 + subgroup.subgroup_id() as u32, Relaxed);
						subgroup.barrier();
						for (other, slot) in slots.iter().enumerate() {
							assert_eq!(slot.load(Relaxed), round * 10 + other as u32);
						}
						subgroup.barrier();
					}
				});
			}
		});
	}

	#[test]
	fn panic_releases_teammates() {
		let team = ThreadTeam::<1>::new(3);
		let results = std::thread::scope(|scope| {
			let handles = (0..team.num_subgroups())
				.map(|id| {
					let subgroup = team.subgroup(id);
					scope.spawn(move || {
						subgroup.barrier();
						if subgroup.subgroup_id() == 1 {
							panic!("subgroup 1 failed");
						}
						subgroup.barrier();
					})
				})
				.collect::<Vec<_>>();
			handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
		});
		assert!(team.is_poisoned());
		for (id, result) in results.into_iter().enumerate() {
			let payload = result.unwrap_err();
			if id == 1 {
				assert_eq!(payload.downcast_ref::<&str>(), Some(&"subgroup 1 failed"));
			} else {
				assert!(payload.is::<TeamPoisoned>(), "subgroup {id}");
			}
		}
	}

	#[test]
	fn poisoned_barrier_unwinds_late_arrivals() {
		let team = ThreadTeam::<1>::new(2);
		team.barrier.poison();
		let subgroup = team.subgroup(0);
		let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| subgroup.barrier())).unwrap_err();
		assert!(payload.is::<TeamPoisoned>());
	}

	#[test]
	#[should_panic(expected = "subgroup 8 out of bounds for a team of 8")]
	fn subgroup_out_of_bounds() {
		ThreadTeam::<1>::new(8).subgroup(8);
	}
}
