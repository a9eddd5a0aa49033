use crate::meshlet::attributes::{MeshletAttributes, read_raw_attributes, write_raw_words};
use crate::meshlet::error::MeshletError;
use crate::meshlet::process::{pad_stream, process_meshlets, verify_meshlets};
use meshlet_payload_disk::disk::MeshletPayloadDisk;
use meshlet_payload_disk::meshlet::MESHLET_PAYLOAD_MAX_ELEMENTS;
use meshlet_payload_disk::payload::workgroup::MeshletPayloadTeam;
use meshlet_payload_rt::dispatch::decode_32_to_vec_dyn;
use smallvec::SmallVec;

fn rng(seed: u32) -> impl FnMut() -> u32 {
	let mut state = seed | 1;
	move || {
		state ^= state << 13;
		state ^= state >> 17;
		state ^= state << 5;
		state
	}
}

/// Something resembling quantized vertex attributes: smooth per component with some noise.
fn meshlets(count: usize, num_u32_streams: usize, seed: u32) -> Vec<MeshletAttributes> {
	let mut rng = rng(seed);
	(0..count)
		.map(|m| {
			let len = 1 + rng() as usize % MESHLET_PAYLOAD_MAX_ELEMENTS;
			let streams = (0..num_u32_streams)
				.map(|_| {
					let start = rng().to_le_bytes();
					let step = rng().to_le_bytes().map(|b| b & 7);
					(0..len)
						.map(|i| {
							let noise = rng().to_le_bytes().map(|b| b & 1);
							u32::from_le_bytes(core::array::from_fn(|c| {
								start[c].wrapping_add(step[c].wrapping_mul(i as u8)).wrapping_add(noise[c])
							}))
						})
						.collect::<Vec<_>>()
				})
				.collect::<SmallVec<_>>();
			MeshletAttributes {
				base_vertex_offset: m as u32 * 1000,
				num_primitives: 1 + rng() as usize % 256,
				streams,
			}
		})
		.collect()
}

#[test]
fn end_to_end() -> anyhow::Result<()> {
	let meshlets = meshlets(20, 3, 1);
	for team in [MeshletPayloadTeam::Single, MeshletPayloadTeam::Wide] {
		let disk = verify_meshlets(&meshlets, 3, team, Some(3))?;
		assert_eq!(disk.metas.len(), 20);
		assert_eq!(disk.stats.meshlets, 20);
		assert_eq!(
			disk.stats.elements,
			meshlets.iter().map(|m| (m.num_attributes() * 3) as u64).sum::<u64>()
		);
	}
	Ok(())
}

#[test]
fn metas_and_padding() -> anyhow::Result<()> {
	let meshlets = meshlets(5, 2, 2);
	let disk = process_meshlets(&meshlets, 2)?;
	disk.validate()?;
	for (meta, meshlet) in disk.metas.iter().zip(&meshlets) {
		assert_eq!(meta.base_vertex_offset, meshlet.base_vertex_offset);
		assert_eq!(meta.num_primitives(), meshlet.num_primitives);
		assert_eq!(meta.num_attributes(), meshlet.num_attributes());
	}
	for pair in disk.streams.windows(2) {
		assert_eq!(pair[0].end_offset(), Some(pair[1].offset_from_base));
	}

	let decoded = decode_32_to_vec_dyn(disk.buffers(), 2, MeshletPayloadTeam::Wide, None)?;
	for (stream, decoded) in meshlets.iter().flat_map(|m| &m.streams).zip(decoded.chunks_exact(256)) {
		assert_eq!(decoded, pad_stream(stream));
	}
	Ok(())
}

#[test]
fn raw_file_roundtrip() -> anyhow::Result<()> {
	let mut rng = rng(3);
	let words = (0..4 * 2 * 256).map(|_| rng() & 0x0f0f_0f0f).collect::<Vec<_>>();
	let meshlets = read_raw_attributes(&write_raw_words(&words), 2)?;
	let disk = verify_meshlets(&meshlets, 2, MeshletPayloadTeam::Wide, None)?;

	let path = std::env::temp_dir().join(format!("meshlet-payload-preprocess-{}.bin.zstd", std::process::id()));
	disk.save(&path)?;
	let loaded = MeshletPayloadDisk::load(&path);
	std::fs::remove_file(&path)?;
	let decoded = decode_32_to_vec_dyn(loaded?.buffers(), 2, MeshletPayloadTeam::Single, None)?;
	assert_eq!(decoded, words);
	Ok(())
}

#[test]
fn pad_repeats_last() {
	let padded = pad_stream(&[1, 2, 3]);
	assert_eq!(padded[..4], [1, 2, 3, 3]);
	assert_eq!(padded[255], 3);
}

#[test]
fn invalid_meshlets() {
	let valid = meshlets(1, 2, 4).remove(0);
	let check = |meshlet: MeshletAttributes| process_meshlets(&[valid.clone(), meshlet], 2).unwrap_err();

	assert!(matches!(process_meshlets(&[], 0), Err(MeshletError::NoStreams)));

	let mut meshlet = valid.clone();
	meshlet.streams.pop();
	assert!(matches!(
		check(meshlet),
		MeshletError::StreamCountMismatch {
			meshlet: 1,
			expected: 2,
			found: 1
		}
	));

	let mut meshlet = valid.clone();
	meshlet.num_primitives = 0;
	assert!(matches!(check(meshlet), MeshletError::PrimitiveCount { meshlet: 1, count: 0 }));

	let mut meshlet = valid.clone();
	meshlet.streams = SmallVec::from_vec(vec![vec![0; 257], vec![0; 257]]);
	assert!(matches!(check(meshlet), MeshletError::ElementCount { count: 257, .. }));

	let mut meshlet = valid.clone();
	meshlet.streams = SmallVec::from_vec(vec![Vec::new(), Vec::new()]);
	assert!(matches!(check(meshlet), MeshletError::ElementCount { count: 0, .. }));

	let mut meshlet = valid.clone();
	meshlet.streams = SmallVec::from_vec(vec![vec![0; 10], vec![0; 11]]);
	assert!(matches!(
		check(meshlet),
		MeshletError::ElementCountMismatch {
			stream: 1,
			expected: 10,
			found: 11,
			..
		}
	));
}
