use crate::meshlet::attributes::MeshletAttributes;
use crate::meshlet::error::MeshletError;
use anyhow::bail;
use meshlet_payload_disk::disk::MeshletPayloadDisk;
use meshlet_payload_disk::meshlet::MESHLET_PAYLOAD_MAX_ELEMENTS;
use meshlet_payload_disk::meshlet::meta::MeshletMeta;
use meshlet_payload_disk::payload::encode::{EncodedStream, encode_stream};
use meshlet_payload_disk::payload::workgroup::MeshletPayloadTeam;
use meshlet_payload_disk::stats::MeshletPayloadStats;
use meshlet_payload_rt::dispatch::decode_32_to_vec_dyn;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Encodes meshlets into their payload. Meshlets are encoded in parallel and concatenated in order afterward.
#[profiling::function]
pub fn process_meshlets(
	meshlets: &[MeshletAttributes],
	num_u32_streams: usize,
) -> Result<MeshletPayloadDisk, MeshletError> {
	if num_u32_streams == 0 {
		return Err(MeshletError::NoStreams);
	}
	for (index, meshlet) in meshlets.iter().enumerate() {
		check_meshlet(index, meshlet, num_u32_streams)?;
	}

	let encoded = {
		profiling::scope!("encode meshlets");
		meshlets.par_iter().map(encode_meshlet).collect::<Vec<_>>()
	};

	profiling::scope!("concatenate payloads");
	let mut disk = MeshletPayloadDisk {
		num_u32_streams: num_u32_streams as u32,
		metas: Vec::with_capacity(meshlets.len()),
		streams: Vec::with_capacity(meshlets.len() * num_u32_streams),
		payload: Vec::new(),
		stats: MeshletPayloadStats::default(),
	};
	for (meta, streams) in encoded {
		let first_stream = disk.streams.len();
		for EncodedStream { mut stream, bitplanes } in streams {
			stream.offset_from_base = u32::try_from(disk.payload.len()).map_err(|_| MeshletError::PayloadTooLarge)?;
			disk.payload.extend_from_slice(&bitplanes);
			disk.streams.push(stream);
		}
		disk.metas.push(meta);
		disk.stats += MeshletPayloadStats::from_meshlet(meta, &disk.streams[first_stream..]);
	}
	if disk.payload.len() > u32::MAX as usize {
		return Err(MeshletError::PayloadTooLarge);
	}
	Ok(disk)
}

fn check_meshlet(index: usize, meshlet: &MeshletAttributes, num_u32_streams: usize) -> Result<(), MeshletError> {
	if !(1..=MeshletMeta::MAX_COUNT).contains(&meshlet.num_primitives) {
		return Err(MeshletError::PrimitiveCount {
			meshlet: index,
			count: meshlet.num_primitives,
		});
	}
	if meshlet.streams.len() != num_u32_streams {
		return Err(MeshletError::StreamCountMismatch {
			meshlet: index,
			expected: num_u32_streams,
			found: meshlet.streams.len(),
		});
	}
	let expected = meshlet.num_attributes();
	for (stream, values) in meshlet.streams.iter().enumerate() {
		if !(1..=MESHLET_PAYLOAD_MAX_ELEMENTS).contains(&values.len()) {
			return Err(MeshletError::ElementCount {
				meshlet: index,
				stream,
				count: values.len(),
			});
		}
		if values.len() != expected {
			return Err(MeshletError::ElementCountMismatch {
				meshlet: index,
				stream,
				expected,
				found: values.len(),
			});
		}
	}
	Ok(())
}

fn encode_meshlet(meshlet: &MeshletAttributes) -> (MeshletMeta, SmallVec<[EncodedStream; 4]>) {
	let meta = MeshletMeta::new(
		meshlet.base_vertex_offset,
		meshlet.num_primitives,
		meshlet.num_attributes(),
	);
	let streams = meshlet
		.streams
		.iter()
		.map(|values| encode_stream(&pad_stream(values)))
		.collect();
	(meta, streams)
}

/// Fills a stream up to [`MESHLET_PAYLOAD_MAX_ELEMENTS`] by repeating its last element.
pub fn pad_stream(values: &[u32]) -> [u32; MESHLET_PAYLOAD_MAX_ELEMENTS] {
	let last = values.last().copied().unwrap_or(0);
	core::array::from_fn(|i| values.get(i).copied().unwrap_or(last))
}

/// Encodes, stores, loads and decodes meshlets, failing if any element within the attribute count of its meshlet does
/// not survive.
#[profiling::function]
pub fn verify_meshlets(
	meshlets: &[MeshletAttributes],
	num_u32_streams: usize,
	team: MeshletPayloadTeam,
	num_teams: Option<usize>,
) -> anyhow::Result<MeshletPayloadDisk> {
	let disk = process_meshlets(meshlets, num_u32_streams)?;
	let mut bytes = Vec::new();
	disk.serialize_to(&mut bytes)?;
	let disk = MeshletPayloadDisk::deserialize_from(bytes.as_slice())?;
	let decoded = decode_32_to_vec_dyn(disk.buffers(), num_u32_streams, team, num_teams)?;

	profiling::scope!("compare");
	let mut decoded_streams = decoded.chunks_exact(MESHLET_PAYLOAD_MAX_ELEMENTS);
	for (meshlet_index, meshlet) in meshlets.iter().enumerate() {
		for (stream_index, expected) in meshlet.streams.iter().enumerate() {
			let Some(decoded) = decoded_streams.next() else {
				bail!("decoded fewer streams than were encoded");
			};
			for (i, (expected, decoded)) in expected.iter().zip(decoded).enumerate() {
				if expected != decoded {
					bail!(
						"meshlet {} stream {} element {}: expected {:#010x}, decoded {:#010x}",
						meshlet_index,
						stream_index,
						i,
						expected,
						decoded
					);
				}
			}
		}
	}
	Ok(disk)
}
