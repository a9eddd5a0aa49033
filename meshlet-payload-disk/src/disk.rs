use crate::error::PayloadError;
use crate::stats::MeshletPayloadStats;
use crate::validate::validate_buffers;
use meshlet_payload_shader::meshlet::meta::MeshletMeta;
use meshlet_payload_shader::meshlet::stream::MeshletStream;
use meshlet_payload_shader::payload::buffers::MeshletPayloadBuffers;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// zstd's default level
pub const PAYLOAD_ZSTD_LEVEL: i32 = 0;

/// Encoded meshlet payloads as they are stored on disk: the three decoder buffers and some statistics.
#[derive(Clone, Debug, Default, Archive, Serialize, Deserialize)]
pub struct MeshletPayloadDisk {
	pub num_u32_streams: u32,
	pub metas: Vec<MeshletMeta>,
	/// `num_u32_streams` entries per meshlet
	pub streams: Vec<MeshletStream>,
	pub payload: Vec<u32>,
	pub stats: MeshletPayloadStats,
}

impl MeshletPayloadDisk {
	pub fn buffers(&self) -> MeshletPayloadBuffers<'_> {
		MeshletPayloadBuffers::new(&self.metas, &self.streams, &self.payload)
	}

	pub fn validate(&self) -> Result<(), PayloadError> {
		validate_buffers(self.buffers(), self.num_u32_streams as usize)
	}

	#[profiling::function]
	pub fn serialize_to(&self, write: impl Write) -> Result<(), PayloadError> {
		let bytes = {
			profiling::scope!("rkyv::to_bytes");
			rkyv::to_bytes::<rkyv::rancor::Error>(self)?
		};
		profiling::scope!("zstd::copy_encode");
		zstd::stream::copy_encode(bytes.as_slice(), write, PAYLOAD_ZSTD_LEVEL)?;
		Ok(())
	}

	/// Reads back what [`Self::serialize_to`] wrote. The archive is checked and the buffers validated, so the result
	/// is safe to decode.
	#[profiling::function]
	pub fn deserialize_from(read: impl Read) -> Result<Self, PayloadError> {
		let mut archive = AlignedVec::<16>::new();
		{
			profiling::scope!("zstd::copy_decode");
			zstd::stream::copy_decode(read, &mut archive)?;
		}
		let disk = {
			profiling::scope!("rkyv::from_bytes");
			rkyv::from_bytes::<Self, rkyv::rancor::Error>(&archive)?
		};
		disk.validate()?;
		Ok(disk)
	}

	pub fn save(&self, path: &Path) -> Result<(), PayloadError> {
		let mut write = BufWriter::with_capacity(128 * 1024, File::create(path)?);
		self.serialize_to(&mut write)?;
		write.flush()?;
		Ok(())
	}

	pub fn load(path: &Path) -> Result<Self, PayloadError> {
		Self::deserialize_from(BufReader::new(File::open(path)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use meshlet_payload_shader::meshlet::MESHLET_PAYLOAD_MAX_ELEMENTS;
	use meshlet_payload_shader::payload::encode::encode_stream;

	fn disk() -> MeshletPayloadDisk {
		let mut disk = MeshletPayloadDisk {
			num_u32_streams: 2,
			..MeshletPayloadDisk::default()
		};
		for m in 0..3u32 {
			let meta = MeshletMeta::new(m * 100, 50, 100);
			disk.metas.push(meta);
			for s in 0..2u32 {
				let encoded = encode_stream(&core::array::from_fn(|i| (i as u32 * (m + 1)) ^ (s << 20)));
				let mut stream = encoded.stream;
				stream.offset_from_base = disk.payload.len() as u32;
				disk.payload.extend_from_slice(&encoded.bitplanes);
				disk.streams.push(stream);
			}
			disk.stats += MeshletPayloadStats::from_meshlet(meta, &disk.streams[disk.streams.len() - 2..]);
		}
		disk
	}

	#[test]
	fn serialize_roundtrip() {
		let disk = disk();
		disk.validate().unwrap();
		let mut bytes = Vec::new();
		disk.serialize_to(&mut bytes).unwrap();
		let read = MeshletPayloadDisk::deserialize_from(bytes.as_slice()).unwrap();
		assert_eq!(read.num_u32_streams, disk.num_u32_streams);
		assert_eq!(read.metas, disk.metas);
		assert_eq!(read.streams, disk.streams);
		assert_eq!(read.payload, disk.payload);
		assert_eq!(read.stats, disk.stats);
		assert_eq!(read.stats, MeshletPayloadStats::from_buffers(read.buffers(), 2));
		assert_eq!(read.stats.elements, 3 * 2 * 100);
		assert!(read.stats.elements < (3 * 2 * MESHLET_PAYLOAD_MAX_ELEMENTS) as u64);
	}

	#[test]
	fn save_load() {
		let disk = disk();
		let path = std::env::temp_dir().join(format!("meshlet-payload-disk-{}.bin.zstd", std::process::id()));
		disk.save(&path).unwrap();
		let read = MeshletPayloadDisk::load(&path);
		std::fs::remove_file(&path).unwrap();
		assert_eq!(read.unwrap().payload, disk.payload);
	}

	#[test]
	fn deserialize_rejects_invalid_buffers() {
		let mut disk = disk();
		disk.payload.truncate(1);
		let mut bytes = Vec::new();
		disk.serialize_to(&mut bytes).unwrap();
		let err = MeshletPayloadDisk::deserialize_from(bytes.as_slice()).unwrap_err();
		assert!(matches!(err, PayloadError::PayloadOutOfBounds { .. }), "{err}");
	}

	#[test]
	fn deserialize_garbage() {
		let err = MeshletPayloadDisk::deserialize_from([1u8, 2, 3, 4].as_slice()).unwrap_err();
		assert!(matches!(err, PayloadError::Io(_)), "{err}");
	}
}
