use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use meshlet_payload_disk::disk::MeshletPayloadDisk;
use meshlet_payload_disk::payload::workgroup::MeshletPayloadTeam;
use meshlet_payload_disk::stats::MeshletPayloadStats;
use meshlet_payload_preprocess::meshlet::attributes::{read_raw_attributes, write_raw_words};
use meshlet_payload_preprocess::meshlet::process::{process_meshlets, verify_meshlets};
use meshlet_payload_rt::dispatch::decode_32_to_vec_dyn;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct PreprocessArgs {
	#[command(subcommand)]
	command: Command,

	/// The amount of threads to use
	#[arg(long, short = 'j', global = true)]
	threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Encode a raw attribute file, little endian u32 words laid out [meshlet][stream][256]
	Encode {
		input: PathBuf,
		#[arg(short, long)]
		out: PathBuf,
		/// u32 streams per meshlet
		#[arg(short, long)]
		streams: usize,
	},
	/// Decode an encoded file back into raw attributes
	Decode {
		input: PathBuf,
		#[arg(short, long)]
		out: PathBuf,
		#[command(flatten)]
		team: TeamArgs,
	},
	/// Encode and decode a raw attribute file, checking that every element survives
	Verify {
		input: PathBuf,
		/// u32 streams per meshlet
		#[arg(short, long)]
		streams: usize,
		#[command(flatten)]
		team: TeamArgs,
	},
	/// Print the statistics of an encoded file
	Stats { input: PathBuf },
}

#[derive(clap::Args, Debug)]
struct TeamArgs {
	/// How many subgroups decode a meshlet together
	#[arg(long, value_enum, default_value_t = TeamWidth::Wide)]
	width: TeamWidth,

	/// Concurrently decoding teams, defaults to one per available thread and team
	#[arg(long)]
	teams: Option<usize>,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum TeamWidth {
	Single,
	Wide,
}

impl From<TeamWidth> for MeshletPayloadTeam {
	fn from(value: TeamWidth) -> Self {
		match value {
			TeamWidth::Single => MeshletPayloadTeam::Single,
			TeamWidth::Wide => MeshletPayloadTeam::Wide,
		}
	}
}

fn main() -> anyhow::Result<()> {
	#[cfg(feature = "profile-with-puffin")]
	let _puffin_server = {
		profiling::puffin::set_scopes_on(true);
		let server_addr = format!("127.0.0.1:{}", puffin_http::DEFAULT_PORT);
		puffin_http::Server::new(&server_addr)?
	};

	let result = inner_main();
	profiling::finish_frame!();
	result
}

#[profiling::function]
fn inner_main() -> anyhow::Result<()> {
	let args = PreprocessArgs::parse();
	rayon::ThreadPoolBuilder::new()
		.num_threads(args.threads.unwrap_or(0))
		.thread_name(|id| format!("Rayon-{}", id))
		.build_global()?;

	match args.command {
		Command::Encode { input, out, streams } => {
			let bytes = fs::read(&input).with_context(|| format!("failed reading {:?}", input))?;
			let meshlets = read_raw_attributes(&bytes, streams)?;
			let disk = process_meshlets(&meshlets, streams)?;
			disk.save(&out).with_context(|| format!("failed writing {:?}", out))?;
			print_stats(&disk.stats);
		}
		Command::Decode { input, out, team } => {
			let disk = MeshletPayloadDisk::load(&input).with_context(|| format!("failed loading {:?}", input))?;
			let decoded = decode_32_to_vec_dyn(
				disk.buffers(),
				disk.num_u32_streams as usize,
				team.width.into(),
				team.teams,
			)?;
			fs::write(&out, write_raw_words(&decoded)).with_context(|| format!("failed writing {:?}", out))?;
		}
		Command::Verify { input, streams, team } => {
			let bytes = fs::read(&input).with_context(|| format!("failed reading {:?}", input))?;
			let meshlets = read_raw_attributes(&bytes, streams)?;
			let disk = verify_meshlets(&meshlets, streams, team.width.into(), team.teams)?;
			println!("verified {} meshlets", disk.metas.len());
			print_stats(&disk.stats);
		}
		Command::Stats { input } => {
			let disk = MeshletPayloadDisk::load(&input).with_context(|| format!("failed loading {:?}", input))?;
			println!("{} streams per meshlet", disk.num_u32_streams);
			print_stats(&disk.stats);
		}
	}
	Ok(())
}

fn print_stats(stats: &MeshletPayloadStats) {
	println!("{stats:#?}");
	println!("{:.3} bits per element", stats.bits_per_element());
}
