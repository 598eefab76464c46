use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use libhasher::HashAlg;

mod diff;
mod dupes;
mod find;
mod listing;
mod progress;
mod show;
mod style;
mod update;

#[derive(Parser, Debug)]
#[command(
	name = "hasher",
	version = "v0.9.0",
	about = "Maintains content hashes in file extended attributes and diffs directory trees by them"
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Update stored hashes, recomputing only where size or mtime changed
	Update {
		/// Files (or, with -r, directories) to update
		#[arg(required = true)]
		paths: Vec<Utf8PathBuf>,
		/// Recompute even when the stored hash still looks valid
		#[arg(short, long)]
		force: bool,
		/// Recurse into directories using the parallel pipeline
		#[arg(short, long)]
		recursive: bool,
		/// Show per-worker progress
		#[arg(short, long)]
		verbose: bool,
		/// Worker threads ("-w 0" = number of logical processors)
		#[arg(short = 'w', long, default_value_t = 0)]
		workers: usize,
		/// Hash algorithm (sha1, sha256, sha512)
		#[arg(short, long, default_value = "sha1")]
		alg: String,
	},
	/// Remove every hasher attribute from the given files
	Clear {
		#[arg(required = true)]
		paths: Vec<Utf8PathBuf>,
		/// Recurse into directories
		#[arg(short, long)]
		recursive: bool,
		/// Print each cleared file
		#[arg(short, long)]
		verbose: bool,
	},
	/// Show the stored hash attributes of files
	Show {
		#[arg(required = true)]
		paths: Vec<Utf8PathBuf>,
		/// Recurse into directories
		#[arg(short, long)]
		recursive: bool,
		/// Hash algorithm (sha1, sha256, sha512)
		#[arg(short, long, default_value = "sha1")]
		alg: String,
	},
	/// Output a hash manifest in TSV format
	ListHash {
		/// Directories to list
		#[arg(required = true)]
		dirs: Vec<Utf8PathBuf>,
		/// Output file path (default: stdout)
		#[arg(short, long)]
		out: Option<Utf8PathBuf>,
		/// Update stale hashes while listing
		#[arg(short, long)]
		update: bool,
		/// Hash algorithm (sha1, sha256, sha512)
		#[arg(short, long, default_value = "sha1")]
		alg: String,
	},
	/// Check which source hashes also exist in the target set
	Duplicate {
		/// Source: a manifest TSV or a directory
		#[arg(short, long)]
		source: Utf8PathBuf,
		/// Target: a manifest TSV or a directory
		#[arg(short, long)]
		target: Utf8PathBuf,
		/// Show only sources that exist in the target
		#[arg(short, long, conflicts_with = "missing_only")]
		exists_only: bool,
		/// Show only sources missing from the target
		#[arg(short, long)]
		missing_only: bool,
		/// Print only the source file path
		#[arg(short = 'f', long)]
		print_source_path_only: bool,
		/// Separate records by a NUL character
		#[arg(short = '0', long)]
		print0: bool,
		/// Hash algorithm (sha1, sha256, sha512)
		#[arg(short, long, default_value = "sha1")]
		alg: String,
	},
	/// Compare two files by content hash (exit 0 when equal)
	Compare {
		path1: Utf8PathBuf,
		path2: Utf8PathBuf,
	},
	/// Compare two directory trees, directory by directory
	Dirdiff {
		base: Utf8PathBuf,
		target: Utf8PathBuf,
		/// Hide files whose contents are identical
		#[arg(short = 'd', long)]
		diff_only: bool,
	},
	/// Compute and print hashes without touching any attribute
	Calc {
		#[arg(required = true)]
		paths: Vec<Utf8PathBuf>,
		/// Print only the hash value
		#[arg(short, long)]
		no_show_path: bool,
		/// Hash algorithm (sha1, sha256, sha512)
		#[arg(short, long, default_value = "sha1")]
		alg: String,
	},
	/// Find files by the presence or value of their stored hash
	Find {
		#[arg(required = true)]
		dirs: Vec<Utf8PathBuf>,
		/// Find files that carry no stored hash
		#[arg(short, long, conflicts_with_all = ["has_hash", "file"])]
		no_hash: bool,
		/// Find files that carry a stored hash
		#[arg(short = 'e', long, conflicts_with = "file")]
		has_hash: bool,
		/// Find files with the same content hash as this file
		#[arg(short, long)]
		file: Option<Utf8PathBuf>,
		/// Hash algorithm (sha1, sha256, sha512)
		#[arg(short, long, default_value = "sha1")]
		alg: String,
	},
}

fn parse_alg(name: &str) -> Result<HashAlg> {
	Ok(name.parse::<HashAlg>()?)
}

fn run(cli: Cli) -> Result<i32> {
	match cli.command {
		Commands::Update { paths, force, recursive, verbose, workers, alg } => {
			update::run_update(&paths, parse_alg(&alg)?, force, recursive, verbose, workers)
		}
		Commands::Clear { paths, recursive, verbose } => {
			update::run_clear(&paths, recursive, verbose)
		}
		Commands::Show { paths, recursive, alg } => {
			show::run_show(&paths, parse_alg(&alg)?, recursive)
		}
		Commands::ListHash { dirs, out, update, alg } => {
			listing::run_list_hash(&dirs, parse_alg(&alg)?, out.as_deref(), update)
		}
		Commands::Duplicate {
			source,
			target,
			exists_only,
			missing_only,
			print_source_path_only,
			print0,
			alg,
		} => {
			let mode = if exists_only {
				dupes::ShowMode::ExistsOnly
			} else if missing_only {
				dupes::ShowMode::MissingOnly
			} else {
				dupes::ShowMode::Always
			};
			dupes::run_duplicate(
				&source,
				&target,
				parse_alg(&alg)?,
				dupes::DuplicateOptions { mode, print_source_path_only, print0 },
			)
		}
		Commands::Compare { path1, path2 } => diff::run_compare(&path1, &path2),
		Commands::Dirdiff { base, target, diff_only } => {
			diff::run_dirdiff(&base, &target, diff_only)
		}
		Commands::Calc { paths, no_show_path, alg } => {
			show::run_calc(&paths, parse_alg(&alg)?, no_show_path)
		}
		Commands::Find { dirs, no_hash, has_hash, file, alg } => {
			let mode = if no_hash {
				find::FindMode::NoHash
			} else if has_hash {
				find::FindMode::HasHash
			} else if let Some(src) = file {
				find::FindMode::SameAs(src)
			} else {
				anyhow::bail!("one of --no-hash, --has-hash or --file is required");
			};
			find::run_find(&dirs, parse_alg(&alg)?, mode)
		}
	}
}

fn main() {
	let cli = match Cli::try_parse() {
		Ok(cli) => cli,
		Err(err) => {
			// help and version exit clean; real argument errors exit 1
			if err.use_stderr() {
				let _ = err.print();
				std::process::exit(1);
			}
			err.exit();
		}
	};
	let status = match run(cli) {
		Ok(status) => status,
		Err(err) => {
			style::show_error(&format!("{err:#}"));
			1
		}
	};
	std::process::exit(status);
}
