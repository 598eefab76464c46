use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;
use libhasher::common::is_directory;
use libhasher::hash::Hash;
use libhasher::manifest::load_manifest;
use libhasher::store::HashStore;
use libhasher::HashAlg;

use crate::progress::StdioProgressNotifier;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShowMode {
	Always,
	ExistsOnly,
	MissingOnly,
}

pub struct DuplicateOptions {
	pub mode: ShowMode,
	pub print_source_path_only: bool,
	pub print0: bool,
}

/// Loads a hash set from either a manifest TSV or a live directory.
fn load_hash_data(path: &Utf8Path, alg: HashAlg) -> Result<HashStore> {
	if is_directory(path)? {
		let mut store = HashStore::new();
		store
			.append_from_directory(path, alg, &StdioProgressNotifier)
			.with_context(|| format!("failed to hash directory {path}"))?;
		Ok(store)
	} else {
		Ok(load_manifest(path, &StdioProgressNotifier)
			.with_context(|| format!("failed to load manifest {path}"))?)
	}
}

pub fn run_duplicate(
	source: &Utf8Path,
	target: &Utf8Path,
	alg: HashAlg,
	opts: DuplicateOptions,
) -> Result<i32> {
	let src = load_hash_data(source, alg)?;
	let tgt = load_hash_data(target, alg)?;

	let sep = if opts.print0 { '\0' } else { '\n' };
	let mut out = std::io::stdout().lock();

	for hash in src.values() {
		let matches = tgt.get(&hash.hex());
		let show = match opts.mode {
			ShowMode::Always => true,
			ShowMode::ExistsOnly => !matches.is_empty(),
			ShowMode::MissingOnly => matches.is_empty(),
		};
		if show {
			write!(out, "{}{sep}", render(hash, matches, opts.print_source_path_only))
				.context("failed to write result")?;
		}
	}
	Ok(0)
}

fn render(hash: &Hash, matches: &[Hash], path_only: bool) -> String {
	if path_only {
		return hash.path.to_string();
	}
	let mut line = format!("{}\t{}", hash.path, matches.len());
	for m in matches {
		line.push('\t');
		line.push_str(m.path.as_str());
	}
	line
}
