use anyhow::{Context, Result};
use camino::Utf8Path;
use console::style;
use libhasher::common::ensure_directory;
use libhasher::filediff::DiffStatus;
use libhasher::treediff::{dir_diff_recursive, DirPairStatus};
use libhasher::update::update_hash;
use libhasher::HashAlg;

use crate::progress::StdioProgressNotifier;
use crate::style::{show_warn, status_style};

/// Compares two files under the default algorithm. Exit 0 means equal.
pub fn run_compare(path1: &Utf8Path, path2: &Utf8Path) -> Result<i32> {
	let first = update_hash(path1, HashAlg::default(), false)
		.with_context(|| format!("failed to hash {path1}"))?;
	let second = update_hash(path2, HashAlg::default(), false)
		.with_context(|| format!("failed to hash {path2}"))?;

	for attr_err in [&first.attr_error, &second.attr_error].into_iter().flatten() {
		show_warn(&attr_err.to_string());
	}

	if first.hash.has_same_value(&second.hash) {
		println!("{} {path1}\t{path2}", DiffStatus::Same.mark());
		Ok(0)
	} else {
		println!("{} {path1}\t{path2}", DiffStatus::ModifiedSameMtime.mark());
		Ok(1)
	}
}

pub fn run_dirdiff(base: &Utf8Path, target: &Utf8Path, diff_only: bool) -> Result<i32> {
	ensure_directory(base).with_context(|| format!("not a directory: {base}"))?;
	ensure_directory(target).with_context(|| format!("not a directory: {target}"))?;

	let pairs =
		dir_diff_recursive(base, target, HashAlg::default(), &StdioProgressNotifier)?;

	for pair in &pairs {
		match pair.status {
			DirPairStatus::BaseOnly => {
				println!("{}", style(format!("[+] {}", pair.path())).cyan());
			}
			DirPairStatus::TargetOnly => {
				println!("{}", style(format!("[-] {}", pair.path())).color256(218));
			}
			DirPairStatus::Pair => println!("    {}", pair.path()),
		}

		let Some(dir) = pair.base.as_ref().or(pair.target.as_ref()) else {
			continue;
		};
		for file in dir.sorted_children() {
			if diff_only && file.status == DiffStatus::Same {
				continue;
			}
			let line = format!("      {} {}", file.status.mark(), file.basename);
			println!("{}", status_style(file.status).apply_to(line));
		}
	}
	Ok(0)
}
