use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use libhasher::common::{is_directory, XATTR_PREFIX};
use libhasher::pipeline::concurrent_update;
use libhasher::reporting::ProgressNotifier;
use libhasher::update::update_hash;
use libhasher::walk::walk_dir;
use libhasher::{clamp_workers, clear_attrs, HashAlg, HasherError};

use crate::progress::{HasherProgressNotifier, StdioProgressNotifier};
use crate::style;

pub fn run_update(
	paths: &[Utf8PathBuf],
	alg: HashAlg,
	force: bool,
	recursive: bool,
	verbose: bool,
	workers: usize,
) -> Result<i32> {
	if recursive {
		let requested = if workers == 0 { num_cpus::get() } else { workers };
		let workers = clamp_workers(requested);

		// the multi-row display needs a real terminal behind it
		let notifier: Box<dyn ProgressNotifier> =
			if verbose && console::Term::stderr().is_term() {
				Box::new(HasherProgressNotifier::new(workers))
			} else {
				Box::new(StdioProgressNotifier)
			};

		let results = concurrent_update(paths, alg, workers, force, notifier.as_ref())
			.context("bulk update failed")?;

		let failed = results.iter().filter(|r| r.failed()).count();
		if failed > 0 {
			style::show_error(&format!("{failed} of {} files failed", results.len()));
			return Ok(1);
		}
		return Ok(0);
	}

	let mut status = 0;
	for path in paths {
		match update_hash(path, alg, force) {
			Ok(update) => {
				if let Some(err) = &update.attr_error {
					style::show_warn(&err.to_string());
				}
				if verbose {
					let mark = if update.changed { " *" } else { "" };
					println!("{path}  {}{mark}", update.hash.hex());
				}
			}
			Err(err) => {
				style::show_error(&err.to_string());
				status = 1;
			}
		}
	}
	Ok(status)
}

pub fn run_clear(paths: &[Utf8PathBuf], recursive: bool, verbose: bool) -> Result<i32> {
	let mut status = 0;
	for path in paths {
		let result = if recursive && is_directory(path).unwrap_or(false) {
			walk_dir(path, &mut |file_path, file| {
				clear_attrs(file, XATTR_PREFIX)
					.map_err(|e| HasherError::UpdateAttribute {
						path: file_path.to_owned(),
						attr: XATTR_PREFIX.to_string(),
						source: e,
					})?;
				if verbose {
					println!("{file_path}");
				}
				Ok(())
			})
		} else {
			clear_one(path, verbose)
		};

		if let Err(err) = result {
			style::show_error(&err.to_string());
			status = 1;
		}
	}
	Ok(status)
}

fn clear_one(path: &Utf8PathBuf, verbose: bool) -> Result<(), HasherError> {
	let file = libhasher::common::open_regular(path)?;
	clear_attrs(&file, XATTR_PREFIX).map_err(|e| HasherError::UpdateAttribute {
		path: path.to_owned(),
		attr: XATTR_PREFIX.to_string(),
		source: e,
	})?;
	if verbose {
		println!("{path}");
	}
	Ok(())
}
