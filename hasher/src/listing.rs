use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use libhasher::common::ensure_directory;
use libhasher::manifest::list_hashes;
use libhasher::reporting::ProgressNotifier;
use libhasher::HashAlg;

use crate::progress::{HasherProgressNotifier, StdioProgressNotifier};

pub fn run_list_hash(
	dirs: &[Utf8PathBuf],
	alg: HashAlg,
	out: Option<&Utf8Path>,
	update: bool,
) -> Result<i32> {
	for dir in dirs {
		ensure_directory(dir).with_context(|| format!("not a directory: {dir}"))?;
	}

	match out {
		Some(out_path) => {
			// stdout is free, so a progress display is welcome
			let file = std::fs::File::create(out_path)
				.with_context(|| format!("failed to create {out_path}"))?;
			let notifier: Box<dyn ProgressNotifier> =
				if console::Term::stderr().is_term() {
					Box::new(HasherProgressNotifier::new(1))
				} else {
					Box::new(StdioProgressNotifier)
				};
			list_hashes(dirs, alg, update, file, notifier.as_ref())?;
		}
		None => {
			let stdout = std::io::stdout().lock();
			list_hashes(dirs, alg, update, stdout, &StdioProgressNotifier)?;
		}
	}
	Ok(0)
}
