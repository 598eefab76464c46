use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use libhasher::common::unix_nanos;
use libhasher::hash::Hash;
use libhasher::update::update_hash;
use libhasher::walk::walk_dirs;
use libhasher::{get_attr, HashAlg, HasherError};

use crate::style;

pub enum FindMode {
	/// files carrying no stored hash
	NoHash,
	/// files carrying a stored hash
	HasHash,
	/// files whose contents hash equal to this file's
	SameAs(Utf8PathBuf),
}

pub fn run_find(dirs: &[Utf8PathBuf], alg: HashAlg, mode: FindMode) -> Result<i32> {
	match mode {
		FindMode::NoHash => {
			walk_dirs(dirs, |path, file| {
				if get_attr(file, alg.attr_name()).is_empty() {
					println!("{path}");
				}
				Ok(())
			})?;
		}
		FindMode::HasHash => {
			walk_dirs(dirs, |path, file| {
				let stored = get_attr(file, alg.attr_name());
				if stored.is_empty() {
					return Ok(());
				}
				let Ok(value) = hex::decode(&stored) else {
					return Ok(());
				};
				let meta = file.metadata().map_err(|e| HasherError::io(path, e))?;
				let modified = meta.modified().map_err(|e| HasherError::io(path, e))?;
				let mtime = unix_nanos(modified).div_euclid(1_000_000_000);
				println!("{}", Hash::new(path.to_owned(), alg, value, mtime).tsv());
				Ok(())
			})?;
		}
		FindMode::SameAs(src) => {
			let source = update_hash(&src, alg, false)
				.with_context(|| format!("failed to hash {src}"))?;
			if let Some(err) = &source.attr_error {
				style::show_warn(&err.to_string());
			}

			walk_dirs(dirs, |path, _file| {
				match update_hash(path, alg, false) {
					Ok(update) => {
						if update.hash.has_same_value(&source.hash) {
							println!("{}", update.hash.tsv());
						}
					}
					Err(err) => style::show_warn(&format!("{path}: {err}")),
				}
				Ok(())
			})?;
		}
	}
	Ok(0)
}
