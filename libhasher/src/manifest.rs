//! The tab-separated hash manifest. One record per line:
//! `<path>\t<basename>\t<mtime-unix-seconds>\t<alg>:<hex>`. `#` starts a
//! full-line comment. Malformed lines are reported and skipped; they never
//! abort a load.

use std::io::{BufRead, BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::alg::HashAlg;
use crate::error::HasherError;
use crate::hash::Hash;
use crate::reporting::ProgressNotifier;
use crate::store::HashStore;
use crate::update::{stored_hash, update_hash};
use crate::walk::{count_files, walk_dir};

pub fn load_manifest(
	path: &Utf8Path,
	notifier: &dyn ProgressNotifier,
) -> Result<HashStore, HasherError> {
	let file = std::fs::File::open(path).map_err(|e| HasherError::io(path, e))?;
	let reader = BufReader::new(file);

	let mut store = HashStore::new();
	for (idx, line) in reader.lines().enumerate() {
		let line = line.map_err(|e| HasherError::io(path, e))?;
		if line.trim().is_empty() || line.starts_with('#') {
			continue;
		}
		match parse_line(path, idx + 1, &line) {
			Ok(hash) => store.put(hash),
			Err(err) => notifier.notify_warning(0, &err.to_string()),
		}
	}
	Ok(store)
}

fn parse_line(path: &Utf8Path, line_no: usize, line: &str) -> Result<Hash, HasherError> {
	let malformed = |reason: &str| HasherError::ManifestParse {
		path: path.to_owned(),
		line: line_no,
		reason: reason.to_string(),
	};

	let fields: Vec<&str> = line.split('\t').collect();
	if fields.len() < 4 {
		return Err(malformed("expected at least 4 tab-separated fields"));
	}

	let record_path = Utf8PathBuf::from(fields[0]);
	let mtime: i64 = fields[2]
		.parse()
		.map_err(|_| malformed("mtime is not an integer"))?;

	let (alg_name, hex_value) = fields[3]
		.split_once(':')
		.ok_or_else(|| malformed("hash field is not <alg>:<hex>"))?;
	let alg: HashAlg = alg_name
		.parse()
		.map_err(|_| malformed("unknown hash algorithm"))?;
	// a trailing `:` decodes to a zero-length hash and is accepted
	let value = hex::decode(hex_value).map_err(|_| malformed("hash is not valid hex"))?;

	Ok(Hash::new(record_path, alg, value, mtime))
}

/// Writes every record of `store`, sorted by path, one TSV line each.
pub fn write_manifest(store: &HashStore, w: impl Write) -> std::io::Result<()> {
	let mut w = BufWriter::new(w);
	for hash in store.values() {
		writeln!(w, "{}", hash.tsv())?;
	}
	w.flush()
}

/// Emits a manifest line for every regular file under `roots`.
///
/// With `update` set, stale hashes are recomputed through the update
/// protocol before being listed; otherwise only files that already carry a
/// stored hash are listed, and the rest are reported as warnings.
pub fn list_hashes(
	roots: &[Utf8PathBuf],
	alg: HashAlg,
	update: bool,
	w: impl Write,
	notifier: &dyn ProgressNotifier,
) -> Result<(), HasherError> {
	let mut w = BufWriter::new(w);

	notifier.set_total(count_files(roots)?);
	notifier.start();

	let mut done = 0usize;
	let result = (|| {
		for root in roots {
			walk_dir(root, &mut |path, _file| {
				notifier.notify_task_start(0, path.as_str());

				let listed = if update {
					match update_hash(path, alg, false) {
						Ok(up) => {
							if let Some(err) = &up.attr_error {
								notifier.notify_warning(0, &err.to_string());
							}
							Some(up.hash)
						}
						Err(err) => {
							notifier.notify_error(0, &format!("{path}: {err}"));
							None
						}
					}
				} else {
					match stored_hash(path, alg) {
						Ok(Some(hash)) => Some(hash),
						Ok(None) => {
							notifier.notify_warning(0, &format!("no stored hash: {path}"));
							None
						}
						Err(err) => {
							notifier.notify_error(0, &format!("{path}: {err}"));
							None
						}
					}
				};

				if let Some(hash) = listed {
					writeln!(w, "{}", hash.tsv()).map_err(|e| HasherError::io(path, e))?;
				}

				done += 1;
				notifier.notify_progress(done, None);
				Ok(())
			})?;
		}
		w.flush().map_err(|e| HasherError::io(Utf8Path::new(""), e))
	})();

	notifier.shutdown();
	result
}
