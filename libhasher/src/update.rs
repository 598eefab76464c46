//! The per-file "update-if-stale" protocol. A stored hash is trusted only
//! while the stored size and mtime both match the file's current stat; any
//! disagreement forces a recompute.

use camino::Utf8Path;

use crate::alg::HashAlg;
use crate::attr;
use crate::common::{
	open_regular, unix_nanos, wall_clock_nanos, XATTR_HTIME, XATTR_MTIME, XATTR_SIZE,
};
use crate::error::HasherError;
use crate::hash::{digest_stream, Hash};

/// Outcome of one update. `attr_error` is set when the hash was computed
/// but persisting one of the xattrs failed; the hash itself is still valid.
#[derive(Debug)]
pub struct HashUpdate {
	pub changed: bool,
	pub hash: Hash,
	pub attr_error: Option<HasherError>,
}

/// Brings the stored hash of `path` up to date.
///
/// Fast path: stored hash present and (size, mtime) unchanged — only the
/// check timestamp is refreshed. Slow path: the contents are re-hashed and
/// the full attribute tuple rewritten. `force` skips the validity check.
pub fn update_hash(
	path: &Utf8Path,
	alg: HashAlg,
	force: bool,
) -> Result<HashUpdate, HasherError> {
	let file = open_regular(path)?;

	let meta = file.metadata().map_err(|e| HasherError::io(path, e))?;
	let modified = meta.modified().map_err(|e| HasherError::io(path, e))?;
	let size_now = meta.len().to_string();
	let mtime_ns = unix_nanos(modified);
	let mtime_now = mtime_ns.to_string();
	let mtime_secs = mtime_ns.div_euclid(1_000_000_000);

	let update_attr = |name: &str, value: &str| -> Option<HasherError> {
		attr::set_attr(&file, name, value)
			.err()
			.map(|e| HasherError::UpdateAttribute {
				path: path.to_owned(),
				attr: name.to_string(),
				source: e,
			})
	};

	// validity check: the stored hash must decode and the stored stat pair
	// must match the current one exactly
	let stored = attr::get_attr(&file, alg.attr_name());
	let stored_value = if !stored.is_empty()
		&& attr::get_attr(&file, XATTR_SIZE) == size_now
		&& attr::get_attr(&file, XATTR_MTIME) == mtime_now
	{
		hex::decode(&stored).ok()
	} else {
		None
	};

	if let (Some(value), false) = (stored_value, force) {
		let attr_error = update_attr(XATTR_HTIME, &wall_clock_nanos().to_string());
		return Ok(HashUpdate {
			changed: false,
			hash: Hash::new(path.to_owned(), alg, value, mtime_secs),
			attr_error,
		});
	}

	let value = digest_stream(&file, alg).map_err(|e| HasherError::io(path, e))?;
	let hash = Hash::new(path.to_owned(), alg, value, mtime_secs);

	// the stat pair goes last so a crash mid-write leaves a tuple the
	// validity check rejects, never one it wrongly accepts
	let hex = hash.hex();
	let htime = wall_clock_nanos().to_string();
	let mut attr_error = None;
	for (name, value) in [
		(alg.attr_name(), hex.as_str()),
		(XATTR_HTIME, htime.as_str()),
		(XATTR_SIZE, size_now.as_str()),
		(XATTR_MTIME, mtime_now.as_str()),
	] {
		attr_error = update_attr(name, value);
		if attr_error.is_some() {
			break;
		}
	}

	Ok(HashUpdate { changed: true, hash, attr_error })
}

/// Reads the hash stored on `path` without validating or recomputing it.
/// Returns None when no hash is stored for the algorithm.
pub fn stored_hash(path: &Utf8Path, alg: HashAlg) -> Result<Option<Hash>, HasherError> {
	let file = open_regular(path)?;

	let stored = attr::get_attr(&file, alg.attr_name());
	if stored.is_empty() {
		return Ok(None);
	}
	let Ok(value) = hex::decode(&stored) else {
		return Ok(None);
	};

	let meta = file.metadata().map_err(|e| HasherError::io(path, e))?;
	let modified = meta.modified().map_err(|e| HasherError::io(path, e))?;
	let mtime = unix_nanos(modified).div_euclid(1_000_000_000);

	Ok(Some(Hash::new(path.to_owned(), alg, value, mtime)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hash::calc_hash;
	use camino::Utf8PathBuf;
	use std::fs::File;

	fn temp_file(contents: &[u8]) -> (tempfile::TempDir, Utf8PathBuf) {
		let dir = tempfile::tempdir().unwrap();
		let path = Utf8PathBuf::try_from(dir.path().join("a.txt")).unwrap();
		std::fs::write(&path, contents).unwrap();
		(dir, path)
	}

	fn xattrs_supported(path: &Utf8Path) -> bool {
		let file = File::open(path).unwrap();
		if attr::set_attr(&file, "user.hasher.probe", "1").is_err() {
			eprintln!("skipping: filesystem has no user xattr support");
			return false;
		}
		attr::remove_attr(&file, "user.hasher.probe").unwrap();
		true
	}

	#[test]
	fn first_update_computes_and_stores() {
		let (_dir, path) = temp_file(b"hello");
		if !xattrs_supported(&path) {
			return;
		}

		let up = update_hash(&path, HashAlg::Sha1, false).unwrap();
		assert!(up.changed);
		assert!(up.attr_error.is_none());
		assert_eq!(up.hash.hex(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");

		let file = File::open(&path).unwrap();
		assert_eq!(attr::get_attr(&file, XATTR_SIZE), "5");
		assert!(!attr::get_attr(&file, XATTR_MTIME).is_empty());
		assert!(!attr::get_attr(&file, XATTR_HTIME).is_empty());
	}

	#[test]
	fn second_update_is_incremental_and_bumps_htime() {
		let (_dir, path) = temp_file(b"hello");
		if !xattrs_supported(&path) {
			return;
		}

		update_hash(&path, HashAlg::Sha1, false).unwrap();
		let file = File::open(&path).unwrap();
		let htime1: i64 = attr::get_attr(&file, XATTR_HTIME).parse().unwrap();
		let mtime1 = attr::get_attr(&file, XATTR_MTIME);
		let size1 = attr::get_attr(&file, XATTR_SIZE);

		let up = update_hash(&path, HashAlg::Sha1, false).unwrap();
		assert!(!up.changed);
		assert_eq!(up.hash.hex(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");

		let htime2: i64 = attr::get_attr(&file, XATTR_HTIME).parse().unwrap();
		assert!(htime2 > htime1);
		assert_eq!(attr::get_attr(&file, XATTR_MTIME), mtime1);
		assert_eq!(attr::get_attr(&file, XATTR_SIZE), size1);
	}

	#[test]
	fn modification_is_detected() {
		let (_dir, path) = temp_file(b"hello");
		if !xattrs_supported(&path) {
			return;
		}

		update_hash(&path, HashAlg::Sha1, false).unwrap();

		// same length, different contents; mtime moves forward
		std::thread::sleep(std::time::Duration::from_millis(20));
		std::fs::write(&path, b"world").unwrap();

		let up = update_hash(&path, HashAlg::Sha1, false).unwrap();
		assert!(up.changed);
		assert_eq!(up.hash.hex(), "7c211433f02071597741e6ff5a8ea34789abbf43");

		let file = File::open(&path).unwrap();
		assert_eq!(attr::get_attr(&file, XATTR_SIZE), "5");
	}

	#[test]
	fn force_recomputes_matching_hash() {
		let (_dir, path) = temp_file(b"stable contents");
		if !xattrs_supported(&path) {
			return;
		}

		update_hash(&path, HashAlg::Sha1, false).unwrap();
		let up = update_hash(&path, HashAlg::Sha1, true).unwrap();
		assert!(up.changed);
		assert_eq!(
			up.hash.value,
			calc_hash(&path, HashAlg::Sha1).unwrap().value
		);
	}

	#[test]
	fn missing_stat_attr_invalidates() {
		let (_dir, path) = temp_file(b"hello");
		if !xattrs_supported(&path) {
			return;
		}

		update_hash(&path, HashAlg::Sha1, false).unwrap();
		let file = File::open(&path).unwrap();
		attr::remove_attr(&file, XATTR_MTIME).unwrap();

		let up = update_hash(&path, HashAlg::Sha1, false).unwrap();
		assert!(up.changed);
	}

	#[test]
	fn update_without_xattr_support_still_returns_hash() {
		let (_dir, path) = temp_file(b"hello");
		if xattrs_supported(&path) {
			// exercised only where persistence genuinely fails
			return;
		}

		let up = update_hash(&path, HashAlg::Sha1, false).unwrap();
		assert!(up.changed);
		assert_eq!(up.hash.hex(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
		assert!(up.attr_error.as_ref().unwrap().is_attr_error());
	}

	#[test]
	fn rejects_non_regular() {
		let dir = tempfile::tempdir().unwrap();
		let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
		assert!(matches!(
			update_hash(&path, HashAlg::Sha1, false),
			Err(HasherError::NotRegularFile(_))
		));
	}

	#[test]
	fn stored_hash_roundtrip() {
		let (_dir, path) = temp_file(b"hello");
		if !xattrs_supported(&path) {
			return;
		}

		assert!(stored_hash(&path, HashAlg::Sha1).unwrap().is_none());
		update_hash(&path, HashAlg::Sha1, false).unwrap();
		let stored = stored_hash(&path, HashAlg::Sha1).unwrap().unwrap();
		assert_eq!(stored.hex(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
	}
}
