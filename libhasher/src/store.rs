use std::collections::BTreeMap;

use camino::Utf8Path;

use crate::alg::HashAlg;
use crate::error::HasherError;
use crate::hash::Hash;
use crate::reporting::ProgressNotifier;
use crate::update::update_hash;
use crate::walk::walk_dir;

/// In-memory multimap from hex hash to the records carrying that value.
/// Entries are never deduplicated: the same (hash, path) may appear twice.
#[derive(Debug, Default)]
pub struct HashStore {
	store: BTreeMap<String, Vec<Hash>>,
	size: usize,
}

impl HashStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn put(&mut self, hash: Hash) {
		self.store.entry(hash.hex()).or_default().push(hash);
		self.size += 1;
	}

	pub fn get(&self, hex: &str) -> &[Hash] {
		self.store.get(hex).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn size(&self) -> usize {
		self.size
	}

	pub fn is_empty(&self) -> bool {
		self.size == 0
	}

	/// Every record, sorted by path ascending (byte-wise).
	pub fn values(&self) -> Vec<&Hash> {
		let mut values: Vec<&Hash> = self.store.values().flatten().collect();
		values.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
		values
	}

	/// Walks `root` and appends an up-to-date hash for every regular file.
	/// Per-file failures are reported through the notifier and skipped.
	pub fn append_from_directory(
		&mut self,
		root: &Utf8Path,
		alg: HashAlg,
		notifier: &dyn ProgressNotifier,
	) -> Result<(), HasherError> {
		walk_dir(root, &mut |path, _file| {
			match update_hash(path, alg, false) {
				Ok(update) => {
					if let Some(err) = &update.attr_error {
						notifier.notify_warning(0, &err.to_string());
					}
					self.put(update.hash);
				}
				Err(err) => notifier.notify_warning(0, &format!("{path}: {err}")),
			}
			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reporting::NullNotifier;
	use camino::Utf8PathBuf;

	fn record(path: &str, value: &[u8]) -> Hash {
		Hash::new(Utf8PathBuf::from(path), HashAlg::Sha1, value.to_vec(), 1)
	}

	#[test]
	fn size_tracks_every_put() {
		let mut store = HashStore::new();
		store.put(record("/b", &[1]));
		store.put(record("/a", &[1]));
		store.put(record("/c", &[2]));

		assert_eq!(store.size(), 3);
		let bucket_total =
			store.get(&hex::encode([1u8])).len() + store.get(&hex::encode([2u8])).len();
		assert_eq!(bucket_total, store.size());
	}

	#[test]
	fn duplicates_coexist() {
		let mut store = HashStore::new();
		store.put(record("/a", &[7]));
		store.put(record("/a", &[7]));
		assert_eq!(store.get(&hex::encode([7u8])).len(), 2);
		assert_eq!(store.size(), 2);
	}

	#[test]
	fn values_sorted_by_path() {
		let mut store = HashStore::new();
		store.put(record("/z", &[1]));
		store.put(record("/a", &[2]));
		store.put(record("/m", &[1]));

		let paths: Vec<&str> = store.values().iter().map(|h| h.path.as_str()).collect();
		assert_eq!(paths, ["/a", "/m", "/z"]);
	}

	#[test]
	fn get_unknown_is_empty() {
		let store = HashStore::new();
		assert!(store.get("ffff").is_empty());
	}

	#[test]
	fn builds_from_directory() {
		let dir = tempfile::tempdir().unwrap();
		let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
		std::fs::write(root.join("x"), b"one").unwrap();
		std::fs::write(root.join("y"), b"two").unwrap();

		let mut store = HashStore::new();
		store
			.append_from_directory(&root, HashAlg::Sha1, &NullNotifier)
			.unwrap();
		assert_eq!(store.size(), 2);
	}
}
