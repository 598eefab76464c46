use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::alg::HashAlg;
use crate::error::HasherError;
use crate::filediff::{DiffStatus, FileDiff};

/// The files of one directory, keyed by basename, ready for comparison.
/// Listing is non-recursive; subdirectories and symlinks are skipped.
#[derive(Clone, Debug)]
pub struct DirDiff {
	pub path: Utf8PathBuf,
	files: BTreeMap<String, FileDiff>,
}

impl DirDiff {
	pub fn scan(path: &Utf8Path, alg: HashAlg) -> Result<Self, HasherError> {
		let entries = std::fs::read_dir(path).map_err(|e| HasherError::io(path, e))?;

		let mut files = BTreeMap::new();
		for entry in entries {
			let entry = entry.map_err(|e| HasherError::io(path, e))?;
			let ftype = entry.file_type().map_err(|e| HasherError::io(path, e))?;
			if ftype.is_symlink() || ftype.is_dir() || !ftype.is_file() {
				continue;
			}
			let Ok(file_path) = Utf8PathBuf::try_from(entry.path()) else {
				continue;
			};
			let diff = FileDiff::new(&file_path, alg)?;
			files.insert(diff.basename.clone(), diff);
		}

		Ok(Self { path: path.to_owned(), files })
	}

	pub fn get(&self, basename: &str) -> Option<&FileDiff> {
		self.files.get(basename)
	}

	pub fn count(&self) -> usize {
		self.files.len()
	}

	/// children in basename order
	pub fn sorted_children(&self) -> impl Iterator<Item = &FileDiff> {
		self.files.values()
	}

	pub fn mark_all(&mut self, status: DiffStatus) {
		for f in self.files.values_mut() {
			f.status = status;
		}
	}

	/// The basename of the single still-unclassified file carrying `hash`.
	/// Ambiguity (two or more candidates) is not a rename, so it yields
	/// no match.
	fn unique_unknown_by_hash(&self, hash: &[u8]) -> Option<String> {
		let mut found = None;
		for f in self.files.values() {
			if f.status == DiffStatus::Unknown && f.hash_value == hash {
				if found.is_some() {
					return None;
				}
				found = Some(f.basename.clone());
			}
		}
		found
	}

	/// Classifies every file on both sides, in place.
	///
	/// Pass 1 pairs by basename, pass 2 pairs leftovers by unique hash
	/// (rename detection), pass 3 marks the residue: unmatched files here
	/// become Added, unmatched files in `other` become Removed and are
	/// copied into this map so one iteration shows every category.
	pub fn compare(&mut self, other: &mut DirDiff) {
		// pass 1: name match
		let names: Vec<String> = self.files.keys().cloned().collect();
		let mut unmatched = Vec::new();
		for name in names {
			let paired = match other.files.get_mut(&name) {
				Some(theirs) if theirs.status == DiffStatus::Unknown => {
					self.files.get_mut(&name).unwrap().compare(theirs);
					true
				}
				_ => false,
			};
			if !paired {
				unmatched.push(name);
			}
		}

		// pass 2: rename match by hash
		for name in unmatched {
			let hash = self.files[&name].hash_value.clone();
			if let Some(pair_name) = other.unique_unknown_by_hash(&hash) {
				let theirs = other.files.get_mut(&pair_name).unwrap();
				self.files.get_mut(&name).unwrap().compare(theirs);
			}
		}

		// pass 3: residue. the Removed copies are collected first and
		// appended only after both maps are done being read
		for f in self.files.values_mut() {
			if f.status == DiffStatus::Unknown {
				f.status = DiffStatus::Added;
			}
		}
		let mut removed = Vec::new();
		for f in other.files.values_mut() {
			if f.status == DiffStatus::Unknown {
				f.status = DiffStatus::Removed;
				removed.push(f.clone());
			}
		}
		for f in removed {
			self.files.insert(f.basename.clone(), f);
		}
	}
}
