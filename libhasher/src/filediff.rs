use camino::Utf8Path;

use crate::alg::HashAlg;
use crate::common::unix_nanos;
use crate::error::HasherError;
use crate::update::update_hash;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiffStatus {
	Unknown,
	Added,
	Same,
	ModifiedNewer,
	ModifiedOlder,
	ModifiedSameMtime,
	Renamed,
	Removed,
}

impl DiffStatus {
	pub fn mark(self) -> &'static str {
		match self {
			DiffStatus::Unknown => "[?]",
			DiffStatus::Added => "[+]",
			DiffStatus::Same => "[=]",
			DiffStatus::ModifiedNewer => "[>]",
			DiffStatus::ModifiedOlder => "[<]",
			DiffStatus::ModifiedSameMtime => "[~]",
			DiffStatus::Renamed => "[R]",
			DiffStatus::Removed => "[-]",
		}
	}
}

/// One file inside a directory comparison. `pair_name` stays empty until
/// the file is matched against a counterpart on the other side.
#[derive(Clone, Debug)]
pub struct FileDiff {
	pub basename: String,
	pub pair_name: String,
	pub hash_value: Vec<u8>,
	/// nanosecond unix mtime, for the modified-newer/older tie-break
	pub mtime: i64,
	pub status: DiffStatus,
}

impl FileDiff {
	/// Hashes `path` through the update protocol and wraps it unpaired.
	/// An attribute-persistence failure is tolerated: the in-memory hash
	/// is still good for comparison.
	pub fn new(path: &Utf8Path, alg: HashAlg) -> Result<Self, HasherError> {
		let update = update_hash(path, alg, false)?;

		let meta = std::fs::symlink_metadata(path).map_err(|e| HasherError::io(path, e))?;
		let modified = meta.modified().map_err(|e| HasherError::io(path, e))?;

		Ok(Self {
			basename: path.file_name().unwrap_or_default().to_string(),
			pair_name: String::new(),
			hash_value: update.hash.value,
			mtime: unix_nanos(modified),
			status: DiffStatus::Unknown,
		})
	}

	pub fn same_hash(&self, other: &FileDiff) -> bool {
		self.hash_value == other.hash_value
	}

	/// Classifies this file against `other`, pairing both records and
	/// setting both statuses. Returns true when the contents are equal.
	pub fn compare(&mut self, other: &mut FileDiff) -> bool {
		self.pair_name = other.basename.clone();
		other.pair_name = self.basename.clone();

		if self.same_hash(other) {
			if self.basename == other.basename {
				self.status = DiffStatus::Same;
				other.status = DiffStatus::Same;
			} else {
				self.status = DiffStatus::Renamed;
				other.status = DiffStatus::Renamed;
			}
			return true;
		}

		if self.mtime > other.mtime {
			self.status = DiffStatus::ModifiedNewer;
			other.status = DiffStatus::ModifiedOlder;
		} else if self.mtime < other.mtime {
			self.status = DiffStatus::ModifiedOlder;
			other.status = DiffStatus::ModifiedNewer;
		} else {
			self.status = DiffStatus::ModifiedSameMtime;
			other.status = DiffStatus::ModifiedSameMtime;
		}
		false
	}
}
