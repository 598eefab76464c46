use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};

use crate::alg::HashAlg;
use crate::common::{open_regular, unix_nanos, HASH_BUF_SIZE};
use crate::error::HasherError;

/// One computed fingerprint: which file, under which algorithm, the raw
/// digest bytes, and the file's mtime (unix seconds) when it was taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hash {
	pub path: Utf8PathBuf,
	pub alg: HashAlg,
	pub value: Vec<u8>,
	pub mtime: i64,
}

impl Hash {
	pub fn new(path: Utf8PathBuf, alg: HashAlg, value: Vec<u8>, mtime: i64) -> Self {
		Self { path, alg, value, mtime }
	}

	/// lowercase hex of the digest bytes
	pub fn hex(&self) -> String {
		hex::encode(&self.value)
	}

	pub fn basename(&self) -> &str {
		self.path.file_name().unwrap_or("")
	}

	/// manifest line: `<path>\t<basename>\t<mtime>\t<alg>:<hex>`
	pub fn tsv(&self) -> String {
		format!(
			"{}\t{}\t{}\t{}:{}",
			self.path,
			self.basename(),
			self.mtime,
			self.alg.name(),
			self.hex()
		)
	}

	pub fn has_same_value(&self, other: &Hash) -> bool {
		self.value == other.value
	}
}

/// Streams `r` through a fresh hasher in fixed-size chunks.
pub(crate) fn digest_stream<R: Read>(mut r: R, alg: HashAlg) -> std::io::Result<Vec<u8>> {
	let mut hasher = alg.hasher();
	let mut buf = vec![0u8; HASH_BUF_SIZE];
	loop {
		let n = r.read(&mut buf)?;
		if n == 0 {
			break;
		}
		hasher.update(&buf[..n]);
	}
	Ok(hasher.finalize().to_vec())
}

/// Hashes the contents of the regular file at `path`. The mtime is captured
/// after the read completes, not before.
pub fn calc_hash(path: &Utf8Path, alg: HashAlg) -> Result<Hash, HasherError> {
	let file = open_regular(path)?;
	let value = digest_stream(&file, alg).map_err(|e| HasherError::io(path, e))?;

	let meta = file.metadata().map_err(|e| HasherError::io(path, e))?;
	let modified = meta.modified().map_err(|e| HasherError::io(path, e))?;
	let mtime = unix_nanos(modified).div_euclid(1_000_000_000);

	Ok(Hash::new(path.to_owned(), alg, value, mtime))
}

#[cfg(test)]
mod tests {
	use super::*;
	use camino::Utf8PathBuf;
	use digest::Digest;
	use rand::RngCore;

	fn write_temp(contents: &[u8]) -> (tempfile::TempDir, Utf8PathBuf) {
		let dir = tempfile::tempdir().unwrap();
		let path = Utf8PathBuf::try_from(dir.path().join("data")).unwrap();
		std::fs::write(&path, contents).unwrap();
		(dir, path)
	}

	#[test]
	fn sha1_known_vector() {
		let (_dir, path) = write_temp(b"hello");
		let hash = calc_hash(&path, HashAlg::Sha1).unwrap();
		assert_eq!(hash.hex(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
	}

	#[test]
	fn empty_file_hashes_to_empty_digest() {
		let (_dir, path) = write_temp(b"");
		let hash = calc_hash(&path, HashAlg::Sha1).unwrap();
		assert_eq!(hash.hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
	}

	#[test]
	fn chunk_boundary_does_not_change_digest() {
		// one byte past the streaming buffer size
		let mut contents = vec![0u8; HASH_BUF_SIZE + 1];
		rand::thread_rng().fill_bytes(&mut contents);
		let (_dir, path) = write_temp(&contents);

		let streamed = calc_hash(&path, HashAlg::Sha256).unwrap();
		let oneshot = sha2::Sha256::digest(&contents);
		assert_eq!(streamed.value, oneshot.to_vec());
	}

	#[test]
	fn identical_contents_hash_identically() {
		let (_dir_a, a) = write_temp(b"same bytes");
		let (_dir_b, b) = write_temp(b"same bytes");
		let ha = calc_hash(&a, HashAlg::Sha1).unwrap();
		let hb = calc_hash(&b, HashAlg::Sha1).unwrap();
		assert!(ha.has_same_value(&hb));
	}

	#[test]
	fn tsv_shape() {
		let hash = Hash::new(
			Utf8PathBuf::from("/t/a.txt"),
			HashAlg::Sha1,
			vec![0xaa, 0xf4],
			1700000000,
		);
		assert_eq!(hash.tsv(), "/t/a.txt\ta.txt\t1700000000\tsha1:aaf4");
	}

	#[test]
	fn rejects_directory() {
		let dir = tempfile::tempdir().unwrap();
		let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
		assert!(matches!(
			calc_hash(&path, HashAlg::Sha1),
			Err(HasherError::NotRegularFile(_))
		));
	}
}
