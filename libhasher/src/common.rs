use std::fs::File;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::Utf8Path;

use crate::error::HasherError;

/// namespace for every xattr the tool writes
pub const XATTR_PREFIX: &str = "user.hasher";
/// decimal file size in bytes at hash time
pub const XATTR_SIZE: &str = "user.hasher.size";
/// decimal nanosecond unix mtime at hash time
pub const XATTR_MTIME: &str = "user.hasher.mtime";
/// decimal nanosecond unix time of the last successful validity check
pub const XATTR_HTIME: &str = "user.hasher.htime";

/// chunk size for streaming file contents through a hasher
pub const HASH_BUF_SIZE: usize = 256 * 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
	Regular,
	Directory,
	Symlink,
	Other,
}

/// Kind of the entry at `path`, without following symlinks.
pub fn file_kind(path: &Utf8Path) -> Result<FileKind, HasherError> {
	let meta = std::fs::symlink_metadata(path).map_err(|e| HasherError::io(path, e))?;
	let ftype = meta.file_type();
	Ok(if ftype.is_symlink() {
		FileKind::Symlink
	} else if ftype.is_dir() {
		FileKind::Directory
	} else if ftype.is_file() {
		FileKind::Regular
	} else {
		FileKind::Other
	})
}

/// Opens `path` for reading, refusing directories, symlinks and specials.
pub fn open_regular(path: &Utf8Path) -> Result<File, HasherError> {
	if file_kind(path)? != FileKind::Regular {
		return Err(HasherError::NotRegularFile(path.to_owned()));
	}
	File::open(path).map_err(|e| HasherError::io(path, e))
}

pub fn is_directory(path: &Utf8Path) -> Result<bool, HasherError> {
	Ok(file_kind(path)? == FileKind::Directory)
}

pub fn ensure_directory(path: &Utf8Path) -> Result<(), HasherError> {
	if !is_directory(path)? {
		return Err(HasherError::NotRegularFile(path.to_owned()));
	}
	Ok(())
}

/// Nanosecond unix time of `t`. Negative for pre-epoch times.
pub fn unix_nanos(t: SystemTime) -> i64 {
	match t.duration_since(UNIX_EPOCH) {
		Ok(d) => d.as_nanos() as i64,
		Err(e) => -(e.duration().as_nanos() as i64),
	}
}

/// Wall-clock now, as nanosecond unix time.
pub fn wall_clock_nanos() -> i64 {
	unix_nanos(SystemTime::now())
}
