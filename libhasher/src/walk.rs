//! Depth-first traversal over regular files. Symlinks are never followed
//! and never reported; directories are recursed but not passed on. Each
//! file is handed to the callback as an already-open handle, released on
//! every exit path.

use std::fs::File;

use camino::{Utf8Path, Utf8PathBuf};

use crate::common::{ensure_directory, file_kind, FileKind};
use crate::error::HasherError;

pub fn walk_dir<F>(root: &Utf8Path, deal: &mut F) -> Result<(), HasherError>
where
	F: FnMut(&Utf8Path, &File) -> Result<(), HasherError>,
{
	let entries = std::fs::read_dir(root).map_err(|e| HasherError::io(root, e))?;
	for entry in entries {
		let entry = entry.map_err(|e| HasherError::io(root, e))?;
		let ftype = entry.file_type().map_err(|e| HasherError::io(root, e))?;
		if ftype.is_symlink() {
			continue;
		}
		// non-UTF-8 names are not representable in the manifest; skip them
		let Ok(path) = Utf8PathBuf::try_from(entry.path()) else {
			continue;
		};
		if ftype.is_dir() {
			walk_dir(&path, deal)?;
		} else if ftype.is_file() {
			let file = File::open(&path).map_err(|e| HasherError::io(&path, e))?;
			deal(&path, &file)?;
		}
	}
	Ok(())
}

/// Walks every root in order. A callback error aborts the walk; later
/// roots are not visited.
pub fn walk_dirs<F>(roots: &[Utf8PathBuf], mut deal: F) -> Result<(), HasherError>
where
	F: FnMut(&Utf8Path, &File) -> Result<(), HasherError>,
{
	for root in roots {
		ensure_directory(root)?;
	}
	for root in roots {
		walk_dir(root, &mut deal)?;
	}
	Ok(())
}

/// Same traversal as `walk_dirs`, counting only. Regular-file roots count
/// as one; non-regular roots are skipped.
pub fn count_files(roots: &[Utf8PathBuf]) -> Result<usize, HasherError> {
	let mut count = 0usize;
	for root in roots {
		match file_kind(root)? {
			FileKind::Regular => count += 1,
			FileKind::Directory => {
				walk_dir(root, &mut |_, _| {
					count += 1;
					Ok(())
				})?;
			}
			_ => {}
		}
	}
	Ok(count)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeSet;

	fn tree() -> (tempfile::TempDir, Utf8PathBuf) {
		let dir = tempfile::tempdir().unwrap();
		let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

		std::fs::write(root.join("a"), b"a").unwrap();
		std::fs::create_dir(root.join("sub")).unwrap();
		std::fs::write(root.join("sub/b"), b"b").unwrap();
		std::fs::create_dir(root.join("sub/deeper")).unwrap();
		std::fs::write(root.join("sub/deeper/c"), b"c").unwrap();

		(dir, root)
	}

	#[test]
	fn visits_all_regular_files() {
		let (_dir, root) = tree();
		let mut seen = BTreeSet::new();
		walk_dirs(std::slice::from_ref(&root), |path, _file| {
			seen.insert(path.file_name().unwrap().to_string());
			Ok(())
		})
		.unwrap();
		assert_eq!(
			seen,
			BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string()])
		);
	}

	#[cfg(unix)]
	#[test]
	fn symlinks_are_invisible() {
		let (_dir, root) = tree();
		std::os::unix::fs::symlink(root.join("a"), root.join("link-to-a")).unwrap();
		std::os::unix::fs::symlink(root.join("sub"), root.join("link-to-sub")).unwrap();

		let mut count = 0;
		walk_dir(&root, &mut |_, _| {
			count += 1;
			Ok(())
		})
		.unwrap();
		assert_eq!(count, 3);
		assert_eq!(count_files(std::slice::from_ref(&root)).unwrap(), 3);
	}

	#[test]
	fn callback_error_aborts() {
		let (_dir, root) = tree();
		let mut visited = 0;
		let res = walk_dir(&root, &mut |path, _| {
			visited += 1;
			Err(HasherError::NotRegularFile(path.to_owned()))
		});
		assert!(res.is_err());
		assert_eq!(visited, 1);
	}

	#[test]
	fn count_accepts_file_roots() {
		let (_dir, root) = tree();
		let roots = vec![root.join("a"), root.clone()];
		assert_eq!(count_files(&roots).unwrap(), 4);
	}

	#[test]
	fn walk_dirs_requires_directories() {
		let (_dir, root) = tree();
		let roots = vec![root.join("a")];
		assert!(walk_dirs(&roots, |_, _| Ok(())).is_err());
	}
}
