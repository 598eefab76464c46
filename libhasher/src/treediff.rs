use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};

use crate::alg::HashAlg;
use crate::dirdiff::DirDiff;
use crate::error::HasherError;
use crate::filediff::DiffStatus;
use crate::reporting::ProgressNotifier;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DirPairStatus {
	BaseOnly,
	Pair,
	TargetOnly,
}

/// The diff results for one relative directory across the two trees.
#[derive(Debug)]
pub struct DirPair {
	pub base: Option<DirDiff>,
	pub target: Option<DirDiff>,
	pub status: DirPairStatus,
}

impl DirPair {
	pub fn pair(base: DirDiff, target: DirDiff) -> Self {
		Self { base: Some(base), target: Some(target), status: DirPairStatus::Pair }
	}

	pub fn base_only(base: DirDiff) -> Self {
		Self { base: Some(base), target: None, status: DirPairStatus::BaseOnly }
	}

	pub fn target_only(target: DirDiff) -> Self {
		Self { base: None, target: Some(target), status: DirPairStatus::TargetOnly }
	}

	pub fn path(&self) -> &Utf8Path {
		if let Some(base) = &self.base {
			&base.path
		} else if let Some(target) = &self.target {
			&target.path
		} else {
			Utf8Path::new("")
		}
	}
}

/// Compares two directory trees, directory by directory.
///
/// Every relative subdirectory of either root, the roots themselves
/// included, ends up in exactly one pair. Directories on one side only are
/// emitted wholesale as added/removed; common directories get the full
/// three-pass comparison. The result is sorted by path. Directories that
/// fail to scan are reported and skipped.
pub fn dir_diff_recursive(
	base_dir: &Utf8Path,
	target_dir: &Utf8Path,
	alg: HashAlg,
	notifier: &dyn ProgressNotifier,
) -> Result<Vec<DirPair>, HasherError> {
	let base_dir = normalize_dir_path(base_dir);
	let target_dir = normalize_dir_path(target_dir);

	let base_list = list_directories(&base_dir)?;
	let target_list = list_directories(&target_dir)?;

	let mut pairs = Vec::new();

	for rel in base_list.difference(&target_list) {
		match DirDiff::scan(&base_dir.join(rel), alg) {
			Ok(mut dd) => {
				dd.mark_all(DiffStatus::Added);
				pairs.push(DirPair::base_only(dd));
			}
			Err(err) => notifier.notify_warning(0, &err.to_string()),
		}
	}

	for rel in target_list.difference(&base_list) {
		match DirDiff::scan(&target_dir.join(rel), alg) {
			Ok(mut dd) => {
				dd.mark_all(DiffStatus::Removed);
				pairs.push(DirPair::target_only(dd));
			}
			Err(err) => notifier.notify_warning(0, &err.to_string()),
		}
	}

	for rel in base_list.intersection(&target_list) {
		let base = DirDiff::scan(&base_dir.join(rel), alg);
		let target = DirDiff::scan(&target_dir.join(rel), alg);
		match (base, target) {
			(Ok(mut base), Ok(mut target)) => {
				base.compare(&mut target);
				pairs.push(DirPair::pair(base, target));
			}
			(Err(err), _) | (_, Err(err)) => notifier.notify_warning(0, &err.to_string()),
		}
	}

	pairs.sort_by(|a, b| a.path().as_str().cmp(b.path().as_str()));
	Ok(pairs)
}

/// strips redundant trailing separators so relative paths come out clean
fn normalize_dir_path(dir: &Utf8Path) -> Utf8PathBuf {
	let trimmed = dir.as_str().trim_end_matches('/');
	if trimmed.is_empty() {
		Utf8PathBuf::from("/")
	} else {
		Utf8PathBuf::from(trimmed)
	}
}

/// Every subdirectory of `root` as a relative path, the root itself
/// included as `""`. Symlinked directories are not followed.
fn list_directories(root: &Utf8Path) -> Result<BTreeSet<String>, HasherError> {
	let mut out = BTreeSet::new();
	out.insert(String::new());
	collect_subdirs(root, Utf8Path::new(""), &mut out)?;
	Ok(out)
}

fn collect_subdirs(
	root: &Utf8Path,
	rel: &Utf8Path,
	out: &mut BTreeSet<String>,
) -> Result<(), HasherError> {
	let dir = root.join(rel);
	let entries = std::fs::read_dir(&dir).map_err(|e| HasherError::io(&dir, e))?;
	for entry in entries {
		let entry = entry.map_err(|e| HasherError::io(&dir, e))?;
		let ftype = entry.file_type().map_err(|e| HasherError::io(&dir, e))?;
		if ftype.is_symlink() || !ftype.is_dir() {
			continue;
		}
		let Some(name) = entry.file_name().to_str().map(str::to_string) else {
			continue;
		};
		let sub = rel.join(name);
		out.insert(sub.as_str().to_string());
		collect_subdirs(root, &sub, out)?;
	}
	Ok(())
}
