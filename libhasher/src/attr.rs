//! Thin gateway over extended attributes. All operations act on an open
//! file descriptor so that one stat+open pair serves both the validity
//! check and the write.

use std::fs::File;
use std::io;

use xattr::FileExt;

/// Reads an attribute as a string. Any failure, including a missing
/// attribute, yields the empty string.
pub fn get_attr(file: &File, name: &str) -> String {
	match file.get_xattr(name) {
		Ok(Some(v)) => String::from_utf8_lossy(&v).into_owned(),
		_ => String::new(),
	}
}

pub fn set_attr(file: &File, name: &str, value: &str) -> io::Result<()> {
	file.set_xattr(name, value.as_bytes())
}

pub fn remove_attr(file: &File, name: &str) -> io::Result<()> {
	file.remove_xattr(name)
}

pub fn list_attrs(file: &File) -> io::Result<Vec<String>> {
	Ok(file
		.list_xattr()?
		.filter_map(|n| n.into_string().ok())
		.collect())
}

/// Removes every attribute whose name begins with `prefix`.
pub fn clear_attrs(file: &File, prefix: &str) -> io::Result<()> {
	for name in list_attrs(file)? {
		if name.starts_with(prefix) {
			remove_attr(file, &name)?;
		}
	}
	Ok(())
}
