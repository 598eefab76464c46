use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local, SecondsFormat};
use libhasher::common::{is_directory, open_regular, XATTR_HTIME, XATTR_MTIME, XATTR_SIZE};
use libhasher::hash::calc_hash;
use libhasher::walk::walk_dir;
use libhasher::{get_attr, HashAlg, HasherError};

use crate::style;

pub fn run_show(paths: &[Utf8PathBuf], alg: HashAlg, recursive: bool) -> Result<i32> {
	let mut status = 0;
	for path in paths {
		let result = if recursive && is_directory(path).unwrap_or(false) {
			walk_dir(path, &mut |file_path, _file| show_one(file_path, alg))
		} else {
			show_one(path, alg)
		};

		if let Err(err) = result {
			style::show_error(&err.to_string());
			status = 1;
		}
	}
	Ok(status)
}

fn show_one(path: &Utf8Path, alg: HashAlg) -> Result<(), HasherError> {
	let file = open_regular(path)?;

	let hash = get_attr(&file, alg.attr_name());
	let size = get_attr(&file, XATTR_SIZE);
	let mtime = render_nanos(&get_attr(&file, XATTR_MTIME));
	let htime = render_nanos(&get_attr(&file, XATTR_HTIME));

	println!("{path}\t{hash}\t{size}\t{mtime}\t{htime}");
	Ok(())
}

/// Renders a decimal nanosecond unix time as local RFC-3339 with
/// nanosecond precision; anything unparsable passes through untouched.
fn render_nanos(value: &str) -> String {
	match value.parse::<i64>() {
		Ok(ns) => DateTime::from_timestamp_nanos(ns)
			.with_timezone(&Local)
			.to_rfc3339_opts(SecondsFormat::Nanos, false),
		Err(_) => value.to_string(),
	}
}

pub fn run_calc(paths: &[Utf8PathBuf], alg: HashAlg, no_show_path: bool) -> Result<i32> {
	let mut status = 0;
	for path in paths {
		match calc_hash(path, alg) {
			Ok(hash) => {
				if no_show_path {
					println!("{}", hash.hex());
				} else {
					println!("{}  {path}", hash.hex());
				}
			}
			Err(err) => {
				style::show_error(&err.to_string());
				status = 1;
			}
		}
	}
	Ok(status)
}
