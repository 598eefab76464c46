//! Shared stderr formatting and the status color palette.

use console::{style, Style};
use libhasher::filediff::DiffStatus;

pub fn show_warn(msg: &str) {
	eprintln!("[{}] {}", style("WARNING").yellow(), msg);
}

pub fn show_error(msg: &str) {
	eprintln!("[{}] {}", style("ERROR").red(), msg);
}

pub fn status_style(status: DiffStatus) -> Style {
	match status {
		DiffStatus::Added => Style::new().green(),
		DiffStatus::Same => Style::new().color256(8),
		DiffStatus::ModifiedNewer
		| DiffStatus::ModifiedOlder
		| DiffStatus::ModifiedSameMtime => Style::new().color256(214),
		DiffStatus::Renamed => Style::new().yellow(),
		DiffStatus::Removed => Style::new().color256(218),
		DiffStatus::Unknown => Style::new(),
	}
}
