//! The two concrete progress notifiers. The verbose variant owns one
//! terminal row per worker plus a counter row; every notify call becomes an
//! event on an internal channel drained by a single UI thread, so worker
//! threads never touch the terminal themselves.

use std::sync::Mutex;
use std::thread::JoinHandle;

use console::{style, Term};
use crossbeam_channel::{bounded, Receiver, Sender};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use libhasher::reporting::ProgressNotifier;

use crate::style::{show_error, show_warn};

enum Event {
	Total(usize),
	Start { worker_id: usize, name: String },
	Done { worker_id: usize, message: String },
	Progress { done: usize, total: Option<usize> },
	Warning { message: String },
	Error { message: String },
}

pub struct HasherProgressNotifier {
	workers: usize,
	tx: Mutex<Option<Sender<Event>>>,
	rx: Mutex<Option<Receiver<Event>>>,
	ui: Mutex<Option<JoinHandle<()>>>,
}

impl HasherProgressNotifier {
	pub fn new(workers: usize) -> Self {
		let (tx, rx) = bounded(1024);
		Self {
			workers,
			tx: Mutex::new(Some(tx)),
			rx: Mutex::new(Some(rx)),
			ui: Mutex::new(None),
		}
	}

	fn send(&self, event: Event) {
		if let Some(tx) = self.tx.lock().unwrap().as_ref() {
			let _ = tx.send(event);
		}
	}
}

impl ProgressNotifier for HasherProgressNotifier {
	fn set_total(&self, total: usize) {
		self.send(Event::Total(total));
	}

	fn start(&self) {
		let Some(rx) = self.rx.lock().unwrap().take() else {
			return;
		};
		let workers = self.workers;
		*self.ui.lock().unwrap() = Some(std::thread::spawn(move || ui_loop(workers, rx)));
	}

	/// Closes the event channel, then waits for the UI thread to drain
	/// everything already queued. Nothing issued before this call is lost.
	fn shutdown(&self) {
		self.tx.lock().unwrap().take();
		if let Some(handle) = self.ui.lock().unwrap().take() {
			let _ = handle.join();
		}
	}

	fn notify_task_start(&self, worker_id: usize, name: &str) {
		self.send(Event::Start { worker_id, name: name.to_string() });
	}

	fn notify_task_done(&self, worker_id: usize, message: &str) {
		self.send(Event::Done { worker_id, message: message.to_string() });
	}

	fn notify_progress(&self, done: usize, total: Option<usize>) {
		self.send(Event::Progress { done, total });
	}

	fn notify_warning(&self, _worker_id: usize, message: &str) {
		self.send(Event::Warning { message: message.to_string() });
	}

	fn notify_error(&self, _worker_id: usize, message: &str) {
		self.send(Event::Error { message: message.to_string() });
	}

	fn is_verbose(&self) -> bool {
		true
	}
}

fn ui_loop(workers: usize, rx: Receiver<Event>) {
	let term = Term::stderr();
	let _ = term.hide_cursor();

	let mp = MultiProgress::new();
	let row_style = ProgressStyle::with_template("{prefix} : {wide_msg}").unwrap();
	let rows: Vec<ProgressBar> = (0..workers)
		.map(|i| {
			mp.add(
				ProgressBar::new_spinner()
					.with_style(row_style.clone())
					.with_prefix(format!("[Worker-{i}]")),
			)
		})
		.collect();
	let counter = mp.add(
		ProgressBar::new(0)
			.with_style(ProgressStyle::with_template("{pos} / {len}").unwrap()),
	);

	for event in rx {
		match event {
			Event::Total(n) => counter.set_length(n as u64),
			Event::Start { worker_id, name } => {
				if let Some(row) = rows.get(worker_id) {
					row.set_message(chop_path(&name));
				}
			}
			Event::Done { worker_id, message } => {
				if let Some(row) = rows.get(worker_id) {
					row.set_message(message);
				}
			}
			Event::Progress { done, total } => {
				if let Some(total) = total {
					if counter.length() != Some(total as u64) {
						counter.set_length(total as u64);
					}
				}
				counter.set_position(done as u64);
			}
			Event::Warning { message } => {
				let _ = mp.println(format!(
					"[{}] {}",
					style("WARNING").yellow(),
					message
				));
			}
			Event::Error { message } => {
				let _ = mp.println(format!("[{}] {}", style("ERROR").red(), message));
			}
		}
	}

	for row in &rows {
		row.finish();
	}
	counter.finish();
	let _ = term.show_cursor();
}

/// Chops a path down to its last two components, `...`-prefixed when
/// anything was dropped.
fn chop_path(path: &str) -> String {
	let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
	if parts.len() > 2 {
		format!(".../{}/{}", parts[parts.len() - 2], parts[parts.len() - 1])
	} else {
		path.to_string()
	}
}

/// Quiet notifier: progress is discarded, warnings and errors still reach
/// stderr.
pub struct StdioProgressNotifier;

impl ProgressNotifier for StdioProgressNotifier {
	fn set_total(&self, _total: usize) {}
	fn start(&self) {}
	fn shutdown(&self) {}
	fn notify_task_start(&self, _worker_id: usize, _name: &str) {}
	fn notify_task_done(&self, _worker_id: usize, _message: &str) {}
	fn notify_progress(&self, _done: usize, _total: Option<usize>) {}

	fn notify_warning(&self, _worker_id: usize, message: &str) {
		show_warn(message);
	}

	fn notify_error(&self, _worker_id: usize, message: &str) {
		show_error(message);
	}

	fn is_verbose(&self) -> bool {
		false
	}
}
