//! The bulk-update pipeline: one producer walking the roots, a fixed pool
//! of workers running the per-file update protocol, and a coordinator that
//! counts completions. Tasks flow through a bounded channel so the walk
//! never runs unboundedly ahead of the workers; results flow back through
//! an unbounded one.

use camino::Utf8PathBuf;
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};

use crate::alg::HashAlg;
use crate::common::{file_kind, FileKind};
use crate::error::HasherError;
use crate::hash::Hash;
use crate::reporting::ProgressNotifier;
use crate::update::update_hash;
use crate::walk::{count_files, walk_dir};

pub const MSG_OK: &str = "[OK]";
pub const MSG_UPDATED: &str = "[UPDATED]";
pub const MSG_FAILED: &str = "[FAILED]";
pub const MSG_ERROR: &str = "[ERROR]";

#[derive(Clone, Debug)]
pub struct UpdateTask {
	pub path: Utf8PathBuf,
}

#[derive(Debug)]
pub struct UpdateResult {
	pub worker_id: usize,
	pub task: UpdateTask,
	pub hash: Option<Hash>,
	pub message: &'static str,
	pub error: Option<HasherError>,
}

impl UpdateResult {
	pub fn failed(&self) -> bool {
		self.message == MSG_FAILED
	}
}

/// Requested worker count clamped to the host: at most cpu_count - 1, at
/// least 1. Single- and dual-core hosts collapse to one worker.
pub fn clamp_workers(requested: usize) -> usize {
	requested.min(num_cpus::get().saturating_sub(1)).max(1)
}

/// Updates every regular file under `roots` with `workers` parallel
/// workers, streaming progress to `notifier`. Single-file failures are
/// captured per task, not fatal to the pool. Returns one result per
/// dispatched task.
pub fn concurrent_update(
	roots: &[Utf8PathBuf],
	alg: HashAlg,
	workers: usize,
	force: bool,
	notifier: &dyn ProgressNotifier,
) -> Result<Vec<UpdateResult>, HasherError> {
	let workers = clamp_workers(workers);

	// the denominator is taken up front; files appearing mid-walk are
	// still processed but widen `done` past it
	notifier.set_total(count_files(roots)?);
	notifier.start();

	let (task_tx, task_rx) = bounded::<UpdateTask>(3 * workers);
	let (result_tx, result_rx) = unbounded::<UpdateResult>();
	let (dispatched_tx, dispatched_rx) = bounded::<usize>(1);

	let outcome = std::thread::scope(|scope| {
		for worker_id in 0..workers {
			let task_rx = task_rx.clone();
			let result_tx = result_tx.clone();
			scope.spawn(move || {
				worker_loop(worker_id, task_rx, result_tx, alg, force, notifier)
			});
		}
		drop(task_rx);
		drop(result_tx);

		let producer = scope.spawn(move || {
			let mut dispatched = 0usize;
			let result = produce_tasks(roots, &task_tx, &mut dispatched, notifier);
			// announce the real task count even when the walk died early,
			// so the coordinator still quiesces
			let _ = dispatched_tx.send(dispatched);
			result
		});

		let results = coordinate(&result_rx, &dispatched_rx, notifier);
		producer.join().unwrap()?;
		Ok(results)
	});

	notifier.shutdown();
	outcome
}

fn produce_tasks(
	roots: &[Utf8PathBuf],
	tasks: &Sender<UpdateTask>,
	dispatched: &mut usize,
	notifier: &dyn ProgressNotifier,
) -> Result<(), HasherError> {
	for root in roots {
		match file_kind(root)? {
			FileKind::Regular => {
				if tasks.send(UpdateTask { path: root.clone() }).is_ok() {
					*dispatched += 1;
				}
			}
			FileKind::Directory => {
				walk_dir(root, &mut |path, _file| {
					if tasks.send(UpdateTask { path: path.to_owned() }).is_ok() {
						*dispatched += 1;
					}
					Ok(())
				})?;
			}
			_ => notifier.notify_warning(0, &format!("ignored: {root}")),
		}
	}
	Ok(())
}

fn worker_loop(
	worker_id: usize,
	tasks: Receiver<UpdateTask>,
	results: Sender<UpdateResult>,
	alg: HashAlg,
	force: bool,
	notifier: &dyn ProgressNotifier,
) {
	for task in tasks.iter() {
		notifier.notify_task_start(worker_id, task.path.as_str());

		let (message, hash, error) = match update_hash(&task.path, alg, force) {
			Ok(update) => {
				if let Some(err) = &update.attr_error {
					notifier.notify_warning(worker_id, &err.to_string());
				}
				let message = if update.changed { MSG_UPDATED } else { MSG_OK };
				(message, Some(update.hash), update.attr_error)
			}
			Err(err) => {
				notifier.notify_error(worker_id, &format!("{}: {err}", task.path));
				(MSG_FAILED, None, Some(err))
			}
		};

		notifier.notify_task_done(worker_id, message);
		let _ = results.send(UpdateResult { worker_id, task, hash, message, error });
	}
}

/// Consumes results until every dispatched task has produced exactly one.
/// The producer's final count arrives on its own channel; completion is
/// `done >= dispatched`.
fn coordinate(
	results: &Receiver<UpdateResult>,
	dispatched: &Receiver<usize>,
	notifier: &dyn ProgressNotifier,
) -> Vec<UpdateResult> {
	let mut collected = Vec::new();
	let mut done = 0usize;
	let mut expected: Option<usize> = None;

	loop {
		match expected {
			Some(n) => {
				if done >= n {
					break;
				}
				match results.recv() {
					Ok(r) => {
						done += 1;
						notifier.notify_progress(done, Some(n));
						collected.push(r);
					}
					Err(_) => break,
				}
			}
			None => select! {
				recv(results) -> msg => match msg {
					Ok(r) => {
						done += 1;
						notifier.notify_progress(done, None);
						collected.push(r);
					}
					Err(_) => {
						// workers are gone, so the producer has finished;
						// pick up its count and let the check above decide
						expected = Some(dispatched.recv().unwrap_or(done));
					}
				},
				recv(dispatched) -> msg => {
					expected = Some(msg.unwrap_or(done));
				}
			},
		}
	}

	collected
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reporting::NullNotifier;
	use std::sync::Mutex;

	#[derive(Default)]
	struct RecordingNotifier {
		progress: Mutex<Vec<usize>>,
		done_messages: Mutex<Vec<&'static str>>,
		errors: Mutex<Vec<String>>,
	}

	impl ProgressNotifier for RecordingNotifier {
		fn set_total(&self, _total: usize) {}
		fn start(&self) {}
		fn shutdown(&self) {}
		fn notify_task_start(&self, _worker_id: usize, _name: &str) {}
		fn notify_task_done(&self, _worker_id: usize, message: &str) {
			// messages are the well-known static marks
			for mark in [MSG_OK, MSG_UPDATED, MSG_FAILED] {
				if message == mark {
					self.done_messages.lock().unwrap().push(mark);
				}
			}
		}
		fn notify_progress(&self, done: usize, _total: Option<usize>) {
			self.progress.lock().unwrap().push(done);
		}
		fn notify_warning(&self, _worker_id: usize, _message: &str) {}
		fn notify_error(&self, _worker_id: usize, message: &str) {
			self.errors.lock().unwrap().push(message.to_string());
		}
		fn is_verbose(&self) -> bool {
			false
		}
	}

	fn tree_with_files(n: usize) -> (tempfile::TempDir, Vec<Utf8PathBuf>) {
		let dir = tempfile::tempdir().unwrap();
		let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
		for i in 0..n {
			std::fs::write(root.join(format!("file-{i:03}")), format!("contents {i}"))
				.unwrap();
		}
		(dir, vec![root])
	}

	#[test]
	fn clamp_has_a_floor_of_one() {
		assert_eq!(clamp_workers(0), 1);
		assert!(clamp_workers(1024) >= 1);
		assert!(clamp_workers(1024) <= num_cpus::get().max(2));
	}

	#[test]
	fn every_task_yields_exactly_one_result() {
		let (_dir, roots) = tree_with_files(100);
		let notifier = RecordingNotifier::default();

		let results =
			concurrent_update(&roots, HashAlg::Sha1, 4, false, &notifier).unwrap();

		assert_eq!(results.len(), 100);
		let mut paths: Vec<&str> =
			results.iter().map(|r| r.task.path.as_str()).collect();
		paths.sort();
		paths.dedup();
		assert_eq!(paths.len(), 100);
	}

	#[test]
	fn progress_is_strictly_monotonic() {
		let (_dir, roots) = tree_with_files(100);
		let notifier = RecordingNotifier::default();

		concurrent_update(&roots, HashAlg::Sha1, 4, false, &notifier).unwrap();

		let progress = notifier.progress.lock().unwrap();
		let expected: Vec<usize> = (1..=100).collect();
		assert_eq!(*progress, expected);
	}

	#[test]
	fn failures_do_not_stop_the_pool() {
		let (dir, mut roots) = tree_with_files(5);
		let root = roots.pop().unwrap();
		#[cfg(unix)]
		std::os::unix::fs::symlink("/nonexistent", dir.path().join("dangling")).unwrap();
		// a fifo would error; a missing file can't be dispatched, so
		// provoke a failure with an unreadable entry instead
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let locked = root.join("file-000");
			std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000))
				.unwrap();

			let notifier = RecordingNotifier::default();
			let results = concurrent_update(
				std::slice::from_ref(&root),
				HashAlg::Sha1,
				2,
				false,
				&notifier,
			)
			.unwrap();

			assert_eq!(results.len(), 5);
			let failed = results.iter().filter(|r| r.failed()).count();
			// root runs skip the permission check; everyone else fails once
			if failed > 0 {
				assert_eq!(failed, 1);
				assert_eq!(notifier.errors.lock().unwrap().len(), 1);
			}
			assert!(results.iter().filter(|r| !r.failed()).count() >= 4);

			std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o644))
				.unwrap();
		}
	}

	#[test]
	fn second_run_reports_ok_not_updated() {
		let (_dir, roots) = tree_with_files(8);

		let first =
			concurrent_update(&roots, HashAlg::Sha1, 2, false, &NullNotifier).unwrap();
		assert!(first.iter().all(|r| r.message == MSG_UPDATED));

		// without xattr persistence every run recomputes, so only assert
		// the incremental skip when the attributes actually stuck
		if first.iter().all(|r| r
			.error
			.as_ref()
			.map_or(true, |e| !e.is_attr_error()))
		{
			let second =
				concurrent_update(&roots, HashAlg::Sha1, 2, false, &NullNotifier)
					.unwrap();
			assert!(second.iter().all(|r| r.message == MSG_OK));
		}
	}

	#[test]
	fn file_roots_are_dispatched() {
		let (_dir, roots) = tree_with_files(3);
		let file = roots[0].join("file-001");

		let results = concurrent_update(
			std::slice::from_ref(&file),
			HashAlg::Sha1,
			1,
			false,
			&NullNotifier,
		)
		.unwrap();
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].task.path, file);
	}
}
