use camino::Utf8PathBuf;
use thiserror::Error;

/// Error taxonomy of the crate. Per-file errors are recovered locally by the
/// traversals and surfaced through the notifier; anything else propagates.
#[derive(Debug, Error)]
pub enum HasherError {
	#[error("{path}: {source}")]
	Io {
		path: Utf8PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("not a regular file: {0}")]
	NotRegularFile(Utf8PathBuf),

	#[error("hash algorithm not available: {0}")]
	UnavailableAlgorithm(String),

	/// An xattr write failed after the hash itself was computed. The
	/// in-memory hash is still trustworthy, so callers treat this as a
	/// warning rather than a failure.
	#[error("failed to update attribute {attr} on {path}: {source}")]
	UpdateAttribute {
		path: Utf8PathBuf,
		attr: String,
		#[source]
		source: std::io::Error,
	},

	#[error("{path}:{line}: {reason}")]
	ManifestParse {
		path: Utf8PathBuf,
		line: usize,
		reason: String,
	},
}

impl HasherError {
	pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
		Self::Io { path: path.into(), source }
	}

	/// true for the non-fatal attribute-persistence failure
	pub fn is_attr_error(&self) -> bool {
		matches!(self, Self::UpdateAttribute { .. })
	}
}
