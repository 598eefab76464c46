use std::fmt;
use std::str::FromStr;

use digest::DynDigest;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::error::HasherError;

/// A supported digest algorithm together with its xattr binding.
/// The short name is the algorithm id lowercased with dashes removed,
/// and the xattr key is `user.hasher.<short_name>`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HashAlg {
	#[default]
	Sha1,
	Sha256,
	Sha512,
}

impl HashAlg {
	pub fn name(self) -> &'static str {
		match self {
			HashAlg::Sha1 => "sha1",
			HashAlg::Sha256 => "sha256",
			HashAlg::Sha512 => "sha512",
		}
	}

	/// xattr key holding the hex hash for this algorithm
	pub fn attr_name(self) -> &'static str {
		match self {
			HashAlg::Sha1 => "user.hasher.sha1",
			HashAlg::Sha256 => "user.hasher.sha256",
			HashAlg::Sha512 => "user.hasher.sha512",
		}
	}

	/// a fresh streaming hasher for this algorithm
	pub fn hasher(self) -> Box<dyn DynDigest> {
		match self {
			HashAlg::Sha1 => Box::new(Sha1::default()),
			HashAlg::Sha256 => Box::new(Sha256::default()),
			HashAlg::Sha512 => Box::new(Sha512::default()),
		}
	}
}

impl fmt::Display for HashAlg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for HashAlg {
	type Err = HasherError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"sha1" => Ok(HashAlg::Sha1),
			"sha256" => Ok(HashAlg::Sha256),
			"sha512" => Ok(HashAlg::Sha512),
			other => Err(HasherError::UnavailableAlgorithm(other.to_string())),
		}
	}
}
