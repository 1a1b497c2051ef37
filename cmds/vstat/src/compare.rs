//! Drift classification between two loosely semver-shaped version strings.

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// How far apart two deployed versions are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftLevel {
	/// At least one side is not a `MAJOR.MINOR.PATCH` version.
	Unknown,
	Match,
	MinorDrift,
	MajorDrift,
}

impl fmt::Display for DriftLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DriftLevel::Unknown => write!(f, "unknown"),
			DriftLevel::Match => write!(f, "match"),
			DriftLevel::MinorDrift => write!(f, "minor-drift"),
			DriftLevel::MajorDrift => write!(f, "major-drift"),
		}
	}
}

/// A version string that does not parse into exactly three integers.
///
/// Never leaves this module as an error: [`compare`] degrades it to
/// [`DriftLevel::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("version `{0}` is not of the form MAJOR.MINOR.PATCH")]
pub struct ParseVersionError(String);

/// The numeric core of a version, suffix stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
	pub major: u64,
	pub minor: u64,
	pub patch: u64,
}

impl FromStr for Version {
	type Err = ParseVersionError;

	/// Everything from the first `-` on is ignored, so `1.4.0-rc.1` reads as `1.4.0`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let core = s.split_once('-').map_or(s, |(core, _)| core);
		let err = || ParseVersionError(s.to_string());

		let mut parts = core.split('.').map(parse_component);
		let mut next = || parts.next().flatten().ok_or_else(err);
		let version = Version {
			major: next()?,
			minor: next()?,
			patch: next()?,
		};

		if parts.next().is_some() {
			return Err(err());
		}
		Ok(version)
	}
}

/// Digits only: `u64::from_str` would also take a leading `+`.
fn parse_component(part: &str) -> Option<u64> {
	if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	part.parse().ok()
}

impl Version {
	/// Classify the drift from `self` to `other`.
	///
	/// The checks run in order and the first one that applies wins.
	pub fn drift(&self, other: &Version) -> DriftLevel {
		if self.major != other.major {
			DriftLevel::MajorDrift
		} else if self.minor == other.minor && self.patch == other.patch {
			DriftLevel::Match
		} else if self.minor.abs_diff(other.minor) > 1 {
			DriftLevel::MajorDrift
		} else {
			// Minor is one apart, or only the patch differs.
			DriftLevel::MinorDrift
		}
	}
}

/// Classify the drift between two version strings.
///
/// Total over any input: unparsable versions give [`DriftLevel::Unknown`].
pub fn compare(left: &str, right: &str) -> DriftLevel {
	match (left.parse::<Version>(), right.parse::<Version>()) {
		(Ok(left), Ok(right)) => left.drift(&right),
		(Err(e), _) | (_, Err(e)) => {
			tracing::trace!(error = %e, "cannot classify drift");
			DriftLevel::Unknown
		}
	}
}
