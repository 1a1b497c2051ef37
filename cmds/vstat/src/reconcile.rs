//! Merge two service → version maps into ordered comparison rows.

use serde::Serialize;

use crate::{
	compare::{compare, DriftLevel},
	normalize::ServiceVersionMap,
};

/// One service as seen by both sources.
///
/// A version missing from a source is an empty string with the matching
/// `in_*` flag unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
	pub service: String,
	pub left_version: String,
	pub right_version: String,
	pub in_left: bool,
	pub in_right: bool,
	pub drift: DriftLevel,
}

impl ComparisonRow {
	fn new(service: &str, left: Option<&str>, right: Option<&str>) -> Self {
		let left_version = left.unwrap_or_default();
		let right_version = right.unwrap_or_default();
		Self {
			service: service.to_string(),
			left_version: left_version.to_string(),
			right_version: right_version.to_string(),
			in_left: left.is_some(),
			in_right: right.is_some(),
			drift: compare(left_version, right_version),
		}
	}

	/// Whether the two sides report textually different versions.
	pub fn differs(&self) -> bool {
		self.left_version != self.right_version
	}
}

/// Which rows [`reconcile`] produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
	/// Drop rows whose two versions are textually equal.
	pub diffs_only: bool,

	/// Also emit services only the right source reports.
	///
	/// Off by default: rows are enumerated from the left map's services only.
	pub include_right_only: bool,
}

/// Build comparison rows sorted by service name (byte order, case-sensitive).
///
/// A service absent on the right compares as an empty version, so in
/// diffs-only mode a left service with an empty version and no right
/// counterpart is suppressed.
pub fn reconcile(
	left: &ServiceVersionMap,
	right: &ServiceVersionMap,
	opts: ReconcileOptions,
) -> Vec<ComparisonRow> {
	let mut rows: Vec<ComparisonRow> = left
		.iter()
		.map(|(service, version)| ComparisonRow::new(service, Some(version), right.get(service)))
		.collect();

	if opts.include_right_only {
		rows.extend(
			right
				.iter()
				.filter(|(service, _)| !left.contains(service))
				.map(|(service, version)| ComparisonRow::new(service, None, Some(version))),
		);
	}

	if opts.diffs_only {
		rows.retain(ComparisonRow::differs);
	}

	rows.sort_by(|a, b| a.service.cmp(&b.service));
	rows
}
