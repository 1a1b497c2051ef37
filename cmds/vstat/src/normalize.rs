//! Raw instance records to a canonical service → version mapping.

use std::collections::{hash_map::Entry, HashMap};

use serde::Serialize;

use crate::source::RawRecord;

/// Service name prefixes recognised when nothing else is configured.
pub const DEFAULT_PREFIXES: &[&str] = &["api", "svc"];

/// Service name suffixes excluded when nothing else is configured.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &["docs-site"];

/// Decides which `app` label values count as services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFilter {
	prefixes: Vec<String>,
	excluded_suffixes: Vec<String>,
}

impl Default for ServiceFilter {
	fn default() -> Self {
		Self::new(
			DEFAULT_PREFIXES.iter().copied(),
			DEFAULT_EXCLUDED_SUFFIXES.iter().copied(),
		)
	}
}

impl ServiceFilter {
	pub fn new<P, S>(
		prefixes: impl IntoIterator<Item = P>,
		excluded_suffixes: impl IntoIterator<Item = S>,
	) -> Self
	where
		P: Into<String>,
		S: Into<String>,
	{
		Self {
			prefixes: prefixes.into_iter().map(Into::into).collect(),
			excluded_suffixes: excluded_suffixes.into_iter().map(Into::into).collect(),
		}
	}

	/// A name is accepted when it is non-empty, starts with a recognised
	/// prefix and ends with none of the excluded suffixes.
	pub fn accepts(&self, app: &str) -> bool {
		!app.is_empty()
			&& self.prefixes.iter().any(|p| app.starts_with(p.as_str()))
			&& !self
				.excluded_suffixes
				.iter()
				.any(|s| app.ends_with(s.as_str()))
	}
}

/// Exactly one version per service name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServiceVersionMap(HashMap<String, String>);

impl ServiceVersionMap {
	pub fn get(&self, service: &str) -> Option<&str> {
		self.0.get(service).map(String::as_str)
	}

	pub fn contains(&self, service: &str) -> bool {
		self.0.contains_key(service)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Record `version` for `service` unless the service is already known.
	///
	/// Returns whether the entry was inserted.
	fn insert_first(&mut self, service: &str, version: &str) -> bool {
		match self.0.entry(service.to_string()) {
			Entry::Occupied(_) => false,
			Entry::Vacant(slot) => {
				slot.insert(version.to_string());
				true
			}
		}
	}
}

/// First occurrence of a service wins, as in [`normalize`].
impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for ServiceVersionMap {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut map = Self::default();
		for (service, version) in iter {
			map.insert_first(service.as_ref(), version.as_ref());
		}
		map
	}
}

/// Reduce instance records to a service → version mapping.
///
/// Records whose `app` label the filter rejects are skipped. When several
/// records share a service name the first one in iteration order decides
/// the version and later ones are dropped silently. A missing `version`
/// label maps to an empty version.
pub fn normalize(records: &[RawRecord], filter: &ServiceFilter) -> ServiceVersionMap {
	let mut services = ServiceVersionMap::default();
	for record in records {
		let app = record.app();
		if !filter.accepts(app) {
			continue;
		}
		if !services.insert_first(app, record.version()) {
			tracing::trace!(
				service = app,
				version = record.version(),
				"dropping duplicate instance"
			);
		}
	}
	services
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn record(app: &str, version: &str) -> RawRecord {
		RawRecord::from_labels([("app", app), ("version", version)])
	}

	#[rstest]
	#[case::api_prefix("api-foo", true)]
	#[case::svc_prefix("svc-bar", true)]
	#[case::bare_prefix("api", true)]
	#[case::unknown_prefix("web-frontend", false)]
	#[case::prefix_mid_name("my-api", false)]
	#[case::docs_site("api-docs-site", false)]
	#[case::docs_site_mid_name("svc-docs-site-proxy", true)]
	#[case::empty("", false)]
	#[case::case_sensitive("API-foo", false)]
	fn test_default_filter(#[case] app: &str, #[case] accepted: bool) {
		assert_eq!(ServiceFilter::default().accepts(app), accepted);
	}

	#[test]
	fn test_custom_filter() {
		let filter = ServiceFilter::new(["worker"], ["-canary"]);
		assert!(filter.accepts("worker-billing"));
		assert!(!filter.accepts("worker-billing-canary"));
		assert!(!filter.accepts("api-foo"));
	}

	#[test]
	fn test_empty_prefix_set_accepts_nothing() {
		let filter = ServiceFilter::new(Vec::<String>::new(), ["docs-site"]);
		assert!(!filter.accepts("api-foo"));
	}

	#[test]
	fn test_normalize_filters_and_keeps_versions() {
		let records = vec![
			record("api-foo", "1.2.3"),
			record("svc-bar", "2.0.0"),
			record("redis", "7.0.0"),
			record("api-docs-site", "0.1.0"),
			RawRecord::from_labels([("version", "9.9.9")]),
		];

		let services = normalize(&records, &ServiceFilter::default());

		assert_eq!(services.len(), 2);
		assert_eq!(services.get("api-foo"), Some("1.2.3"));
		assert_eq!(services.get("svc-bar"), Some("2.0.0"));
		assert!(!services.contains("redis"));
		assert!(!services.contains("api-docs-site"));
		assert!(!services.contains(""));
	}

	#[test]
	fn test_normalize_first_seen_wins() {
		let records = vec![
			record("api-foo", "1.2.3"),
			record("api-foo", "1.2.4"),
			record("api-foo", "0.0.1"),
		];

		let services = normalize(&records, &ServiceFilter::default());

		assert_eq!(services.len(), 1);
		assert_eq!(services.get("api-foo"), Some("1.2.3"));
	}

	#[test]
	fn test_normalize_filtered_duplicate_does_not_shadow() {
		// A rejected record must not claim the name before an accepted one.
		let filter = ServiceFilter::new(["api"], ["-old"]);
		let records = vec![record("api-foo-old", "0.1.0"), record("api-foo", "1.0.0")];

		let services = normalize(&records, &filter);

		assert_eq!(services.get("api-foo"), Some("1.0.0"));
		assert_eq!(services.len(), 1);
	}

	#[test]
	fn test_normalize_missing_version_is_empty() {
		let records = vec![RawRecord::from_labels([("app", "svc-bar")])];

		let services = normalize(&records, &ServiceFilter::default());

		assert_eq!(services.get("svc-bar"), Some(""));
	}

	#[test]
	fn test_normalize_empty_input() {
		assert!(normalize(&[], &ServiceFilter::default()).is_empty());
		assert!(normalize(&[record("redis", "7")], &ServiceFilter::default()).is_empty());
	}

	#[test]
	fn test_normalize_is_idempotent_on_its_own_output() {
		let records = vec![
			record("api-foo", "1.2.3"),
			record("svc-bar", "2.0.0"),
			record("api-foo", "1.0.0"),
			record("svc-docs-site", "1"),
		];
		let filter = ServiceFilter::default();
		let first = normalize(&records, &filter);

		let replayed: Vec<RawRecord> = first.iter().map(|(app, v)| record(app, v)).collect();
		let second = normalize(&replayed, &filter);

		assert_eq!(first, second);
	}

	#[test]
	fn test_from_iter_keeps_first() {
		let map: ServiceVersionMap = [("api-foo", "1"), ("api-foo", "2")].into_iter().collect();
		assert_eq!(map.get("api-foo"), Some("1"));
	}
}
