//! The boundary between the comparison core and whatever lists workload instances.
//!
//! A source is asked for the instances of one named context and answers with
//! their labels. The core neither knows nor cares whether that is a live
//! cluster, a fixture file or a test double.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::{fixture::FixtureError, k8s::client::ConnectionError};

/// Label carrying the service name.
pub const APP_LABEL: &str = "app";

/// Label carrying the deployed version.
pub const VERSION_LABEL: &str = "version";

/// One workload instance as reported by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
	labels: BTreeMap<String, String>,
}

impl RawRecord {
	pub fn new(labels: BTreeMap<String, String>) -> Self {
		Self { labels }
	}

	/// Build a record from `(key, value)` pairs.
	pub fn from_labels<I, K, V>(labels: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::new(
			labels
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}

	/// Value of `key`, empty when the label is missing.
	pub fn label(&self, key: &str) -> &str {
		self.labels.get(key).map_or("", String::as_str)
	}

	pub fn app(&self) -> &str {
		self.label(APP_LABEL)
	}

	pub fn version(&self) -> &str {
		self.label(VERSION_LABEL)
	}
}

/// Errors a source can report for a context.
#[derive(Debug, Error)]
pub enum SourceError {
	#[error("could not create k8s client")]
	Connection(#[from] ConnectionError),

	#[error("could not get pod list from Kubernetes")]
	List(#[source] kube::Error),

	#[error(transparent)]
	Fixture(#[from] FixtureError),

	#[error("no instances found")]
	NoInstances,
}

/// Anything that can list the workload instances of a named context.
#[async_trait]
pub trait InstanceSource: Send + Sync {
	async fn list_instances(&self, context: &str) -> Result<Vec<RawRecord>, SourceError>;
}
