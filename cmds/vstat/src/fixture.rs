//! File-backed source for offline comparisons and tests.
//!
//! A context `staging` is read from `<dir>/staging.yaml` (or `.yml`, `.json`).
//! The file holds either a Kubernetes `List` (as printed by
//! `kubectl get pods -A -o yaml`) or a bare sequence of pod-like objects;
//! only `metadata.labels` of each item is used.

use std::{
	collections::BTreeMap,
	io,
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::source::{InstanceSource, RawRecord, SourceError};

/// Extensions tried, in order, for a context's fixture file.
const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Debug, Error)]
pub enum FixtureError {
	#[error("no fixture for context '{context}' in {}", dir.display())]
	Missing { context: String, dir: PathBuf },

	#[error("reading fixture {}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("parsing fixture {}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_yaml_with_quirks::Error,
	},
}

#[derive(Deserialize)]
struct FixtureList {
	items: Vec<FixtureItem>,
}

#[derive(Deserialize)]
struct FixtureItem {
	#[serde(default)]
	metadata: FixtureMetadata,
}

#[derive(Default, Deserialize)]
struct FixtureMetadata {
	#[serde(default)]
	labels: BTreeMap<String, String>,
}

/// Reads instances of every context from files in one directory.
#[derive(Debug, Clone)]
pub struct FixtureSource {
	dir: PathBuf,
}

impl FixtureSource {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Locate the fixture file for `context`.
	pub fn path_for(&self, context: &str) -> Option<PathBuf> {
		EXTENSIONS
			.iter()
			.map(|ext| self.dir.join(format!("{context}.{ext}")))
			.find(|path| path.is_file())
	}
}

/// Parse fixture contents into records.
///
/// Label values are always read as strings, so `version: 1.0` stays `"1.0"`.
pub fn parse_fixture(path: &Path, content: &str) -> Result<Vec<RawRecord>, FixtureError> {
	let items = match serde_yaml_with_quirks::from_str::<FixtureList>(content) {
		Ok(list) => list.items,
		Err(list_err) => serde_yaml_with_quirks::from_str::<Vec<FixtureItem>>(content).map_err(
			|_| FixtureError::Parse {
				path: path.to_path_buf(),
				source: list_err,
			},
		)?,
	};

	Ok(items
		.into_iter()
		.map(|item| RawRecord::new(item.metadata.labels))
		.collect())
}

#[async_trait]
impl InstanceSource for FixtureSource {
	#[instrument(skip(self), fields(dir = %self.dir.display()))]
	async fn list_instances(&self, context: &str) -> Result<Vec<RawRecord>, SourceError> {
		let path = self.path_for(context).ok_or_else(|| FixtureError::Missing {
			context: context.to_string(),
			dir: self.dir.clone(),
		})?;

		let content = tokio::fs::read_to_string(&path)
			.await
			.map_err(|source| FixtureError::Read {
				path: path.clone(),
				source,
			})?;

		let records = parse_fixture(&path, &content)?;
		tracing::debug!(path = %path.display(), instances = records.len(), "loaded fixture");
		Ok(records)
	}
}
