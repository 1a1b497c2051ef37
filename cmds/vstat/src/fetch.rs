//! Concurrent fetch of both sources.
//!
//! Each source is listed and normalized on its own task. Results are tagged
//! with the slot and context they belong to, so completion order never
//! matters. The first failure wins: the remaining task is aborted when the
//! join set is dropped, and there is no channel it could block on.

use std::{collections::HashMap, fmt, sync::Arc};

use thiserror::Error;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{instrument, Instrument};

use crate::{
	normalize::{normalize, ServiceFilter, ServiceVersionMap},
	source::{InstanceSource, SourceError},
};

/// A source bound to the context it is asked about.
#[derive(Clone)]
pub struct NamedSource {
	context: String,
	source: Arc<dyn InstanceSource>,
}

impl fmt::Debug for NamedSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NamedSource")
			.field("context", &self.context)
			.finish_non_exhaustive()
	}
}

impl NamedSource {
	pub fn new(context: impl Into<String>, source: Arc<dyn InstanceSource>) -> Self {
		Self {
			context: context.into(),
			source,
		}
	}

	pub fn context(&self) -> &str {
		&self.context
	}
}

/// The two sides of a comparison.
#[derive(Debug, Clone)]
pub struct SourcePair {
	pub left: NamedSource,
	pub right: NamedSource,
}

impl SourcePair {
	pub fn new(left: NamedSource, right: NamedSource) -> Self {
		Self { left, right }
	}
}

/// Normalized services of one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResult {
	pub context: String,
	pub services: ServiceVersionMap,
}

/// Results for both sides, in the slots they were requested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPair {
	pub left: SourceResult,
	pub right: SourceResult,
}

/// Errors that abort a fetch.
#[derive(Debug, Error)]
pub enum FetchError {
	#[error("could not list instances for context '{context}'")]
	SourceUnavailable {
		context: String,
		#[source]
		source: SourceError,
	},

	#[error("fetch task for context '{context}' failed")]
	TaskPanicked {
		context: String,
		#[source]
		source: JoinError,
	},
}

impl FetchError {
	/// Context of the source that failed.
	pub fn context(&self) -> &str {
		match self {
			FetchError::SourceUnavailable { context, .. }
			| FetchError::TaskPanicked { context, .. } => context,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
	Left,
	Right,
}

/// List and normalize both sources concurrently.
///
/// Returns as soon as either side fails; there is no result with one side
/// missing. A source that lists zero instances counts as failed.
#[instrument(skip_all, fields(left = %pair.left.context, right = %pair.right.context))]
pub async fn fetch_pair(
	pair: SourcePair,
	filter: &ServiceFilter,
) -> Result<FetchedPair, FetchError> {
	let mut join_set = JoinSet::new();
	let mut contexts: HashMap<Id, String> = HashMap::with_capacity(2);

	for (slot, named) in [(Slot::Left, pair.left), (Slot::Right, pair.right)] {
		let context = named.context.clone();
		let filter = filter.clone();
		let span = tracing::debug_span!("fetch_source", context = %context);

		let handle = join_set.spawn(
			async move { (slot, fetch_source(&named, &filter).await) }.instrument(span),
		);
		contexts.insert(handle.id(), context);
	}

	let mut left = None;
	let mut right = None;

	while let Some(joined) = join_set.join_next().await {
		let (slot, result) = joined.map_err(|e| FetchError::TaskPanicked {
			context: contexts.get(&e.id()).cloned().unwrap_or_default(),
			source: e,
		})?;

		let result = result.inspect_err(|e| {
			tracing::debug!(context = e.context(), "fetch failed, abandoning sibling");
		})?;
		match slot {
			Slot::Left => left = Some(result),
			Slot::Right => right = Some(result),
		}
	}

	match (left, right) {
		(Some(left), Some(right)) => Ok(FetchedPair { left, right }),
		_ => unreachable!("the join set yields one result per spawned slot"),
	}
}

async fn fetch_source(
	named: &NamedSource,
	filter: &ServiceFilter,
) -> Result<SourceResult, FetchError> {
	let unavailable = |source| FetchError::SourceUnavailable {
		context: named.context.clone(),
		source,
	};

	let records = named
		.source
		.list_instances(&named.context)
		.await
		.map_err(unavailable)?;

	if records.is_empty() {
		return Err(unavailable(SourceError::NoInstances));
	}

	let services = normalize(&records, filter);
	tracing::debug!(
		instances = records.len(),
		services = services.len(),
		"normalized instances"
	);

	Ok(SourceResult {
		context: named.context.clone(),
		services,
	})
}
