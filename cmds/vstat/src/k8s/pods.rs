//! Pod listing as an [`InstanceSource`].

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
	api::{Api, ListParams},
	config::Kubeconfig,
	Client,
};
use tracing::instrument;

use super::client::ClusterConnection;
use crate::source::{InstanceSource, RawRecord, SourceError, VERSION_LABEL};

/// Pods requested per list call.
const PAGE_SIZE: u32 = 500;

/// Lists pods of a kubeconfig context.
///
/// Every call connects afresh, so the two contexts of a comparison share
/// nothing but the parsed kubeconfig.
#[derive(Clone)]
pub struct ClusterSource {
	kubeconfig: Kubeconfig,
}

impl ClusterSource {
	pub fn new(kubeconfig: Kubeconfig) -> Self {
		Self { kubeconfig }
	}
}

#[async_trait]
impl InstanceSource for ClusterSource {
	#[instrument(skip(self))]
	async fn list_instances(&self, context: &str) -> Result<Vec<RawRecord>, SourceError> {
		let connection = ClusterConnection::connect(context, self.kubeconfig.clone()).await?;
		tracing::debug!(
			server_version = %connection.server_version().git_version,
			"connected to cluster"
		);
		list_pod_records(connection.client()).await
	}
}

/// List the labels of all pods carrying a `version` label, in every namespace.
#[instrument(skip_all)]
pub async fn list_pod_records(client: &Client) -> Result<Vec<RawRecord>, SourceError> {
	let pods: Api<Pod> = Api::all(client.clone());
	let mut params = ListParams::default().labels(VERSION_LABEL).limit(PAGE_SIZE);
	let mut records = Vec::new();

	loop {
		let page = pods.list(&params).await.map_err(SourceError::List)?;
		records.extend(
			page.items
				.into_iter()
				.map(|pod| RawRecord::new(pod.metadata.labels.unwrap_or_default())),
		);

		match page.metadata.continue_ {
			Some(token) if !token.is_empty() => {
				tracing::trace!(listed = records.len(), "fetching next page of pods");
				params = params.continue_token(&token);
			}
			_ => break,
		}
	}

	tracing::debug!(pods = records.len(), "listed pods");
	Ok(records)
}
