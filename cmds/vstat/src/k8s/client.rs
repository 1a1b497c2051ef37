//! Kubernetes cluster connection management.

use std::{path::Path, time::Duration};

use k8s_openapi::apimachinery::pkg::version::Info;
use kube::{
	config::{KubeConfigOptions, Kubeconfig, KubeconfigError},
	Client, Config,
};
use thiserror::Error;
use tracing::instrument;

/// Default timeout for Kubernetes API requests.
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when connecting to a Kubernetes cluster.
#[derive(Debug, Error)]
pub enum ConnectionError {
	#[error("no context named `{0}` was found. Please check your kubeconfig")]
	ContextNotFound(String),

	#[error(transparent)]
	Kubeconfig(#[from] KubeconfigError),

	#[error(transparent)]
	Kube(#[from] kube::Error),
}

/// Load a kubeconfig from `path`, or from the default locations
/// (`$KUBECONFIG`, then `~/.kube/config`) when no path is given.
pub fn load_kubeconfig(path: Option<&Path>) -> Result<Kubeconfig, ConnectionError> {
	let kubeconfig = match path {
		Some(path) => Kubeconfig::read_from(path)?,
		None => Kubeconfig::read()?,
	};
	Ok(kubeconfig)
}

/// Represents a connection to one kubeconfig context.
#[derive(Clone)]
pub struct ClusterConnection {
	client: Client,
	server_version: Info,
}

impl std::fmt::Debug for ClusterConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClusterConnection")
			.field("server_version", &self.server_version)
			.finish_non_exhaustive()
	}
}

impl ClusterConnection {
	/// Connect to the cluster behind `context` in `kubeconfig`.
	///
	/// The context must exist in the kubeconfig; the current context is never
	/// used as a fallback.
	#[instrument(skip(kubeconfig))]
	pub async fn connect(context: &str, kubeconfig: Kubeconfig) -> Result<Self, ConnectionError> {
		if !kubeconfig.contexts.iter().any(|c| c.name == context) {
			return Err(ConnectionError::ContextNotFound(context.to_string()));
		}

		let mut config = Config::from_custom_kubeconfig(
			kubeconfig,
			&KubeConfigOptions {
				context: Some(context.to_string()),
				..Default::default()
			},
		)
		.await?;

		config.read_timeout = Some(DEFAULT_API_TIMEOUT);
		let client = Client::try_from(config)?;

		let server_version = client.apiserver_version().await?;

		Ok(Self {
			client,
			server_version,
		})
	}

	/// Get a reference to the underlying kube client.
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// Get the server version.
	pub fn server_version(&self) -> &Info {
		&self.server_version
	}
}
