//! HTTP-based mock Kubernetes server using wiremock.
//!
//! This provides a real HTTP server that can be used with actual kubeconfig-based
//! connections, unlike the tower mock which only works with in-process clients.

use std::{sync::Arc, time::Duration};

use bon::Builder;
use kube::config::{
	AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
};
use tracing::{debug, trace};
use wiremock::{
	matchers::{method, path, path_regex},
	Mock, MockServer, Request, ResponseTemplate,
};

use crate::pods::{matches_selector, namespace_of};

/// A mock Kubernetes server exposed over HTTP.
#[derive(Builder)]
pub struct HttpMockK8sServer {
	/// Pod manifests served by the pod list endpoints, in list order.
	#[builder(default)]
	pods: Vec<serde_json::Value>,
	/// When set, every pod list request fails with this HTTP status.
	list_failure: Option<u16>,
	/// Delay applied to every pod list response.
	list_delay: Option<Duration>,
}

/// A running HTTP mock server instance.
pub struct RunningHttpMockK8sServer {
	server: MockServer,
}

impl HttpMockK8sServer {
	/// Start the mock server with all configured pods.
	pub async fn start(self) -> RunningHttpMockK8sServer {
		let server = MockServer::start().await;

		debug!(uri = %server.uri(), pods = self.pods.len(), "Started mock K8s server");

		mount_version(&server).await;
		mount_pods(&server, Arc::new(self.pods), self.list_failure, self.list_delay).await;

		RunningHttpMockK8sServer { server }
	}
}

impl RunningHttpMockK8sServer {
	/// Get the server's URI (e.g., "http://127.0.0.1:12345").
	pub fn uri(&self) -> String {
		self.server.uri()
	}

	/// Create a Kubeconfig pointing to this mock server.
	pub fn kubeconfig(&self) -> Kubeconfig {
		self.kubeconfig_with_context("mock-context")
	}

	/// Create a Kubeconfig pointing to this mock server with a custom context name.
	///
	/// Cluster and user entries are named after the context, so kubeconfigs
	/// for several servers can be merged without collisions.
	pub fn kubeconfig_with_context(&self, context_name: &str) -> Kubeconfig {
		let (cluster, context, auth_info) = self.named_entries(context_name);

		Kubeconfig {
			clusters: vec![cluster],
			contexts: vec![context],
			auth_infos: vec![auth_info],
			current_context: Some(context_name.to_string()),
			..Default::default()
		}
	}

	fn named_entries(&self, context_name: &str) -> (NamedCluster, NamedContext, NamedAuthInfo) {
		let cluster_name = format!("{context_name}-cluster");
		let user_name = format!("{context_name}-user");

		(
			NamedCluster {
				name: cluster_name.clone(),
				cluster: Some(Cluster {
					server: Some(self.uri()),
					insecure_skip_tls_verify: Some(true),
					..Default::default()
				}),
			},
			NamedContext {
				name: context_name.to_string(),
				context: Some(Context {
					cluster: cluster_name,
					user: Some(user_name.clone()),
					namespace: Some("default".to_string()),
					..Default::default()
				}),
			},
			NamedAuthInfo {
				name: user_name,
				auth_info: Some(AuthInfo::default()),
			},
		)
	}
}

/// Build one kubeconfig with a context per `(context name, server)` pair.
///
/// The first pair becomes the current context.
pub fn merged_kubeconfig(servers: &[(&str, &RunningHttpMockK8sServer)]) -> Kubeconfig {
	let mut kubeconfig = Kubeconfig {
		current_context: servers.first().map(|(name, _)| (*name).to_string()),
		..Default::default()
	};

	for (context_name, server) in servers {
		let (cluster, context, auth_info) = server.named_entries(context_name);
		kubeconfig.clusters.push(cluster);
		kubeconfig.contexts.push(context);
		kubeconfig.auth_infos.push(auth_info);
	}

	kubeconfig
}

async fn mount_version(server: &MockServer) {
	Mock::given(method("GET"))
		.and(path("/version"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"major": "1",
			"minor": "28",
			"gitVersion": "v1.28.0",
			"gitCommit": "fake",
			"gitTreeState": "clean",
			"buildDate": "2024-01-01T00:00:00Z",
			"goVersion": "go1.21.0",
			"compiler": "gc",
			"platform": "linux/amd64"
		})))
		.mount(server)
		.await;
}

/// Mount the cluster-wide and namespaced pod list endpoints.
///
/// Lists honour `labelSelector`, `limit` and `continue`; the continue token
/// is the offset of the next page.
async fn mount_pods(
	server: &MockServer,
	pods: Arc<Vec<serde_json::Value>>,
	failure: Option<u16>,
	delay: Option<Duration>,
) {
	Mock::given(method("GET"))
		.and(path_regex(r"^/api/v1/(namespaces/[^/]+/)?pods$"))
		.respond_with(move |req: &Request| {
			let response = match failure {
				Some(code) => failure_status(code),
				None => list_pods(&pods, req),
			};

			match delay {
				Some(delay) => response.set_delay(delay),
				None => response,
			}
		})
		.mount(server)
		.await;
}

fn list_pods(pods: &[serde_json::Value], req: &Request) -> ResponseTemplate {
	let namespace = req
		.url
		.path()
		.strip_prefix("/api/v1/namespaces/")
		.and_then(|rest| rest.split('/').next());

	let mut selector = String::new();
	let mut limit = None;
	let mut offset = 0;
	for (key, value) in req.url.query_pairs() {
		match key.as_ref() {
			"labelSelector" => selector = value.into_owned(),
			"limit" => limit = value.parse::<usize>().ok().filter(|l| *l > 0),
			"continue" => offset = value.parse::<usize>().unwrap_or(0),
			_ => {}
		}
	}

	let matching: Vec<&serde_json::Value> = pods
		.iter()
		.filter(|pod| namespace.is_none_or(|ns| namespace_of(pod) == ns))
		.filter(|pod| matches_selector(pod, &selector))
		.collect();

	let end = limit.map_or(matching.len(), |l| (offset + l).min(matching.len()));
	let page: Vec<_> = matching
		.get(offset..end)
		.unwrap_or_default()
		.iter()
		.map(|pod| (*pod).clone())
		.collect();

	trace!(
		path = %req.url.path(),
		selector = %selector,
		offset,
		returned = page.len(),
		"Served pod list"
	);

	let mut metadata = serde_json::json!({ "resourceVersion": "1" });
	if end < matching.len() {
		metadata["continue"] = serde_json::Value::String(end.to_string());
	}

	ResponseTemplate::new(200).set_body_json(serde_json::json!({
		"kind": "PodList",
		"apiVersion": "v1",
		"metadata": metadata,
		"items": page
	}))
}

fn failure_status(code: u16) -> ResponseTemplate {
	ResponseTemplate::new(code).set_body_json(serde_json::json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": "Failure",
		"message": "pods is forbidden",
		"reason": "Forbidden",
		"code": code
	}))
}
