//! Mock Kubernetes API server for testing.
//!
//! Provides an HTTP server that can be used with kubeconfig-based connections
//! and serves pod listings across namespaces.

pub mod http;
pub mod pods;

pub use http::{merged_kubeconfig, HttpMockK8sServer, RunningHttpMockK8sServer};
pub use pods::pod;
