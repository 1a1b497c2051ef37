//! Kubernetes access for listing workload instances.
//!
//! This module provides native Kubernetes API access using kube-rs,
//! avoiding the need to shell out to kubectl.

pub mod client;
pub mod pods;
