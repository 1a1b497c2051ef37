//! Pod fixtures and the list semantics the mock server applies to them.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Build a pod manifest carrying the given labels.
pub fn pod(name: &str, namespace: &str, labels: &[(&str, &str)]) -> serde_json::Value {
	let labels: BTreeMap<String, String> = labels
		.iter()
		.map(|(k, v)| ((*k).to_string(), (*v).to_string()))
		.collect();

	let pod = Pod {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			namespace: Some(namespace.to_string()),
			labels: Some(labels),
			..ObjectMeta::default()
		},
		..Pod::default()
	};

	serde_json::to_value(&pod).expect("serializing a pod should never fail")
}

/// Namespace of a pod manifest, `default` when unset.
pub(crate) fn namespace_of(pod: &serde_json::Value) -> &str {
	pod.pointer("/metadata/namespace")
		.and_then(|v| v.as_str())
		.unwrap_or("default")
}

/// Check a pod against a label selector.
///
/// Supports the equality-based subset: `key`, `!key`, `key=value`,
/// `key==value` and `key!=value`, comma separated.
pub(crate) fn matches_selector(pod: &serde_json::Value, selector: &str) -> bool {
	let labels = pod.pointer("/metadata/labels").and_then(|l| l.as_object());
	let label = |key: &str| labels.and_then(|l| l.get(key)).and_then(|v| v.as_str());

	selector
		.split(',')
		.map(str::trim)
		.filter(|term| !term.is_empty())
		.all(|term| {
			if let Some((key, value)) = term.split_once("!=") {
				label(key.trim()) != Some(value.trim())
			} else if let Some((key, value)) = term
				.split_once("==")
				.or_else(|| term.split_once('='))
			{
				label(key.trim()) == Some(value.trim())
			} else if let Some(key) = term.strip_prefix('!') {
				label(key.trim()).is_none()
			} else {
				label(term).is_some()
			}
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pod_manifest_shape() {
		let pod = pod("api-foo-1", "apps", &[("app", "api-foo"), ("version", "1.2.3")]);
		assert_eq!(pod["metadata"]["name"], "api-foo-1");
		assert_eq!(namespace_of(&pod), "apps");
		assert_eq!(pod["metadata"]["labels"]["version"], "1.2.3");
	}

	#[test]
	fn test_selector_matching() {
		let pod = pod("p", "default", &[("app", "api-foo"), ("version", "1.2.3")]);
		assert!(matches_selector(&pod, "version"));
		assert!(matches_selector(&pod, "app=api-foo,version"));
		assert!(matches_selector(&pod, "app==api-foo"));
		assert!(matches_selector(&pod, "!tier"));
		assert!(matches_selector(&pod, ""));
		assert!(!matches_selector(&pod, "tier"));
		assert!(!matches_selector(&pod, "app!=api-foo"));
		assert!(!matches_selector(&pod, "app=svc-bar"));
	}
}
