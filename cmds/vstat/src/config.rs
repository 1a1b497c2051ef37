//! Configuration file support for vstat
//!
//! Supports `.vstat.yaml` files that can be placed anywhere in the directory
//! hierarchy. vstat searches from the current directory upward to the filesystem root.

use std::{
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::normalize::{ServiceFilter, DEFAULT_EXCLUDED_SUFFIXES, DEFAULT_PREFIXES};

/// The name of the config file vstat looks for
pub const CONFIG_FILE_NAME: &str = ".vstat.yaml";

/// Root configuration structure for .vstat.yaml
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VstatConfig {
	/// Prefixes an `app` label must start with to count as a service
	#[serde(default)]
	pub service_prefixes: Option<Vec<String>>,

	/// Suffixes that exclude an otherwise matching `app` label
	#[serde(default)]
	pub excluded_suffixes: Option<Vec<String>>,

	/// Kubeconfig to read contexts from, relative paths resolve against the config file
	#[serde(default)]
	pub kubeconfig: Option<PathBuf>,
}

impl VstatConfig {
	/// Load config by searching from the given directory upward
	pub fn load_from_directory(start_dir: &Path) -> Result<Option<Self>> {
		if let Some(config_path) = find_config_file(start_dir) {
			let config = Self::load_from_file(&config_path)?;
			Ok(Some(config))
		} else {
			Ok(None)
		}
	}

	/// Load config from a specific file path
	pub fn load_from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("failed to read config file: {}", path.display()))?;
		let mut config: VstatConfig = serde_yaml_with_quirks::from_str(&content)
			.with_context(|| format!("failed to parse config file: {}", path.display()))?;

		if let (Some(kubeconfig), Some(dir)) = (&config.kubeconfig, path.parent()) {
			if kubeconfig.is_relative() {
				config.kubeconfig = Some(dir.join(kubeconfig));
			}
		}

		tracing::debug!(path = %path.display(), "loaded config file");
		Ok(config)
	}

	/// Build the service filter, CLI values taking priority over the file,
	/// and the file over the built-in defaults.
	///
	/// Empty CLI lists mean "not given".
	pub fn service_filter(
		&self,
		cli_prefixes: &[String],
		cli_suffixes: &[String],
	) -> ServiceFilter {
		let prefixes = pick(cli_prefixes, self.service_prefixes.as_deref(), DEFAULT_PREFIXES);
		let suffixes = pick(
			cli_suffixes,
			self.excluded_suffixes.as_deref(),
			DEFAULT_EXCLUDED_SUFFIXES,
		);
		ServiceFilter::new(prefixes, suffixes)
	}

	/// Kubeconfig path, CLI value taking priority over the file.
	pub fn kubeconfig_path<'a>(&'a self, cli: Option<&'a Path>) -> Option<&'a Path> {
		cli.or(self.kubeconfig.as_deref())
	}
}

fn pick(cli: &[String], file: Option<&[String]>, default: &[&str]) -> Vec<String> {
	if !cli.is_empty() {
		return cli.to_vec();
	}
	match file {
		Some(file) => file.to_vec(),
		None => default.iter().map(|s| (*s).to_string()).collect(),
	}
}

/// Search for a config file starting from `start_dir` and walking up to the filesystem root
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
	let mut current = start_dir.to_path_buf();

	// Canonicalize if possible to handle relative paths
	if let Ok(canonical) = current.canonicalize() {
		current = canonical;
	}

	loop {
		let config_path = current.join(CONFIG_FILE_NAME);
		if config_path.is_file() {
			return Some(config_path);
		}

		match current.parent() {
			Some(parent) if parent != current => current = parent.to_path_buf(),
			_ => break,
		}
	}

	None
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use indoc::indoc;
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn test_find_config_in_current_dir() {
		let temp = TempDir::new().unwrap();
		let config_path = temp.path().join(CONFIG_FILE_NAME);
		fs::write(&config_path, "servicePrefixes: [api]").unwrap();

		let found = find_config_file(temp.path());
		// Compare file names only to avoid canonicalization issues on macOS
		assert!(found.is_some());
		assert_eq!(found.unwrap().file_name(), config_path.file_name());
	}

	#[test]
	fn test_find_config_in_parent_dir() {
		let temp = TempDir::new().unwrap();
		fs::write(temp.path().join(CONFIG_FILE_NAME), "servicePrefixes: [api]").unwrap();
		let nested = temp.path().join("a").join("b");
		fs::create_dir_all(&nested).unwrap();

		let config = VstatConfig::load_from_directory(&nested).unwrap();

		assert_eq!(
			config.and_then(|c| c.service_prefixes),
			Some(vec!["api".to_string()])
		);
	}

	#[test]
	fn test_load_full_config() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join(CONFIG_FILE_NAME);
		fs::write(
			&path,
			indoc! {"
				servicePrefixes:
				  - worker
				excludedSuffixes:
				  - -canary
				kubeconfig: kube/config
			"},
		)
		.unwrap();

		let config = VstatConfig::load_from_file(&path).unwrap();

		assert_eq!(config.service_prefixes, Some(vec!["worker".to_string()]));
		assert_eq!(config.excluded_suffixes, Some(vec!["-canary".to_string()]));
		assert_eq!(config.kubeconfig, Some(temp.path().join("kube/config")));
	}

	#[test]
	fn test_unknown_keys_are_rejected() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join(CONFIG_FILE_NAME);
		fs::write(&path, "servicePrefix: [api]\n").unwrap();

		assert_matches!(VstatConfig::load_from_file(&path), Err(_));
	}

	#[test]
	fn test_filter_precedence() {
		let config = VstatConfig {
			service_prefixes: Some(vec!["worker".to_string()]),
			..VstatConfig::default()
		};

		let from_file = config.service_filter(&[], &[]);
		assert!(from_file.accepts("worker-a"));
		assert!(!from_file.accepts("api-a"));
		assert!(!from_file.accepts("worker-docs-site"));

		let from_cli = config.service_filter(&["job".to_string()], &["-tmp".to_string()]);
		assert!(from_cli.accepts("job-a"));
		assert!(!from_cli.accepts("worker-a"));
		assert!(from_cli.accepts("job-docs-site"));

		assert_eq!(VstatConfig::default().service_filter(&[], &[]), ServiceFilter::default());
	}

	#[test]
	fn test_kubeconfig_precedence() {
		let config = VstatConfig {
			kubeconfig: Some(PathBuf::from("/from/file")),
			..VstatConfig::default()
		};

		assert_eq!(config.kubeconfig_path(None), Some(Path::new("/from/file")));
		assert_eq!(
			config.kubeconfig_path(Some(Path::new("/from/cli"))),
			Some(Path::new("/from/cli"))
		);
		assert_eq!(VstatConfig::default().kubeconfig_path(None), None);
	}
}
