//! Compare command handler.
//!
//! Fetches both contexts concurrently, reconciles their services and writes
//! the report.

use std::{
	io::{IsTerminal, Write},
	path::PathBuf,
	sync::Arc,
	time::Duration,
};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::ProgressBar;
use tracing::instrument;

use crate::{
	config::VstatConfig,
	fetch::{fetch_pair, NamedSource, SourcePair},
	fixture::FixtureSource,
	k8s::{client::load_kubeconfig, pods::ClusterSource},
	normalize::ServiceFilter,
	reconcile::{reconcile, ComparisonRow, ReconcileOptions},
	report::{ColorMode, OutputFormat, ReportWriter},
	source::InstanceSource,
};

#[derive(Args, Debug)]
pub struct CompareArgs {
	/// First kubeconfig context, shown in the left column (e.g. staging)
	pub left: String,

	/// Second kubeconfig context, shown in the right column (e.g. production)
	pub right: String,

	/// Only show services whose versions differ
	#[arg(short = 'd', long)]
	pub diffs_only: bool,

	/// Also show services that only the second context runs
	#[arg(long)]
	pub include_missing: bool,

	/// Path to the kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
	#[arg(long, value_name = "PATH")]
	pub kubeconfig: Option<PathBuf>,

	/// Read instances from <DIR>/<context>.yaml instead of querying a cluster
	#[arg(long, value_name = "DIR", conflicts_with = "kubeconfig")]
	pub fixtures: Option<PathBuf>,

	/// Service name prefix to include, repeatable (default: api, svc)
	#[arg(long = "prefix", value_name = "PREFIX", allow_hyphen_values = true)]
	pub prefixes: Vec<String>,

	/// Service name suffix to exclude, repeatable (default: docs-site)
	#[arg(long = "exclude-suffix", value_name = "SUFFIX", allow_hyphen_values = true)]
	pub excluded_suffixes: Vec<String>,

	/// Controls color in the report, must be "auto", "always", or "never"
	#[arg(long, value_enum, default_value = "auto")]
	pub color: ColorMode,

	/// Report format
	#[arg(short = 'o', long, value_enum, default_value = "table")]
	pub output: OutputFormat,

	/// Log level (possible values: error, warn, info, debug, trace)
	#[arg(long)]
	pub log_level: Option<tracing::Level>,
}

/// Options for running a comparison.
#[derive(Debug, Clone, Default)]
pub struct CompareOpts {
	pub filter: ServiceFilter,
	pub reconcile: ReconcileOptions,
	pub color: ColorMode,
	pub output: OutputFormat,
	/// Draw a spinner on stderr while fetching.
	pub show_progress: bool,
}

impl CompareOpts {
	pub fn from_args(args: &CompareArgs, config: &VstatConfig) -> Self {
		Self {
			filter: config.service_filter(&args.prefixes, &args.excluded_suffixes),
			reconcile: ReconcileOptions {
				diffs_only: args.diffs_only,
				include_right_only: args.include_missing,
			},
			color: args.color,
			output: args.output,
			show_progress: std::io::stderr().is_terminal(),
		}
	}
}

/// Run the compare command.
pub async fn run<W: Write>(args: CompareArgs, writer: W) -> Result<()> {
	let cwd = std::env::current_dir().context("resolving current directory")?;
	let config = VstatConfig::load_from_directory(&cwd)?.unwrap_or_default();

	let opts = CompareOpts::from_args(&args, &config);
	let sources = build_sources(&args, &config)?;

	compare_environments(sources, &opts, writer).await?;
	Ok(())
}

/// Pick the source for both contexts: fixture files or the cluster.
pub fn build_sources(args: &CompareArgs, config: &VstatConfig) -> Result<SourcePair> {
	let source: Arc<dyn InstanceSource> = match &args.fixtures {
		Some(dir) => Arc::new(FixtureSource::new(dir)),
		None => {
			let path = config.kubeconfig_path(args.kubeconfig.as_deref());
			let kubeconfig = load_kubeconfig(path).context("loading kubeconfig")?;
			Arc::new(ClusterSource::new(kubeconfig))
		}
	};

	Ok(SourcePair::new(
		NamedSource::new(&args.left, source.clone()),
		NamedSource::new(&args.right, source),
	))
}

/// Fetch, reconcile and report.
///
/// Returns the rows that were written. Nothing is written when either
/// source fails.
#[instrument(skip_all, fields(left = %sources.left.context(), right = %sources.right.context()))]
pub async fn compare_environments<W: Write>(
	sources: SourcePair,
	opts: &CompareOpts,
	writer: W,
) -> Result<Vec<ComparisonRow>> {
	let progress = spinner(opts.show_progress);
	let fetched = fetch_pair(sources, &opts.filter).await;
	progress.finish_and_clear();
	let fetched = fetched?;

	let rows = reconcile(&fetched.left.services, &fetched.right.services, opts.reconcile);
	tracing::info!(
		left_services = fetched.left.services.len(),
		right_services = fetched.right.services.len(),
		rows = rows.len(),
		"reconciled services"
	);

	ReportWriter::new(writer, opts.color)
		.write(opts.output, &fetched.left.context, &fetched.right.context, &rows)
		.context("writing report")?;

	Ok(rows)
}

fn spinner(enabled: bool) -> ProgressBar {
	if !enabled {
		return ProgressBar::hidden();
	}

	let bar = ProgressBar::new_spinner();
	bar.set_message("Getting pods");
	bar.enable_steady_tick(Duration::from_millis(100));
	bar
}
