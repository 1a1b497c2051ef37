use anyhow::{Context, Result};
use clap::Parser;
use vstat::{
	commands::{self, compare::CompareArgs, util::BrokenPipeGuard},
	telemetry,
};

#[cfg(all(
	target_os = "linux",
	feature = "mimalloc",
	not(feature = "system-alloc")
))]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

#[derive(Parser)]
#[command(name = "vstat")]
#[command(
	about = "Compare deployed service versions between two Kubernetes contexts",
	long_about = None
)]
#[command(version = env!("VSTAT_VERSION"))]
struct Cli {
	#[command(flatten)]
	compare: CompareArgs,
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("creating tokio runtime")?;

	// The OTLP exporter spawns onto the ambient runtime.
	let _enter = runtime.enter();
	let _telemetry = telemetry::init(cli.compare.log_level)?;

	let stdout = BrokenPipeGuard::new(std::io::stdout());
	runtime.block_on(commands::compare::run(cli.compare, stdout))
}
