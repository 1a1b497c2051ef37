//! Common test utilities.

use std::{
	io::{self, ErrorKind, Write},
	sync::Arc,
	time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
	k8s::client::ConnectionError,
	source::{InstanceSource, RawRecord, SourceError},
};

/// A writer that simulates a broken pipe (SIGPIPE scenario).
///
/// This writer immediately returns `ErrorKind::BrokenPipe` on any write attempt,
/// simulating what happens when stdout is connected to a process that has exited.
pub struct BrokenPipeWriter;

impl Write for BrokenPipeWriter {
	fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
		Err(io::Error::new(ErrorKind::BrokenPipe, "broken pipe"))
	}

	fn flush(&mut self) -> io::Result<()> {
		Err(io::Error::new(ErrorKind::BrokenPipe, "broken pipe"))
	}
}

/// Signals once a [`DropGuard`] handed out by it has been dropped.
#[derive(Clone, Default)]
pub struct DropFlag(Arc<Notify>);

impl DropFlag {
	pub fn guard(&self) -> DropGuard {
		DropGuard(self.0.clone())
	}

	/// Resolve once a guard has been dropped, even if that already happened.
	pub async fn wait(&self) {
		self.0.notified().await;
	}
}

pub struct DropGuard(Arc<Notify>);

impl Drop for DropGuard {
	fn drop(&mut self) {
		self.0.notify_one();
	}
}

enum Behaviour {
	Records(Vec<RawRecord>),
	Fail,
	Hang(DropFlag),
	Panic,
}

/// An in-memory source with scripted behaviour.
pub struct StaticSource {
	behaviour: Behaviour,
	delay: Option<Duration>,
}

impl StaticSource {
	fn with(behaviour: Behaviour) -> Self {
		Self {
			behaviour,
			delay: None,
		}
	}

	/// Answer with these records.
	pub fn ok(records: Vec<RawRecord>) -> Self {
		Self::with(Behaviour::Records(records))
	}

	/// Fail as if the context did not exist.
	pub fn failing() -> Self {
		Self::with(Behaviour::Fail)
	}

	/// Never answer; `flag` fires when the pending call is dropped.
	pub fn hanging(flag: DropFlag) -> Self {
		Self::with(Behaviour::Hang(flag))
	}

	pub fn panicking() -> Self {
		Self::with(Behaviour::Panic)
	}

	/// Sleep before answering.
	pub fn delayed(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}
}

#[async_trait]
impl InstanceSource for StaticSource {
	async fn list_instances(&self, context: &str) -> Result<Vec<RawRecord>, SourceError> {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}

		match &self.behaviour {
			Behaviour::Records(records) => Ok(records.clone()),
			Behaviour::Fail => Err(ConnectionError::ContextNotFound(context.to_string()).into()),
			Behaviour::Hang(flag) => {
				let _guard = flag.guard();
				std::future::pending().await
			}
			Behaviour::Panic => panic!("source for {context} exploded"),
		}
	}
}
