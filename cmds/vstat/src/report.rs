//! Rendering of comparison rows.
//!
//! Drift levels map to presentation-neutral hints, and hints map to terminal
//! colours. Tables are aligned with tabwriter, which skips ANSI escapes when
//! measuring cells.

use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use nu_ansi_term::{Color, Style};
use serde::Serialize;
use tabwriter::TabWriter;
use thiserror::Error;
use tracing::instrument;

use crate::{compare::DriftLevel, reconcile::ComparisonRow};

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
	#[error("writing report")]
	Write(#[from] std::io::Error),

	#[error("serializing report")]
	Json(#[from] serde_json::Error),
}

/// How a row should stand out, independent of any terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayHint {
	Neutral,
	Success,
	Warning,
	Danger,
}

impl DisplayHint {
	pub fn color(self) -> Color {
		match self {
			DisplayHint::Neutral => Color::Blue,
			DisplayHint::Success => Color::Green,
			DisplayHint::Warning => Color::Yellow,
			DisplayHint::Danger => Color::Red,
		}
	}
}

impl From<DriftLevel> for DisplayHint {
	fn from(drift: DriftLevel) -> Self {
		match drift {
			DriftLevel::Unknown => DisplayHint::Neutral,
			DriftLevel::Match => DisplayHint::Success,
			DriftLevel::MinorDrift => DisplayHint::Warning,
			DriftLevel::MajorDrift => DisplayHint::Danger,
		}
	}
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
	/// Colorize when stdout is a terminal.
	#[default]
	Auto,

	/// Always colorize.
	Always,

	/// Never colorize.
	Never,
}

impl ColorMode {
	pub fn should_colorize(self) -> bool {
		match self {
			ColorMode::Auto => std::io::stdout().is_terminal(),
			ColorMode::Always => true,
			ColorMode::Never => false,
		}
	}
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
	/// Aligned, optionally colored table.
	#[default]
	Table,

	/// JSON document with both context names and all rows.
	Json,
}

/// Shown in place of a version the source does not report.
const ABSENT: &str = "-";

#[derive(Serialize)]
struct JsonReport<'a> {
	left: &'a str,
	right: &'a str,
	rows: &'a [ComparisonRow],
}

/// Writes comparison reports.
pub struct ReportWriter<W: Write> {
	writer: W,
	use_color: bool,
}

impl<W: Write> ReportWriter<W> {
	pub fn new(writer: W, color_mode: ColorMode) -> Self {
		Self {
			writer,
			use_color: color_mode.should_colorize(),
		}
	}

	/// Write the rows in `format`.
	pub fn write(
		&mut self,
		format: OutputFormat,
		left: &str,
		right: &str,
		rows: &[ComparisonRow],
	) -> Result<(), ReportError> {
		match format {
			OutputFormat::Table => self.write_table(left, right, rows),
			OutputFormat::Json => self.write_json(left, right, rows),
		}
	}

	/// Write a `Service | <left> | <right>` table, versions colored by drift.
	#[instrument(skip_all, fields(rows = rows.len()))]
	pub fn write_table(
		&mut self,
		left: &str,
		right: &str,
		rows: &[ComparisonRow],
	) -> Result<(), ReportError> {
		let mut table = TabWriter::new(&mut self.writer).ansi(self.use_color);

		writeln!(table, "Service\t{}\t{}", left, right)?;

		for row in rows {
			let left_version = if row.in_left { row.left_version.as_str() } else { ABSENT };
			let right_version = if row.in_right { row.right_version.as_str() } else { ABSENT };

			if self.use_color {
				let style = Style::new().fg(DisplayHint::from(row.drift).color());
				writeln!(
					table,
					"{}\t{}\t{}",
					row.service,
					style.paint(left_version),
					style.paint(right_version)
				)?;
			} else {
				writeln!(table, "{}\t{}\t{}", row.service, left_version, right_version)?;
			}
		}

		table.flush()?;
		Ok(())
	}

	/// Write the rows as a pretty-printed JSON document.
	pub fn write_json(
		&mut self,
		left: &str,
		right: &str,
		rows: &[ComparisonRow],
	) -> Result<(), ReportError> {
		serde_json::to_writer_pretty(&mut self.writer, &JsonReport { left, right, rows })?;
		writeln!(self.writer)?;
		self.writer.flush()?;
		Ok(())
	}
}
