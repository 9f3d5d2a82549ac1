use std::fmt;
use std::path::Path;

/// The step of a merge that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
	LoadComponent,
	OpenDocument,
	WriteDocument,
	Stage,
}

impl fmt::Display for FailureStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::LoadComponent => "load component",
			Self::OpenDocument => "open document",
			Self::WriteDocument => "write document",
			Self::Stage => "stage output",
		};
		f.write_str(label)
	}
}

/// Progress and diagnostics emitted while merging.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum MergeEvent<'a> {
	/// A merge of `component` into `document` is starting.
	Merging {
		name: &'a str,
		component: &'a Path,
		document: &'a Path,
	},
	/// A component declaration was replaced by a call-site redefinition.
	Superseded {
		name: &'a str,
		original: &'a str,
		replacement: &'a str,
	},
	/// An earlier redefinition of a property was dropped in favour of a later
	/// one in the same block.
	Overridden { name: &'a str, line: &'a str },
	/// An invocation was replaced by the merged component.
	Spliced {
		name: &'a str,
		/// 1-indexed line of the invocation marker.
		line: usize,
		superseded: usize,
		unmatched: usize,
	},
	/// The document ended before the invocation's braces balanced. Its lines
	/// are dropped from the output.
	Unterminated { name: &'a str, line: usize },
	/// The merge was aborted.
	Failed {
		name: &'a str,
		stage: FailureStage,
		path: &'a Path,
	},
}

impl fmt::Display for MergeEvent<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Merging {
				name,
				component,
				document,
			} => {
				write!(
					f,
					"Merging @{name} ({}) into {}",
					component.display(),
					document.display()
				)
			}
			Self::Superseded { original, .. } => {
				write!(f, "merging line {}", original.trim_end())
			}
			Self::Overridden { line, .. } => {
				write!(f, "dropping overridden redefinition {}", line.trim())
			}
			Self::Spliced {
				name,
				line,
				superseded,
				unmatched,
			} => {
				write!(
					f,
					"spliced @{name} at line {line} ({superseded} merged, {unmatched} kept)"
				)
			}
			Self::Unterminated { name, line } => {
				write!(
					f,
					"@{name} opened at line {line} is never closed; its lines were dropped"
				)
			}
			Self::Failed { stage, path, .. } => {
				write!(f, "Failed to {stage} {}", path.display())
			}
		}
	}
}

/// Receives [`MergeEvent`]s. Closures taking a `&MergeEvent` are reporters.
pub trait MergeReporter {
	fn report(&self, event: &MergeEvent<'_>);
}

impl<F> MergeReporter for F
where
	F: Fn(&MergeEvent<'_>),
{
	fn report(&self, event: &MergeEvent<'_>) {
		self(event);
	}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl MergeReporter for TracingReporter {
	fn report(&self, event: &MergeEvent<'_>) {
		match event {
			MergeEvent::Merging {
				name,
				component,
				document,
			} => {
				tracing::info!(
					name,
					component = %component.display(),
					document = %document.display(),
					"{event}"
				);
			}
			MergeEvent::Superseded {
				name, replacement, ..
			} => {
				tracing::info!(name, replacement = replacement.trim_end(), "{event}");
			}
			MergeEvent::Overridden { name, .. } => {
				tracing::info!(name, "{event}");
			}
			MergeEvent::Spliced { name, line, .. } => {
				tracing::debug!(name, line, "{event}");
			}
			MergeEvent::Unterminated { name, line } => {
				tracing::warn!(name, line, "{event}");
			}
			MergeEvent::Failed { name, stage, path } => {
				tracing::error!(name, stage = %stage, path = %path.display(), "{event}");
			}
		}
	}
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl MergeReporter for SilentReporter {
	fn report(&self, _event: &MergeEvent<'_>) {}
}
