use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use crate::ComponentBody;
use crate::FailureStage;
use crate::MergeEvent;
use crate::MergeReporter;
use crate::SpliceError;
use crate::SpliceResult;
use crate::Supersession;
use crate::load_component;
use crate::patterns::InvocationPattern;
use crate::patterns::brace_delta;
use crate::patterns::validate_component_name;
use crate::reconcile;

/// Rule written above every spliced component.
pub const SPLICE_RULE: &str = "//---------------\n";

/// What happened at one invocation site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSummary {
	/// 1-indexed line of the invocation marker in the original document.
	pub line: usize,
	/// Leading whitespace of the marker line.
	pub indentation: String,
	/// Component declarations replaced by redefinitions.
	pub superseded: Vec<Supersession>,
	/// Redefinitions dropped in favour of a later one for the same property.
	pub overridden: usize,
	/// Block lines kept verbatim after the separator.
	pub unmatched: usize,
}

/// The result of merging one component into one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutput {
	/// The reconstructed document.
	pub content: String,
	/// One entry per spliced invocation, in document order.
	pub invocations: Vec<InvocationSummary>,
	/// Marker line of an invocation still open when the document ended. Its
	/// lines are not part of `content`.
	pub unterminated: Option<usize>,
}

impl MergeOutput {
	/// Number of invocation sites that were spliced.
	pub fn spliced(&self) -> usize {
		self.invocations.len()
	}

	/// Number of component declarations replaced across all sites.
	pub fn superseded(&self) -> usize {
		self.invocations
			.iter()
			.map(|invocation| invocation.superseded.len())
			.sum()
	}
}

/// An invocation whose closing brace has not been reached yet.
#[derive(Debug)]
struct OpenInvocation<'a> {
	line: usize,
	indentation: &'a str,
	open_braces: i32,
	block: Vec<&'a str>,
}

#[derive(Debug)]
enum ScanState<'a> {
	PassThrough,
	Capturing(OpenInvocation<'a>),
}

/// Replace every `@name { ... }` invocation in `document` with the merged
/// component.
///
/// The scan copies lines through until a marker line matches, then collects
/// the invocation block while counting braces. When the count returns to zero
/// the block is reconciled against `component` and written out as a header,
/// the merged content and the closing line.
///
/// A block whose braces never balance is dropped from the output together with
/// its marker line. `MergeOutput::unterminated` records where it started.
pub fn merge_source(
	document: &str,
	component: &ComponentBody,
	name: &str,
	reporter: &dyn MergeReporter,
) -> SpliceResult<MergeOutput> {
	let pattern = InvocationPattern::new(name)?;
	let mut content = String::with_capacity(document.len() + component.len() * 32);
	let mut invocations = Vec::new();
	let mut state = ScanState::PassThrough;

	for (index, line) in document.split_inclusive('\n').enumerate() {
		state = match state {
			ScanState::PassThrough => {
				if let Some(indentation) = pattern.indentation(line) {
					tracing::trace!(name, line = index + 1, "invocation opened");
					ScanState::Capturing(OpenInvocation {
						line: index + 1,
						indentation,
						open_braces: 1,
						block: Vec::new(),
					})
				} else {
					content.push_str(line);
					ScanState::PassThrough
				}
			}
			ScanState::Capturing(mut open) => {
				open.open_braces += brace_delta(line);
				if open.open_braces > 0 {
					open.block.push(line);
					ScanState::Capturing(open)
				} else {
					let summary = splice(&mut content, component, &pattern, &open, line, reporter)?;
					invocations.push(summary);
					ScanState::PassThrough
				}
			}
		};
	}

	let unterminated = match state {
		ScanState::PassThrough => None,
		ScanState::Capturing(open) => {
			reporter.report(&MergeEvent::Unterminated {
				name,
				line: open.line,
			});
			Some(open.line)
		}
	};

	Ok(MergeOutput {
		content,
		invocations,
		unterminated,
	})
}

fn splice(
	content: &mut String,
	component: &ComponentBody,
	pattern: &InvocationPattern,
	open: &OpenInvocation<'_>,
	closing_line: &str,
	reporter: &dyn MergeReporter,
) -> SpliceResult<InvocationSummary> {
	let name = pattern.name();
	let indentation = open.indentation;
	let reconciliation = reconcile(component, &open.block, indentation)?;

	for entry in &reconciliation.superseded {
		reporter.report(&MergeEvent::Superseded {
			name,
			original: &entry.original,
			replacement: &entry.replacement,
		});
	}
	for index in &reconciliation.overridden {
		reporter.report(&MergeEvent::Overridden {
			name,
			line: open.block[*index],
		});
	}

	content.push_str(indentation);
	content.push_str(SPLICE_RULE);
	content.push_str(indentation);
	content.push_str("// @");
	content.push_str(name);
	content.push('\n');
	content.push_str(&reconciliation.content);
	content.push_str(closing_line);

	reporter.report(&MergeEvent::Spliced {
		name,
		line: open.line,
		superseded: reconciliation.superseded.len(),
		unmatched: reconciliation.unmatched,
	});

	Ok(InvocationSummary {
		line: open.line,
		indentation: indentation.to_string(),
		overridden: reconciliation.overridden.len(),
		unmatched: reconciliation.unmatched,
		superseded: reconciliation.superseded,
	})
}

/// Merge the component at `component` into the document at `document`,
/// rewriting the document in place.
///
/// The component is loaded first and the document is then opened for reading
/// and writing, so a missing component or a read-only document aborts the
/// merge before anything is written. The merged text is written to a
/// temporary file next to the document and moved over it, so a failed write
/// leaves the document as it was. Failures are reported to `reporter` and
/// returned.
#[tracing::instrument(level = "debug", skip_all, fields(name = %name, document = %document.display()))]
pub fn merge_component_into_document(
	document: &Path,
	component: &Path,
	name: &str,
	reporter: &dyn MergeReporter,
) -> SpliceResult<MergeOutput> {
	validate_component_name(name)?;
	reporter.report(&MergeEvent::Merging {
		name,
		component,
		document,
	});

	let fail = |stage: FailureStage, path: &Path| {
		reporter.report(&MergeEvent::Failed { name, stage, path });
	};

	let body = load_component(component, name)
		.inspect_err(|_| fail(FailureStage::LoadComponent, component))?;

	let open_error = |source: std::io::Error| {
		fail(FailureStage::OpenDocument, document);
		SpliceError::OpenDocument {
			path: document.to_path_buf(),
			name: name.to_string(),
			source,
		}
	};
	let mut file = OpenOptions::new()
		.read(true)
		.write(true)
		.open(document)
		.map_err(open_error)?;
	let mut original = String::new();
	file.read_to_string(&mut original).map_err(open_error)?;

	let output = merge_source(&original, &body, name, reporter)?;

	rewrite(document, file, &output.content).map_err(|source| {
		fail(FailureStage::WriteDocument, document);
		SpliceError::WriteDocument {
			path: document.to_path_buf(),
			source,
		}
	})?;
	tracing::debug!(
		spliced = output.spliced(),
		superseded = output.superseded(),
		"document rewritten"
	);

	Ok(output)
}

/// Replace the contents of `document`, keeping its permissions.
fn rewrite(document: &Path, original: File, content: &str) -> std::io::Result<()> {
	let permissions = original.metadata()?.permissions();
	drop(original);

	let directory = document
		.parent()
		.filter(|parent| !parent.as_os_str().is_empty())
		.unwrap_or_else(|| Path::new("."));
	let mut staged = tempfile::Builder::new()
		.prefix(".qmlsplice-")
		.tempfile_in(directory)?;
	staged.write_all(content.as_bytes())?;
	staged.flush()?;
	staged.as_file().set_permissions(permissions)?;
	staged.persist(document).map_err(|e| e.error)?;

	Ok(())
}
