use std::collections::HashMap;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::FailureStage;
use crate::MergeEvent;
use crate::MergeOutput;
use crate::MergeReporter;
use crate::SpliceError;
use crate::SpliceResult;
use crate::config::MergeJob;
use crate::config::SpliceConfig;
use crate::load_component;
use crate::merge_component_into_document;
use crate::merge_source;

/// Options for running a list of merge jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
	/// Compute every merge in memory and write nothing.
	pub dry_run: bool,
	/// Stop at the first failed job.
	pub fail_fast: bool,
}

impl RunOptions {
	/// Construct [`RunOptions`] from a [`SpliceConfig`]. `dry_run` is never
	/// set from config.
	pub fn from_config(config: Option<&SpliceConfig>) -> Self {
		Self {
			dry_run: false,
			fail_fast: config.is_some_and(|c| c.fail_fast),
		}
	}
}

/// The result of one merge job.
#[derive(Debug)]
pub struct JobOutcome {
	/// The job with its paths resolved against the project root.
	pub job: MergeJob,
	/// The component name used for invocation markers, when it could be
	/// determined.
	pub name: Option<String>,
	/// The merge output, or why the job was aborted.
	pub result: SpliceResult<MergeOutput>,
	/// The text the merge started from. Only recorded for dry runs.
	pub before: Option<String>,
}

impl JobOutcome {
	pub fn is_ok(&self) -> bool {
		self.result.is_ok()
	}

	/// The file the merged document was (or would be) written to.
	pub fn target(&self) -> &Path {
		self.job.target()
	}
}

/// The result of running a list of merge jobs.
#[derive(Debug, Default)]
pub struct RunSummary {
	/// One outcome per job that was attempted, in order.
	pub outcomes: Vec<JobOutcome>,
	/// Number of jobs skipped after a failure with `fail_fast` set.
	pub skipped: usize,
}

impl RunSummary {
	/// Returns true if every job succeeded and none were skipped.
	pub fn is_ok(&self) -> bool {
		self.skipped == 0 && self.outcomes.iter().all(JobOutcome::is_ok)
	}

	pub fn succeeded(&self) -> impl Iterator<Item = &JobOutcome> {
		self.outcomes.iter().filter(|outcome| outcome.is_ok())
	}

	pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
		self.outcomes.iter().filter(|outcome| !outcome.is_ok())
	}

	/// The final text of every target that was produced, in the order the
	/// targets were first written. Later jobs into the same target override
	/// earlier ones.
	pub fn final_contents(&self) -> Vec<(&Path, &str)> {
		let mut order: Vec<&Path> = Vec::new();
		let mut latest: HashMap<&Path, &str> = HashMap::new();

		for outcome in &self.outcomes {
			let Ok(output) = &outcome.result else {
				continue;
			};
			let target = outcome.target();
			if latest.insert(target, output.content.as_str()).is_none() {
				order.push(target);
			}
		}

		order
			.into_iter()
			.filter_map(|target| latest.get(target).map(|content| (target, *content)))
			.collect()
	}
}

/// Load the project config at `root` and run its jobs.
pub fn run_project(
	root: &Path,
	dry_run: bool,
	reporter: &dyn MergeReporter,
) -> SpliceResult<RunSummary> {
	let Some(config) = SpliceConfig::load(root)? else {
		return Err(SpliceError::NoConfig {
			root: root.to_path_buf(),
		});
	};
	let options = RunOptions {
		dry_run,
		..RunOptions::from_config(Some(&config))
	};

	Ok(run_jobs(root, &config.merges, &options, reporter))
}

/// Run merge jobs in order, resolving their paths against `root`.
///
/// A failed job is recorded and the run moves on to the next one unless
/// `fail_fast` is set. When a job writes to an output that an earlier job of
/// the same run already produced, it merges into that output instead of
/// starting again from its source document.
pub fn run_jobs(
	root: &Path,
	jobs: &[MergeJob],
	options: &RunOptions,
	reporter: &dyn MergeReporter,
) -> RunSummary {
	let mut summary = RunSummary::default();
	let mut produced: HashSet<PathBuf> = HashSet::new();
	let mut pending: HashMap<PathBuf, String> = HashMap::new();

	for (index, job) in jobs.iter().enumerate() {
		let job = job.resolved(root);
		let name = job.component_name();
		let outcome = match name {
			Err(error) => {
				JobOutcome {
					job,
					name: None,
					result: Err(error),
					before: None,
				}
			}
			Ok(name) if options.dry_run => {
				let (result, before) = dry_run_job(&job, &name, &pending, reporter);
				if let Ok(output) = &result {
					pending.insert(job.target().to_path_buf(), output.content.clone());
				}
				JobOutcome {
					job,
					name: Some(name),
					result,
					before,
				}
			}
			Ok(name) => {
				let chained = produced.contains(job.target());
				let result = if job.is_staged() && !chained {
					stage_job(&job, &name, reporter)
				} else {
					merge_component_into_document(job.target(), &job.component, &name, reporter)
				};
				if result.is_ok() {
					produced.insert(job.target().to_path_buf());
				}
				JobOutcome {
					job,
					name: Some(name),
					result,
					before: None,
				}
			}
		};

		let failed = !outcome.is_ok();
		summary.outcomes.push(outcome);
		if failed && options.fail_fast {
			summary.skipped = jobs.len() - index - 1;
			break;
		}
	}

	summary
}

/// Merge into a temporary copy of the source document next to the output,
/// then move the copy over the output. The source document is never touched.
fn stage_job(job: &MergeJob, name: &str, reporter: &dyn MergeReporter) -> SpliceResult<MergeOutput> {
	let output = job.target();
	let stage_error = |reason: String| {
		reporter.report(&MergeEvent::Failed {
			name,
			stage: FailureStage::Stage,
			path: output,
		});
		SpliceError::Stage {
			path: output.to_path_buf(),
			reason,
		}
	};

	let source = std::fs::read_to_string(&job.document).map_err(|source| {
		reporter.report(&MergeEvent::Failed {
			name,
			stage: FailureStage::OpenDocument,
			path: &job.document,
		});
		SpliceError::OpenDocument {
			path: job.document.clone(),
			name: name.to_string(),
			source,
		}
	})?;

	let directory = output
		.parent()
		.filter(|parent| !parent.as_os_str().is_empty())
		.unwrap_or_else(|| Path::new("."));
	let mut staged = tempfile::Builder::new()
		.prefix(".qmlsplice-")
		.tempfile_in(directory)
		.map_err(|e| stage_error(e.to_string()))?;
	staged
		.write_all(source.as_bytes())
		.and_then(|()| staged.flush())
		.map_err(|e| stage_error(e.to_string()))?;

	let merged = merge_component_into_document(staged.path(), &job.component, name, reporter)?;

	staged
		.persist(output)
		.map_err(|e| stage_error(e.error.to_string()))?;
	tracing::debug!(output = %output.display(), "staged merge persisted");

	Ok(merged)
}

/// Compute a job's merge in memory. Targets produced earlier in the run are
/// read from `pending`.
fn dry_run_job(
	job: &MergeJob,
	name: &str,
	pending: &HashMap<PathBuf, String>,
	reporter: &dyn MergeReporter,
) -> (SpliceResult<MergeOutput>, Option<String>) {
	let target = job.target();
	let source = if job.is_staged() && !pending.contains_key(target) {
		job.document.as_path()
	} else {
		target
	};
	reporter.report(&MergeEvent::Merging {
		name,
		component: &job.component,
		document: source,
	});

	let fail = |stage: FailureStage, path: &Path| {
		reporter.report(&MergeEvent::Failed { name, stage, path });
	};

	let body = match load_component(&job.component, name) {
		Ok(body) => body,
		Err(error) => {
			fail(FailureStage::LoadComponent, &job.component);
			return (Err(error), None);
		}
	};

	let before = match pending.get(target) {
		Some(text) => text.clone(),
		None => {
			match std::fs::read_to_string(source) {
				Ok(text) => text,
				Err(error) => {
					fail(FailureStage::OpenDocument, source);
					let error = SpliceError::OpenDocument {
						path: source.to_path_buf(),
						name: name.to_string(),
						source: error,
					};
					return (Err(error), None);
				}
			}
		}
	};

	let result = merge_source(&before, &body, name, reporter);
	(result, Some(before))
}
