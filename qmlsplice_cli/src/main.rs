use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use qmlsplice_cli::Commands;
use qmlsplice_cli::OutputFormat;
use qmlsplice_cli::SpliceCli;
use qmlsplice_core::MergeEvent;
use qmlsplice_core::MergeReporter;
use qmlsplice_core::SilentReporter;
use qmlsplice_core::SpliceError;
use qmlsplice_core::TracingReporter;
use qmlsplice_core::config::CONFIG_FILE_CANDIDATES;
use qmlsplice_core::config::MergeJob;
use qmlsplice_core::config::SpliceConfig;
use qmlsplice_core::project::JobOutcome;
use qmlsplice_core::project::RunOptions;
use qmlsplice_core::project::RunSummary;
use qmlsplice_core::project::run_jobs;
use serde::Serialize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "QMLSPLICE_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
	let args = SpliceCli::parse();

	// Respect NO_COLOR, --no-color and non-terminal stdout.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(&args, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Merge {
			document,
			component,
			name,
			output,
			dry_run,
			diff,
		}) => {
			let mut job = MergeJob::new(document, component);
			job.name.clone_from(name);
			job.output.clone_from(output);
			run_merge(&args, &job, *dry_run, *diff)
		}
		Some(Commands::Run {
			dry_run,
			diff,
			format,
			fail_fast,
		}) => run_run(&args, *dry_run, *diff, *format, *fail_fast),
		Some(Commands::List { format }) => run_list(&args, *format),
		Some(Commands::Init) => run_init(&args),
		None => {
			eprintln!("No subcommand specified. Run `qmlsplice --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			// Render core errors through miette for help text and error codes.
			match e.downcast::<SpliceError>() {
				Ok(splice_err) => {
					let report: miette::Report = (*splice_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

fn init_tracing(args: &SpliceCli, use_color: bool) {
	let default_directive = if args.verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.init();
}

fn resolve_root(args: &SpliceCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Prints merge progress for a person at a terminal.
struct ConsoleReporter {
	root: PathBuf,
	verbose: bool,
}

impl MergeReporter for ConsoleReporter {
	fn report(&self, event: &MergeEvent<'_>) {
		match event {
			MergeEvent::Merging {
				name,
				component,
				document,
			} => {
				println!(
					"{} @{name} ({}) into {}",
					colored!("Merging", bold),
					make_relative(component, &self.root),
					make_relative(document, &self.root)
				);
			}
			MergeEvent::Superseded { .. } | MergeEvent::Overridden { .. } => {
				println!("  {event}");
			}
			MergeEvent::Spliced { .. } => {
				if self.verbose {
					println!("  {event}");
				}
			}
			MergeEvent::Unterminated { .. } => {
				eprintln!("{} {event}", colored!("warning:", yellow));
			}
			// Failures are rendered from the returned error.
			_ => tracing::debug!("{event}"),
		}
	}
}

/// The reporter for human-readable output. JSON output keeps stdout clean
/// and routes events through `tracing` instead.
fn reporter(args: &SpliceCli, root: &Path, format: OutputFormat) -> Box<dyn MergeReporter> {
	if args.quiet {
		Box::new(SilentReporter)
	} else if format == OutputFormat::Json {
		Box::new(TracingReporter)
	} else {
		Box::new(ConsoleReporter {
			root: root.to_path_buf(),
			verbose: args.verbose,
		})
	}
}

fn run_merge(args: &SpliceCli, job: &MergeJob, dry_run: bool, show_diff: bool) -> CliResult<bool> {
	let root = resolve_root(args);
	let reporter = reporter(args, &root, OutputFormat::Text);
	let options = RunOptions {
		dry_run,
		fail_fast: true,
	};

	let summary = run_jobs(&root, std::slice::from_ref(job), &options, reporter.as_ref());
	let Some(outcome) = summary.outcomes.into_iter().next() else {
		return Ok(true);
	};
	let JobOutcome {
		job,
		name,
		result,
		before,
	} = outcome;
	let output = result?;
	let name = name.unwrap_or_default();
	let target = make_relative(job.target(), &root);

	if output.spliced() == 0 && !args.quiet {
		eprintln!(
			"{} no `@{name} {{` invocations found in {}",
			colored!("warning:", yellow),
			make_relative(&job.document, &root)
		);
	}

	if dry_run {
		let before = before.unwrap_or_default();
		if show_diff {
			print_diff(&before, &output.content);
		} else {
			print!("{}", output.content);
		}
		return Ok(true);
	}

	if !args.quiet {
		println!(
			"{} @{name} into {target} ({} site(s), {} line(s) merged)",
			colored!("Spliced", green),
			output.spliced(),
			output.superseded()
		);
	}

	Ok(true)
}

fn load_config(root: &Path) -> CliResult<SpliceConfig> {
	match SpliceConfig::load(root)? {
		Some(config) => Ok(config),
		None => {
			Err(Box::new(SpliceError::NoConfig {
				root: root.to_path_buf(),
			}))
		}
	}
}

fn run_run(
	args: &SpliceCli,
	dry_run: bool,
	show_diff: bool,
	format: OutputFormat,
	fail_fast: bool,
) -> CliResult<bool> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let options = RunOptions {
		dry_run,
		fail_fast: fail_fast || config.fail_fast,
	};
	let reporter = reporter(args, &root, format);

	if config.merges.is_empty() && format == OutputFormat::Text && !args.quiet {
		println!("No merge jobs configured.");
	}

	let summary = run_jobs(&root, &config.merges, &options, reporter.as_ref());

	match format {
		OutputFormat::Json => print_run_json(&summary, &root, dry_run)?,
		OutputFormat::Text => print_run_text(args, &summary, &root, dry_run, show_diff),
	}

	Ok(summary.is_ok())
}

fn print_run_text(
	args: &SpliceCli,
	summary: &RunSummary,
	root: &Path,
	dry_run: bool,
	show_diff: bool,
) {
	if dry_run {
		for (target, content) in summary.final_contents() {
			let rel = make_relative(target, root);
			if show_diff {
				let current = std::fs::read_to_string(target).unwrap_or_default();
				if current == content {
					println!("{rel}: unchanged");
					continue;
				}
				println!("{}", colored!(format!("--- {rel}"), bold));
				print_diff(&current, content);
			} else {
				println!("{}", colored!(format!("=== {rel}"), bold));
				print!("{content}");
			}
		}
	}

	for outcome in summary.failed() {
		if let Err(error) = &outcome.result {
			eprintln!("{} {error}", colored!("error:", red));
		}
	}

	if args.quiet {
		return;
	}

	let succeeded = summary.succeeded().count();
	let failed = summary.failed().count();
	let verb = if dry_run { "Would merge" } else { "Merged" };
	if failed == 0 {
		println!("{} {succeeded} job(s)", colored!(verb, green));
	} else {
		println!(
			"{} {succeeded} job(s), {}",
			verb,
			colored!(format!("{failed} failed"), red)
		);
	}
	if summary.skipped > 0 {
		println!(
			"{}",
			colored!(
				format!("Skipped {} job(s) after the first failure", summary.skipped),
				yellow
			)
		);
	}
}

#[derive(Serialize)]
struct RunReport<'a> {
	ok: bool,
	dry_run: bool,
	skipped: usize,
	jobs: Vec<JobReport<'a>>,
}

#[derive(Serialize)]
struct JobReport<'a> {
	document: String,
	component: String,
	name: Option<&'a str>,
	target: String,
	ok: bool,
	spliced: usize,
	superseded: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	unterminated: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	content: Option<&'a str>,
}

fn print_run_json(summary: &RunSummary, root: &Path, dry_run: bool) -> CliResult<()> {
	let jobs = summary
		.outcomes
		.iter()
		.map(|outcome| {
			let mut report = JobReport {
				document: make_relative(&outcome.job.document, root),
				component: make_relative(&outcome.job.component, root),
				name: outcome.name.as_deref(),
				target: make_relative(outcome.target(), root),
				ok: outcome.is_ok(),
				spliced: 0,
				superseded: 0,
				unterminated: None,
				error: None,
				content: None,
			};
			match &outcome.result {
				Ok(output) => {
					report.spliced = output.spliced();
					report.superseded = output.superseded();
					report.unterminated = output.unterminated;
					if dry_run {
						report.content = Some(output.content.as_str());
					}
				}
				Err(error) => report.error = Some(error.to_string()),
			}
			report
		})
		.collect();

	let report = RunReport {
		ok: summary.is_ok(),
		dry_run,
		skipped: summary.skipped,
		jobs,
	};
	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

#[derive(Serialize)]
struct ListEntry<'a> {
	name: Option<String>,
	document: &'a Path,
	component: &'a Path,
	#[serde(skip_serializing_if = "Option::is_none")]
	output: Option<&'a Path>,
}

fn run_list(args: &SpliceCli, format: OutputFormat) -> CliResult<bool> {
	let root = resolve_root(args);
	let config = load_config(&root)?;

	match format {
		OutputFormat::Json => {
			let entries: Vec<ListEntry<'_>> = config
				.merges
				.iter()
				.map(|job| {
					ListEntry {
						name: job.component_name().ok(),
						document: &job.document,
						component: &job.component,
						output: job.output.as_deref(),
					}
				})
				.collect();
			println!("{}", serde_json::to_string_pretty(&entries)?);
		}
		OutputFormat::Text => {
			if config.merges.is_empty() {
				println!("No merge jobs configured.");
				return Ok(true);
			}

			println!(
				"{}",
				colored!(format!("Merge jobs ({}):", config.merges.len()), bold)
			);
			for (index, job) in config.merges.iter().enumerate() {
				let name = job
					.component_name()
					.unwrap_or_else(|_| String::from("<invalid name>"));
				let staged = if job.is_staged() {
					format!(" (from {})", job.document.display())
				} else {
					String::new()
				};
				println!(
					"  {}. @{name} {} -> {}{staged}",
					index + 1,
					job.component.display(),
					job.target().display()
				);
			}
		}
	}

	Ok(true)
}

fn run_init(args: &SpliceCli) -> CliResult<bool> {
	let root = resolve_root(args);

	if let Some(existing) = SpliceConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(true);
	}

	let sample_config = "# qmlsplice configuration\n# Merge jobs run in order. Jobs writing to the \
	                     same output chain into it.\n\n# Stop at the first failed merge.\nfail_fast \
	                     = false\n\n[[merge]]\n# Document holding `@Button { ... }` \
	                     invocations.\ndocument = \"main.original.qml\"\ncomponent = \
	                     \"Button.qml\"\n# Defaults to the component file stem.\n# name = \
	                     \"Button\"\n# Leave `document` untouched and write the result \
	                     here.\noutput = \"main.qml\"\n";

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, sample_config)?;
	println!("Created {}", CONFIG_FILE_CANDIDATES[0]);
	println!();
	println!("Next steps:");
	println!("  1. Point the [[merge]] tables at your documents and components");
	println!("  2. Mark use sites in a document with `@Button {{ ... }}`");
	println!("  3. Run `qmlsplice run` to splice them");

	Ok(true)
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("{}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("{}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!(" {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
