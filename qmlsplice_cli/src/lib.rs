use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Inline reusable QML components into the documents that use them.",
	long_about = "qmlsplice replaces every `@Component { ... }` invocation in a QML document \
	              with the body of the component file. Property lines inside the invocation \
	              block override the component's own declarations for that site \
	              only.\n\nQuick start:\n  qmlsplice merge main.qml Button.qml\n  qmlsplice \
	              init\n  qmlsplice run"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct SpliceCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory. Relative paths in commands and in
	/// `qmlsplice.toml` resolve against it.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output and debug logging.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Only print errors.
	#[arg(long, short, global = true, default_value_t = false, conflicts_with = "verbose")]
	pub quiet: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Splice one component into one document.
	///
	/// Every `@Name {` invocation in the document is replaced by the component
	/// body, with redefinitions from the invocation block merged in. The
	/// document is rewritten in place unless `--output` is given, in which
	/// case the document is left untouched and the result is written to the
	/// output path instead.
	Merge {
		/// The QML document holding `@Name { ... }` invocations.
		document: PathBuf,

		/// The component source file.
		component: PathBuf,

		/// Component name used in invocation markers. Defaults to the
		/// component file stem.
		#[arg(long, short)]
		name: Option<String>,

		/// Write the merged document here instead of rewriting the document.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Print the merged document instead of writing it.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// With `--dry-run`, show a unified diff against the current document
		/// instead of the full merged text.
		#[arg(long, default_value_t = false, requires = "dry_run")]
		diff: bool,
	},
	/// Run every merge job listed in `qmlsplice.toml`, in order.
	///
	/// Jobs that write to the same output chain: later jobs merge into the
	/// output produced by earlier ones. A failed job is reported and the run
	/// moves on unless `--fail-fast` (or `fail_fast` in the config) is set.
	/// Exits with status 1 when any job failed.
	Run {
		/// Compute every merge without writing files and print the results.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// With `--dry-run`, show unified diffs instead of full documents.
		#[arg(long, default_value_t = false, requires = "dry_run")]
		diff: bool,

		/// Output format for the run summary.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Stop at the first failed job.
		#[arg(long, default_value_t = false)]
		fail_fast: bool,
	},
	/// List the merge jobs configured in `qmlsplice.toml`.
	List {
		/// Output format for the job list.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Create a sample `qmlsplice.toml` in the project root.
	///
	/// Does nothing if a config file already exists.
	Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
