use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SpliceError {
	#[error(transparent)]
	#[diagnostic(code(qmlsplice::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to load component `{name}` from `{}`", path.display())]
	#[diagnostic(
		code(qmlsplice::load_component),
		help("check that the component file exists and is readable")
	)]
	LoadComponent {
		path: PathBuf,
		name: String,
		source: std::io::Error,
	},

	#[error("failed to open document `{}` while merging `@{name}`", path.display())]
	#[diagnostic(
		code(qmlsplice::open_document),
		help("the document must be both readable and writable; it was left unmodified")
	)]
	OpenDocument {
		path: PathBuf,
		name: String,
		source: std::io::Error,
	},

	#[error("failed to rewrite document `{}`", path.display())]
	#[diagnostic(code(qmlsplice::write_document))]
	WriteDocument {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("invalid component name: `{0}`")]
	#[diagnostic(
		code(qmlsplice::invalid_component_name),
		help("component names are identifiers made of letters, digits, `_` and `.`")
	)]
	InvalidComponentName(String),

	#[error("invalid line pattern `{pattern}`")]
	#[diagnostic(code(qmlsplice::invalid_pattern))]
	InvalidPattern {
		pattern: String,
		source: regex::Error,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(qmlsplice::config_parse),
		help("check that qmlsplice.toml is valid TOML with one or more [[merge]] tables")
	)]
	ConfigParse(String),

	#[error("no qmlsplice.toml found in `{}`", root.display())]
	#[diagnostic(
		code(qmlsplice::no_config),
		help("run `qmlsplice init` to create one, or use `qmlsplice merge` for a single merge")
	)]
	NoConfig { root: PathBuf },

	#[error("failed to stage merge output `{}`: {reason}", path.display())]
	#[diagnostic(code(qmlsplice::stage))]
	Stage { path: PathBuf, reason: String },
}

pub type SpliceResult<T> = Result<T, SpliceError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
