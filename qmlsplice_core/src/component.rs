use std::path::Path;

use derive_more::Deref;

use crate::SpliceError;
use crate::SpliceResult;
use crate::patterns::is_blank_line;
use crate::patterns::is_import_line;

/// A component declaration ready to be merged: the lines of its source file,
/// terminators included, with import directives and blank lines removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct ComponentBody {
	lines: Vec<String>,
}

impl ComponentBody {
	/// Build a body from already-read component source.
	pub fn from_source(source: &str) -> Self {
		let lines = source.split_inclusive('\n').map(str::to_string).collect();
		Self {
			lines: trim_component(lines),
		}
	}

	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	pub fn into_lines(self) -> Vec<String> {
		self.lines
	}
}

impl From<Vec<String>> for ComponentBody {
	fn from(lines: Vec<String>) -> Self {
		Self {
			lines: trim_component(lines),
		}
	}
}

/// Drop import directives and blank lines, keeping the rest in order.
/// Trimming an already trimmed body returns it unchanged.
pub fn trim_component(lines: Vec<String>) -> Vec<String> {
	lines
		.into_iter()
		.filter(|line| !is_import_line(line) && !is_blank_line(line))
		.collect()
}

/// Read and trim the component file at `path`. `name` is only used to label
/// the error.
pub fn load_component(path: &Path, name: &str) -> SpliceResult<ComponentBody> {
	let source = std::fs::read_to_string(path).map_err(|source| {
		SpliceError::LoadComponent {
			path: path.to_path_buf(),
			name: name.to_string(),
			source,
		}
	})?;

	Ok(ComponentBody::from_source(&source))
}
