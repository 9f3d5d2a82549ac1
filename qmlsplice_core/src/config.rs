use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::SpliceError;
use crate::SpliceResult;
use crate::patterns::validate_component_name;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"qmlsplice.toml",
	".qmlsplice.toml",
	".config/qmlsplice.toml",
];

/// Configuration loaded from a `qmlsplice.toml` file.
///
/// ```toml
/// fail_fast = false
///
/// [[merge]]
/// document = "main.original.qml"
/// component = "Button.qml"
/// output = "main.qml"
///
/// [[merge]]
/// document = "ResponsiveHelper.qml"
/// component = "components/Button.qml"
/// name = "Button"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpliceConfig {
	/// Stop at the first failed merge instead of running the remaining jobs.
	#[serde(default)]
	pub fail_fast: bool,
	/// Merge jobs, run in the order they are listed.
	#[serde(default, rename = "merge")]
	pub merges: Vec<MergeJob>,
}

impl SpliceConfig {
	/// Return the first config file found at `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> SpliceResult<Option<SpliceConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	/// Parse and validate config text.
	pub fn parse(content: &str) -> SpliceResult<SpliceConfig> {
		let config: SpliceConfig =
			toml::from_str(content).map_err(|e| SpliceError::ConfigParse(e.to_string()))?;

		for job in &config.merges {
			if let Some(name) = &job.name {
				validate_component_name(name)?;
			}
		}

		Ok(config)
	}
}

/// One `(document, component, name)` merge, optionally staged into `output`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MergeJob {
	/// The document holding `@Name { ... }` invocations.
	pub document: PathBuf,
	/// The component source file.
	pub component: PathBuf,
	/// Component name used in invocation markers. Defaults to the component
	/// file stem.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Write the merged document here instead of rewriting `document`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub output: Option<PathBuf>,
}

impl MergeJob {
	pub fn new(document: impl Into<PathBuf>, component: impl Into<PathBuf>) -> Self {
		Self {
			document: document.into(),
			component: component.into(),
			name: None,
			output: None,
		}
	}

	#[must_use]
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	#[must_use]
	pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
		self.output = Some(output.into());
		self
	}

	/// The component name: the explicit `name`, or the component file stem.
	pub fn component_name(&self) -> SpliceResult<String> {
		let name = match &self.name {
			Some(name) => name.clone(),
			None => {
				self.component
					.file_stem()
					.map(|stem| stem.to_string_lossy().into_owned())
					.unwrap_or_default()
			}
		};
		validate_component_name(&name)?;

		Ok(name)
	}

	/// The file the merged document ends up in.
	pub fn target(&self) -> &Path {
		self.output.as_deref().unwrap_or(&self.document)
	}

	/// Whether the merge is written to a separate output file.
	pub fn is_staged(&self) -> bool {
		self.output
			.as_deref()
			.is_some_and(|output| output != self.document)
	}

	/// Resolve relative paths against `root`.
	#[must_use]
	pub fn resolved(&self, root: &Path) -> Self {
		Self {
			document: root.join(&self.document),
			component: root.join(&self.component),
			name: self.name.clone(),
			output: self.output.as_ref().map(|output| root.join(output)),
		}
	}
}
