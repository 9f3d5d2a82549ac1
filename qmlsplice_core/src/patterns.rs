//! Line recognizers for the three shapes the merge cares about.
//!
//! None of these parse QML. Each one looks at a single line and answers a
//! narrow question, so brace tracking and property matching can be tested on
//! their own.
//!
//! ```text
//! import-line      := "import" (WS | EOL) ...
//! blank-line       := EOL
//! invocation-line  := WS* "@" NAME " "? "{" ...
//! property-line    := WS* ("property" WS+ TYPE WS+)? IDENT WS* ":" VALUE
//! declaration-line := WS+ ("property" WS+ TYPE WS+)? NAME WS* ":" ...
//! ```

use regex::Regex;

use crate::SpliceError;
use crate::SpliceResult;

const PROPERTY_LINE: &str = r"^(\s*)(property\s+\w+\s+)?(\w+)\s*:(.*)$";

fn compile(pattern: &str) -> SpliceResult<Regex> {
	Regex::new(pattern).map_err(|source| {
		SpliceError::InvalidPattern {
			pattern: pattern.to_string(),
			source,
		}
	})
}

/// Strip a single trailing `\n`. A preceding `\r` is kept so it survives in
/// property values the way the rest of the line does.
pub fn strip_newline(line: &str) -> &str {
	line.strip_suffix('\n').unwrap_or(line)
}

/// Whether the line is an import directive: it starts with the `import` token
/// at column 0.
pub fn is_import_line(line: &str) -> bool {
	let Some(rest) = line.trim_end().strip_prefix("import") else {
		return false;
	};

	rest.chars().next().is_none_or(char::is_whitespace)
}

/// Whether the line holds nothing but its line terminator.
pub fn is_blank_line(line: &str) -> bool {
	line == "\n" || line == "\r\n"
}

/// The brace counter adjustment for a line: `+1` if it contains any `{`, `-1`
/// if it contains any `}`. Both checks apply independently, so a line holding
/// `{ ... }` nets zero.
pub fn brace_delta(line: &str) -> i32 {
	let mut delta = 0;
	if line.contains('{') {
		delta += 1;
	}
	if line.contains('}') {
		delta -= 1;
	}
	delta
}

/// Check that `name` can be used as a component name.
pub fn validate_component_name(name: &str) -> SpliceResult<()> {
	let valid = !name.is_empty()
		&& name
			.chars()
			.all(|c| c.is_alphanumeric() || c == '_' || c == '.');

	if valid {
		Ok(())
	} else {
		Err(SpliceError::InvalidComponentName(name.to_string()))
	}
}

/// Recognizer for `<indent>@<name> {` marker lines.
#[derive(Debug, Clone)]
pub struct InvocationPattern {
	name: String,
	regex: Regex,
}

impl InvocationPattern {
	pub fn new(name: &str) -> SpliceResult<Self> {
		validate_component_name(name)?;
		let regex = Regex::new(&format!(r"^(\s*)@{} ?\{{", regex::escape(name)))
			.map_err(|_| SpliceError::InvalidComponentName(name.to_string()))?;

		Ok(Self {
			name: name.to_string(),
			regex,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the leading indentation when the line opens an invocation of
	/// this component.
	pub fn indentation<'a>(&self, line: &'a str) -> Option<&'a str> {
		self.regex
			.captures(line)
			.and_then(|captures| captures.get(1))
			.map(|indent| indent.as_str())
	}
}

/// A `name: value` assignment found in an invocation block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLine<'a> {
	pub indentation: &'a str,
	/// The `property <Type> ` prefix written at the call site, if any. It is
	/// never carried into the merged declaration.
	pub type_prefix: Option<&'a str>,
	pub name: &'a str,
	/// Everything after the first colon, without the line terminator.
	pub value: &'a str,
}

/// Recognizer for `name: value` assignment lines.
#[derive(Debug, Clone)]
pub struct PropertyPattern {
	regex: Regex,
}

impl PropertyPattern {
	pub fn new() -> SpliceResult<Self> {
		Ok(Self {
			regex: compile(PROPERTY_LINE)?,
		})
	}

	/// Parse a property assignment line.
	pub fn parse<'a>(&self, line: &'a str) -> Option<PropertyLine<'a>> {
		let captures = self.regex.captures(strip_newline(line))?;

		Some(PropertyLine {
			indentation: captures.get(1).map_or("", |m| m.as_str()),
			type_prefix: captures.get(2).map(|m| m.as_str()),
			name: captures.get(3)?.as_str(),
			value: captures.get(4).map_or("", |m| m.as_str()),
		})
	}
}

/// Recognizer for an indented declaration of one property inside a component.
#[derive(Debug, Clone)]
pub struct DeclarationPattern {
	regex: Regex,
}

impl DeclarationPattern {
	pub fn new(property: &str) -> SpliceResult<Self> {
		let regex = compile(&format!(
			r"^\s+((?:property\s+\w+\s+)?{}\s*:)",
			regex::escape(property)
		))?;

		Ok(Self { regex })
	}

	/// Returns the declaration prefix, up to and including the colon, with the
	/// component's own `property <Type>` kept when present.
	pub fn declaration<'a>(&self, line: &'a str) -> Option<&'a str> {
		self.regex
			.captures(line)
			.and_then(|captures| captures.get(1))
			.map(|m| m.as_str())
	}
}
