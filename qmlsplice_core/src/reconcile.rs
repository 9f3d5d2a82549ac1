use std::collections::HashMap;
use std::collections::HashSet;

use crate::ComponentBody;
use crate::SpliceResult;
use crate::patterns::DeclarationPattern;
use crate::patterns::PropertyLine;
use crate::patterns::PropertyPattern;
use crate::patterns::brace_delta;

/// Comment line separating the component's own lines from the call-site lines
/// that could not be merged into a declaration.
pub const REDEFINITIONS_SEPARATOR: &str = "    //---- Redefinitions ----\n";

/// A component declaration replaced by a call-site redefinition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supersession {
	/// Index of the replaced line within the component body.
	pub component_index: usize,
	/// Index of the redefinition within the invocation block.
	pub block_index: usize,
	/// The component line as it was declared.
	pub original: String,
	/// The synthesized line written in its place.
	pub replacement: String,
}

/// The reconciled content for one invocation site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
	/// Component lines (with substitutions) followed by the separator and the
	/// leftover block lines, if any.
	pub content: String,
	pub superseded: Vec<Supersession>,
	/// Block indices of redefinitions dropped because a later line in the same
	/// block redefines the same property and was merged.
	pub overridden: Vec<usize>,
	/// Number of block lines emitted verbatim after the separator.
	pub unmatched: usize,
}

impl Reconciliation {
	pub fn has_leftovers(&self) -> bool {
		self.unmatched > 0
	}
}

/// Reconcile the lines of an invocation block against a component body.
///
/// Candidate redefinitions are the property lines at the top level of the
/// block. Lines inside a nested element of the block, and property lines that
/// open or close a brace scope, are never merged and stay verbatim. When a
/// property is redefined more than once at the top level, only the last
/// redefinition is merged; the earlier ones are dropped if it merges and left
/// in place otherwise. A redefinition merges into the first component line at
/// brace depth 1 that declares the same property. The merged line takes its
/// indentation and value from the redefinition and its declaration prefix,
/// `property <Type>` included, from the component.
///
/// The component lines are emitted up to the component's own closing brace,
/// prefixed with `indentation`, except for merged lines which already carry
/// the redefinition's indentation.
pub fn reconcile(
	component: &ComponentBody,
	block: &[&str],
	indentation: &str,
) -> SpliceResult<Reconciliation> {
	let redefinitions = top_level_redefinitions(block)?;

	let mut last_redefinition: HashMap<&str, usize> = HashMap::new();
	for (index, property) in &redefinitions {
		last_redefinition.insert(property.name, *index);
	}

	let mut superseded: Vec<Supersession> = Vec::new();
	let mut consumed_components: HashSet<usize> = HashSet::new();
	let mut consumed_block: HashSet<usize> = HashSet::new();
	let mut merged_names: HashSet<&str> = HashSet::new();

	for (block_index, property) in &redefinitions {
		if last_redefinition.get(property.name) != Some(block_index) {
			continue;
		}

		let pattern = DeclarationPattern::new(property.name)?;
		let Some((component_index, declaration)) =
			find_declaration(component, &pattern, &consumed_components)
		else {
			continue;
		};

		let replacement = format!(
			"{}{}{}\n",
			property.indentation, declaration, property.value
		);
		superseded.push(Supersession {
			component_index,
			block_index: *block_index,
			original: component[component_index].clone(),
			replacement,
		});
		consumed_components.insert(component_index);
		consumed_block.insert(*block_index);
		merged_names.insert(property.name);
	}

	let overridden: Vec<usize> = redefinitions
		.iter()
		.filter(|(index, property)| {
			merged_names.contains(property.name) && !consumed_block.contains(index)
		})
		.map(|(index, _)| *index)
		.collect();

	let replacements: HashMap<usize, &str> = superseded
		.iter()
		.map(|entry| (entry.component_index, entry.replacement.as_str()))
		.collect();

	let mut content = String::new();
	for (index, line) in component.iter().enumerate() {
		if line.starts_with('}') {
			break;
		}

		if let Some(replacement) = replacements.get(&index) {
			content.push_str(replacement);
		} else {
			content.push_str(indentation);
			content.push_str(line);
		}
	}

	let leftovers: Vec<&str> = block
		.iter()
		.enumerate()
		.filter(|(index, _)| !consumed_block.contains(index) && !overridden.contains(index))
		.map(|(_, line)| *line)
		.collect();

	if !leftovers.is_empty() {
		content.push_str(indentation);
		content.push_str(REDEFINITIONS_SEPARATOR);
		for line in &leftovers {
			content.push_str(line);
		}
	}

	Ok(Reconciliation {
		content,
		superseded,
		overridden,
		unmatched: leftovers.len(),
	})
}

/// Property lines at brace depth 0 of the block, with their block indices.
fn top_level_redefinitions<'a>(block: &[&'a str]) -> SpliceResult<Vec<(usize, PropertyLine<'a>)>> {
	let pattern = PropertyPattern::new()?;
	let mut redefinitions = Vec::new();
	let mut depth = 0;

	for (index, line) in block.iter().copied().enumerate() {
		let delta = brace_delta(line);
		if depth == 0 && delta == 0 {
			if let Some(property) = pattern.parse(line) {
				redefinitions.push((index, property));
			}
		}
		depth += delta;
	}

	Ok(redefinitions)
}

/// Find the first not-yet-consumed component line at brace depth 1 that
/// `pattern` matches. Consumed lines take no part in the depth count.
fn find_declaration<'a>(
	component: &'a ComponentBody,
	pattern: &DeclarationPattern,
	consumed: &HashSet<usize>,
) -> Option<(usize, &'a str)> {
	let mut depth = 0;

	for (index, line) in component.iter().enumerate() {
		if consumed.contains(&index) {
			continue;
		}

		depth += brace_delta(line);
		if depth != 1 {
			continue;
		}

		if let Some(declaration) = pattern.declaration(line) {
			return Some((index, declaration));
		}
	}

	None
}
