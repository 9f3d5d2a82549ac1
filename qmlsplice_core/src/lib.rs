//! `qmlsplice_core` inlines reusable QML components into the documents that
//! invoke them. A document marks each use site with `@ComponentName { ... }`;
//! the lines inside the braces redefine properties of the component for that
//! site only.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Component file
//!   → Loader (drops import and blank lines into a ComponentBody)
//! Document
//!   → Scanner (pass-through until a `@Name {` marker, then captures the block by brace count)
//!   → Reconciler (merges depth-1 declarations with call-site redefinitions)
//!   → Splicer (header + merged component + leftover redefinitions + closing line)
//!   → Document rewritten in full
//! ```
//!
//! ## Modules
//!
//! - [`patterns`]: The line recognizers: import lines, blank lines, invocation markers, property lines and depth-1 declarations.
//! - [`config`]: Configuration loading from `qmlsplice.toml`: the ordered list of merge jobs.
//! - [`project`]: Running merge jobs in order, with staged outputs and dry runs.
//!
//! ## Key Types
//!
//! - [`ComponentBody`]: A trimmed component, ready to merge.
//! - [`Reconciliation`]: The merged content for one invocation site.
//! - [`MergeOutput`]: A rewritten document with a summary of every spliced site.
//! - [`MergeReporter`]: The sink receiving progress and diagnostics; [`TracingReporter`] logs through `tracing`.
//! - [`SpliceError`]: Everything that aborts a merge.
//!
//! ## Quick Start
//!
//! ```rust
//! use qmlsplice_core::ComponentBody;
//! use qmlsplice_core::SilentReporter;
//! use qmlsplice_core::merge_source;
//!
//! let button = ComponentBody::from_source(
//! 	"import QtQuick 2.0\n\nRectangle {\n    property int size: 10\n    color: \"blue\"\n}\n",
//! );
//! let document = "Item {\n    @Button {\n        size: 20\n    }\n}\n";
//!
//! let output = merge_source(document, &button, "Button", &SilentReporter).unwrap();
//! assert!(output.content.contains("        property int size: 20\n"));
//! assert!(!output.content.contains("Redefinitions"));
//! ```

pub use component::*;
pub use engine::*;
pub use error::*;
pub use reconcile::*;
pub use reporter::*;

mod component;
pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
pub mod patterns;
pub mod project;
mod reconcile;
mod reporter;

#[cfg(test)]
mod __fixtures;
