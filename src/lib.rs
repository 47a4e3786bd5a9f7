//! templ-ast - AST model and builder for the GeneWeb templ template language
//!
//! This library owns the abstract syntax tree of a parsed template: an
//! ordered [`Tree`] of tagged [`Node`]s covering text, variable references,
//! translations, conditionals, bounded loops, macro definition and
//! application, `let` bindings, operators, integer literals and file
//! inclusion. The grammar itself lives in an external collaborator that
//! hands over opaque [`Term`]s; this crate validates them, copies every
//! payload into owned storage, and either returns a fully consistent tree
//! or a descriptive error and nothing else.
//!
//! # Example
//!
//! ```rust
//! use templ_ast::{build_tree, NodeKind, Term};
//!
//! // One text statement followed by a variable reference.
//! let body = Term::list(vec![
//!     Term::node(NodeKind::Text, vec![Term::str("Hello ")]),
//!     Term::node(
//!         NodeKind::Var,
//!         vec![Term::str("first_name"), Term::list(vec![])],
//!     ),
//! ]);
//!
//! let tree = build_tree(&body).unwrap();
//! assert_eq!(tree.len(), 2);
//! assert_eq!(tree[0].kind(), NodeKind::Text);
//! ```

pub mod ast;
pub mod builder;
pub mod error;
pub mod options;
pub mod term;

pub use ast::{ApplyArg, DefineParam, Include, Node, NodeKind, Tree};
pub use builder::{build_node, build_node_with, build_tree, build_tree_with, name_of};
pub use error::BuildError;
pub use options::{BuildOptions, OptionsError};
pub use term::{SourceError, TemplateSource, Term};

use std::path::Path;

use thiserror::Error;

/// Errors that can occur during the load pipeline
#[derive(Debug, Error)]
pub enum TemplError {
    /// The external parser could not produce terms for the file
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The terms did not build into a valid tree
    #[error("build error: {0}")]
    Build(#[from] BuildError),
}

/// Parse a template file and build its AST, with default limits
///
/// This is the main entry point for consumers that hold a
/// [`TemplateSource`]: the collaborator parses the file (through its cache
/// when `cached` is set) down to a term list, and the builder turns that
/// list into an owned [`Tree`].
pub fn load_tree(
    source: &impl TemplateSource,
    cached: bool,
    path: &Path,
) -> Result<Tree, TemplError> {
    load_tree_with(source, cached, path, &BuildOptions::default())
}

/// Parse a template file and build its AST with explicit limits
pub fn load_tree_with(
    source: &impl TemplateSource,
    cached: bool,
    path: &Path,
    options: &BuildOptions,
) -> Result<Tree, TemplError> {
    let term = source.parse_path(cached, path)?;
    let tree = build_tree_with(&term, options)?;
    Ok(tree)
}
