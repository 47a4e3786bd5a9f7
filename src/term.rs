//! External term representation handed over by the template grammar
//!
//! The grammar and tokenizer live in a separate collaborator. What this crate
//! consumes is the collaborator's already-materialized output: a [`Term`]
//! graph in which every AST node appears as a raw discriminant tag plus
//! positionally ordered fields. The core never mutates a term and never
//! retains one past a construction call; it copies what it needs into owned
//! [`Node`](crate::Node) storage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One opaque structured value produced by the external parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A single AST node: raw wire discriminant plus positional fields
    ///
    /// The tag stays a raw `u8` so out-of-range discriminants coming from a
    /// misbehaving collaborator are representable and can be diagnosed.
    Node { tag: u8, fields: Vec<Term> },
    /// Raw string bytes from the template source
    Str(String),
    Bool(bool),
    /// Ordered list of terms, possibly empty
    List(Vec<Term>),
    /// Fixed-shape aggregate, e.g. a (name, default) macro parameter pair
    Tuple(Vec<Term>),
    /// Optional field: absent, or a present wrapped value
    Opt(Option<Box<Term>>),
    /// Polymorphic variant: string tag selecting the payload's meaning
    Variant { tag: String, payload: Box<Term> },
}

impl Term {
    /// A node term for the given kind
    pub fn node(tag: impl Into<u8>, fields: Vec<Term>) -> Self {
        Term::Node {
            tag: tag.into(),
            fields,
        }
    }

    /// An owned string term
    pub fn str(s: impl Into<String>) -> Self {
        Term::Str(s.into())
    }

    /// A list term
    pub fn list(items: impl IntoIterator<Item = Term>) -> Self {
        Term::List(items.into_iter().collect())
    }

    /// A fixed-shape aggregate term
    pub fn tuple(items: impl IntoIterator<Item = Term>) -> Self {
        Term::Tuple(items.into_iter().collect())
    }

    /// A present optional field
    pub fn some(term: Term) -> Self {
        Term::Opt(Some(Box::new(term)))
    }

    /// An absent optional field
    pub fn none() -> Self {
        Term::Opt(None)
    }

    /// A polymorphic-variant term
    pub fn variant(tag: impl Into<String>, payload: Term) -> Self {
        Term::Variant {
            tag: tag.into(),
            payload: Box::new(payload),
        }
    }

    /// Short shape name for diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            Term::Node { .. } => "node",
            Term::Str(_) => "string",
            Term::Bool(_) => "bool",
            Term::List(_) => "list",
            Term::Tuple(_) => "tuple",
            Term::Opt(_) => "option",
            Term::Variant { .. } => "variant",
        }
    }
}

/// Errors reported by the external parser collaborator
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read template {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("template syntax error in {path}: {message}")]
    Syntax { path: PathBuf, message: String },
}

/// The narrow interface to the external grammar collaborator
///
/// Implementations parse a template file (optionally through their own
/// cache) down to the top-level block body as a [`Term::List`] of node
/// terms, with every include already flattened.
pub trait TemplateSource {
    fn parse_path(&self, cached: bool, path: &Path) -> Result<Term, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_constructors_build_expected_shapes() {
        let term = Term::node(
            NodeKind::Var,
            vec![Term::str("x"), Term::list(vec![Term::str("sub")])],
        );
        match term {
            Term::Node { tag, fields } => {
                assert_eq!(tag, NodeKind::Var.tag());
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0], Term::Str("x".to_string()));
            }
            other => panic!("expected node term, got {}", other.shape()),
        }

        assert_eq!(Term::none(), Term::Opt(None));
        assert_eq!(
            Term::some(Term::str("v")),
            Term::Opt(Some(Box::new(Term::Str("v".to_string()))))
        );
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(Term::str("a").shape(), "string");
        assert_eq!(Term::list(vec![]).shape(), "list");
        assert_eq!(Term::tuple(vec![]).shape(), "tuple");
        assert_eq!(Term::variant("File", Term::str("p")).shape(), "variant");
        assert_eq!(Term::Bool(true).shape(), "bool");
    }
}
