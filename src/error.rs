//! Error types for AST construction

use thiserror::Error;

/// Errors that can occur while building an AST from external terms
///
/// Every failure is fatal to the current construction call: there is no
/// partial tree, no local recovery, and nothing for the caller to release.
/// Wrapper variants ([`BuildError::Child`], [`BuildError::At`]) carry the
/// trail from the failing term back to the top-level call.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Tag outside the registered dispatch table
    #[error("unknown node kind: tag {tag} is out of range")]
    UnknownKind { tag: u8 },

    /// Known tag with deliberately no builder registered
    ///
    /// Only the Pack kind maps here. Pack terms stand for already-flattened
    /// include groups; seeing one during construction means the upstream
    /// parser violated its flattening contract.
    #[error(
        "node kind {name} is reserved for flattened includes and must never \
         reach construction; the upstream parser failed to flatten"
    )]
    ReservedKind { name: &'static str },

    /// Kind whose field layout is not settled upstream
    #[error("node kind {name} is not supported yet")]
    UnsupportedKind { name: &'static str },

    /// Include payload tag other than "File" or "Raw"
    #[error("unknown include kind: {tag:?} (expected \"File\" or \"Raw\")")]
    UnknownIncludeKind { tag: String },

    /// Nesting deeper than the configured limit
    #[error("template nesting exceeds the configured depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// Term shape does not match the kind's positional field layout
    #[error("malformed {kind} term: field {field} is not {expected}")]
    Malformed {
        kind: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    /// A recursive child build failed inside a node builder
    #[error("while building {kind} field {field}: {source}")]
    Child {
        kind: &'static str,
        field: &'static str,
        #[source]
        source: Box<BuildError>,
    },

    /// A tree element failed to build
    #[error("at tree index {index}: {source}")]
    At {
        index: usize,
        #[source]
        source: Box<BuildError>,
    },
}

impl BuildError {
    /// Wrap a child failure with the enclosing kind and field name
    pub(crate) fn child(kind: &'static str, field: &'static str, source: BuildError) -> Self {
        BuildError::Child {
            kind,
            field,
            source: Box::new(source),
        }
    }

    /// Wrap a tree element failure with its index
    pub(crate) fn at(index: usize, source: BuildError) -> Self {
        BuildError::At {
            index,
            source: Box::new(source),
        }
    }

    /// The innermost cause, unwrapping positional context
    pub fn root_cause(&self) -> &BuildError {
        match self {
            BuildError::Child { source, .. } | BuildError::At { source, .. } => {
                source.root_cause()
            }
            _ => self,
        }
    }
}
