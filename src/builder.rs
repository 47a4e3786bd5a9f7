//! Node and tree construction from external terms
//!
//! Construction is driven by a fixed dispatch table keyed by the wire
//! discriminant: each entry names its kind and, for constructible kinds,
//! carries the builder function. Builders extract their fields
//! by fixed position, copy strings into owned storage, and recurse through
//! [`build_node`]/[`build_tree`] for sub-nodes and sub-trees. On any failure
//! the whole call unwinds; partially built children are released by
//! ownership and the caller receives nothing.

use crate::ast::{ApplyArg, DefineParam, Include, Node, NodeKind, Tree};
use crate::error::BuildError;
use crate::options::BuildOptions;
use crate::term::Term;

type BuildFn = fn(&mut Builder<'_>, &[Term]) -> Result<Node, BuildError>;

struct Entry {
    kind: NodeKind,
    build: Option<BuildFn>,
}

/// Tag-indexed dispatch table; entry order must match the wire discriminants.
///
/// Keep the Pack builder `None`: Pack stands for an already-flattened include
/// group and must never reach construction.
static DISPATCH: [Entry; NodeKind::COUNT] = [
    Entry { kind: NodeKind::Text, build: Some(build_text) },
    Entry { kind: NodeKind::Var, build: Some(build_var) },
    Entry { kind: NodeKind::Translate, build: Some(build_translate) },
    Entry { kind: NodeKind::WidthHeight, build: Some(build_width_height) },
    Entry { kind: NodeKind::If, build: Some(build_if) },
    Entry { kind: NodeKind::Foreach, build: Some(build_foreach) },
    Entry { kind: NodeKind::For, build: Some(build_for) },
    Entry { kind: NodeKind::Define, build: Some(build_define) },
    Entry { kind: NodeKind::Apply, build: Some(build_apply) },
    Entry { kind: NodeKind::Let, build: Some(build_let) },
    Entry { kind: NodeKind::UnaryOp, build: Some(build_unary_op) },
    Entry { kind: NodeKind::BinaryOp, build: Some(build_binary_op) },
    Entry { kind: NodeKind::Int, build: Some(build_int) },
    Entry { kind: NodeKind::Include, build: Some(build_include) },
    Entry { kind: NodeKind::Pack, build: None },
];

/// Diagnostic name for a raw wire tag
///
/// Total: out-of-range tags map to `"UNKNOWN"` rather than failing.
pub fn name_of(tag: u8) -> &'static str {
    DISPATCH
        .get(tag as usize)
        .map(|entry| entry.kind.name())
        .unwrap_or("UNKNOWN")
}

/// Build one node from a node term, with default limits
pub fn build_node(term: &Term) -> Result<Node, BuildError> {
    build_node_with(term, &BuildOptions::default())
}

/// Build one node from a node term
pub fn build_node_with(term: &Term, options: &BuildOptions) -> Result<Node, BuildError> {
    Builder::new(options).node(term)
}

/// Build a whole block body from a list term, with default limits
pub fn build_tree(term: &Term) -> Result<Tree, BuildError> {
    build_tree_with(term, &BuildOptions::default())
}

/// Build a whole block body from a list term
///
/// The result has exactly one node per input list element, in list order.
/// If any element fails, everything built so far is released and the error
/// propagates with the failing element's index.
pub fn build_tree_with(term: &Term, options: &BuildOptions) -> Result<Tree, BuildError> {
    Builder::new(options).tree(term)
}

/// Recursive construction state: the options in force and the current
/// node nesting depth
struct Builder<'a> {
    options: &'a BuildOptions,
    depth: usize,
}

impl<'a> Builder<'a> {
    fn new(options: &'a BuildOptions) -> Self {
        Self { options, depth: 0 }
    }

    fn node(&mut self, term: &Term) -> Result<Node, BuildError> {
        let (tag, fields) = match term {
            Term::Node { tag, fields } => (*tag, fields.as_slice()),
            _ => {
                return Err(BuildError::Malformed {
                    kind: "Node",
                    field: "term",
                    expected: "a node term",
                })
            }
        };
        let entry = DISPATCH
            .get(tag as usize)
            .ok_or(BuildError::UnknownKind { tag })?;
        let build = entry.build.ok_or(BuildError::ReservedKind {
            name: entry.kind.name(),
        })?;
        if self.depth >= self.options.max_depth {
            return Err(BuildError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = build(self, fields);
        self.depth -= 1;
        result
    }

    fn tree(&mut self, term: &Term) -> Result<Tree, BuildError> {
        let items = match term {
            Term::List(items) => items,
            _ => {
                return Err(BuildError::Malformed {
                    kind: "Tree",
                    field: "term",
                    expected: "a list term",
                })
            }
        };
        let mut nodes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let node = self.node(item).map_err(|e| BuildError::at(index, e))?;
            nodes.push(node);
        }
        Ok(Tree::from_nodes(nodes))
    }

    fn child_node(
        &mut self,
        kind: &'static str,
        field_name: &'static str,
        term: &Term,
    ) -> Result<Node, BuildError> {
        self.node(term)
            .map_err(|e| BuildError::child(kind, field_name, e))
    }

    fn child_tree(
        &mut self,
        kind: &'static str,
        field_name: &'static str,
        term: &Term,
    ) -> Result<Tree, BuildError> {
        self.tree(term)
            .map_err(|e| BuildError::child(kind, field_name, e))
    }
}

// ------------------------------------------------------------------
// Positional field extraction
// ------------------------------------------------------------------

fn field<'t>(
    kind: &'static str,
    fields: &'t [Term],
    index: usize,
    name: &'static str,
) -> Result<&'t Term, BuildError> {
    fields.get(index).ok_or(BuildError::Malformed {
        kind,
        field: name,
        expected: "present",
    })
}

fn own_str(kind: &'static str, name: &'static str, term: &Term) -> Result<String, BuildError> {
    match term {
        Term::Str(s) => Ok(s.clone()),
        _ => Err(BuildError::Malformed {
            kind,
            field: name,
            expected: "a string term",
        }),
    }
}

fn expect_bool(kind: &'static str, name: &'static str, term: &Term) -> Result<bool, BuildError> {
    match term {
        Term::Bool(b) => Ok(*b),
        _ => Err(BuildError::Malformed {
            kind,
            field: name,
            expected: "a bool term",
        }),
    }
}

fn expect_list<'t>(
    kind: &'static str,
    name: &'static str,
    term: &'t Term,
) -> Result<&'t [Term], BuildError> {
    match term {
        Term::List(items) => Ok(items),
        _ => Err(BuildError::Malformed {
            kind,
            field: name,
            expected: "a list term",
        }),
    }
}

fn expect_tuple<'t>(
    kind: &'static str,
    name: &'static str,
    term: &'t Term,
) -> Result<&'t [Term], BuildError> {
    match term {
        Term::Tuple(items) => Ok(items),
        _ => Err(BuildError::Malformed {
            kind,
            field: name,
            expected: "a tuple term",
        }),
    }
}

fn expect_opt<'t>(
    kind: &'static str,
    name: &'static str,
    term: &'t Term,
) -> Result<Option<&'t Term>, BuildError> {
    match term {
        Term::Opt(inner) => Ok(inner.as_deref()),
        _ => Err(BuildError::Malformed {
            kind,
            field: name,
            expected: "an option term",
        }),
    }
}

// ------------------------------------------------------------------
// Per-kind builders, in tag order
// ------------------------------------------------------------------

fn build_text(_cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Text";
    let text = own_str(K, "text", field(K, fields, 0, "text")?)?;
    Ok(Node::Text(text))
}

fn build_var(_cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Var";
    let name = own_str(K, "name", field(K, fields, 0, "name")?)?;
    let items = expect_list(K, "accessors", field(K, fields, 1, "accessors")?)?;
    let mut accessors = Vec::with_capacity(items.len());
    for item in items {
        accessors.push(own_str(K, "accessor", item)?);
    }
    Ok(Node::Var { name, accessors })
}

fn build_translate(_cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Translate";
    let capitalize = expect_bool(K, "capitalize", field(K, fields, 0, "capitalize")?)?;
    // Both strings are copied verbatim; empty is a valid lexicon key/variant.
    let key = own_str(K, "key", field(K, fields, 1, "key")?)?;
    let variant = own_str(K, "variant", field(K, fields, 2, "variant")?)?;
    Ok(Node::Translate {
        capitalize,
        key,
        variant,
    })
}

fn build_width_height(_cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "WidthHeight";
    let size = own_str(K, "size", field(K, fields, 0, "size")?)?;
    Ok(Node::WidthHeight(size))
}

fn build_if(cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "If";
    // The condition is a single node; both branches are trees, and an absent
    // else-branch arrives as an empty list, never as an option.
    let cond = cx.child_node(K, "cond", field(K, fields, 0, "cond")?)?;
    let then_branch = cx.child_tree(K, "then", field(K, fields, 1, "then")?)?;
    let else_branch = cx.child_tree(K, "else", field(K, fields, 2, "else")?)?;
    Ok(Node::If {
        cond: Box::new(cond),
        then_branch,
        else_branch,
    })
}

// TODO: build Foreach once the upstream grammar settles its field layout
// (iteration variable, iterable expression, loop body).
fn build_foreach(_cx: &mut Builder<'_>, _fields: &[Term]) -> Result<Node, BuildError> {
    Err(BuildError::UnsupportedKind { name: "Foreach" })
}

fn build_for(cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "For";
    let var = own_str(K, "var", field(K, fields, 0, "var")?)?;
    // Bounds are nodes, not literals, so computed ranges are allowed.
    let start = cx.child_node(K, "start", field(K, fields, 1, "start")?)?;
    let end = cx.child_node(K, "end", field(K, fields, 2, "end")?)?;
    let body = cx.child_tree(K, "body", field(K, fields, 3, "body")?)?;
    Ok(Node::For {
        var,
        start: Box::new(start),
        end: Box::new(end),
        body,
    })
}

fn build_define(cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Define";
    let name = own_str(K, "name", field(K, fields, 0, "name")?)?;

    let items = expect_list(K, "params", field(K, fields, 1, "params")?)?;
    let mut params = Vec::with_capacity(items.len());
    for item in items {
        let pair = expect_tuple(K, "param", item)?;
        let param_name = own_str(K, "param name", field(K, pair, 0, "param name")?)?;
        let default = match expect_opt(K, "param default", field(K, pair, 1, "param default")?)? {
            Some(term) => Some(cx.child_node(K, "param default", term)?),
            None => None,
        };
        params.push(DefineParam {
            name: param_name,
            default,
        });
    }

    let values = cx.child_tree(K, "values", field(K, fields, 2, "values")?)?;
    let rest = cx.child_tree(K, "rest", field(K, fields, 3, "rest")?)?;
    Ok(Node::Define {
        name,
        params,
        values,
        rest,
    })
}

fn build_apply(cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Apply";
    let name = own_str(K, "name", field(K, fields, 0, "name")?)?;

    let items = expect_list(K, "args", field(K, fields, 1, "args")?)?;
    let mut args = Vec::with_capacity(items.len());
    for item in items {
        let pair = expect_tuple(K, "arg", item)?;
        let keyword = match expect_opt(K, "arg keyword", field(K, pair, 0, "arg keyword")?)? {
            Some(term) => Some(own_str(K, "arg keyword", term)?),
            None => None,
        };
        let value = cx.child_tree(K, "arg value", field(K, pair, 1, "arg value")?)?;
        args.push(ApplyArg { keyword, value });
    }
    Ok(Node::Apply { name, args })
}

fn build_let(cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Let";
    let var = own_str(K, "var", field(K, fields, 0, "var")?)?;
    let value = cx.child_tree(K, "value", field(K, fields, 1, "value")?)?;
    let body = cx.child_tree(K, "body", field(K, fields, 2, "body")?)?;
    Ok(Node::Let { var, value, body })
}

fn build_unary_op(cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "UnaryOp";
    let op = own_str(K, "op", field(K, fields, 0, "op")?)?;
    let operand = cx.child_node(K, "operand", field(K, fields, 1, "operand")?)?;
    Ok(Node::UnaryOp {
        op,
        operand: Box::new(operand),
    })
}

fn build_binary_op(cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "BinaryOp";
    let op = own_str(K, "op", field(K, fields, 0, "op")?)?;
    let left = cx.child_node(K, "left", field(K, fields, 1, "left")?)?;
    let right = cx.child_node(K, "right", field(K, fields, 2, "right")?)?;
    Ok(Node::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn build_int(_cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Int";
    // Keep the literal as text; parsing it to a machine integer is the
    // evaluator's decision, not ours.
    let num = own_str(K, "num", field(K, fields, 0, "num")?)?;
    Ok(Node::Int(num))
}

fn build_include(_cx: &mut Builder<'_>, fields: &[Term]) -> Result<Node, BuildError> {
    const K: &str = "Include";
    let (tag, payload) = match field(K, fields, 0, "payload")? {
        Term::Variant { tag, payload } => (tag, payload.as_ref()),
        _ => {
            return Err(BuildError::Malformed {
                kind: K,
                field: "payload",
                expected: "a variant term",
            })
        }
    };
    // This builder only records the inclusion intent; reading the file and
    // merging its tree is the upstream parser's responsibility.
    let include = match tag.as_str() {
        "File" => Include::File(own_str(K, "path", payload)?),
        "Raw" => Include::Raw(own_str(K, "content", payload)?),
        _ => {
            return Err(BuildError::UnknownIncludeKind { tag: tag.clone() });
        }
    };
    Ok(Node::Include(include))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Term {
        Term::node(NodeKind::Text, vec![Term::str(s)])
    }

    #[test]
    fn test_dispatch_table_matches_tag_order() {
        for (index, entry) in DISPATCH.iter().enumerate() {
            assert_eq!(entry.kind.tag() as usize, index);
        }
        assert!(DISPATCH[NodeKind::Pack.tag() as usize].build.is_none());
    }

    #[test]
    fn test_name_of_is_total() {
        for tag in 0..NodeKind::COUNT as u8 {
            assert_ne!(name_of(tag), "UNKNOWN");
        }
        assert_eq!(name_of(15), "UNKNOWN");
        assert_eq!(name_of(255), "UNKNOWN");
    }

    #[test]
    fn test_build_text() {
        let node = build_node(&text("hello")).expect("Should build");
        assert_eq!(node, Node::Text("hello".to_string()));
    }

    #[test]
    fn test_build_var_accessor_chain() {
        let term = Term::node(
            NodeKind::Var,
            vec![
                Term::str("evar"),
                Term::list(vec![Term::str("sub1"), Term::str("sub2")]),
            ],
        );
        let node = build_node(&term).expect("Should build");
        assert_eq!(
            node,
            Node::Var {
                name: "evar".to_string(),
                accessors: vec!["sub1".to_string(), "sub2".to_string()],
            }
        );
    }

    #[test]
    fn test_build_translate_empty_variant_is_valid() {
        let term = Term::node(
            NodeKind::Translate,
            vec![Term::Bool(true), Term::str("welcome"), Term::str("")],
        );
        let node = build_node(&term).expect("Should build");
        assert_eq!(
            node,
            Node::Translate {
                capitalize: true,
                key: "welcome".to_string(),
                variant: String::new(),
            }
        );
    }

    #[test]
    fn test_build_if_condition_is_node_not_tree() {
        let term = Term::node(
            NodeKind::If,
            vec![
                Term::node(NodeKind::Var, vec![Term::str("wizard"), Term::list(vec![])]),
                Term::list(vec![text("yes")]),
                Term::list(vec![]),
            ],
        );
        let node = build_node(&term).expect("Should build");
        match node {
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => {
                assert_eq!(cond.kind(), NodeKind::Var);
                assert_eq!(then_branch.len(), 1);
                assert!(else_branch.is_empty());
            }
            other => panic!("expected If, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_build_for_with_computed_bounds() {
        let term = Term::node(
            NodeKind::For,
            vec![
                Term::str("i"),
                Term::node(NodeKind::Int, vec![Term::str("1")]),
                Term::node(
                    NodeKind::BinaryOp,
                    vec![
                        Term::str("+"),
                        Term::node(NodeKind::Var, vec![Term::str("n"), Term::list(vec![])]),
                        Term::node(NodeKind::Int, vec![Term::str("2")]),
                    ],
                ),
                Term::list(vec![text("x")]),
            ],
        );
        let node = build_node(&term).expect("Should build");
        match node {
            Node::For { var, start, end, body } => {
                assert_eq!(var, "i");
                assert_eq!(*start, Node::Int("1".to_string()));
                assert_eq!(end.kind(), NodeKind::BinaryOp);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected For, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_build_apply_keyword_and_positional_args() {
        let term = Term::node(
            NodeKind::Apply,
            vec![
                Term::str("greet"),
                Term::list(vec![
                    Term::tuple(vec![Term::some(Term::str("who")), Term::list(vec![text("w")])]),
                    Term::tuple(vec![Term::none(), Term::list(vec![])]),
                ]),
            ],
        );
        let node = build_node(&term).expect("Should build");
        match node {
            Node::Apply { name, args } => {
                assert_eq!(name, "greet");
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].keyword.as_deref(), Some("who"));
                assert_eq!(args[0].value.len(), 1);
                assert_eq!(args[1].keyword, None);
                assert!(args[1].value.is_empty());
            }
            other => panic!("expected Apply, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_build_let() {
        let term = Term::node(
            NodeKind::Let,
            vec![
                Term::str("x"),
                Term::list(vec![text("v")]),
                Term::list(vec![text("b")]),
            ],
        );
        let node = build_node(&term).expect("Should build");
        match node {
            Node::Let { var, value, body } => {
                assert_eq!(var, "x");
                assert_eq!(value.len(), 1);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected Let, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_build_unary_and_binary_ops() {
        let term = Term::node(
            NodeKind::UnaryOp,
            vec![
                Term::str("not"),
                Term::node(NodeKind::Var, vec![Term::str("x"), Term::list(vec![])]),
            ],
        );
        let node = build_node(&term).expect("Should build");
        assert_eq!(node.kind(), NodeKind::UnaryOp);

        let term = Term::node(
            NodeKind::BinaryOp,
            vec![
                Term::str("="),
                Term::node(NodeKind::Int, vec![Term::str("1")]),
                Term::node(NodeKind::Int, vec![Term::str("2")]),
            ],
        );
        let node = build_node(&term).expect("Should build");
        match node {
            Node::BinaryOp { op, left, right } => {
                assert_eq!(op, "=");
                assert_eq!(*left, Node::Int("1".to_string()));
                assert_eq!(*right, Node::Int("2".to_string()));
            }
            other => panic!("expected BinaryOp, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_unknown_tag_fails() {
        let term = Term::node(200u8, vec![]);
        let err = build_node(&term).expect_err("Should fail");
        assert!(matches!(err, BuildError::UnknownKind { tag: 200 }));
    }

    #[test]
    fn test_pack_tag_is_reserved() {
        let term = Term::node(NodeKind::Pack, vec![]);
        let err = build_node(&term).expect_err("Should fail");
        assert!(matches!(err, BuildError::ReservedKind { name: "Pack" }));
    }

    #[test]
    fn test_foreach_is_unsupported() {
        let term = Term::node(NodeKind::Foreach, vec![]);
        let err = build_node(&term).expect_err("Should fail");
        assert!(matches!(err, BuildError::UnsupportedKind { name: "Foreach" }));
    }

    #[test]
    fn test_include_unknown_variant_tag_fails() {
        let term = Term::node(
            NodeKind::Include,
            vec![Term::variant("Web", Term::str("http://x"))],
        );
        let err = build_node(&term).expect_err("Should fail");
        match err {
            BuildError::UnknownIncludeKind { tag } => assert_eq!(tag, "Web"),
            other => panic!("expected UnknownIncludeKind, got {other}"),
        }
    }

    #[test]
    fn test_malformed_field_position_fails() {
        // Text with a bool where the string belongs.
        let term = Term::node(NodeKind::Text, vec![Term::Bool(true)]);
        let err = build_node(&term).expect_err("Should fail");
        assert!(matches!(
            err,
            BuildError::Malformed {
                kind: "Text",
                field: "text",
                ..
            }
        ));

        // Missing field entirely.
        let term = Term::node(NodeKind::Text, vec![]);
        let err = build_node(&term).expect_err("Should fail");
        assert!(matches!(err, BuildError::Malformed { .. }));
    }

    #[test]
    fn test_non_node_term_rejected() {
        let err = build_node(&Term::str("oops")).expect_err("Should fail");
        assert!(matches!(err, BuildError::Malformed { kind: "Node", .. }));

        let err = build_tree(&Term::str("oops")).expect_err("Should fail");
        assert!(matches!(err, BuildError::Malformed { kind: "Tree", .. }));
    }

    #[test]
    fn test_tree_failure_reports_index() {
        let term = Term::list(vec![text("ok"), Term::node(99u8, vec![]), text("never")]);
        let err = build_tree(&term).expect_err("Should fail");
        match err {
            BuildError::At { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, BuildError::UnknownKind { tag: 99 }));
            }
            other => panic!("expected At, got {other}"),
        }
    }

    #[test]
    fn test_depth_limit_enforced() {
        // Depth 1 allows a bare node but not its nested condition.
        let options = BuildOptions::default().with_max_depth(1);
        assert!(build_node_with(&text("flat"), &options).is_ok());

        let nested = Term::node(
            NodeKind::UnaryOp,
            vec![Term::str("not"), text("deep")],
        );
        let err = build_node_with(&nested, &options).expect_err("Should fail");
        assert!(matches!(
            err.root_cause(),
            BuildError::DepthExceeded { limit: 1 }
        ));
    }
}
