//! Abstract Syntax Tree types for the templ template language
//!
//! A [`Tree`] is an ordered, owned sequence of [`Node`]s and represents one
//! template block body; index order is document order, which is also the
//! order a renderer would execute statements in. Every node fully owns its
//! payload: strings are independent copies, sub-trees and sub-nodes have
//! exactly one owner, and dropping a tree releases everything below it.
//! Once built, the AST is immutable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The full tag space of AST kinds, in wire-discriminant order
///
/// This covers every discriminant the external parser can emit, including
/// two kinds that never appear in a constructed [`Node`]: `Foreach` (field
/// layout unsettled upstream) and `Pack` (reserved for include groups the
/// upstream parser must flatten before handing terms over).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeKind {
    Text = 0,
    Var,
    Translate,
    WidthHeight,
    If,
    Foreach,
    For,
    Define,
    Apply,
    Let,
    UnaryOp,
    BinaryOp,
    Int,
    Include,
    Pack,
}

impl NodeKind {
    /// Number of kinds in the tag space
    pub const COUNT: usize = 15;

    /// Map a raw wire discriminant to a kind
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeKind::Text),
            1 => Some(NodeKind::Var),
            2 => Some(NodeKind::Translate),
            3 => Some(NodeKind::WidthHeight),
            4 => Some(NodeKind::If),
            5 => Some(NodeKind::Foreach),
            6 => Some(NodeKind::For),
            7 => Some(NodeKind::Define),
            8 => Some(NodeKind::Apply),
            9 => Some(NodeKind::Let),
            10 => Some(NodeKind::UnaryOp),
            11 => Some(NodeKind::BinaryOp),
            12 => Some(NodeKind::Int),
            13 => Some(NodeKind::Include),
            14 => Some(NodeKind::Pack),
            _ => None,
        }
    }

    /// The raw wire discriminant for this kind
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Human-readable kind name, used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Text => "Text",
            NodeKind::Var => "Var",
            NodeKind::Translate => "Translate",
            NodeKind::WidthHeight => "WidthHeight",
            NodeKind::If => "If",
            NodeKind::Foreach => "Foreach",
            NodeKind::For => "For",
            NodeKind::Define => "Define",
            NodeKind::Apply => "Apply",
            NodeKind::Let => "Let",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::BinaryOp => "BinaryOp",
            NodeKind::Int => "Int",
            NodeKind::Include => "Include",
            NodeKind::Pack => "Pack",
        }
    }
}

impl From<NodeKind> for u8 {
    fn from(kind: NodeKind) -> u8 {
        kind.tag()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One template construct, with its fully owned payload
///
/// There is no `Pack` variant: packed include groups are flattened by the
/// upstream parser and can never occur in a constructed AST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Literal output text
    Text(String),
    /// Variable reference with accessor chain, e.g. `var.sub1.sub2`
    Var {
        name: String,
        accessors: Vec<String>,
    },
    /// Translated lexicon entry
    Translate {
        capitalize: bool,
        key: String,
        /// Disambiguates between lexicon variants; often empty
        variant: String,
    },
    /// Image width/height size expression
    WidthHeight(String),
    /// Conditional; an absent else-branch is an empty tree, never an option
    If {
        cond: Box<Node>,
        then_branch: Tree,
        else_branch: Tree,
    },
    /// Reserved: the upstream grammar has not settled this kind's fields,
    /// so the builder refuses it and this variant is never produced
    Foreach,
    /// Bounded loop; start and end are nodes, so computed bounds are allowed
    For {
        var: String,
        start: Box<Node>,
        end: Box<Node>,
        body: Tree,
    },
    /// Macro definition; scope extends over `rest`, the remainder of the
    /// enclosing block
    Define {
        name: String,
        params: Vec<DefineParam>,
        values: Tree,
        rest: Tree,
    },
    /// Macro application
    Apply {
        name: String,
        args: Vec<ApplyArg>,
    },
    /// Variable binding scoped over `body`
    Let {
        var: String,
        value: Tree,
        body: Tree,
    },
    /// Unary operator application
    UnaryOp {
        op: String,
        operand: Box<Node>,
    },
    /// Binary operator application
    BinaryOp {
        op: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Integer literal, kept as source text so formatting and width survive
    /// until a downstream evaluator decides how to interpret it
    Int(String),
    /// File inclusion intent; actual reading and merging happens upstream
    Include(Include),
}

/// Include payload: by path or inline content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Include {
    File(String),
    Raw(String),
}

/// One macro parameter with an optional default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefineParam {
    pub name: String,
    /// `None` means the parameter has no default, which is meaningful
    /// program state: applying the macro must then supply this argument
    pub default: Option<Node>,
}

/// One macro application argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyArg {
    /// Keyword for named arguments, `None` for positional ones
    pub keyword: Option<String>,
    /// Arguments are template fragments in their own right, not bare values
    pub value: Tree,
}

impl Node {
    /// The kind tag of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text(_) => NodeKind::Text,
            Node::Var { .. } => NodeKind::Var,
            Node::Translate { .. } => NodeKind::Translate,
            Node::WidthHeight(_) => NodeKind::WidthHeight,
            Node::If { .. } => NodeKind::If,
            Node::Foreach => NodeKind::Foreach,
            Node::For { .. } => NodeKind::For,
            Node::Define { .. } => NodeKind::Define,
            Node::Apply { .. } => NodeKind::Apply,
            Node::Let { .. } => NodeKind::Let,
            Node::UnaryOp { .. } => NodeKind::UnaryOp,
            Node::BinaryOp { .. } => NodeKind::BinaryOp,
            Node::Int(_) => NodeKind::Int,
            Node::Include(_) => NodeKind::Include,
        }
    }

    /// Human-readable kind name
    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Total number of nodes in this subtree, this node included
    pub fn node_count(&self) -> usize {
        match self {
            Node::Text(_)
            | Node::Translate { .. }
            | Node::WidthHeight(_)
            | Node::Var { .. }
            | Node::Foreach
            | Node::Int(_)
            | Node::Include(_) => 1,
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => 1 + cond.node_count() + then_branch.node_count() + else_branch.node_count(),
            Node::For {
                start, end, body, ..
            } => 1 + start.node_count() + end.node_count() + body.node_count(),
            Node::Define {
                params,
                values,
                rest,
                ..
            } => {
                let defaults: usize = params
                    .iter()
                    .filter_map(|p| p.default.as_ref())
                    .map(Node::node_count)
                    .sum();
                1 + defaults + values.node_count() + rest.node_count()
            }
            Node::Apply { args, .. } => {
                1 + args.iter().map(|a| a.value.node_count()).sum::<usize>()
            }
            Node::Let { value, body, .. } => 1 + value.node_count() + body.node_count(),
            Node::UnaryOp { operand, .. } => 1 + operand.node_count(),
            Node::BinaryOp { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }
}

/// An ordered, owned sequence of nodes: one template block body
///
/// Length is fixed at construction; there is no public mutation API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tree(Vec<Node>);

impl Tree {
    /// An empty tree, e.g. an absent else-branch
    pub fn empty() -> Self {
        Tree(Vec::new())
    }

    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Tree(nodes)
    }

    /// Number of top-level statements in this block
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Statement at document-order position `index`
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.0.get(index)
    }

    /// Iterate statements in document order
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }

    /// The statements as a slice
    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    /// Total number of nodes in the whole tree, recursively
    pub fn node_count(&self) -> usize {
        self.0.iter().map(Node::node_count).sum()
    }
}

impl IntoIterator for Tree {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Tree {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        &self.0[index]
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for Node {
    /// Compact single-line structural form, e.g.
    /// `If(Var("wizard", []), [Text("yes")], [])`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(s) => write!(f, "Text({s:?})"),
            Node::Var { name, accessors } => write!(f, "Var({name:?}, {accessors:?})"),
            Node::Translate {
                capitalize,
                key,
                variant,
            } => write!(f, "Translate({capitalize}, {key:?}, {variant:?})"),
            Node::WidthHeight(size) => write!(f, "WidthHeight({size:?})"),
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "If({cond}, {then_branch}, {else_branch})"),
            Node::Foreach => f.write_str("Foreach"),
            Node::For {
                var,
                start,
                end,
                body,
            } => write!(f, "For({var:?}, {start}, {end}, {body})"),
            Node::Define {
                name,
                params,
                values,
                rest,
            } => {
                write!(f, "Define({name:?}, [")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &p.default {
                        Some(d) => write!(f, "{:?}={d}", p.name)?,
                        None => write!(f, "{:?}", p.name)?,
                    }
                }
                write!(f, "], {values}, {rest})")
            }
            Node::Apply { name, args } => {
                write!(f, "Apply({name:?}, [")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &a.keyword {
                        Some(k) => write!(f, "{:?}={}", k, a.value)?,
                        None => write!(f, "{}", a.value)?,
                    }
                }
                f.write_str("])")
            }
            Node::Let { var, value, body } => write!(f, "Let({var:?}, {value}, {body})"),
            Node::UnaryOp { op, operand } => write!(f, "UnaryOp({op:?}, {operand})"),
            Node::BinaryOp { op, left, right } => {
                write!(f, "BinaryOp({op:?}, {left}, {right})")
            }
            Node::Int(num) => write!(f, "Int({num:?})"),
            Node::Include(Include::File(path)) => write!(f, "Include(File({path:?}))"),
            Node::Include(Include::Raw(content)) => write!(f, "Include(Raw({content:?}))"),
        }
    }
}
