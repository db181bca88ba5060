//! Arena-indexed AST.
//!
//! A tagged-variant `Node` enum stored in a `dice_core::Arena<Node>` so
//! children are `NodeId`s rather than pointers — cycles are impossible
//! by construction since a parser only ever allocates children before
//! their parent.

use std::fmt;

use dice_core::{Arena, CustomDie, NodeId, Selection, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn as_char(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }
}

/// Which shape of dice operation a `DiceOp` node represents.
///
/// `Exploding`, `Pool`, and `Fate` are reserved for future grammar
/// extensions: the current grammar never produces them, and the
/// evaluator surfaces `NotSupported` if one is ever constructed by hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiceKind {
    Basic,
    Custom,
    Filter,
    Exploding,
    Pool,
    Fate,
}

/// A dice primary: `3d6`, `4d6kh3`, `1d{-1,0,1}`, `4dF`, etc.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiceOp {
    pub kind: DiceKind,
    pub count: Option<NodeId>,
    pub sides: Option<NodeId>,
    pub modifier: Option<NodeId>,
    pub custom_name: Option<String>,
    pub custom_die: Option<CustomDie>,
    pub selection: Option<Selection>,
}

impl DiceOp {
    pub fn basic(count: Option<NodeId>, sides: NodeId, selection: Option<Selection>) -> Self {
        DiceOp {
            kind: DiceKind::Basic,
            count,
            sides: Some(sides),
            modifier: None,
            custom_name: None,
            custom_die: None,
            selection,
        }
    }

    pub fn custom_named(
        count: Option<NodeId>,
        name: String,
        selection: Option<Selection>,
    ) -> Self {
        DiceOp {
            kind: DiceKind::Custom,
            count,
            sides: None,
            modifier: None,
            custom_name: Some(name),
            custom_die: None,
            selection,
        }
    }

    pub fn custom_inline(
        count: Option<NodeId>,
        die: CustomDie,
        selection: Option<Selection>,
    ) -> Self {
        DiceOp {
            kind: DiceKind::Custom,
            count,
            sides: None,
            modifier: None,
            custom_name: None,
            custom_die: Some(die),
            selection,
        }
    }
}

/// One AST node. Children are `NodeId`s into the owning [`Ast`]'s arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Literal { value: Value },
    BinaryOp { op: BinOp, left: NodeId, right: NodeId },
    DiceOp(DiceOp),
    FunctionCall { name: String, args: Vec<NodeId> },
    Annotation { key: String, value: String, child: NodeId },
}

/// A parsed expression: an arena of nodes plus the id of the root.
#[derive(Debug)]
pub struct Ast {
    pub(crate) nodes: Arena<Node>,
    pub root: NodeId,
}

impl Ast {
    pub fn get(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, self.root, f)
    }
}

/// Reconstructs a normalized expression string for the subtree rooted at
/// `id`. Binary operators are always fully parenthesized, and a `DiceOp`'s
/// filter suffix is rendered from its `original_syntax` rather than from
/// `kind`, since a selection overwrites `kind` to `Filter` regardless of
/// whether the underlying die was `Basic` or `Custom`.
fn write_node(ast: &Ast, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match ast.get(id) {
        Node::Literal { value } => write!(f, "{value}"),
        Node::BinaryOp { op, left, right } => {
            f.write_str("(")?;
            write_node(ast, *left, f)?;
            write!(f, "{}", op.as_char())?;
            write_node(ast, *right, f)?;
            f.write_str(")")
        }
        Node::DiceOp(op) => write_dice_op(ast, op, f),
        Node::FunctionCall { name, args } => {
            write!(f, "{name}(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write_node(ast, *arg, f)?;
            }
            f.write_str(")")
        }
        Node::Annotation { key, value, child } => {
            write!(f, "[{key}:{value}]")?;
            write_node(ast, *child, f)
        }
    }
}

fn write_dice_op(ast: &Ast, op: &DiceOp, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(count) = op.count {
        write_node(ast, count, f)?;
    }
    f.write_str("d")?;
    if let Some(name) = &op.custom_name {
        f.write_str(name)?;
    } else if let Some(die) = &op.custom_die {
        write_custom_die(die, f)?;
    } else if let Some(sides) = op.sides {
        write_node(ast, sides, f)?;
    }
    if let Some(selection) = &op.selection {
        f.write_str(&selection.original_syntax)?;
    }
    Ok(())
}

fn write_custom_die(die: &CustomDie, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (i, side) in die.sides.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        match &side.label {
            Some(label) => write!(f, "{}:\"{}\"", side.value, label)?,
            None => write!(f, "{}", side.value)?,
        }
    }
    f.write_str("}")
}
