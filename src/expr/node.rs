//! Expression-tree nodes.
//!
//! A [`Node`] is either a variable leaf or a binary operation that owns its
//! two children. Trees are plain owned values: cloning a tree deep-copies
//! it, and no subtree is ever shared between two trees.

use rand::Rng;
use std::fmt;

/// Arithmetic operator of a [`Node::BinaryOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    /// All operators, in the order used for uniform draws.
    pub const ALL: [Operator; 3] = [Operator::Add, Operator::Subtract, Operator::Multiply];

    /// Draws an operator uniformly from [`Operator::ALL`].
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// The two operators different from `self`.
    pub fn others(self) -> [Operator; 2] {
        match self {
            Operator::Add => [Operator::Subtract, Operator::Multiply],
            Operator::Subtract => [Operator::Add, Operator::Multiply],
            Operator::Multiply => [Operator::Add, Operator::Subtract],
        }
    }

    /// Draws one of the two other operators uniformly.
    pub fn random_other<R: Rng>(self, rng: &mut R) -> Self {
        self.others()[rng.random_range(0..2)]
    }

    /// Applies the operator with 64-bit wrapping arithmetic.
    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Operator::Add => lhs.wrapping_add(rhs),
            Operator::Subtract => lhs.wrapping_sub(rhs),
            Operator::Multiply => lhs.wrapping_mul(rhs),
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply => 2,
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A node in an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// Leaf referring to an input variable by name.
    Variable(String),
    /// Internal node combining two exclusively owned subtrees.
    BinaryOp {
        op: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn var(name: impl Into<String>) -> Self {
        Node::Variable(name.into())
    }

    pub fn binary(op: Operator, left: Node, right: Node) -> Self {
        Node::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn add(left: Node, right: Node) -> Self {
        Self::binary(Operator::Add, left, right)
    }

    pub fn sub(left: Node, right: Node) -> Self {
        Self::binary(Operator::Subtract, left, right)
    }

    pub fn mul(left: Node, right: Node) -> Self {
        Self::binary(Operator::Multiply, left, right)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Variable(_))
    }

    /// The operator of a binary-operation node, `None` for a leaf.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Node::Variable(_) => None,
            Node::BinaryOp { op, .. } => Some(*op),
        }
    }

    /// Depth-first, left-before-right, parent-before-children traversal.
    ///
    /// This is the order that defines subtree indices.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// Counts the nodes matching `predicate`.
    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Node) -> bool,
    {
        self.preorder().filter(|node| predicate(node)).count()
    }

    /// Number of binary-operation nodes; the range of valid subtree indices.
    pub fn binop_count(&self) -> usize {
        self.count_where(|node| !node.is_leaf())
    }

    /// Number of binary-operation nodes using `op`.
    pub fn operator_count(&self, op: Operator) -> usize {
        self.count_where(|node| node.operator() == Some(op))
    }

    pub fn leaf_count(&self) -> usize {
        self.count_where(Node::is_leaf)
    }

    /// Length of the longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        match self {
            Node::Variable(_) => 1,
            Node::BinaryOp { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Names of the variables referenced by the leaves, in pre-order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.preorder().filter_map(|node| match node {
            Node::Variable(name) => Some(name.as_str()),
            Node::BinaryOp { .. } => None,
        })
    }

    fn fmt_operand(
        &self,
        f: &mut fmt::Formatter<'_>,
        parent: Operator,
        is_right: bool,
    ) -> fmt::Result {
        // Left-associative grammar: a right operand of equal precedence
        // needs parentheses to keep its own grouping.
        let needs_parens = match self.operator() {
            None => false,
            Some(op) => {
                op.precedence() < parent.precedence()
                    || (is_right && op.precedence() == parent.precedence())
            }
        };
        if needs_parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

/// Renders with the minimal parentheses needed to re-parse the same tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Variable(name) => write!(f, "{name}"),
            Node::BinaryOp { op, left, right } => {
                left.fmt_operand(f, *op, false)?;
                write!(f, " {op} ")?;
                right.fmt_operand(f, *op, true)
            }
        }
    }
}

/// Pre-order iterator over a tree, see [`Node::preorder`].
pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        if let Node::BinaryOp { left, right, .. } = node {
            self.stack.push(&**right);
            self.stack.push(&**left);
        }
        Some(node)
    }
}
