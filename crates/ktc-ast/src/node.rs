//! Node definitions.

use ktc_common::{Atom, Span};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index of a node in its [`NodeArena`](crate::NodeArena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    pub(crate) fn none() -> Self {
        Self::NONE
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::NONE
    }
}

/// Binary operator tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    IdentityEq,
    /// `!==`
    IdentityNotEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    Plus,
    Minus,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    LtEq,
    GtEq,
    /// `?:`
    Elvis,
}

impl BinaryOp {
    /// `==` and `!=`.
    pub const fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    /// `===` and `!==`.
    pub const fn is_identity_equality(self) -> bool {
        matches!(self, BinaryOp::IdentityEq | BinaryOp::IdentityNotEq)
    }

    /// Operators whose right operand is evaluated only on some paths.
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::AndAnd | BinaryOp::OrOr | BinaryOp::Elvis)
    }

    pub const fn token(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::IdentityEq => "===",
            BinaryOp::IdentityNotEq => "!==",
            BinaryOp::AndAnd => "&&",
            BinaryOp::OrOr => "||",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Elvis => "?:",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Null,
    Boolean,
    Int,
    String,
}

pub type NodeList = SmallVec<[NodeIndex; 4]>;

/// The kind-specific payload of a node.
///
/// Child references are `NodeIndex` values into the same arena. Optional
/// children use `Option<NodeIndex>` rather than `NodeIndex::NONE` so the JSON
/// form stays readable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------
    File {
        declarations: NodeList,
    },
    Class {
        name: Atom,
        #[serde(default)]
        primary_parameters: NodeList,
        #[serde(default)]
        members: NodeList,
        #[serde(default)]
        annotations: NodeList,
    },
    /// A primary constructor parameter; `val`/`var` parameters declare a property.
    Parameter {
        name: Atom,
        #[serde(default)]
        declares_property: bool,
        #[serde(default)]
        default_value: Option<NodeIndex>,
    },
    Property {
        name: Atom,
        #[serde(default)]
        initializer: Option<NodeIndex>,
        #[serde(default)]
        annotations: NodeList,
    },
    Function {
        name: Atom,
        #[serde(default)]
        body: Option<NodeIndex>,
        #[serde(default)]
        annotations: NodeList,
    },
    SecondaryConstructor {
        /// Arguments of the `this(...)`/`super(...)` delegation call.
        #[serde(default)]
        delegation_arguments: NodeList,
        #[serde(default)]
        body: Option<NodeIndex>,
        #[serde(default)]
        annotations: NodeList,
    },
    InitBlock {
        body: NodeIndex,
    },

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------
    Block {
        #[serde(default)]
        statements: NodeList,
    },
    LocalVariable {
        name: Atom,
        #[serde(default)]
        initializer: Option<NodeIndex>,
        #[serde(default)]
        mutable: bool,
    },
    If {
        condition: NodeIndex,
        then_branch: NodeIndex,
        #[serde(default)]
        else_branch: Option<NodeIndex>,
    },
    While {
        condition: NodeIndex,
        body: NodeIndex,
    },
    DoWhile {
        body: NodeIndex,
        condition: NodeIndex,
    },
    Break,
    Continue,
    Return {
        #[serde(default)]
        value: Option<NodeIndex>,
    },
    Throw {
        value: NodeIndex,
    },
    Try {
        body: NodeIndex,
        #[serde(default)]
        catches: NodeList,
        #[serde(default)]
        finally: Option<NodeIndex>,
    },
    Catch {
        parameter: Atom,
        body: NodeIndex,
    },

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------
    Assignment {
        target: NodeIndex,
        value: NodeIndex,
    },
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    This {
        #[serde(default)]
        label: Option<Atom>,
    },
    SimpleName {
        name: Atom,
    },
    /// `receiver.selector` or `receiver?.selector`.
    Qualified {
        receiver: NodeIndex,
        selector: NodeIndex,
        #[serde(default)]
        safe: bool,
    },
    Call {
        callee: NodeIndex,
        #[serde(default)]
        arguments: NodeList,
    },
    /// `Receiver::callee` or `::callee`.
    CallableReference {
        #[serde(default)]
        receiver: Option<NodeIndex>,
        callee: NodeIndex,
    },
    /// A type written in expression position (the left side of `::`).
    TypeReference {
        name: Atom,
        #[serde(default)]
        nullable: bool,
    },
    Literal {
        literal: LiteralKind,
        #[serde(default)]
        text: String,
    },
    Annotated {
        annotations: NodeList,
        expression: NodeIndex,
    },
    AnnotationEntry {
        name: Atom,
    },
}

impl NodeKind {
    /// Human-readable kind name used in logs and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeKind::File { .. } => "file",
            NodeKind::Class { .. } => "class",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::Property { .. } => "property",
            NodeKind::Function { .. } => "function",
            NodeKind::SecondaryConstructor { .. } => "secondary constructor",
            NodeKind::InitBlock { .. } => "init block",
            NodeKind::Block { .. } => "block",
            NodeKind::LocalVariable { .. } => "local variable",
            NodeKind::If { .. } => "if",
            NodeKind::While { .. } => "while",
            NodeKind::DoWhile { .. } => "do-while",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
            NodeKind::Return { .. } => "return",
            NodeKind::Throw { .. } => "throw",
            NodeKind::Try { .. } => "try",
            NodeKind::Catch { .. } => "catch",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::This { .. } => "this",
            NodeKind::SimpleName { .. } => "simple name",
            NodeKind::Qualified { .. } => "qualified expression",
            NodeKind::Call { .. } => "call",
            NodeKind::CallableReference { .. } => "callable reference",
            NodeKind::TypeReference { .. } => "type reference",
            NodeKind::Literal { .. } => "literal",
            NodeKind::Annotated { .. } => "annotated expression",
            NodeKind::AnnotationEntry { .. } => "annotation entry",
        }
    }

    pub const fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::File { .. }
                | NodeKind::Class { .. }
                | NodeKind::Parameter { .. }
                | NodeKind::Property { .. }
                | NodeKind::Function { .. }
                | NodeKind::SecondaryConstructor { .. }
                | NodeKind::LocalVariable { .. }
        )
    }

    pub const fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Assignment { .. }
                | NodeKind::Binary { .. }
                | NodeKind::This { .. }
                | NodeKind::SimpleName { .. }
                | NodeKind::Qualified { .. }
                | NodeKind::Call { .. }
                | NodeKind::CallableReference { .. }
                | NodeKind::TypeReference { .. }
                | NodeKind::Literal { .. }
                | NodeKind::Annotated { .. }
        )
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> NodeList {
        let mut out = NodeList::new();
        match self {
            NodeKind::File { declarations } => out.extend(declarations.iter().copied()),
            NodeKind::Class {
                primary_parameters,
                members,
                annotations,
                ..
            } => {
                out.extend(annotations.iter().copied());
                out.extend(primary_parameters.iter().copied());
                out.extend(members.iter().copied());
            }
            NodeKind::Parameter { default_value, .. } => out.extend(*default_value),
            NodeKind::Property {
                initializer,
                annotations,
                ..
            } => {
                out.extend(annotations.iter().copied());
                out.extend(*initializer);
            }
            NodeKind::Function {
                body, annotations, ..
            } => {
                out.extend(annotations.iter().copied());
                out.extend(*body);
            }
            NodeKind::SecondaryConstructor {
                delegation_arguments,
                body,
                annotations,
            } => {
                out.extend(annotations.iter().copied());
                out.extend(delegation_arguments.iter().copied());
                out.extend(*body);
            }
            NodeKind::InitBlock { body } => out.push(*body),
            NodeKind::Block { statements } => out.extend(statements.iter().copied()),
            NodeKind::LocalVariable { initializer, .. } => out.extend(*initializer),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                out.push(*then_branch);
                out.extend(*else_branch);
            }
            NodeKind::While { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            NodeKind::DoWhile { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            NodeKind::Break | NodeKind::Continue => {}
            NodeKind::Return { value } => out.extend(*value),
            NodeKind::Throw { value } => out.push(*value),
            NodeKind::Try {
                body,
                catches,
                finally,
            } => {
                out.push(*body);
                out.extend(catches.iter().copied());
                out.extend(*finally);
            }
            NodeKind::Catch { body, .. } => out.push(*body),
            NodeKind::Assignment { target, value } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::This { .. } | NodeKind::SimpleName { .. } => {}
            NodeKind::Qualified {
                receiver, selector, ..
            } => {
                out.push(*receiver);
                out.push(*selector);
            }
            NodeKind::Call { callee, arguments } => {
                out.push(*callee);
                out.extend(arguments.iter().copied());
            }
            NodeKind::CallableReference { receiver, callee } => {
                out.extend(*receiver);
                out.push(*callee);
            }
            NodeKind::TypeReference { .. } | NodeKind::Literal { .. } => {}
            NodeKind::Annotated {
                annotations,
                expression,
            } => {
                out.extend(annotations.iter().copied());
                out.push(*expression);
            }
            NodeKind::AnnotationEntry { .. } => {}
        }
        out
    }
}

/// A node: kind payload plus source span and parent link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub span: Span,
    #[serde(default = "NodeIndex::none", skip_serializing)]
    pub parent: NodeIndex,
}
