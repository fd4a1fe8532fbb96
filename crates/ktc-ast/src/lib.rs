//! Typed AST contract for the ktc front-end.
//!
//! Parsing is done elsewhere; this crate only describes the shape of the tree
//! the resolver and the constructor checker consume. Nodes live in a
//! [`NodeArena`] and are addressed by [`NodeIndex`]. The arena is serializable
//! so that units can be handed over as JSON.

pub mod arena;
pub mod node;
pub mod visit;

pub use arena::NodeArena;
pub use node::{BinaryOp, LiteralKind, Node, NodeIndex, NodeKind, NodeList};
