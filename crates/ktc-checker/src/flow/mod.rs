//! Control-flow ("pseudocode") construction and the initialization dataflow
//! run over it.

pub mod builder;
pub mod initialization;
pub mod instructions;

pub use builder::PseudocodeBuilder;
pub use initialization::{InitState, InitStates, VariableInitializers};
pub use instructions::{
    Instruction, InstructionId, InstructionKind, LabelId, LexicalScope, LexicalScopeId, MagicKind,
    Pseudocode,
};
