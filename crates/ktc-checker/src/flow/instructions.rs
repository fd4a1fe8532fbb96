//! Pseudocode: a linear instruction list with explicit successor edges.
//!
//! Every subroutine has one entry, a normal exit, an error exit (reached by
//! `throw`) and a sink that both exits flow into. Jumps name labels; the
//! builder resolves labels to instruction ids when it finishes, and
//! reachability from the entry is computed once, so dead code can be skipped
//! by every later pass.

use crate::trace::ReferenceTarget;
use fixedbitset::FixedBitSet;
use ktc_ast::NodeIndex;
use ktc_solver::CallableId;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstructionId(pub u32);

impl InstructionId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LexicalScopeId(pub u32);

/// Values that appear in the graph without a source expression of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MagicKind {
    /// The instance an unqualified member call is dispatched on.
    ImplicitReceiver,
    /// A subexpression too deeply nested to be followed.
    Truncated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstructionKind {
    SubroutineEnter,
    SubroutineExit,
    SubroutineError,
    SubroutineSink,
    /// Read of a name or `this`.
    ReadValue { target: Option<ReferenceTarget> },
    /// Write through a name or `this.name`; `lvalue` is the written expression.
    WriteValue {
        target: Option<CallableId>,
        lvalue: NodeIndex,
    },
    VariableDeclaration { variable: Option<CallableId> },
    Call { callee: Option<CallableId> },
    Magic {
        kind: MagicKind,
        target: Option<CallableId>,
    },
    LoadConstant,
    /// Evaluates an expression that does not read or write tracked state.
    Mark,
    Jump { target: LabelId },
    ConditionalJump { target: LabelId, on_true: bool },
    /// Continues to the next instruction or to any of `targets`.
    NondeterministicJump { targets: SmallVec<[LabelId; 2]> },
}

impl InstructionKind {
    pub const fn name(&self) -> &'static str {
        match self {
            InstructionKind::SubroutineEnter => "<START>",
            InstructionKind::SubroutineExit => "<END>",
            InstructionKind::SubroutineError => "<ERROR>",
            InstructionKind::SubroutineSink => "<SINK>",
            InstructionKind::ReadValue { .. } => "r",
            InstructionKind::WriteValue { .. } => "w",
            InstructionKind::VariableDeclaration { .. } => "v",
            InstructionKind::Call { .. } => "call",
            InstructionKind::Magic { .. } => "magic",
            InstructionKind::LoadConstant => "const",
            InstructionKind::Mark => "mark",
            InstructionKind::Jump { .. } => "jmp",
            InstructionKind::ConditionalJump { on_true: true, .. } => "jt",
            InstructionKind::ConditionalJump { on_true: false, .. } => "jf",
            InstructionKind::NondeterministicJump { .. } => "jmp?",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Instruction {
    pub kind: InstructionKind,
    /// Node the instruction was generated for.
    pub element: NodeIndex,
    pub scope: LexicalScopeId,
    pub next: SmallVec<[InstructionId; 2]>,
    pub previous: SmallVec<[InstructionId; 2]>,
}

/// Lexical block an instruction was generated in.
#[derive(Clone, Copy, Debug)]
pub struct LexicalScope {
    pub parent: Option<LexicalScopeId>,
    pub element: NodeIndex,
    pub depth: u32,
    /// Nearest enclosing scope opened by a declaration (possibly this one).
    pub declaration_scope: LexicalScopeId,
}

// =============================================================================
// Pseudocode
// =============================================================================

pub struct Pseudocode {
    pub(crate) root: NodeIndex,
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) scopes: Vec<LexicalScope>,
    pub(crate) reachable: FixedBitSet,
    pub(crate) enter: InstructionId,
    pub(crate) exit: InstructionId,
    pub(crate) error: InstructionId,
    pub(crate) sink: InstructionId,
}

impl Pseudocode {
    /// Declaration the pseudocode was built for.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instruction(&self, id: InstructionId) -> Option<&Instruction> {
        self.instructions.get(id.index())
    }

    pub fn instructions(&self) -> impl Iterator<Item = (InstructionId, &Instruction)> {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, instruction)| (InstructionId(i as u32), instruction))
    }

    pub fn enter(&self) -> InstructionId {
        self.enter
    }

    pub fn exit(&self) -> InstructionId {
        self.exit
    }

    pub fn error(&self) -> InstructionId {
        self.error
    }

    pub fn sink(&self) -> InstructionId {
        self.sink
    }

    pub fn scope(&self, id: LexicalScopeId) -> Option<&LexicalScope> {
        self.scopes.get(id.0 as usize)
    }

    /// Not reachable from the entry.
    pub fn is_dead(&self, id: InstructionId) -> bool {
        !self.reachable.contains(id.index())
    }

    /// Reachable instructions in id order.
    pub fn reachable_instructions(&self) -> impl Iterator<Item = InstructionId> + '_ {
        self.reachable.ones().map(|i| InstructionId(i as u32))
    }

    /// Instructions generated for `element`, in id order.
    pub fn instructions_for(&self, element: NodeIndex) -> Vec<InstructionId> {
        self.instructions()
            .filter(|(_, instruction)| instruction.element == element)
            .map(|(id, _)| id)
            .collect()
    }

    /// Variables declared in this pseudocode, in declaration order.
    ///
    /// Without `include_inside_local_declarations`, only declarations whose
    /// nearest declaration scope is the root one are returned.
    pub fn declared_variables(&self, include_inside_local_declarations: bool) -> Vec<CallableId> {
        let root_scope = LexicalScopeId(0);
        let mut out = Vec::new();
        for instruction in &self.instructions {
            let InstructionKind::VariableDeclaration {
                variable: Some(variable),
            } = instruction.kind
            else {
                continue;
            };
            let top_level = self
                .scope(instruction.scope)
                .is_some_and(|scope| scope.declaration_scope == root_scope);
            if (include_inside_local_declarations || top_level) && !out.contains(&variable) {
                out.push(variable);
            }
        }
        out
    }

    /// One instruction per line, `id: name` plus successors; used in logs and
    /// test failure output.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (id, instruction) in self.instructions() {
            let dead = if self.is_dead(id) { " (dead)" } else { "" };
            let next: Vec<String> = instruction.next.iter().map(|n| n.0.to_string()).collect();
            out.push_str(&format!(
                "{}: {} [{}] -> {}{}\n",
                id.0,
                instruction.kind.name(),
                instruction.element.0,
                next.join(","),
                dead
            ));
        }
        out
    }
}
