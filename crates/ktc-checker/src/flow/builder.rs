//! Pseudocode construction from the typed AST.
//!
//! The builder walks one subroutine (the class-level initialization of a
//! class, or the body of a secondary constructor) in evaluation order and
//! emits instructions into a linear list. Control transfers are expressed as
//! jumps to labels; labels are bound to "the next instruction emitted" and
//! resolved in [`finish`](PseudocodeBuilder::finish), which also computes
//! predecessor edges and reachability.
//!
//! `finally` blocks are generated once per way out of the `try` (normal,
//! exceptional, and every `return`/`break`/`continue` that leaves it), so
//! one source node can own several instructions.

use crate::context::CheckerContext;
use crate::error::{CheckerError, CheckerResult};
use crate::flow::instructions::{
    Instruction, InstructionId, InstructionKind, LabelId, LexicalScope, LexicalScopeId, MagicKind,
    Pseudocode,
};
use crate::trace::{BindingTrace, ReferenceTarget};
use fixedbitset::FixedBitSet;
use ktc_ast::{BinaryOp, NodeIndex, NodeKind};
use ktc_common::limits::MAX_PSEUDOCODE_NESTING;
use ktc_solver::CallableId;
use smallvec::{SmallVec, smallvec};
use tracing::{debug, trace};

struct LoopInfo {
    continue_label: LabelId,
    break_label: LabelId,
    /// Number of enclosing `finally` blocks when the loop was entered.
    finally_depth: usize,
}

pub struct PseudocodeBuilder<'a, 't> {
    cx: &'a CheckerContext<'a>,
    trace: &'t dyn BindingTrace,
    root: NodeIndex,
    instructions: Vec<Instruction>,
    /// Label -> index of the instruction it is bound to.
    labels: Vec<Option<u32>>,
    scopes: Vec<LexicalScope>,
    current_scope: LexicalScopeId,
    loops: Vec<LoopInfo>,
    finally_blocks: Vec<NodeIndex>,
    exit_label: LabelId,
    error_label: LabelId,
    depth: u32,
}

impl<'a, 't> PseudocodeBuilder<'a, 't> {
    /// Bindings recorded by the external resolver are read from `trace`.
    pub fn new(cx: &'a CheckerContext<'a>, trace: &'t dyn BindingTrace) -> Self {
        Self {
            cx,
            trace,
            root: NodeIndex::NONE,
            instructions: Vec::new(),
            labels: Vec::new(),
            scopes: Vec::new(),
            current_scope: LexicalScopeId(0),
            loops: Vec::new(),
            finally_blocks: Vec::new(),
            exit_label: LabelId(0),
            error_label: LabelId(0),
            depth: 0,
        }
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Class-level initialization in declaration order: primary constructor
    /// parameters, property initializers and init blocks.
    pub fn build_class_initializer(mut self, class: NodeIndex) -> CheckerResult<Pseudocode> {
        let NodeKind::Class {
            primary_parameters,
            members,
            ..
        } = self.cx.kind(class)?
        else {
            return Err(CheckerError::MalformedAst {
                node: class.0,
                expected: "class",
            });
        };
        self.start(class);
        for &parameter in primary_parameters {
            self.generate_parameter(parameter)?;
        }
        for &member in members {
            match self.cx.kind(member)? {
                NodeKind::Property { initializer, .. } => {
                    let variable = self.trace.declaration(member);
                    self.emit(InstructionKind::VariableDeclaration { variable }, member);
                    if let Some(initializer) = *initializer {
                        self.generate(initializer)?;
                        self.emit(
                            InstructionKind::WriteValue {
                                target: variable,
                                lvalue: member,
                            },
                            member,
                        );
                    }
                }
                NodeKind::InitBlock { body } => self.generate(*body)?,
                // Function bodies, constructors and nested classes run later.
                _ => {}
            }
        }
        Ok(self.finish())
    }

    /// Delegation arguments and body of a secondary constructor.
    pub fn build_secondary_constructor(mut self, constructor: NodeIndex) -> CheckerResult<Pseudocode> {
        let NodeKind::SecondaryConstructor {
            delegation_arguments,
            body,
            ..
        } = self.cx.kind(constructor)?
        else {
            return Err(CheckerError::MalformedAst {
                node: constructor.0,
                expected: "secondary constructor",
            });
        };
        self.start(constructor);
        for &argument in delegation_arguments {
            self.generate(argument)?;
        }
        if let Some(body) = *body {
            self.generate(body)?;
        }
        Ok(self.finish())
    }

    fn start(&mut self, root: NodeIndex) {
        self.root = root;
        self.scopes.push(LexicalScope {
            parent: None,
            element: root,
            depth: 0,
            declaration_scope: LexicalScopeId(0),
        });
        self.current_scope = LexicalScopeId(0);
        self.exit_label = self.new_label();
        self.error_label = self.new_label();
        self.emit(InstructionKind::SubroutineEnter, root);
    }

    fn generate_parameter(&mut self, parameter: NodeIndex) -> CheckerResult<()> {
        let NodeKind::Parameter {
            declares_property,
            default_value,
            ..
        } = self.cx.kind(parameter)?
        else {
            return Err(CheckerError::MalformedAst {
                node: parameter.0,
                expected: "parameter",
            });
        };
        if let Some(default_value) = *default_value {
            self.generate(default_value)?;
        }
        if *declares_property {
            let variable = self.trace.declaration(parameter);
            self.emit(InstructionKind::VariableDeclaration { variable }, parameter);
            self.emit(
                InstructionKind::WriteValue {
                    target: variable,
                    lvalue: parameter,
                },
                parameter,
            );
        }
        Ok(())
    }

    // =========================================================================
    // Emission helpers
    // =========================================================================

    fn emit(&mut self, kind: InstructionKind, element: NodeIndex) -> InstructionId {
        let id = InstructionId(self.instructions.len() as u32);
        self.instructions.push(Instruction {
            kind,
            element,
            scope: self.current_scope,
            next: SmallVec::new(),
            previous: SmallVec::new(),
        });
        id
    }

    fn new_label(&mut self) -> LabelId {
        let label = LabelId(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    fn bind_label(&mut self, label: LabelId) {
        if let Some(slot) = self.labels.get_mut(label.0 as usize) {
            *slot = Some(self.instructions.len() as u32);
        }
    }

    fn enter_scope(&mut self, element: NodeIndex) -> LexicalScopeId {
        let saved = self.current_scope;
        let id = LexicalScopeId(self.scopes.len() as u32);
        let (depth, parent_declaration) = self
            .scopes
            .get(saved.0 as usize)
            .map_or((0, LexicalScopeId(0)), |s| (s.depth + 1, s.declaration_scope));
        let is_declaration = self.cx.arena.kind(element).is_some_and(NodeKind::is_declaration);
        self.scopes.push(LexicalScope {
            parent: Some(saved),
            element,
            depth,
            declaration_scope: if is_declaration { id } else { parent_declaration },
        });
        self.current_scope = id;
        saved
    }

    fn reference_target(&self, node: NodeIndex) -> Option<ReferenceTarget> {
        self.trace.reference_target(node)
    }

    fn callable_target(&self, node: NodeIndex) -> Option<CallableId> {
        match self.reference_target(node) {
            Some(ReferenceTarget::Callable(id)) => Some(id),
            _ => None,
        }
    }

    // =========================================================================
    // Statements and expressions
    // =========================================================================

    fn generate(&mut self, node: NodeIndex) -> CheckerResult<()> {
        if self.depth >= MAX_PSEUDOCODE_NESTING {
            trace!(node = node.0, "pseudocode nesting limit reached");
            self.emit(
                InstructionKind::Magic {
                    kind: MagicKind::Truncated,
                    target: None,
                },
                node,
            );
            return Ok(());
        }
        self.depth += 1;
        let result = self.generate_inner(node);
        self.depth -= 1;
        result
    }

    fn generate_inner(&mut self, node: NodeIndex) -> CheckerResult<()> {
        let kind = self.cx.kind(node)?;
        match kind {
            NodeKind::Block { statements } => {
                let saved = self.enter_scope(node);
                for &statement in statements {
                    self.generate(statement)?;
                }
                self.current_scope = saved;
            }
            NodeKind::LocalVariable { initializer, .. } => {
                let variable = self.trace.declaration(node);
                self.emit(InstructionKind::VariableDeclaration { variable }, node);
                if let Some(initializer) = *initializer {
                    self.generate(initializer)?;
                    self.emit(
                        InstructionKind::WriteValue {
                            target: variable,
                            lvalue: node,
                        },
                        node,
                    );
                }
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.generate(*condition)?;
                let else_label = self.new_label();
                self.emit(
                    InstructionKind::ConditionalJump {
                        target: else_label,
                        on_true: false,
                    },
                    node,
                );
                self.generate(*then_branch)?;
                match *else_branch {
                    Some(else_branch) => {
                        let end = self.new_label();
                        self.emit(InstructionKind::Jump { target: end }, node);
                        self.bind_label(else_label);
                        self.generate(else_branch)?;
                        self.bind_label(end);
                    }
                    None => self.bind_label(else_label),
                }
            }
            NodeKind::While { condition, body } => {
                let condition_label = self.new_label();
                let exit = self.new_label();
                self.bind_label(condition_label);
                self.generate(*condition)?;
                self.emit(
                    InstructionKind::ConditionalJump {
                        target: exit,
                        on_true: false,
                    },
                    node,
                );
                self.generate_loop_body(*body, condition_label, exit)?;
                self.emit(
                    InstructionKind::Jump {
                        target: condition_label,
                    },
                    node,
                );
                self.bind_label(exit);
            }
            NodeKind::DoWhile { body, condition } => {
                let body_label = self.new_label();
                let condition_label = self.new_label();
                let exit = self.new_label();
                self.bind_label(body_label);
                self.generate_loop_body(*body, condition_label, exit)?;
                self.bind_label(condition_label);
                self.generate(*condition)?;
                self.emit(
                    InstructionKind::ConditionalJump {
                        target: body_label,
                        on_true: true,
                    },
                    node,
                );
                self.bind_label(exit);
            }
            NodeKind::Break | NodeKind::Continue => {
                let Some(info) = self.loops.last() else {
                    return Err(CheckerError::MalformedAst {
                        node: node.0,
                        expected: "statement inside a loop",
                    });
                };
                let target = if matches!(kind, NodeKind::Break) {
                    info.break_label
                } else {
                    info.continue_label
                };
                let finally_depth = info.finally_depth;
                self.generate_pending_finally(finally_depth)?;
                self.emit(InstructionKind::Jump { target }, node);
            }
            NodeKind::Return { value } => {
                if let Some(value) = *value {
                    self.generate(value)?;
                }
                self.generate_pending_finally(0)?;
                self.emit(
                    InstructionKind::Jump {
                        target: self.exit_label,
                    },
                    node,
                );
            }
            NodeKind::Throw { value } => {
                self.generate(*value)?;
                self.emit(
                    InstructionKind::Jump {
                        target: self.error_label,
                    },
                    node,
                );
            }
            NodeKind::Try {
                body,
                catches,
                finally,
            } => self.generate_try(node, *body, catches, *finally)?,
            NodeKind::Catch { body, .. } => self.generate(*body)?,
            NodeKind::Assignment { target, value } => self.generate_assignment(node, *target, *value)?,
            NodeKind::Binary { op, left, right } => self.generate_binary(node, *op, *left, *right)?,
            NodeKind::This { .. } | NodeKind::SimpleName { .. } => {
                let target = self.reference_target(node);
                self.emit(InstructionKind::ReadValue { target }, node);
            }
            NodeKind::Qualified {
                receiver,
                selector,
                safe,
            } => {
                self.generate(*receiver)?;
                if *safe {
                    let skip = self.new_label();
                    self.emit(
                        InstructionKind::ConditionalJump {
                            target: skip,
                            on_true: false,
                        },
                        node,
                    );
                    self.generate(*selector)?;
                    self.bind_label(skip);
                } else {
                    self.generate(*selector)?;
                }
            }
            NodeKind::Call { callee, arguments } => self.generate_call(node, *callee, arguments)?,
            NodeKind::Literal { .. } => {
                self.emit(InstructionKind::LoadConstant, node);
            }
            NodeKind::Annotated { expression, .. } => self.generate(*expression)?,
            NodeKind::CallableReference { .. } | NodeKind::TypeReference { .. } => {
                self.emit(InstructionKind::Mark, node);
            }
            NodeKind::AnnotationEntry { .. } => {}
            NodeKind::File { .. }
            | NodeKind::Class { .. }
            | NodeKind::Function { .. }
            | NodeKind::SecondaryConstructor { .. }
            | NodeKind::Parameter { .. }
            | NodeKind::Property { .. }
            | NodeKind::InitBlock { .. } => {
                // Local declarations run on their own schedule.
                self.emit(InstructionKind::Mark, node);
            }
        }
        Ok(())
    }

    fn generate_loop_body(
        &mut self,
        body: NodeIndex,
        continue_label: LabelId,
        break_label: LabelId,
    ) -> CheckerResult<()> {
        self.loops.push(LoopInfo {
            continue_label,
            break_label,
            finally_depth: self.finally_blocks.len(),
        });
        let result = self.generate(body);
        self.loops.pop();
        result
    }

    /// Inline the `finally` blocks entered after `from_depth`, innermost first.
    fn generate_pending_finally(&mut self, from_depth: usize) -> CheckerResult<()> {
        let pending: Vec<NodeIndex> = self
            .finally_blocks
            .get(from_depth..)
            .unwrap_or_default()
            .iter()
            .rev()
            .copied()
            .collect();
        let saved = std::mem::take(&mut self.finally_blocks);
        let mut result = Ok(());
        for (i, block) in pending.into_iter().enumerate() {
            // A finally block runs with only the blocks outside it still pending.
            self.finally_blocks = saved[..saved.len() - 1 - i].to_vec();
            result = self.generate(block);
            if result.is_err() {
                break;
            }
        }
        self.finally_blocks = saved;
        result
    }

    fn generate_try(
        &mut self,
        node: NodeIndex,
        body: NodeIndex,
        catches: &[NodeIndex],
        finally: Option<NodeIndex>,
    ) -> CheckerResult<()> {
        let catch_labels: SmallVec<[LabelId; 2]> = catches.iter().map(|_| self.new_label()).collect();
        let exceptional_finally = finally.map(|_| self.new_label());
        let mut targets = catch_labels.clone();
        targets.extend(exceptional_finally);
        self.emit(InstructionKind::NondeterministicJump { targets }, node);

        if let Some(finally) = finally {
            self.finally_blocks.push(finally);
        }
        let after = self.new_label();
        let mut result = self.generate(body);
        if result.is_ok() {
            self.emit(InstructionKind::Jump { target: after }, node);
            for (&handler, &label) in catches.iter().zip(&catch_labels) {
                self.bind_label(label);
                result = self.generate(handler);
                if result.is_err() {
                    break;
                }
                self.emit(InstructionKind::Jump { target: after }, node);
            }
        }
        if finally.is_some() {
            self.finally_blocks.pop();
        }
        result?;

        match (finally, exceptional_finally) {
            (Some(finally), Some(label)) => {
                self.bind_label(label);
                self.generate(finally)?;
                self.emit(
                    InstructionKind::Jump {
                        target: self.error_label,
                    },
                    node,
                );
                self.bind_label(after);
                self.generate(finally)?;
            }
            _ => self.bind_label(after),
        }
        Ok(())
    }

    fn generate_assignment(&mut self, node: NodeIndex, target: NodeIndex, value: NodeIndex) -> CheckerResult<()> {
        let written = match self.cx.kind(target)? {
            NodeKind::SimpleName { .. } => {
                self.generate(value)?;
                self.callable_target(target)
            }
            NodeKind::Qualified {
                receiver, selector, ..
            } => {
                let (receiver, selector) = (*receiver, *selector);
                self.generate(receiver)?;
                self.generate(value)?;
                self.callable_target(selector)
            }
            _ => {
                self.generate(target)?;
                self.generate(value)?;
                None
            }
        };
        self.emit(
            InstructionKind::WriteValue {
                target: written,
                lvalue: target,
            },
            node,
        );
        Ok(())
    }

    fn generate_binary(
        &mut self,
        node: NodeIndex,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> CheckerResult<()> {
        self.generate(left)?;
        if op.is_short_circuit() {
            // `&&` skips the right side when the left is false; `||` and `?:`
            // when it is true (non-null).
            let end = self.new_label();
            self.emit(
                InstructionKind::ConditionalJump {
                    target: end,
                    on_true: op != BinaryOp::AndAnd,
                },
                node,
            );
            self.generate(right)?;
            self.bind_label(end);
            self.emit(InstructionKind::Mark, node);
        } else {
            self.generate(right)?;
            let callee = self.trace.resolved_call(node);
            self.emit(InstructionKind::Call { callee }, node);
        }
        Ok(())
    }

    fn generate_call(&mut self, node: NodeIndex, callee: NodeIndex, arguments: &[NodeIndex]) -> CheckerResult<()> {
        let target = match self.cx.kind(callee)? {
            NodeKind::SimpleName { .. } => {
                let target = self.callable_target(callee);
                if !self.is_qualified_selector(node)
                    && let Some(id) = target
                    && self
                        .cx
                        .table
                        .callable(id)
                        .is_some_and(|d| d.dispatch_receiver.is_some() || d.extension_receiver.is_some())
                {
                    self.emit(
                        InstructionKind::Magic {
                            kind: MagicKind::ImplicitReceiver,
                            target: Some(id),
                        },
                        node,
                    );
                }
                target
            }
            _ => {
                self.generate(callee)?;
                None
            }
        };
        for &argument in arguments {
            self.generate(argument)?;
        }
        self.emit(InstructionKind::Call { callee: target }, node);
        Ok(())
    }

    /// `node` is the selector of a qualified expression, so its receiver is explicit.
    fn is_qualified_selector(&self, node: NodeIndex) -> bool {
        let parent = self.cx.arena.parent(node);
        matches!(
            self.cx.arena.kind(parent),
            Some(NodeKind::Qualified { selector, .. }) if *selector == node
        )
    }

    // =========================================================================
    // Finish
    // =========================================================================

    fn finish(mut self) -> Pseudocode {
        self.bind_label(self.exit_label);
        let exit = self.emit(InstructionKind::SubroutineExit, self.root);
        self.bind_label(self.error_label);
        let error = self.emit(InstructionKind::SubroutineError, self.root);
        let sink = self.emit(InstructionKind::SubroutineSink, self.root);

        let count = self.instructions.len();
        let resolve = |labels: &[Option<u32>], label: LabelId| -> Option<InstructionId> {
            labels
                .get(label.0 as usize)
                .copied()
                .flatten()
                .filter(|&index| (index as usize) < count)
                .map(InstructionId)
        };

        for index in 0..count {
            let fall_through = InstructionId(index as u32 + 1);
            let next: SmallVec<[InstructionId; 2]> = match &self.instructions[index].kind {
                InstructionKind::SubroutineExit | InstructionKind::SubroutineError => smallvec![sink],
                InstructionKind::SubroutineSink => SmallVec::new(),
                InstructionKind::Jump { target } => resolve(&self.labels, *target).into_iter().collect(),
                InstructionKind::ConditionalJump { target, .. } => {
                    let mut next: SmallVec<[InstructionId; 2]> = smallvec![fall_through];
                    next.extend(resolve(&self.labels, *target));
                    next
                }
                InstructionKind::NondeterministicJump { targets } => {
                    let mut next: SmallVec<[InstructionId; 2]> = smallvec![fall_through];
                    next.extend(targets.iter().filter_map(|t| resolve(&self.labels, *t)));
                    next
                }
                _ => smallvec![fall_through],
            };
            let mut deduped: SmallVec<[InstructionId; 2]> = SmallVec::new();
            for id in next {
                if !deduped.contains(&id) {
                    deduped.push(id);
                }
            }
            self.instructions[index].next = deduped;
        }

        for index in 0..count {
            let next = self.instructions[index].next.clone();
            for successor in next {
                if let Some(instruction) = self.instructions.get_mut(successor.index()) {
                    instruction.previous.push(InstructionId(index as u32));
                }
            }
        }

        let mut reachable = FixedBitSet::with_capacity(count);
        let mut worklist = vec![InstructionId(0)];
        while let Some(id) = worklist.pop() {
            if id.index() >= count || reachable.put(id.index()) {
                continue;
            }
            worklist.extend(self.instructions[id.index()].next.iter().copied());
        }

        debug!(
            root = self.root.0,
            instructions = count,
            reachable = reachable.count_ones(..),
            "built pseudocode"
        );

        Pseudocode {
            root: self.root,
            instructions: self.instructions,
            scopes: self.scopes,
            reachable,
            enter: InstructionId(0),
            exit,
            error,
            sink,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/pseudocode_tests.rs"]
mod tests;
