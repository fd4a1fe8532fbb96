//! Detection of `this` escaping from a constructor before the class's
//! non-null properties are initialized.
//!
//! The checker builds pseudocode for the class initialization (or for a
//! secondary constructor, starting from the state the class initialization
//! leaves behind), runs the initialization dataflow, and then inspects every
//! reachable read of `this` and every unqualified member call with an
//! implicit receiver. A usage is reported when it is not syntactically safe,
//! some non-null tracked property is not initialized on entry to it, and it
//! is not annotated as fragile.

use crate::context::CheckerContext;
use crate::error::{CheckerError, CheckerResult};
use crate::flow::{
    InitStates, InstructionKind, MagicKind, Pseudocode, PseudocodeBuilder, VariableInitializers,
};
use crate::trace::{BindingTrace, ReferenceTarget};
use ktc_ast::{NodeIndex, NodeKind};
use ktc_common::diagnostic_codes;
use ktc_solver::{CallableFlags, CallableId, ClassId, Container};
use rustc_hash::FxHashSet;
use tracing::{debug, debug_span, trace};

pub struct ConstructorConsistencyChecker<'a> {
    cx: &'a CheckerContext<'a>,
    declaration: NodeIndex,
    class_node: NodeIndex,
    class: ClassId,
    pseudocode: Pseudocode,
    initializers: VariableInitializers,
    /// Properties whose initialization is tracked, in declaration order.
    tracked: Vec<CallableId>,
}

impl<'a> ConstructorConsistencyChecker<'a> {
    /// Prepare a check of `declaration`, a class or one of its secondary
    /// constructors.
    pub fn new(
        cx: &'a CheckerContext<'a>,
        declaration: NodeIndex,
        trace: &dyn BindingTrace,
    ) -> CheckerResult<Self> {
        let class_node = match cx.kind(declaration)? {
            NodeKind::Class { .. } => declaration,
            NodeKind::SecondaryConstructor { .. } => cx
                .arena
                .ancestors(declaration)
                .find(|&node| matches!(cx.arena.kind(node), Some(NodeKind::Class { .. })))
                .ok_or(CheckerError::MalformedAst {
                    node: declaration.0,
                    expected: "constructor inside a class",
                })?,
            _ => {
                return Err(CheckerError::MalformedAst {
                    node: declaration.0,
                    expected: "class or secondary constructor",
                });
            }
        };
        let class = trace
            .class_descriptor(class_node)
            .ok_or(CheckerError::MissingClassDescriptor { node: class_node.0 })?;

        let class_pseudocode = PseudocodeBuilder::new(cx, trace).build_class_initializer(class_node)?;
        let tracked = tracked_properties(cx, class, &class_pseudocode);
        let class_data = VariableInitializers::compute(&class_pseudocode, &tracked, None)?;

        let (pseudocode, initializers) = if declaration == class_node {
            (class_pseudocode, class_data)
        } else {
            let initial: Option<InitStates> = class_data.exit_state().cloned();
            let pseudocode = PseudocodeBuilder::new(cx, trace).build_secondary_constructor(declaration)?;
            let initializers = VariableInitializers::compute(&pseudocode, &tracked, initial.as_ref())?;
            (pseudocode, initializers)
        };

        Ok(Self {
            cx,
            declaration,
            class_node,
            class,
            pseudocode,
            initializers,
            tracked,
        })
    }

    pub fn pseudocode(&self) -> &Pseudocode {
        &self.pseudocode
    }

    pub fn tracked_properties(&self) -> &[CallableId] {
        &self.tracked
    }

    /// Report unsafe usages into `trace`. Returns the number reported.
    pub fn check(&self, trace: &mut dyn BindingTrace) -> CheckerResult<usize> {
        let _span = debug_span!("check_constructor", declaration = self.declaration.0).entered();

        let gating: Vec<CallableId> = self
            .tracked
            .iter()
            .copied()
            .filter(|id| {
                self.cx
                    .table
                    .callable(*id)
                    .is_some_and(|d| !self.cx.types.is_nullable(d.return_type))
            })
            .collect();
        let class_name = self
            .cx
            .table
            .class(self.class)
            .map_or("<unknown>", |c| self.cx.name(c.name));

        let mut reported: FxHashSet<(NodeIndex, u32)> = FxHashSet::default();
        for id in self.pseudocode.reachable_instructions() {
            let (Some(instruction), Some(enter)) =
                (self.pseudocode.instruction(id), self.initializers.enter_data(id))
            else {
                continue;
            };
            let element = instruction.element;
            let report = match instruction.kind {
                InstructionKind::ReadValue { .. }
                    if matches!(self.cx.arena.kind(element), Some(NodeKind::This { .. })) =>
                {
                    (!self.safe_this_usage(element, trace)
                        && !all_initialized(&gating, enter)
                        && !self.marked_as_fragile(element, trace))
                    .then(|| {
                        (
                            diagnostic_codes::DANGEROUS_THIS_IN_CONSTRUCTOR,
                            class_name.to_string(),
                        )
                    })
                }
                InstructionKind::Magic {
                    kind: MagicKind::ImplicitReceiver,
                    ..
                } => match self.cx.arena.kind(element) {
                    Some(NodeKind::Call { callee, .. }) => (!self.safe_call_usage(*callee, trace)
                        && !all_initialized(&gating, enter)
                        && !self.marked_as_fragile(element, trace))
                    .then(|| {
                        (
                            diagnostic_codes::DANGEROUS_METHOD_CALL_IN_CONSTRUCTOR,
                            self.callee_name(*callee),
                        )
                    }),
                    _ => None,
                },
                _ => None,
            };
            let Some((code, argument)) = report else {
                continue;
            };
            // `finally` blocks appear more than once in the graph.
            if !reported.insert((element, code)) {
                continue;
            }
            trace!(element = element.0, code, "unsafe usage in constructor");
            trace.report_at(self.cx.arena.span(element), code, &[&argument]);
        }

        debug!(
            class = class_name,
            tracked = self.tracked.len(),
            reported = reported.len(),
            "constructor checked"
        );
        Ok(reported.len())
    }

    /// `this` of another class, a plain member selection, or an operand of an
    /// equality comparison.
    fn safe_this_usage(&self, this: NodeIndex, trace: &dyn BindingTrace) -> bool {
        if trace.reference_target(this) != Some(ReferenceTarget::Class(self.class)) {
            return true;
        }
        match self.cx.arena.kind(self.cx.arena.parent(this)) {
            Some(NodeKind::Qualified { selector, .. }) => {
                matches!(self.cx.arena.kind(*selector), Some(NodeKind::SimpleName { .. }))
            }
            Some(NodeKind::Binary { op, .. }) => op.is_equality() || op.is_identity_equality(),
            _ => false,
        }
    }

    /// The called function is declared outside the class being constructed.
    fn safe_call_usage(&self, callee: NodeIndex, trace: &dyn BindingTrace) -> bool {
        let Some(ReferenceTarget::Callable(id)) = trace.reference_target(callee) else {
            return false;
        };
        self.cx
            .table
            .callable(id)
            .is_some_and(|d| d.kind.is_function_like() && d.containing != Container::Class(self.class))
    }

    /// An annotation entry on the usage, or on a declaration enclosing it
    /// within the class, resolves to the fragile marker.
    fn marked_as_fragile(&self, element: NodeIndex, trace: &dyn BindingTrace) -> bool {
        let Some(fragile) = self.cx.table.find_class_by_fq_name(self.cx.names.fragile) else {
            return false;
        };
        let arena = self.cx.arena;
        std::iter::once(element)
            .chain(arena.ancestors(element))
            .take_while(|&node| node != self.class_node)
            .filter_map(|node| match arena.kind(node) {
                Some(
                    NodeKind::Annotated { annotations, .. }
                    | NodeKind::Property { annotations, .. }
                    | NodeKind::Function { annotations, .. }
                    | NodeKind::SecondaryConstructor { annotations, .. },
                ) => Some(annotations),
                _ => None,
            })
            .flatten()
            .any(|&entry| trace.annotation_class(entry) == Some(fragile))
    }

    fn callee_name(&self, callee: NodeIndex) -> String {
        match self.cx.arena.kind(callee) {
            Some(NodeKind::SimpleName { name }) => self.cx.name(*name).to_string(),
            _ => "<call>".to_string(),
        }
    }
}

fn all_initialized(gating: &[CallableId], enter: &InitStates) -> bool {
    gating
        .iter()
        .all(|p| enter.get(p).is_some_and(|state| state.is_initialized()))
}

/// Properties of `class` declared in its initialization pseudocode that
/// store a value and are not `lateinit`.
fn tracked_properties(cx: &CheckerContext<'_>, class: ClassId, pseudocode: &Pseudocode) -> Vec<CallableId> {
    pseudocode
        .declared_variables(false)
        .into_iter()
        .filter(|id| {
            cx.table.callable(*id).is_some_and(|d| {
                d.kind.is_property()
                    && d.containing == Container::Class(class)
                    && d.flags.contains(CallableFlags::HAS_BACKING_FIELD)
                    && !d.flags.contains(CallableFlags::LATEINIT)
            })
        })
        .collect()
}

/// Check `declaration` (a class or a secondary constructor) and report into
/// `trace`. Returns the number of diagnostics reported.
pub fn check_constructor(
    cx: &CheckerContext<'_>,
    declaration: NodeIndex,
    trace: &mut dyn BindingTrace,
) -> CheckerResult<usize> {
    let checker = ConstructorConsistencyChecker::new(cx, declaration, &*trace)?;
    checker.check(trace)
}

#[cfg(test)]
#[path = "../tests/constructor_checker_tests.rs"]
mod tests;
