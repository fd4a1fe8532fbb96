//! Overload resolution for callable references.
//!
//! Candidates named like the reference are gathered in priority levels:
//! the explicit lookup scope first (one level per lexical scope, nearest
//! first), then members of the receiver type and its supertypes, then
//! extensions visible in the lexical scope. The first level with any
//! applicable candidate decides the outcome, so a nearer declaration shadows
//! farther ones and two applicable candidates on one level are an
//! ambiguity rather than a reason to look further.

use crate::context::{CheckArgumentTypesMode, CheckerContext, ContextDependency, ResolutionContext};
use crate::options::CallableReferenceMode;
use crate::trace::{BindingKey, BindingTrace, BindingValue, ReferenceTarget, TemporaryTrace};
use ktc_ast::NodeIndex;
use ktc_common::{Atom, diagnostic_codes};
use ktc_solver::overrides::all_overridden;
use ktc_solver::reflection::reference_receiver;
use ktc_solver::{CallableDescriptor, CallableId, TypeId};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

// =============================================================================
// Results
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverloadResolutionResults {
    Success(CallableId),
    /// Several applicable candidates on the deciding level.
    Ambiguity(Vec<CallableId>),
    Nothing,
}

impl OverloadResolutionResults {
    pub fn is_single_result(&self) -> bool {
        matches!(self, OverloadResolutionResults::Success(_))
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, OverloadResolutionResults::Nothing)
    }

    /// Found something, even if not uniquely.
    pub fn is_something(&self) -> bool {
        !self.is_nothing()
    }

    pub fn is_ambiguity(&self) -> bool {
        matches!(self, OverloadResolutionResults::Ambiguity(_))
    }

    pub fn candidates(&self) -> &[CallableId] {
        match self {
            OverloadResolutionResults::Success(id) => std::slice::from_ref(id),
            OverloadResolutionResults::Ambiguity(ids) => ids,
            OverloadResolutionResults::Nothing => &[],
        }
    }

    /// The resolved callable, if resolution produced exactly one.
    ///
    /// In an independent context a callable whose return type was never
    /// inferred does not count as resolved; a dependent context leaves that
    /// to the enclosing call.
    pub fn resulting_descriptor(
        &self,
        cx: &CheckerContext<'_>,
        dependency: ContextDependency,
    ) -> Option<CallableId> {
        let OverloadResolutionResults::Success(id) = self else {
            return None;
        };
        if dependency == ContextDependency::Independent
            && cx
                .table
                .callable(*id)
                .is_some_and(|d| d.return_type == TypeId::DONT_CARE)
        {
            return None;
        }
        Some(*id)
    }
}

// =============================================================================
// Accept policy
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveArgumentsMode {
    /// Only the shape of the result is needed; commit unique results.
    ShapeFunctionArguments,
    /// Full resolution; commit anything that was found, ambiguities included.
    ResolveFunctionArguments,
}

impl ResolveArgumentsMode {
    /// Commit `trace` if `results` satisfy this mode, otherwise discard it.
    /// Returns whether the trace was committed.
    pub fn accept_resolution(self, results: &OverloadResolutionResults, trace: TemporaryTrace<'_>) -> bool {
        let accept = match self {
            ResolveArgumentsMode::ShapeFunctionArguments => results.is_single_result(),
            ResolveArgumentsMode::ResolveFunctionArguments => results.is_something(),
        };
        if accept {
            trace.commit();
        } else {
            trace.discard();
        }
        accept
    }
}

impl From<CallableReferenceMode> for ResolveArgumentsMode {
    fn from(mode: CallableReferenceMode) -> Self {
        match mode {
            CallableReferenceMode::Shape => ResolveArgumentsMode::ShapeFunctionArguments,
            CallableReferenceMode::Resolve => ResolveArgumentsMode::ResolveFunctionArguments,
        }
    }
}

// =============================================================================
// CallResolver
// =============================================================================

/// A reference treated as a call without value arguments.
#[derive(Clone, Copy, Debug)]
pub struct ReferenceCall {
    /// The callee name node; bindings and diagnostics attach here.
    pub reference: NodeIndex,
    pub name: Atom,
    /// Explicit receiver type, for `Type::name` resolved through an instance.
    pub receiver: Option<TypeId>,
}

type Level = SmallVec<[CallableId; 4]>;

pub struct CallResolver<'a> {
    cx: &'a CheckerContext<'a>,
}

impl<'a> CallResolver<'a> {
    pub fn new(cx: &'a CheckerContext<'a>) -> Self {
        Self { cx }
    }

    pub fn resolve_call_for_member(
        &self,
        call: &ReferenceCall,
        ctx: &ResolutionContext,
        trace: &mut dyn BindingTrace,
    ) -> OverloadResolutionResults {
        let expected_arity = match ctx.check_arguments {
            CheckArgumentTypesMode::CheckCallableType => ctx.expected_type.function_arity(self.cx.types),
            CheckArgumentTypesMode::CheckValueArguments => None,
        };
        let name = self.cx.name(call.name);
        let span = self.cx.arena.span(call.reference);

        for (index, level) in self.candidate_levels(call, ctx).into_iter().enumerate() {
            let applicable: Vec<CallableId> = level
                .into_iter()
                .filter(|id| {
                    self.cx
                        .table
                        .callable(*id)
                        .is_some_and(|d| self.is_applicable(d, call, expected_arity))
                })
                .collect();
            trace!(name, level = index, applicable = applicable.len(), "candidate level");
            match applicable.as_slice() {
                [] => {}
                [single] => {
                    let single = *single;
                    trace.record(
                        BindingKey::ResolvedCall(call.reference),
                        BindingValue::Callable(single),
                    );
                    trace.record(
                        BindingKey::ReferenceTarget(call.reference),
                        BindingValue::Target(ReferenceTarget::Callable(single)),
                    );
                    debug!(name, callable = single.0, "resolved reference");
                    return OverloadResolutionResults::Success(single);
                }
                many => {
                    let candidates = self.cx.formatter().format_candidates(many);
                    trace.report_at(
                        span,
                        diagnostic_codes::CALLABLE_REFERENCE_RESOLUTION_AMBIGUITY,
                        &[&candidates],
                    );
                    debug!(name, count = many.len(), "ambiguous reference");
                    return OverloadResolutionResults::Ambiguity(applicable);
                }
            }
        }

        trace.report_at(span, diagnostic_codes::UNRESOLVED_REFERENCE, &[name]);
        OverloadResolutionResults::Nothing
    }

    fn candidate_levels(&self, call: &ReferenceCall, ctx: &ResolutionContext) -> Vec<Level> {
        let table = self.cx.table;
        let Some(receiver) = call.receiver else {
            return ctx
                .scope
                .candidate_levels(self.cx.scopes, table, call.name)
                .into_iter()
                .map(Level::from_vec)
                .collect();
        };

        let mut levels = Vec::new();
        levels.push(self.member_candidates(receiver, call.name));
        if let Some(lexical) = ctx.scope.lexical() {
            for scope in self.cx.scopes.chain(lexical) {
                let Some(data) = self.cx.scopes.get(scope) else {
                    continue;
                };
                levels.push(
                    data.declarations
                        .iter()
                        .copied()
                        .filter(|id| {
                            table
                                .callable(*id)
                                .is_some_and(|d| d.name == call.name && d.extension_receiver.is_some())
                        })
                        .collect(),
                );
            }
        }
        levels
    }

    /// Members named `name` of the receiver's class and its supertypes, with
    /// overridden declarations dropped in favour of their overrides. Inner
    /// class constructors count as members.
    fn member_candidates(&self, receiver: TypeId, name: Atom) -> Level {
        let Some(class) = self.cx.types.lookup(receiver).and_then(|d| d.class_id()) else {
            return Level::new();
        };
        let table = self.cx.table;
        let mut found: Level = Level::new();
        let mut classes = vec![class];
        classes.extend(self.cx.hierarchy().supertype_closure(class));
        for owner in classes {
            let members = table.members_named(owner, name);
            let inner = table.inner_class_constructors_named(owner, name);
            for id in members.into_iter().chain(inner) {
                if !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        let overridden: FxHashSet<CallableId> = found
            .iter()
            .flat_map(|id| all_overridden(table, *id))
            .collect();
        found.retain(|id| !overridden.contains(id));
        found
    }

    fn is_applicable(
        &self,
        candidate: &CallableDescriptor,
        call: &ReferenceCall,
        expected_arity: Option<usize>,
    ) -> bool {
        let receiver_ok = match (call.receiver, candidate.extension_receiver) {
            (None, None) => true,
            (None, Some(_)) => false,
            // Only members of the receiver's class reach this level.
            (Some(_), None) => true,
            (Some(receiver), Some(expected)) => {
                candidate.dispatch_receiver.is_some()
                    || self.cx.hierarchy().is_receiver_applicable(self.cx.types, receiver, expected)
            }
        };
        if !receiver_ok {
            return false;
        }
        match expected_arity {
            Some(arity) => reference_arity(candidate) == arity,
            None => true,
        }
    }
}

/// Parameter count of the reflective type of a reference to `candidate`.
fn reference_arity(candidate: &CallableDescriptor) -> usize {
    let receiver = usize::from(reference_receiver(candidate).is_some());
    if candidate.kind.is_function_like() {
        candidate.value_parameters.len() + receiver
    } else {
        receiver
    }
}

#[cfg(test)]
#[path = "../tests/call_resolver_tests.rs"]
mod tests;
