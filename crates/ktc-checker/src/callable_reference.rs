//! Callable reference resolution (`Type::name` and `::name`).
//!
//! With no left-hand side the name is resolved directly in the ambient
//! scope. With a class on the left, three speculative trials run in order:
//! the class's static scope, the constructors of its nested classes, and
//! finally member/extension lookup with an instance of the class as
//! receiver. Each trial runs in its own [`TemporaryTrace`] and the accept
//! policy decides whether its writes reach the caller's trace. The first
//! trial that finds *something* wins; an ambiguity is terminal for the
//! reference and never falls through to a later scope.

use crate::call_resolver::{
    CallResolver, OverloadResolutionResults, ReferenceCall, ResolveArgumentsMode,
};
use crate::context::{CheckArgumentTypesMode, CheckerContext, ExpectedType, ResolutionContext};
use crate::error::{CheckerError, CheckerResult};
use crate::options::CallableReferenceMode;
use crate::scope::ResolutionScope;
use crate::trace::{
    AnonymousFunction, AnonymousVariable, BindingKey, BindingTrace, BindingValue, TemporaryTrace,
};
use ktc_ast::{NodeIndex, NodeKind};
use ktc_common::{Atom, diagnostic_codes};
use ktc_solver::reflection::{ReflectionRefusal, reflection_type};
use ktc_solver::{CallableId, ClassId, TypeId};
use tracing::{debug, debug_span, trace};

/// Outcome of [`CallableReferenceResolver::resolve_callable_reference_target`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TargetResolution {
    /// The uniquely resolved callable.
    pub descriptor: Option<CallableId>,
    /// Resolution found at least one candidate, possibly ambiguously.
    pub resolved_to_something: bool,
}

pub struct CallableReferenceResolver<'a> {
    cx: &'a CheckerContext<'a>,
    calls: CallResolver<'a>,
}

impl<'a> CallableReferenceResolver<'a> {
    pub fn new(cx: &'a CheckerContext<'a>) -> Self {
        Self {
            cx,
            calls: CallResolver::new(cx),
        }
    }

    /// Callee node and referenced name of a callable reference expression.
    fn reference_parts(&self, expression: NodeIndex) -> CheckerResult<(NodeIndex, Atom)> {
        let malformed = CheckerError::MalformedAst {
            node: expression.0,
            expected: "callable reference",
        };
        let NodeKind::CallableReference { callee, .. } = self.cx.kind(expression)? else {
            return Err(malformed);
        };
        match self.cx.arena.kind(*callee) {
            Some(NodeKind::SimpleName { name }) => Ok((*callee, *name)),
            _ => Err(malformed),
        }
    }

    fn lhs_class(&self, lhs: TypeId) -> Option<ClassId> {
        self.cx.types.lookup(lhs).and_then(|data| data.class_id())
    }

    // =========================================================================
    // Trials
    // =========================================================================

    /// Resolve the reference as far as `mode` requires.
    ///
    /// Returns `None` when the left-hand side is not a class or no trial
    /// found anything; otherwise the results of the winning trial, whose
    /// writes have been committed into `trace` if `mode` accepted them.
    pub fn resolve_possibly_ambiguous_callable_reference(
        &self,
        expression: NodeIndex,
        lhs: Option<TypeId>,
        ctx: &ResolutionContext,
        trace: &mut dyn BindingTrace,
        mode: ResolveArgumentsMode,
    ) -> CheckerResult<Option<OverloadResolutionResults>> {
        let (callee, name) = self.reference_parts(expression)?;
        let text = self.cx.name(name);
        let _span = debug_span!("resolve_callable_reference", name = text, ?mode).entered();

        let Some(lhs) = lhs else {
            let call = ReferenceCall {
                reference: callee,
                name,
                receiver: None,
            };
            return Ok(Some(self.resolve_as_function(&call, ctx, trace, mode)));
        };

        let Some(class) = self.lhs_class(lhs) else {
            debug!(name = text, "left-hand side is not a class");
            trace.report_at(
                self.cx.arena.span(expression),
                diagnostic_codes::CALLABLE_REFERENCE_LHS_NOT_A_CLASS,
                &[],
            );
            return Ok(None);
        };

        let in_scope = |title: String, scope: ResolutionScope, trace: &mut dyn BindingTrace| {
            let mut temporary = TemporaryTrace::new(trace, title);
            let call = ReferenceCall {
                reference: callee,
                name,
                receiver: None,
            };
            let results =
                self.resolve_as_function(&call, &ctx.replace_scope(scope), &mut temporary, mode);
            mode.accept_resolution(&results, temporary);
            results
        };

        let statics = in_scope(
            format!("trace to resolve ::{text} in static scope"),
            ResolutionScope::Static(class),
            &mut *trace,
        );
        if statics.is_something() {
            return Ok(Some(statics));
        }

        let nested = in_scope(
            format!("trace to resolve ::{text} in static nested classes scope"),
            ResolutionScope::NestedClassifiers(class),
            &mut *trace,
        );
        if nested.is_something() {
            return Ok(Some(nested));
        }

        let with_receiver = {
            let mut temporary = TemporaryTrace::new(trace, format!("trace to resolve ::{text} with receiver"));
            let call = ReferenceCall {
                reference: callee,
                name,
                receiver: Some(lhs),
            };
            let results = self.resolve_as_function(&call, ctx, &mut temporary, mode);
            mode.accept_resolution(&results, temporary);
            results
        };
        if with_receiver.is_something() {
            return Ok(Some(with_receiver));
        }

        trace!(name = text, "no trial found a candidate");
        Ok(None)
    }

    /// The innermost trial: overload resolution against the expected
    /// callable type.
    fn resolve_as_function(
        &self,
        call: &ReferenceCall,
        ctx: &ResolutionContext,
        trace: &mut dyn BindingTrace,
        mode: ResolveArgumentsMode,
    ) -> OverloadResolutionResults {
        let title = format!("trace to resolve ::{} as function", self.cx.name(call.name));
        let mut temporary = TemporaryTrace::new(trace, title);
        let ctx = ctx.replace_check_arguments(CheckArgumentTypesMode::CheckCallableType);
        let results = self.calls.resolve_call_for_member(call, &ctx, &mut temporary);
        mode.accept_resolution(&results, temporary);
        results
    }

    /// Resolve the reference fully and pick its unique target.
    pub fn resolve_callable_reference_target(
        &self,
        expression: NodeIndex,
        lhs: Option<TypeId>,
        ctx: &ResolutionContext,
        trace: &mut dyn BindingTrace,
    ) -> CheckerResult<TargetResolution> {
        let results = self.resolve_possibly_ambiguous_callable_reference(
            expression,
            lhs,
            ctx,
            trace,
            ResolveArgumentsMode::ResolveFunctionArguments,
        )?;
        Ok(match results {
            Some(results) if results.is_something() => TargetResolution {
                descriptor: results.resulting_descriptor(self.cx, ctx.dependency),
                resolved_to_something: true,
            },
            _ => TargetResolution::default(),
        })
    }

    // =========================================================================
    // Reflective types
    // =========================================================================

    fn reflection_type_for(
        &self,
        expression: Option<NodeIndex>,
        descriptor: CallableId,
        ctx: &ResolutionContext,
        trace: Option<&mut dyn BindingTrace>,
        bind: bool,
    ) -> CheckerResult<Option<TypeId>> {
        let desc = self.cx.callable(descriptor)?;
        let ty = match reflection_type(self.cx.types, desc) {
            Ok(ty) => ty,
            Err(ReflectionRefusal::MemberExtension) => {
                if let (Some(expression), Some(trace)) = (expression, trace) {
                    let (callee, _) = self.reference_parts(expression)?;
                    let name = self.cx.formatter().format_callable_name(descriptor);
                    trace.report_at(
                        self.cx.arena.span(callee),
                        diagnostic_codes::EXTENSION_IN_CLASS_REFERENCE_NOT_ALLOWED,
                        &[&name],
                    );
                }
                return Ok(None);
            }
            Err(ReflectionRefusal::Variable) => {
                if let (Some(expression), Some(trace)) = (expression, trace) {
                    let (callee, _) = self.reference_parts(expression)?;
                    trace.report_at(
                        self.cx.arena.span(callee),
                        diagnostic_codes::UNSUPPORTED,
                        &["References to variables aren't supported yet"],
                    );
                }
                return Ok(None);
            }
            Err(ReflectionRefusal::UnsupportedKind(kind)) => {
                return Err(CheckerError::UnsupportedDescriptor {
                    name: self.cx.formatter().format_callable_name(descriptor),
                    kind,
                });
            }
        };

        if let (true, Some(expression), Some(trace)) = (bind, expression, trace) {
            let container = ctx.containing_declaration(self.cx.scopes);
            if desc.kind.is_function_like() {
                trace.record(
                    BindingKey::Function(expression),
                    BindingValue::Function(AnonymousFunction {
                        container,
                        function_type: ty,
                    }),
                );
            } else {
                trace.record(
                    BindingKey::Variable(expression),
                    BindingValue::Variable(AnonymousVariable {
                        container,
                        variable_type: ty,
                        mutable: false,
                    }),
                );
            }
        }
        Ok(Some(ty))
    }

    /// Reflective type of a reference to `descriptor`, without reporting or
    /// binding anything.
    pub fn get_reflection_type_for_callable_descriptor(
        &self,
        descriptor: CallableId,
        ctx: &ResolutionContext,
    ) -> CheckerResult<Option<TypeId>> {
        self.reflection_type_for(None, descriptor, ctx, None, false)
    }

    /// Reflective type of `expression` resolved to `descriptor`. Refusals are
    /// reported on the callee; the synthesized function or variable is bound
    /// to the expression.
    pub fn create_reflection_type_for_resolved_callable_reference(
        &self,
        expression: NodeIndex,
        descriptor: CallableId,
        ctx: &ResolutionContext,
        trace: &mut dyn BindingTrace,
    ) -> CheckerResult<Option<TypeId>> {
        self.reflection_type_for(Some(expression), descriptor, ctx, Some(trace), true)
    }

    /// Type of a reference resolved only for its shape.
    ///
    /// A unique target gets its reflective type with refusals reported, but
    /// nothing is bound to the expression.
    pub fn resolved_callable_reference_shape_type(
        &self,
        expression: NodeIndex,
        results: Option<&OverloadResolutionResults>,
        ctx: &ResolutionContext,
        trace: &mut dyn BindingTrace,
    ) -> CheckerResult<Option<TypeId>> {
        let Some(results) = results else {
            return Ok(None);
        };
        if let OverloadResolutionResults::Success(_) = results {
            return match results.resulting_descriptor(self.cx, ctx.dependency) {
                Some(descriptor) => {
                    self.reflection_type_for(Some(expression), descriptor, ctx, Some(trace), false)
                }
                None => Ok(None),
            };
        }
        if ctx.expected_type.is_unknown() {
            return Ok(Some(TypeId::FUNCTION_PLACEHOLDER));
        }
        Ok(Some(self.cx.types.function(
            None,
            std::iter::empty(),
            TypeId::DONT_CARE,
            false,
        )))
    }

    // =========================================================================
    // Entry point
    // =========================================================================

    /// Resolve `expression` per the configured mode and record its type.
    pub fn resolve_callable_reference(
        &self,
        expression: NodeIndex,
        lhs: Option<TypeId>,
        ctx: &ResolutionContext,
        trace: &mut dyn BindingTrace,
    ) -> CheckerResult<Option<TypeId>> {
        let ty = match self.cx.options.callable_reference_mode {
            CallableReferenceMode::Shape => {
                let shape_ctx = ctx.replace_expected_type(ExpectedType::NoExpectedType);
                let results = self.resolve_possibly_ambiguous_callable_reference(
                    expression,
                    lhs,
                    &shape_ctx,
                    trace,
                    ResolveArgumentsMode::ShapeFunctionArguments,
                )?;
                self.resolved_callable_reference_shape_type(expression, results.as_ref(), ctx, trace)?
            }
            CallableReferenceMode::Resolve => {
                let target = self.resolve_callable_reference_target(expression, lhs, ctx, trace)?;
                // A rejected left-hand side has already been reported.
                let lhs_rejected = lhs.is_some_and(|ty| self.lhs_class(ty).is_none());
                if !target.resolved_to_something && !lhs_rejected {
                    let (callee, name) = self.reference_parts(expression)?;
                    trace.report_at(
                        self.cx.arena.span(callee),
                        diagnostic_codes::UNRESOLVED_REFERENCE,
                        &[self.cx.name(name)],
                    );
                }
                match target.descriptor {
                    Some(descriptor) => self
                        .create_reflection_type_for_resolved_callable_reference(
                            expression, descriptor, ctx, trace,
                        )?,
                    None => None,
                }
            }
        };
        if let Some(ty) = ty {
            trace.record(BindingKey::ExpressionType(expression), BindingValue::Type(ty));
        }
        Ok(ty)
    }
}
