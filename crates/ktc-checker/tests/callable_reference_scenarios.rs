//! Callable reference resolution through the public API.

mod support;

use ktc_checker::trace::{AnonymousVariable, BindingTrace};
use ktc_checker::{
    CallableReferenceMode, CallableReferenceResolver, CheckerError, ExpectedType, ResolutionContext,
    ResolutionScope, ScopeId, TargetResolution,
};
use ktc_common::diagnostic_codes::{
    CALLABLE_REFERENCE_LHS_NOT_A_CLASS, CALLABLE_REFERENCE_RESOLUTION_AMBIGUITY,
    EXTENSION_IN_CLASS_REFERENCE_NOT_ALLOWED, UNRESOLVED_REFERENCE, UNSUPPORTED,
};
use ktc_ast::NodeIndex;
use ktc_solver::{
    CallableDescriptor, CallableFlags, CallableId, CallableKind, ClassDescriptor, Container, TypeId,
};
use support::Fixture;

fn package_scope(fx: &mut Fixture, declarations: Vec<CallableId>) -> ScopeId {
    fx.scopes.add(None, Container::Package, declarations)
}

fn resolve(
    fx: &mut Fixture,
    expression: NodeIndex,
    lhs: Option<TypeId>,
    ctx: &ResolutionContext,
) -> Option<TypeId> {
    fx.run(|cx, trace| CallableReferenceResolver::new(cx).resolve_callable_reference(expression, lhs, ctx, trace))
        .expect("resolution should not fail")
}

/// Class `C` with static `make()`, `make(Int)` (optional) and an instance `make()`.
fn statics_fixture(ambiguous: bool) -> (Fixture, TypeId, CallableId, ScopeId) {
    let mut fx = Fixture::new();
    let int = fx.int;
    let (c, c_type) = fx.class("C");
    let static_make = fx.static_method(c, "make", &[], int);
    if ambiguous {
        fx.static_method(c, "make", &[int], int);
    }
    fx.method(c, "make", &[], int);
    let scope = package_scope(&mut fx, Vec::new());
    (fx, c_type, static_make, scope)
}

// =============================================================================
// Static, nested and receiver trials
// =============================================================================

#[test]
fn static_member_is_preferred_over_instance_member() {
    let (mut fx, c_type, static_make, scope) = statics_fixture(false);
    let receiver = fx.type_reference("C");
    let (expression, callee) = fx.callable_reference(Some(receiver), "make");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    let ty = resolve(&mut fx, expression, Some(c_type), &ctx);

    let int = fx.int;
    assert_eq!(ty, Some(fx.types.function(None, [], int, true)));
    assert_eq!(fx.trace.resolved_call(callee), Some(static_make));
    assert_eq!(fx.trace.expression_type(expression), ty);
    assert!(fx.codes().is_empty(), "{:?}", fx.messages());
}

#[test]
fn ambiguity_in_static_scope_does_not_fall_through() {
    let (mut fx, c_type, _, scope) = statics_fixture(true);
    let receiver = fx.type_reference("C");
    let (expression, callee) = fx.callable_reference(Some(receiver), "make");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    let ty = resolve(&mut fx, expression, Some(c_type), &ctx);

    assert_eq!(ty, None);
    assert_eq!(fx.codes(), vec![CALLABLE_REFERENCE_RESOLUTION_AMBIGUITY]);
    assert_eq!(
        fx.messages(),
        vec!["Callable reference resolution ambiguity: C.make(), C.make(Int)".to_string()]
    );
    assert_eq!(fx.trace.resolved_call(callee), None);
}

#[test]
fn shape_mode_ambiguity_yields_placeholder_without_diagnostics() {
    let (mut fx, c_type, _, scope) = statics_fixture(true);
    fx.options.callable_reference_mode = CallableReferenceMode::Shape;
    let receiver = fx.type_reference("C");
    let (expression, _) = fx.callable_reference(Some(receiver), "make");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    let ty = resolve(&mut fx, expression, Some(c_type), &ctx);

    assert_eq!(ty, Some(TypeId::FUNCTION_PLACEHOLDER));
    assert!(fx.codes().is_empty(), "{:?}", fx.messages());
}

#[test]
fn shape_mode_ambiguity_with_expected_type_yields_unknown_function() {
    let (mut fx, c_type, _, scope) = statics_fixture(true);
    fx.options.callable_reference_mode = CallableReferenceMode::Shape;
    let receiver = fx.type_reference("C");
    let (expression, _) = fx.callable_reference(Some(receiver), "make");
    let int = fx.int;
    let expected = fx.types.function(None, [int], int, false);
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope))
        .replace_expected_type(ExpectedType::Known(expected));

    let ty = resolve(&mut fx, expression, Some(c_type), &ctx);

    assert_eq!(ty, Some(fx.types.function(None, [], TypeId::DONT_CARE, false)));
    assert!(fx.codes().is_empty());
}

#[test]
fn shape_mode_single_result_types_without_binding() {
    let (mut fx, c_type, static_make, scope) = statics_fixture(false);
    fx.options.callable_reference_mode = CallableReferenceMode::Shape;
    let receiver = fx.type_reference("C");
    let (expression, callee) = fx.callable_reference(Some(receiver), "make");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    let ty = resolve(&mut fx, expression, Some(c_type), &ctx);

    let int = fx.int;
    assert_eq!(ty, Some(fx.types.function(None, [], int, true)));
    assert_eq!(fx.trace.resolved_call(callee), Some(static_make));
    assert_eq!(fx.trace.expression_type(expression), ty);
    assert!(fx.trace.function_binding(expression).is_none());
}

#[test]
fn shape_mode_uninferred_target_has_no_type_in_independent_context() {
    let mut fx = Fixture::new();
    fx.options.callable_reference_mode = CallableReferenceMode::Shape;
    let pending = fx.top_level_function("pending", &[], TypeId::DONT_CARE);
    let scope = package_scope(&mut fx, vec![pending]);
    let (expression, _) = fx.callable_reference(None, "pending");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    let ty = resolve(&mut fx, expression, None, &ctx);

    assert_eq!(ty, None);
    assert_eq!(fx.trace.expression_type(expression), None);
    assert!(fx.trace.function_binding(expression).is_none());
    assert!(fx.codes().is_empty(), "{:?}", fx.messages());
}

#[test]
fn shape_mode_still_reports_refusals() {
    let mut fx = Fixture::new();
    fx.options.callable_reference_mode = CallableReferenceMode::Shape;
    let int = fx.int;
    let (c, c_type) = fx.class("C");
    let ext = fx.method(c, "twice", &[], int);
    if let Some(desc) = fx.table.callable_mut(ext) {
        desc.extension_receiver = Some(int);
    }
    let scope = package_scope(&mut fx, Vec::new());

    let receiver = fx.type_reference("C");
    let (expression, _) = fx.callable_reference(Some(receiver), "twice");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    assert_eq!(resolve(&mut fx, expression, Some(c_type), &ctx), None);
    assert_eq!(fx.codes(), vec![EXTENSION_IN_CLASS_REFERENCE_NOT_ALLOWED]);
    assert!(fx.trace.function_binding(expression).is_none());
}

#[test]
fn nested_class_constructor_is_found_after_statics() {
    let mut fx = Fixture::new();
    let (outer, outer_type) = fx.class("Outer");
    let inner_name = fx.atom("Inner");
    let inner = fx.table.add_nested_class(
        outer,
        ClassDescriptor {
            name: inner_name,
            fq_name: inner_name,
            ..ClassDescriptor::default()
        },
    );
    let inner_type = fx.types.class(inner);
    let mut ctor = CallableDescriptor::new(inner_name, CallableKind::Constructor, inner_type);
    ctor.containing = Container::Class(inner);
    let ctor = fx.table.add_callable(ctor);
    let scope = package_scope(&mut fx, Vec::new());

    let receiver = fx.type_reference("Outer");
    let (expression, callee) = fx.callable_reference(Some(receiver), "Inner");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));
    let ty = resolve(&mut fx, expression, Some(outer_type), &ctx);

    assert_eq!(ty, Some(fx.types.function(None, [], inner_type, true)));
    assert_eq!(fx.trace.resolved_call(callee), Some(ctor));
}

#[test]
fn inner_class_constructor_falls_through_to_receiver_trial() {
    let mut fx = Fixture::new();
    let (outer, outer_type) = fx.class("Outer");
    let inner_name = fx.atom("Inner");
    let inner = fx.table.add_nested_class(
        outer,
        ClassDescriptor {
            name: inner_name,
            fq_name: inner_name,
            is_inner: true,
            ..ClassDescriptor::default()
        },
    );
    let inner_type = fx.types.class(inner);
    let mut ctor = CallableDescriptor::new(inner_name, CallableKind::Constructor, inner_type);
    ctor.containing = Container::Class(inner);
    ctor.dispatch_receiver = Some(outer_type);
    let ctor = fx.table.add_callable(ctor);
    let scope = package_scope(&mut fx, Vec::new());

    let receiver = fx.type_reference("Outer");
    let (expression, callee) = fx.callable_reference(Some(receiver), "Inner");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));
    let ty = resolve(&mut fx, expression, Some(outer_type), &ctx);

    // The constructor needs an `Outer`, so the reference takes one.
    assert_eq!(ty, Some(fx.types.function(Some(outer_type), [], inner_type, true)));
    assert_eq!(fx.trace.resolved_call(callee), Some(ctor));
    assert!(fx.codes().is_empty(), "{:?}", fx.messages());
}

#[test]
fn property_reference_binds_an_immutable_variable() {
    let mut fx = Fixture::new();
    let int = fx.int;
    let (c, c_type) = fx.class("C");
    let p = fx.property(c, "p", int);
    let scope = package_scope(&mut fx, Vec::new());

    let receiver = fx.type_reference("C");
    let (expression, callee) = fx.callable_reference(Some(receiver), "p");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));
    let ty = resolve(&mut fx, expression, Some(c_type), &ctx);

    let expected = fx.types.property(Some(c_type), int, false);
    assert_eq!(ty, Some(expected));
    assert_eq!(fx.trace.resolved_call(callee), Some(p));
    assert_eq!(
        fx.trace.variable_binding(expression),
        Some(AnonymousVariable {
            container: Container::Package,
            variable_type: expected,
            mutable: false,
        })
    );
    assert!(fx.trace.function_binding(expression).is_none());
}

#[test]
fn extension_in_lexical_scope_resolves_with_receiver() {
    let mut fx = Fixture::new();
    let int = fx.int;
    let (_, c_type) = fx.class("C");
    let name = fx.atom("describe");
    let mut ext = CallableDescriptor::new(name, CallableKind::Function, int);
    ext.extension_receiver = Some(c_type);
    let ext = fx.table.add_callable(ext);
    let scope = package_scope(&mut fx, vec![ext]);

    let receiver = fx.type_reference("C");
    let (expression, callee) = fx.callable_reference(Some(receiver), "describe");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));
    let ty = resolve(&mut fx, expression, Some(c_type), &ctx);

    assert_eq!(ty, Some(fx.types.function(Some(c_type), [], int, true)));
    assert_eq!(fx.trace.resolved_call(callee), Some(ext));
    assert!(fx.codes().is_empty());
}

// =============================================================================
// Expected type and unqualified references
// =============================================================================

#[test]
fn expected_function_type_selects_overload_by_arity() {
    let mut fx = Fixture::new();
    let int = fx.int;
    let nullary = fx.top_level_function("f", &[], int);
    let unary = fx.top_level_function("f", &[int], int);
    let scope = package_scope(&mut fx, vec![nullary, unary]);

    let (expression, callee) = fx.callable_reference(None, "f");
    let expected = fx.types.function(None, [int], int, false);
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope))
        .replace_expected_type(ExpectedType::Known(expected));
    let ty = resolve(&mut fx, expression, None, &ctx);

    assert_eq!(ty, Some(fx.types.function(None, [int], int, true)));
    assert_eq!(fx.trace.resolved_call(callee), Some(unary));
}

#[test]
fn missing_name_is_reported_once() {
    let mut fx = Fixture::new();
    let scope = package_scope(&mut fx, Vec::new());
    let (expression, _) = fx.callable_reference(None, "nothing");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    assert_eq!(resolve(&mut fx, expression, None, &ctx), None);
    assert_eq!(fx.codes(), vec![UNRESOLVED_REFERENCE]);
    assert_eq!(fx.messages(), vec!["Unresolved reference: nothing".to_string()]);
}

#[test]
fn uninferred_return_type_is_not_a_target_in_independent_context() {
    let mut fx = Fixture::new();
    let pending = fx.top_level_function("pending", &[], TypeId::DONT_CARE);
    let scope = package_scope(&mut fx, vec![pending]);
    let (expression, _) = fx.callable_reference(None, "pending");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    let target = fx
        .run(|cx, trace| {
            CallableReferenceResolver::new(cx).resolve_callable_reference_target(expression, None, &ctx, trace)
        })
        .expect("resolution should not fail");
    assert_eq!(
        target,
        TargetResolution {
            descriptor: None,
            resolved_to_something: true,
        }
    );
}

// =============================================================================
// Refusals
// =============================================================================

#[test]
fn non_class_left_hand_side_is_rejected() {
    let mut fx = Fixture::new();
    let int = fx.int;
    let scope = package_scope(&mut fx, Vec::new());
    let lhs = fx.types.function(None, [], int, false);
    let receiver = fx.type_reference("F");
    let (expression, _) = fx.callable_reference(Some(receiver), "invoke");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    assert_eq!(resolve(&mut fx, expression, Some(lhs), &ctx), None);
    assert_eq!(fx.codes(), vec![CALLABLE_REFERENCE_LHS_NOT_A_CLASS]);
}

#[test]
fn member_extension_reference_is_refused() {
    let mut fx = Fixture::new();
    let int = fx.int;
    let (c, c_type) = fx.class("C");
    let ext = fx.method(c, "twice", &[], int);
    if let Some(desc) = fx.table.callable_mut(ext) {
        desc.extension_receiver = Some(int);
    }
    let scope = package_scope(&mut fx, Vec::new());

    let receiver = fx.type_reference("C");
    let (expression, _) = fx.callable_reference(Some(receiver), "twice");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    assert_eq!(resolve(&mut fx, expression, Some(c_type), &ctx), None);
    assert_eq!(fx.codes(), vec![EXTENSION_IN_CLASS_REFERENCE_NOT_ALLOWED]);
    assert!(fx.messages()[0].starts_with("'C.twice' is a member and an extension"));
}

#[test]
fn local_variable_reference_is_unsupported() {
    let mut fx = Fixture::new();
    let int = fx.int;
    let name = fx.atom("counter");
    let mut local = CallableDescriptor::new(name, CallableKind::LocalVariable, int);
    local.flags = CallableFlags::VAR;
    let local = fx.table.add_callable(local);
    let scope = package_scope(&mut fx, vec![local]);

    let (expression, _) = fx.callable_reference(None, "counter");
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    assert_eq!(resolve(&mut fx, expression, None, &ctx), None);
    assert_eq!(fx.codes(), vec![UNSUPPORTED]);
    assert_eq!(
        fx.messages(),
        vec!["Unsupported [References to variables aren't supported yet]".to_string()]
    );
}

#[test]
fn accessor_descriptor_is_an_internal_error() {
    let mut fx = Fixture::new();
    let int = fx.int;
    let (c, _) = fx.class("C");
    let p = fx.property(c, "p", int);
    let name = fx.atom("<get-p>");
    let getter = fx.table.add_callable(CallableDescriptor::new(
        name,
        CallableKind::PropertyGetter { property: p },
        int,
    ));
    let scope = package_scope(&mut fx, Vec::new());
    let ctx = ResolutionContext::new(ResolutionScope::Lexical(scope));

    let result = fx.run(|cx, _| {
        CallableReferenceResolver::new(cx).get_reflection_type_for_callable_descriptor(getter, &ctx)
    });
    assert!(matches!(
        result,
        Err(CheckerError::UnsupportedDescriptor { kind: "getter", .. })
    ));
}
