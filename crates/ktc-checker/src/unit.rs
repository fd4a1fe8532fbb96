//! Unit interchange format and per-unit analysis.
//!
//! Parsing and name resolution happen outside this crate, so a compilation
//! unit arrives as one JSON document (`*.unit.json`) carrying everything the
//! checks read: the string table, the type table, descriptors, the AST, the
//! bindings the external resolver produced, the lexical scopes and the
//! callable references to resolve.
//!
//! Entry `i` of `strings` is `Atom(i + 1)`. Entry `i` of `types` becomes
//! `TypeId(16 + i)` once re-interned, so entries must be distinct and may
//! only refer to earlier entries or to the intrinsic ids 0-2.

use crate::callable_reference::CallableReferenceResolver;
use crate::constructor_checker::check_constructor;
use crate::context::{CheckerContext, ResolutionContext};
use crate::error::{CheckerError, CheckerResult};
use crate::options::CheckerOptions;
use crate::scope::{ResolutionScope, ScopeId, ScopeTable};
use crate::trace::{BindingKey, BindingTrace, BindingValue, ReferenceTarget, RootTrace};
use ktc_ast::{NodeArena, NodeIndex, NodeKind};
use ktc_common::{Diagnostic, Interner};
use ktc_solver::{CallableId, ClassId, DescriptorTable, KnownNames, TypeData, TypeId, TypeInterner};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

// =============================================================================
// File format
// =============================================================================

/// A binding from an AST node to something the external resolver decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBinding<T> {
    pub node: NodeIndex,
    pub target: T,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitBindings {
    /// What names, `this` expressions and callees refer to.
    pub reference_targets: Vec<NodeBinding<ReferenceTarget>>,
    /// Class of each annotation entry.
    pub annotations: Vec<NodeBinding<ClassId>>,
    /// Descriptor of each class declaration.
    pub classes: Vec<NodeBinding<ClassId>>,
    /// Descriptor of each property, property parameter and local variable.
    pub declarations: Vec<NodeBinding<CallableId>>,
}

/// A callable reference expression to resolve.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CallableReferenceRequest {
    pub expression: NodeIndex,
    /// Type of the left-hand side, resolved externally.
    #[serde(default)]
    pub lhs_type: Option<TypeId>,
    #[serde(default)]
    pub expected_type: Option<TypeId>,
    /// Lexical scope the expression appears in.
    pub scope: ScopeId,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitFile {
    /// Source file name diagnostics are attributed to.
    pub file: String,
    pub strings: Vec<String>,
    pub types: Vec<TypeData>,
    pub descriptors: DescriptorTable,
    pub ast: NodeArena,
    pub bindings: UnitBindings,
    pub scopes: ScopeTable,
    pub callable_references: Vec<CallableReferenceRequest>,
}

impl UnitFile {
    pub fn from_json(text: &str) -> CheckerResult<Self> {
        serde_json::from_str(text).map_err(|e| CheckerError::MalformedUnit(e.to_string()))
    }
}

/// Result of analyzing one unit.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UnitReport {
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics beyond the per-unit limit.
    pub dropped_diagnostics: usize,
    /// Callable references that received a type.
    pub references_resolved: usize,
    /// Classes and secondary constructors checked.
    pub constructors_checked: usize,
}

// =============================================================================
// Loading
// =============================================================================

/// Re-intern the type table, validating ids as it goes.
pub fn load_types(entries: &[TypeData], table: &DescriptorTable) -> CheckerResult<TypeInterner> {
    let types = TypeInterner::new();
    for (index, data) in entries.iter().enumerate() {
        let expected = TypeId(TypeId::FIRST_USER + index as u32);
        for referenced in data.referenced_types() {
            let known = if referenced.is_intrinsic() {
                types.lookup(referenced).is_some()
            } else {
                referenced.0 < expected.0
            };
            if !known {
                return Err(CheckerError::MalformedUnit(format!(
                    "type entry {index} refers to type {} before it is defined",
                    referenced.0
                )));
            }
        }
        if let Some(class) = data.class_id()
            && table.class(class).is_none()
        {
            return Err(CheckerError::MalformedUnit(format!(
                "type entry {index} refers to unknown class {}",
                class.0
            )));
        }
        let id = types.intern(data.clone());
        if id != expected {
            return Err(CheckerError::MalformedUnit(format!(
                "type entry {index} is intrinsic or duplicates type {}",
                id.0
            )));
        }
    }
    Ok(types)
}

fn record_bindings(bindings: &UnitBindings, arena: &NodeArena, trace: &mut RootTrace) -> CheckerResult<()> {
    let check_node = |node: NodeIndex| {
        if arena.get(node).is_some() {
            Ok(())
        } else {
            Err(CheckerError::MalformedUnit(format!(
                "binding refers to missing node {}",
                node.0
            )))
        }
    };
    for b in &bindings.reference_targets {
        check_node(b.node)?;
        trace.record(BindingKey::ReferenceTarget(b.node), BindingValue::Target(b.target));
    }
    for b in &bindings.annotations {
        check_node(b.node)?;
        trace.record(BindingKey::Annotation(b.node), BindingValue::Class(b.target));
    }
    for b in &bindings.classes {
        check_node(b.node)?;
        trace.record(BindingKey::Class(b.node), BindingValue::Class(b.target));
    }
    for b in &bindings.declarations {
        check_node(b.node)?;
        trace.record(BindingKey::Declaration(b.node), BindingValue::Callable(b.target));
    }
    Ok(())
}

// =============================================================================
// Analysis
// =============================================================================

/// Analyze one unit: resolve its callable references, then check every
/// class and secondary constructor in node order.
///
/// An `Err` means the unit broke an invariant and its analysis stopped; the
/// caller decides how to report that.
pub fn analyze_unit(unit: UnitFile, options: &CheckerOptions) -> CheckerResult<UnitReport> {
    let UnitFile {
        file,
        strings,
        types: type_entries,
        descriptors,
        mut ast,
        bindings,
        scopes,
        callable_references,
    } = unit;
    let _span = debug_span!("analyze_unit", file = %file).entered();

    let mut interner = Interner::from_table(&strings);
    let names = KnownNames::new(&mut interner);
    let types = load_types(&type_entries, &descriptors)?;
    ast.link_parents();

    let mut trace = RootTrace::new(file.clone()).with_diagnostic_limit(options.max_diagnostics_per_unit);
    record_bindings(&bindings, &ast, &mut trace)?;

    let cx = CheckerContext::new(
        &ast,
        &interner,
        &types,
        &descriptors,
        &names,
        &scopes,
        options,
    );

    let mut references_resolved = 0;
    if options.check_callable_references {
        let resolver = CallableReferenceResolver::new(&cx);
        for request in &callable_references {
            if scopes.get(request.scope).is_none() {
                return Err(CheckerError::MalformedUnit(format!(
                    "callable reference {} names unknown scope {}",
                    request.expression.0, request.scope.0
                )));
            }
            let ctx = ResolutionContext::new(ResolutionScope::Lexical(request.scope))
                .replace_expected_type(request.expected_type.into());
            if resolver
                .resolve_callable_reference(request.expression, request.lhs_type, &ctx, &mut trace)?
                .is_some()
            {
                references_resolved += 1;
            }
        }
    }

    let mut constructors_checked = 0;
    if options.check_constructors {
        for (index, node) in ast.nodes.iter().enumerate() {
            if matches!(
                node.kind,
                NodeKind::Class { .. } | NodeKind::SecondaryConstructor { .. }
            ) {
                check_constructor(&cx, NodeIndex(index as u32), &mut trace)?;
                constructors_checked += 1;
            }
        }
    }

    let dropped_diagnostics = trace.dropped_diagnostics();
    let diagnostics = trace.into_diagnostics();
    if dropped_diagnostics > 0 {
        info!(file = %file, dropped = dropped_diagnostics, "diagnostic limit reached");
    }
    debug!(
        file = %file,
        diagnostics = diagnostics.len(),
        references_resolved,
        constructors_checked,
        "unit analyzed"
    );
    Ok(UnitReport {
        file,
        diagnostics,
        dropped_diagnostics,
        references_resolved,
        constructors_checked,
    })
}
