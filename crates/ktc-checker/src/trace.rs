//! Binding trace: the diagnostics and bindings produced by analysis.
//!
//! [`RootTrace`] is the committed store for one unit. [`TemporaryTrace`] is
//! a write-local layer over any other trace: reads fall through to the
//! parent, writes stay local until [`commit`](TemporaryTrace::commit) moves
//! them into the parent in order. Dropping or discarding a temporary trace
//! leaves the parent untouched, which is how rejected resolution trials stay
//! unobservable.

use ktc_ast::NodeIndex;
use ktc_common::{Diagnostic, SmartMap, Span};
use ktc_solver::{CallableId, ClassId, Container, TypeId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// =============================================================================
// Binding slices
// =============================================================================

/// Declaration an expression refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReferenceTarget {
    Class(ClassId),
    Callable(CallableId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKey {
    /// What a name, `this` or callee refers to.
    ReferenceTarget(NodeIndex),
    /// Class of an annotation entry.
    Annotation(NodeIndex),
    /// Descriptor of a class declaration.
    Class(NodeIndex),
    /// Descriptor of a property, primary parameter or local declaration.
    Declaration(NodeIndex),
    /// Function synthesized for a function reference.
    Function(NodeIndex),
    /// Variable synthesized for a property reference.
    Variable(NodeIndex),
    /// Callable chosen by overload resolution for a reference.
    ResolvedCall(NodeIndex),
    ExpressionType(NodeIndex),
}

/// Anonymous function bound to a function reference expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnonymousFunction {
    pub container: Container,
    pub function_type: TypeId,
}

/// Anonymous, immutable local bound to a property reference expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnonymousVariable {
    pub container: Container,
    pub variable_type: TypeId,
    pub mutable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingValue {
    Target(ReferenceTarget),
    Class(ClassId),
    Callable(CallableId),
    Function(AnonymousFunction),
    Variable(AnonymousVariable),
    Type(TypeId),
}

// =============================================================================
// BindingTrace
// =============================================================================

pub trait BindingTrace {
    /// File diagnostics are attributed to.
    fn file_name(&self) -> &str;

    fn report(&mut self, diagnostic: Diagnostic);

    fn record(&mut self, key: BindingKey, value: BindingValue);

    fn get(&self, key: BindingKey) -> Option<BindingValue>;

    /// Diagnostics visible through this trace, parents included.
    fn diagnostic_count(&self) -> usize;

    /// Report a registered diagnostic code at `span`.
    fn report_at(&mut self, span: Span, code: u32, args: &[&str]) {
        let diagnostic = Diagnostic::from_code(self.file_name(), span.start, span.len(), code, args);
        self.report(diagnostic);
    }

    fn reference_target(&self, node: NodeIndex) -> Option<ReferenceTarget> {
        match self.get(BindingKey::ReferenceTarget(node)) {
            Some(BindingValue::Target(target)) => Some(target),
            _ => None,
        }
    }

    fn annotation_class(&self, entry: NodeIndex) -> Option<ClassId> {
        match self.get(BindingKey::Annotation(entry)) {
            Some(BindingValue::Class(class)) => Some(class),
            _ => None,
        }
    }

    fn class_descriptor(&self, node: NodeIndex) -> Option<ClassId> {
        match self.get(BindingKey::Class(node)) {
            Some(BindingValue::Class(class)) => Some(class),
            _ => None,
        }
    }

    fn declaration(&self, node: NodeIndex) -> Option<CallableId> {
        match self.get(BindingKey::Declaration(node)) {
            Some(BindingValue::Callable(callable)) => Some(callable),
            _ => None,
        }
    }

    fn resolved_call(&self, node: NodeIndex) -> Option<CallableId> {
        match self.get(BindingKey::ResolvedCall(node)) {
            Some(BindingValue::Callable(callable)) => Some(callable),
            _ => None,
        }
    }

    fn function_binding(&self, node: NodeIndex) -> Option<AnonymousFunction> {
        match self.get(BindingKey::Function(node)) {
            Some(BindingValue::Function(function)) => Some(function),
            _ => None,
        }
    }

    fn variable_binding(&self, node: NodeIndex) -> Option<AnonymousVariable> {
        match self.get(BindingKey::Variable(node)) {
            Some(BindingValue::Variable(variable)) => Some(variable),
            _ => None,
        }
    }

    fn expression_type(&self, node: NodeIndex) -> Option<TypeId> {
        match self.get(BindingKey::ExpressionType(node)) {
            Some(BindingValue::Type(ty)) => Some(ty),
            _ => None,
        }
    }
}

// =============================================================================
// RootTrace
// =============================================================================

/// Committed diagnostics and bindings of one unit.
#[derive(Debug, Default)]
pub struct RootTrace {
    file: String,
    diagnostics: Vec<Diagnostic>,
    bindings: FxHashMap<BindingKey, BindingValue>,
    /// 0 = unlimited.
    max_diagnostics: usize,
    dropped: usize,
}

impl RootTrace {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Keep at most `max` diagnostics; later ones are counted and dropped.
    #[must_use]
    pub fn with_diagnostic_limit(mut self, max: usize) -> Self {
        self.max_diagnostics = max;
        self
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Diagnostics dropped because of the per-unit limit.
    pub fn dropped_diagnostics(&self) -> usize {
        self.dropped
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

impl BindingTrace for RootTrace {
    fn file_name(&self) -> &str {
        &self.file
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if self.max_diagnostics != 0 && self.diagnostics.len() >= self.max_diagnostics {
            self.dropped += 1;
            return;
        }
        trace!(code = diagnostic.code, start = diagnostic.start, "diagnostic committed");
        self.diagnostics.push(diagnostic);
    }

    fn record(&mut self, key: BindingKey, value: BindingValue) {
        self.bindings.insert(key, value);
    }

    fn get(&self, key: BindingKey) -> Option<BindingValue> {
        self.bindings.get(&key).copied()
    }

    fn diagnostic_count(&self) -> usize {
        self.diagnostics.len()
    }
}

// =============================================================================
// TemporaryTrace
// =============================================================================

/// Write-local layer over a parent trace.
pub struct TemporaryTrace<'p> {
    parent: &'p mut dyn BindingTrace,
    title: String,
    diagnostics: Vec<Diagnostic>,
    bindings: SmartMap<BindingKey, BindingValue>,
}

impl<'p> TemporaryTrace<'p> {
    pub fn new(parent: &'p mut dyn BindingTrace, title: impl Into<String>) -> Self {
        let title = title.into();
        trace!(title = %title, "opened temporary trace");
        Self {
            parent,
            title,
            diagnostics: Vec::new(),
            bindings: SmartMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Diagnostics buffered in this layer only.
    pub fn local_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Move local writes into the parent, diagnostics first, in order.
    pub fn commit(self) {
        debug!(
            title = %self.title,
            diagnostics = self.diagnostics.len(),
            bindings = self.bindings.len(),
            "committing temporary trace"
        );
        let TemporaryTrace {
            parent,
            diagnostics,
            bindings,
            ..
        } = self;
        for diagnostic in diagnostics {
            parent.report(diagnostic);
        }
        for (key, value) in bindings.iter() {
            parent.record(*key, *value);
        }
    }

    /// Drop local writes.
    pub fn discard(self) {
        debug!(
            title = %self.title,
            diagnostics = self.diagnostics.len(),
            "discarding temporary trace"
        );
    }
}

impl BindingTrace for TemporaryTrace<'_> {
    fn file_name(&self) -> &str {
        self.parent.file_name()
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn record(&mut self, key: BindingKey, value: BindingValue) {
        self.bindings.insert(key, value);
    }

    fn get(&self, key: BindingKey) -> Option<BindingValue> {
        self.bindings
            .get(&key)
            .copied()
            .or_else(|| self.parent.get(key))
    }

    fn diagnostic_count(&self) -> usize {
        self.parent.diagnostic_count() + self.diagnostics.len()
    }
}

#[cfg(test)]
#[path = "../tests/trace_tests.rs"]
mod tests;
