//! Builders for small hand-written units used by the integration tests.

#![allow(dead_code)]

use ktc_ast::{BinaryOp, LiteralKind, NodeArena, NodeIndex, NodeKind, NodeList};
use ktc_checker::trace::{BindingKey, BindingTrace, BindingValue, ReferenceTarget, RootTrace};
use ktc_checker::{CheckerContext, CheckerOptions, ScopeTable};
use ktc_common::{Atom, Interner, Span};
use ktc_solver::{
    CallableDescriptor, CallableFlags, CallableId, CallableKind, ClassDescriptor, ClassId,
    Container, DescriptorTable, KnownNames, TypeId, TypeInterner,
};

pub struct Fixture {
    pub interner: Interner,
    pub names: KnownNames,
    pub types: TypeInterner,
    pub table: DescriptorTable,
    pub arena: NodeArena,
    pub scopes: ScopeTable,
    pub options: CheckerOptions,
    pub trace: RootTrace,
    pub int: TypeId,
    offset: u32,
}

impl Fixture {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let names = KnownNames::new(&mut interner);
        let types = TypeInterner::new();
        let mut table = DescriptorTable::new();
        let int_class = table.add_class(ClassDescriptor {
            name: interner.intern("Int"),
            fq_name: interner.intern("kotlin.Int"),
            ..ClassDescriptor::default()
        });
        let int = types.class(int_class);
        Self {
            interner,
            names,
            types,
            table,
            arena: NodeArena::new(),
            scopes: ScopeTable::new(),
            options: CheckerOptions::default(),
            trace: RootTrace::new("test.kt"),
            int,
            offset: 0,
        }
    }

    /// Run `f` with a context over the fixture and its trace.
    pub fn run<R>(&mut self, f: impl FnOnce(&CheckerContext<'_>, &mut RootTrace) -> R) -> R {
        let cx = CheckerContext::new(
            &self.arena,
            &self.interner,
            &self.types,
            &self.table,
            &self.names,
            &self.scopes,
            &self.options,
        );
        f(&cx, &mut self.trace)
    }

    pub fn atom(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn codes(&self) -> Vec<u32> {
        self.trace.diagnostics().iter().map(|d| d.code).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.trace
            .diagnostics()
            .iter()
            .map(|d| d.message_text.clone())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Descriptors
    // -------------------------------------------------------------------------

    pub fn class(&mut self, name: &str) -> (ClassId, TypeId) {
        let name = self.atom(name);
        let class = self.table.add_class(ClassDescriptor {
            name,
            fq_name: name,
            ..ClassDescriptor::default()
        });
        (class, self.types.class(class))
    }

    pub fn fragile_annotation_class(&mut self) -> ClassId {
        let fragile = self.names.fragile;
        self.table.add_class(ClassDescriptor {
            name: self.interner.intern("Fragile"),
            fq_name: fragile,
            ..ClassDescriptor::default()
        })
    }

    pub fn property(&mut self, class: ClassId, name: &str, ty: TypeId) -> CallableId {
        self.property_with(class, name, ty, CallableFlags::HAS_BACKING_FIELD)
    }

    pub fn property_with(&mut self, class: ClassId, name: &str, ty: TypeId, flags: CallableFlags) -> CallableId {
        let this_type = self.types.class(class);
        let mut desc = CallableDescriptor::new(
            self.atom(name),
            CallableKind::Property {
                getter: None,
                setter: None,
            },
            ty,
        );
        desc.containing = Container::Class(class);
        desc.dispatch_receiver = Some(this_type);
        desc.flags = flags;
        self.table.add_callable(desc)
    }

    pub fn method(&mut self, class: ClassId, name: &str, params: &[TypeId], ret: TypeId) -> CallableId {
        let this_type = self.types.class(class);
        let mut desc = CallableDescriptor::new(self.atom(name), CallableKind::Function, ret);
        desc.containing = Container::Class(class);
        desc.dispatch_receiver = Some(this_type);
        desc.value_parameters = params.to_vec();
        self.table.add_callable(desc)
    }

    pub fn static_method(&mut self, class: ClassId, name: &str, params: &[TypeId], ret: TypeId) -> CallableId {
        let mut desc = CallableDescriptor::new(self.atom(name), CallableKind::Function, ret);
        desc.value_parameters = params.to_vec();
        self.table.add_static_callable(class, desc)
    }

    pub fn top_level_function(&mut self, name: &str, params: &[TypeId], ret: TypeId) -> CallableId {
        let mut desc = CallableDescriptor::new(self.atom(name), CallableKind::Function, ret);
        desc.value_parameters = params.to_vec();
        self.table.add_callable(desc)
    }

    // -------------------------------------------------------------------------
    // AST
    // -------------------------------------------------------------------------

    pub fn node(&mut self, kind: NodeKind) -> NodeIndex {
        let start = self.offset;
        self.offset += 10;
        self.arena.add(kind, Span::new(start, start + 5))
    }

    pub fn bind(&mut self, node: NodeIndex, target: ReferenceTarget) {
        self.trace.record(BindingKey::ReferenceTarget(node), BindingValue::Target(target));
    }

    /// A simple name referring to `target`.
    pub fn name_ref(&mut self, name: &str, target: CallableId) -> NodeIndex {
        let name = self.atom(name);
        let node = self.node(NodeKind::SimpleName { name });
        self.bind(node, ReferenceTarget::Callable(target));
        node
    }

    pub fn unresolved_name(&mut self, name: &str) -> NodeIndex {
        let name = self.atom(name);
        self.node(NodeKind::SimpleName { name })
    }

    pub fn this(&mut self, class: ClassId) -> NodeIndex {
        let node = self.node(NodeKind::This { label: None });
        self.bind(node, ReferenceTarget::Class(class));
        node
    }

    pub fn int_literal(&mut self) -> NodeIndex {
        self.node(NodeKind::Literal {
            literal: LiteralKind::Int,
            text: "1".to_string(),
        })
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Assignment { target, value })
    }

    pub fn qualified(&mut self, receiver: NodeIndex, selector: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Qualified {
            receiver,
            selector,
            safe: false,
        })
    }

    pub fn call(&mut self, callee: NodeIndex, arguments: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::Call {
            callee,
            arguments: arguments.iter().copied().collect(),
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Binary { op, left, right })
    }

    pub fn block(&mut self, statements: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::Block {
            statements: statements.iter().copied().collect(),
        })
    }

    pub fn if_else(&mut self, condition: NodeIndex, then_branch: NodeIndex, else_branch: Option<NodeIndex>) -> NodeIndex {
        self.node(NodeKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn init(&mut self, statements: &[NodeIndex]) -> NodeIndex {
        let body = self.block(statements);
        self.node(NodeKind::InitBlock { body })
    }

    /// A property declaration bound to `property`.
    pub fn property_node(&mut self, property: CallableId, initializer: Option<NodeIndex>) -> NodeIndex {
        let name = self.table.callable(property).map_or(Atom::NONE, |d| d.name);
        let node = self.node(NodeKind::Property {
            name,
            initializer,
            annotations: NodeList::new(),
        });
        self.trace
            .record(BindingKey::Declaration(node), BindingValue::Callable(property));
        node
    }

    pub fn annotation_entry(&mut self, class: ClassId) -> NodeIndex {
        let name = self.atom("Fragile");
        let node = self.node(NodeKind::AnnotationEntry { name });
        self.trace.record(BindingKey::Annotation(node), BindingValue::Class(class));
        node
    }

    pub fn annotated(&mut self, annotations: &[NodeIndex], expression: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Annotated {
            annotations: annotations.iter().copied().collect(),
            expression,
        })
    }

    pub fn secondary_constructor(&mut self, statements: &[NodeIndex]) -> NodeIndex {
        let body = self.block(statements);
        self.node(NodeKind::SecondaryConstructor {
            delegation_arguments: NodeList::new(),
            body: Some(body),
            annotations: NodeList::new(),
        })
    }

    /// A class declaration bound to `class`.
    pub fn class_node(&mut self, class: ClassId, members: &[NodeIndex]) -> NodeIndex {
        let name = self.table.class(class).map_or(Atom::NONE, |c| c.name);
        let node = self.node(NodeKind::Class {
            name,
            primary_parameters: NodeList::new(),
            members: members.iter().copied().collect(),
            annotations: NodeList::new(),
        });
        self.trace.record(BindingKey::Class(node), BindingValue::Class(class));
        node
    }

    /// `Receiver::name` (or `::name` without a receiver node).
    pub fn callable_reference(&mut self, receiver: Option<NodeIndex>, name: &str) -> (NodeIndex, NodeIndex) {
        let callee = self.unresolved_name(name);
        let expression = self.node(NodeKind::CallableReference { receiver, callee });
        (expression, callee)
    }

    pub fn type_reference(&mut self, name: &str) -> NodeIndex {
        let name = self.atom(name);
        self.node(NodeKind::TypeReference {
            name,
            nullable: false,
        })
    }
}
