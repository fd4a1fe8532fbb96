#![allow(dead_code)]

//! Hand-built descriptors, AST and bindings for unit tests.

use crate::context::CheckerContext;
use crate::flow::{Pseudocode, PseudocodeBuilder};
use crate::options::CheckerOptions;
use crate::scope::ScopeTable;
use crate::trace::{BindingKey, BindingTrace, BindingValue, ReferenceTarget, RootTrace};
use ktc_ast::{LiteralKind, NodeArena, NodeIndex, NodeKind, NodeList};
use ktc_common::{Atom, Interner, Span};
use ktc_solver::{
    CallableDescriptor, CallableFlags, CallableId, CallableKind, ClassDescriptor, ClassId, Container,
    DescriptorTable, KnownNames, TypeId, TypeInterner,
};

pub(crate) struct World {
    pub arena: NodeArena,
    pub interner: Interner,
    pub names: KnownNames,
    pub types: TypeInterner,
    pub table: DescriptorTable,
    pub scopes: ScopeTable,
    pub options: CheckerOptions,
    pub trace: RootTrace,
    offset: u32,
}

impl World {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let names = KnownNames::new(&mut interner);
        Self {
            arena: NodeArena::new(),
            interner,
            names,
            types: TypeInterner::new(),
            table: DescriptorTable::new(),
            scopes: ScopeTable::new(),
            options: CheckerOptions::default(),
            trace: RootTrace::new("test.kt"),
            offset: 0,
        }
    }

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

    pub fn class_initializer(&mut self, class: NodeIndex) -> Pseudocode {
        self.run(|cx, trace| PseudocodeBuilder::new(cx, &*trace).build_class_initializer(class))
            .expect("pseudocode should build")
    }

    // -------------------------------------------------------------------------
    // Descriptors
    // -------------------------------------------------------------------------

    pub fn class(&mut self, name: &str, supertypes: Vec<ClassId>) -> ClassId {
        let name = self.interner.intern(name);
        self.table.add_class(ClassDescriptor {
            name,
            fq_name: name,
            supertypes,
            ..ClassDescriptor::default()
        })
    }

    /// A function returning `DONT_CARE`; class members get a dispatch receiver.
    pub fn function(&mut self, name: &str, containing: Container, params: usize) -> CallableId {
        let name = self.interner.intern(name);
        let mut desc = CallableDescriptor::new(name, CallableKind::Function, TypeId::DONT_CARE);
        if let Container::Class(class) = containing {
            desc.dispatch_receiver = Some(self.types.class(class));
        }
        desc.containing = containing;
        desc.value_parameters = vec![TypeId::DONT_CARE; params];
        self.table.add_callable(desc)
    }

    /// A non-null property with a backing field.
    pub fn property(&mut self, class: ClassId, name: &str) -> CallableId {
        let name = self.interner.intern(name);
        let ty = self.types.class(class);
        let mut desc = CallableDescriptor::new(
            name,
            CallableKind::Property {
                getter: None,
                setter: None,
            },
            ty,
        );
        desc.containing = Container::Class(class);
        desc.dispatch_receiver = Some(ty);
        desc.flags = CallableFlags::HAS_BACKING_FIELD;
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

    pub fn name(&mut self, text: &str) -> NodeIndex {
        let name = self.interner.intern(text);
        self.node(NodeKind::SimpleName { name })
    }

    pub fn name_ref(&mut self, text: &str, target: CallableId) -> NodeIndex {
        let node = self.name(text);
        self.trace.record(
            BindingKey::ReferenceTarget(node),
            BindingValue::Target(ReferenceTarget::Callable(target)),
        );
        node
    }

    pub fn this(&mut self, class: ClassId) -> NodeIndex {
        let node = self.node(NodeKind::This { label: None });
        self.trace.record(
            BindingKey::ReferenceTarget(node),
            BindingValue::Target(ReferenceTarget::Class(class)),
        );
        node
    }

    pub fn literal(&mut self) -> NodeIndex {
        self.node(NodeKind::Literal {
            literal: LiteralKind::Int,
            text: "1".to_string(),
        })
    }

    pub fn condition(&mut self) -> NodeIndex {
        self.node(NodeKind::Literal {
            literal: LiteralKind::Boolean,
            text: "true".to_string(),
        })
    }

    /// `name = 1` writing `property`.
    pub fn set(&mut self, text: &str, property: CallableId) -> NodeIndex {
        let target = self.name_ref(text, property);
        let value = self.literal();
        self.node(NodeKind::Assignment { target, value })
    }

    pub fn call(&mut self, callee: NodeIndex, arguments: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::Call {
            callee,
            arguments: arguments.iter().copied().collect(),
        })
    }

    pub fn block(&mut self, statements: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::Block {
            statements: statements.iter().copied().collect(),
        })
    }

    pub fn init(&mut self, statements: &[NodeIndex]) -> NodeIndex {
        let body = self.block(statements);
        self.node(NodeKind::InitBlock { body })
    }

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
}
