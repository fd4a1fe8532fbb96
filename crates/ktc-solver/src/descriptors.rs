//! Declaration descriptors and their storage.
//!
//! Descriptors are the semantic view of declarations produced by the
//! external resolver: classes, callables (functions, constructors,
//! properties, accessors, locals) and type parameters. They are stored in a
//! [`DescriptorTable`] and referenced by small copyable ids, so the override
//! relation and class nesting are plain id graphs rather than object links.

use crate::types::{AnnotationRef, TypeId};
use crate::variance::Variance;
use bitflags::bitflags;
use ktc_common::Atom;
use serde::{Deserialize, Serialize};
use tracing::trace;

// =============================================================================
// Ids
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallableId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeParamId(pub u32);

// =============================================================================
// Classes
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Object,
    EnumClass,
    AnnotationClass,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    Final,
    Sealed,
    Open,
    Abstract,
}

impl Modality {
    /// Whether a declaration with this modality may have subclasses or overrides.
    pub const fn is_overridable(self) -> bool {
        !matches!(self, Modality::Final)
    }
}

/// Semantic description of a class, interface or object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDescriptor {
    pub name: Atom,
    /// Fully-qualified name, e.g. `kotlin.collections.MutableList`.
    pub fq_name: Atom,
    pub kind: ClassKind,
    pub modality: Modality,
    pub type_params: Vec<TypeParamId>,
    /// Direct superclasses and superinterfaces.
    pub supertypes: Vec<ClassId>,
    /// Enclosing class for nested classes.
    pub containing: Option<ClassId>,
    /// An `inner` class needs an instance of its enclosing class.
    pub is_inner: bool,
    /// Instance members (functions and properties) declared in the class.
    pub members: Vec<CallableId>,
    /// Members reachable without an instance (companion-like and Java statics).
    pub static_members: Vec<CallableId>,
    /// Nested classes and objects.
    pub nested_classes: Vec<ClassId>,
    pub constructors: Vec<CallableId>,
    pub annotations: Vec<AnnotationRef>,
}

// =============================================================================
// Callables
// =============================================================================

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CallableFlags: u32 {
        /// `var` property or local.
        const VAR = 1 << 0;
        /// Property stores its value in a field.
        const HAS_BACKING_FIELD = 1 << 1;
        const LATEINIT = 1 << 2;
        const ABSTRACT = 1 << 3;
        const OPEN = 1 << 4;
        const OVERRIDE = 1 << 5;
        /// Declared in a Java class; accessors may surface as synthetic properties.
        const JAVA = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallableKind {
    Function,
    Constructor,
    Property {
        #[serde(default)]
        getter: Option<CallableId>,
        #[serde(default)]
        setter: Option<CallableId>,
    },
    PropertyGetter {
        property: CallableId,
    },
    PropertySetter {
        property: CallableId,
    },
    LocalVariable,
    ValueParameter,
}

impl CallableKind {
    pub const fn is_function_like(&self) -> bool {
        matches!(self, CallableKind::Function | CallableKind::Constructor)
    }

    pub const fn is_property(&self) -> bool {
        matches!(self, CallableKind::Property { .. })
    }

    pub const fn is_accessor(&self) -> bool {
        matches!(
            self,
            CallableKind::PropertyGetter { .. } | CallableKind::PropertySetter { .. }
        )
    }

    pub const fn label(&self) -> &'static str {
        match self {
            CallableKind::Function => "function",
            CallableKind::Constructor => "constructor",
            CallableKind::Property { .. } => "property",
            CallableKind::PropertyGetter { .. } => "getter",
            CallableKind::PropertySetter { .. } => "setter",
            CallableKind::LocalVariable => "local variable",
            CallableKind::ValueParameter => "value parameter",
        }
    }
}

/// What a callable is declared in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Container {
    #[default]
    Package,
    Class(ClassId),
    Callable(CallableId),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallableDescriptor {
    pub name: Atom,
    /// Fully-qualified name, e.g. `kotlin.MutableList.addAll`; `Atom::NONE` for locals.
    #[serde(default)]
    pub fq_name: Atom,
    pub kind: CallableKind,
    #[serde(default)]
    pub containing: Container,
    #[serde(default)]
    pub dispatch_receiver: Option<TypeId>,
    #[serde(default)]
    pub extension_receiver: Option<TypeId>,
    /// Return type for functions, value type for properties and variables.
    pub return_type: TypeId,
    #[serde(default)]
    pub value_parameters: Vec<TypeId>,
    #[serde(default)]
    pub type_params: Vec<TypeParamId>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRef>,
    /// Callables this one directly overrides.
    #[serde(default)]
    pub overridden: Vec<CallableId>,
    #[serde(default)]
    pub flags: CallableFlags,
}

impl CallableDescriptor {
    pub fn new(name: Atom, kind: CallableKind, return_type: TypeId) -> Self {
        Self {
            name,
            fq_name: Atom::NONE,
            kind,
            containing: Container::Package,
            dispatch_receiver: None,
            extension_receiver: None,
            return_type,
            value_parameters: Vec::new(),
            type_params: Vec::new(),
            annotations: Vec::new(),
            overridden: Vec::new(),
            flags: CallableFlags::empty(),
        }
    }

    #[inline]
    pub fn is_var(&self) -> bool {
        self.flags.contains(CallableFlags::VAR)
    }

    /// A member that is also an extension (`fun A.foo()` declared in class `B`).
    #[inline]
    pub fn is_member_extension(&self) -> bool {
        self.dispatch_receiver.is_some() && self.extension_receiver.is_some()
    }

    pub fn containing_class(&self) -> Option<ClassId> {
        match self.containing {
            Container::Class(class) => Some(class),
            _ => None,
        }
    }
}

// =============================================================================
// Type parameters
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TypeParamOwner {
    Class(ClassId),
    Callable(CallableId),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeParameterDescriptor {
    pub name: Atom,
    #[serde(default)]
    pub variance: Variance,
    #[serde(default)]
    pub upper_bounds: Vec<TypeId>,
    pub owner: TypeParamOwner,
    #[serde(default)]
    pub reified: bool,
}

// =============================================================================
// DescriptorTable
// =============================================================================

/// Storage for all descriptors of one compilation unit.
///
/// Ids are positions in the respective vectors, so a table deserialized from
/// a unit file keeps the ids the external resolver assigned.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorTable {
    classes: Vec<ClassDescriptor>,
    callables: Vec<CallableDescriptor>,
    type_params: Vec<TypeParameterDescriptor>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: ClassDescriptor) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        trace!(class_id = id.0, name = class.name.0, "registered class descriptor");
        self.classes.push(class);
        id
    }

    /// Register a callable and link it into its containing class's member list.
    ///
    /// Constructors go to `constructors`; other class members go to `members`.
    /// Use [`add_static_callable`](Self::add_static_callable) for statics.
    pub fn add_callable(&mut self, callable: CallableDescriptor) -> CallableId {
        let id = CallableId(self.callables.len() as u32);
        if let Container::Class(class) = callable.containing {
            let is_constructor = matches!(callable.kind, CallableKind::Constructor);
            let is_accessor = callable.kind.is_accessor();
            if let Some(owner) = self.classes.get_mut(class.0 as usize) {
                if is_constructor {
                    owner.constructors.push(id);
                } else if !is_accessor {
                    owner.members.push(id);
                }
            }
        }
        self.callables.push(callable);
        id
    }

    /// Register a static member of `class`.
    pub fn add_static_callable(&mut self, class: ClassId, mut callable: CallableDescriptor) -> CallableId {
        let id = CallableId(self.callables.len() as u32);
        callable.containing = Container::Class(class);
        if let Some(owner) = self.classes.get_mut(class.0 as usize) {
            owner.static_members.push(id);
        }
        self.callables.push(callable);
        id
    }

    /// Register a class nested in `outer`.
    pub fn add_nested_class(&mut self, outer: ClassId, mut class: ClassDescriptor) -> ClassId {
        class.containing = Some(outer);
        let id = self.add_class(class);
        if let Some(owner) = self.classes.get_mut(outer.0 as usize) {
            owner.nested_classes.push(id);
        }
        id
    }

    pub fn add_type_param(&mut self, param: TypeParameterDescriptor) -> TypeParamId {
        let id = TypeParamId(self.type_params.len() as u32);
        match param.owner {
            TypeParamOwner::Class(class) => {
                if let Some(owner) = self.classes.get_mut(class.0 as usize) {
                    owner.type_params.push(id);
                }
            }
            TypeParamOwner::Callable(callable) => {
                if let Some(owner) = self.callables.get_mut(callable.0 as usize) {
                    owner.type_params.push(id);
                }
            }
        }
        self.type_params.push(param);
        id
    }

    /// Attach getter/setter accessors to a property.
    pub fn set_accessors(
        &mut self,
        property: CallableId,
        getter: Option<CallableId>,
        setter: Option<CallableId>,
    ) {
        if let Some(desc) = self.callables.get_mut(property.0 as usize) {
            desc.kind = CallableKind::Property { getter, setter };
        }
    }

    pub fn set_overridden(&mut self, callable: CallableId, overridden: Vec<CallableId>) {
        if let Some(desc) = self.callables.get_mut(callable.0 as usize) {
            desc.overridden = overridden;
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn class(&self, id: ClassId) -> Option<&ClassDescriptor> {
        self.classes.get(id.0 as usize)
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDescriptor> {
        self.classes.get_mut(id.0 as usize)
    }

    pub fn callable(&self, id: CallableId) -> Option<&CallableDescriptor> {
        self.callables.get(id.0 as usize)
    }

    pub fn callable_mut(&mut self, id: CallableId) -> Option<&mut CallableDescriptor> {
        self.callables.get_mut(id.0 as usize)
    }

    pub fn type_param(&self, id: TypeParamId) -> Option<&TypeParameterDescriptor> {
        self.type_params.get(id.0 as usize)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn callable_count(&self) -> usize {
        self.callables.len()
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId)
    }

    pub fn callable_ids(&self) -> impl Iterator<Item = CallableId> + '_ {
        (0..self.callables.len() as u32).map(CallableId)
    }

    /// First class with the given fully-qualified name.
    pub fn find_class_by_fq_name(&self, fq_name: Atom) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|c| c.fq_name == fq_name)
            .map(|i| ClassId(i as u32))
    }

    /// Members of `class` named `name` (not including supertypes).
    pub fn members_named(&self, class: ClassId, name: Atom) -> Vec<CallableId> {
        self.class(class).map_or_else(Vec::new, |c| {
            c.members
                .iter()
                .copied()
                .filter(|id| self.callable(*id).is_some_and(|d| d.name == name))
                .collect()
        })
    }

    pub fn static_members_named(&self, class: ClassId, name: Atom) -> Vec<CallableId> {
        self.class(class).map_or_else(Vec::new, |c| {
            c.static_members
                .iter()
                .copied()
                .filter(|id| self.callable(*id).is_some_and(|d| d.name == name))
                .collect()
        })
    }

    /// Constructors of nested classes of `class` whose simple name is `name`.
    pub fn nested_class_constructors_named(&self, class: ClassId, name: Atom) -> Vec<CallableId> {
        let Some(outer) = self.class(class) else {
            return Vec::new();
        };
        outer
            .nested_classes
            .iter()
            .filter_map(|id| self.class(*id))
            .filter(|nested| nested.name == name && !nested.is_inner)
            .flat_map(|nested| nested.constructors.iter().copied())
            .collect()
    }

    /// Constructors of `inner` classes of `class` named `name`; they take an
    /// instance of `class` as receiver.
    pub fn inner_class_constructors_named(&self, class: ClassId, name: Atom) -> Vec<CallableId> {
        let Some(outer) = self.class(class) else {
            return Vec::new();
        };
        outer
            .nested_classes
            .iter()
            .filter_map(|id| self.class(*id))
            .filter(|nested| nested.name == name && nested.is_inner)
            .flat_map(|nested| nested.constructors.iter().copied())
            .collect()
    }

    /// Properties declared directly in `class`, in declaration order.
    pub fn declared_properties(&self, class: ClassId) -> Vec<CallableId> {
        self.class(class).map_or_else(Vec::new, |c| {
            c.members
                .iter()
                .copied()
                .filter(|id| self.callable(*id).is_some_and(|d| d.kind.is_property()))
                .collect()
        })
    }

    /// Walk the containment chain of a callable: the callable itself, then
    /// enclosing callables and classes, nearest first.
    pub fn parents_with_self(&self, callable: CallableId) -> Vec<Container> {
        let mut out = vec![Container::Callable(callable)];
        let mut current = self.callable(callable).map(|d| d.containing);
        while let Some(container) = current {
            match container {
                Container::Package => break,
                Container::Callable(id) => {
                    if out.contains(&container) {
                        break;
                    }
                    out.push(container);
                    current = self.callable(id).map(|d| d.containing);
                }
                Container::Class(id) => {
                    if out.contains(&container) {
                        break;
                    }
                    out.push(container);
                    current = self
                        .class(id)
                        .map(|c| c.containing.map_or(Container::Package, Container::Class));
                }
            }
        }
        out
    }

    /// Annotations of a container.
    pub fn annotations_of(&self, container: Container) -> &[AnnotationRef] {
        match container {
            Container::Package => &[],
            Container::Class(id) => self.class(id).map_or(&[], |c| c.annotations.as_slice()),
            Container::Callable(id) => self
                .callable(id)
                .map_or(&[], |c| c.annotations.as_slice()),
        }
    }
}

#[cfg(test)]
#[path = "../tests/descriptor_tests.rs"]
mod tests;
