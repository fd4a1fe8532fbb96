//! Type data definitions.

use crate::descriptors::{ClassId, TypeParamId};
use crate::variance::Variance;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Interned type handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The type of an expression that failed to resolve.
    pub const ERROR: TypeId = TypeId(0);
    /// A return type left for outer inference to decide.
    pub const DONT_CARE: TypeId = TypeId(1);
    /// Function of unknown shape, produced for ambiguous references with no
    /// expected type.
    pub const FUNCTION_PLACEHOLDER: TypeId = TypeId(2);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = 16;

    #[inline]
    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }
}

/// An annotation attached to a type or declaration.
///
/// Only the first boolean argument is retained; it is the only argument the
/// wildcard rules read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationRef {
    pub class: ClassId,
    #[serde(default)]
    pub value: Option<bool>,
}

impl AnnotationRef {
    pub const fn new(class: ClassId) -> Self {
        Self { class, value: None }
    }
}

/// A type argument: either `*` or a (possibly projected) type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeArgument {
    Star,
    Type {
        #[serde(default)]
        projection: Variance,
        #[serde(rename = "type")]
        type_id: TypeId,
    },
}

impl TypeArgument {
    pub const fn invariant(type_id: TypeId) -> Self {
        TypeArgument::Type {
            projection: Variance::Invariant,
            type_id,
        }
    }

    pub const fn projected(projection: Variance, type_id: TypeId) -> Self {
        TypeArgument::Type {
            projection,
            type_id,
        }
    }

    #[inline]
    pub const fn is_star(&self) -> bool {
        matches!(self, TypeArgument::Star)
    }
}

pub type TypeArgs = SmallVec<[TypeArgument; 2]>;
pub type TypeList = SmallVec<[TypeId; 4]>;
pub type AnnotationList = SmallVec<[AnnotationRef; 1]>;

/// Structural type representation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeData {
    /// A classifier type `C<args>`, optionally nullable.
    Class {
        class: ClassId,
        #[serde(default)]
        args: TypeArgs,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        annotations: AnnotationList,
    },
    /// A reference to a declared type parameter.
    TypeParameter {
        param: TypeParamId,
        #[serde(default)]
        nullable: bool,
    },
    /// A function type `R.(P1, P2) -> T`.
    ///
    /// `reflective` marks the callable-reference form of a function value.
    Function {
        #[serde(default)]
        receiver: Option<TypeId>,
        #[serde(default)]
        params: TypeList,
        #[serde(rename = "return")]
        return_type: TypeId,
        #[serde(default)]
        reflective: bool,
    },
    /// The callable-reference form of a property: receiver, value type and
    /// whether it can be written through the reference.
    Property {
        #[serde(default)]
        receiver: Option<TypeId>,
        value: TypeId,
        #[serde(default)]
        mutable: bool,
    },
    FunctionPlaceholder,
    DontCare,
    Error,
}

impl TypeData {
    pub fn class(class: ClassId) -> Self {
        TypeData::Class {
            class,
            args: TypeArgs::new(),
            nullable: false,
            annotations: AnnotationList::new(),
        }
    }

    pub fn generic(class: ClassId, args: impl IntoIterator<Item = TypeArgument>) -> Self {
        TypeData::Class {
            class,
            args: args.into_iter().collect(),
            nullable: false,
            annotations: AnnotationList::new(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TypeData::Class { nullable, .. } | TypeData::TypeParameter { nullable, .. } => {
                *nullable
            }
            _ => false,
        }
    }

    /// Class identity of a classifier type.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            TypeData::Class { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeArgument] {
        match self {
            TypeData::Class { args, .. } => args,
            _ => &[],
        }
    }

    pub fn annotations(&self) -> &[AnnotationRef] {
        match self {
            TypeData::Class { annotations, .. } => annotations,
            _ => &[],
        }
    }

    /// Types this entry refers to directly (argument, receiver, parameter,
    /// return and value types).
    pub fn referenced_types(&self) -> TypeList {
        let mut out = TypeList::new();
        match self {
            TypeData::Class { args, .. } => {
                out.extend(args.iter().filter_map(|arg| match arg {
                    TypeArgument::Type { type_id, .. } => Some(*type_id),
                    TypeArgument::Star => None,
                }));
            }
            TypeData::Function {
                receiver,
                params,
                return_type,
                ..
            } => {
                out.extend(*receiver);
                out.extend(params.iter().copied());
                out.push(*return_type);
            }
            TypeData::Property { receiver, value, .. } => {
                out.extend(*receiver);
                out.push(*value);
            }
            TypeData::TypeParameter { .. }
            | TypeData::FunctionPlaceholder
            | TypeData::DontCare
            | TypeData::Error => {}
        }
        out
    }
}
