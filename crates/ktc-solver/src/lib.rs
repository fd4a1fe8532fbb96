//! Type representation and declaration descriptors for the ktc front-end.
//!
//! - **Types**: structural `TypeData` interned to `TypeId` handles, so type
//!   equality is an integer comparison.
//! - **Descriptors**: the semantic view of declarations (classes, callables,
//!   type parameters) stored in a `DescriptorTable` and addressed by ids.
//! - **Variance engine**: effective variance of projected arguments and the
//!   "most precise argument" predicates used for wildcard decisions.
//! - **Type mapping**: JVM wildcard decisions and the annotation-driven modes
//!   that suppress or force them.

pub mod class_hierarchy;
pub mod descriptors;
pub mod format;
mod intern;
pub mod names;
pub mod overrides;
pub mod recursion;
pub mod reflection;
pub mod type_mapping;
pub mod types;
pub mod variance;

pub use descriptors::{
    CallableDescriptor, CallableFlags, CallableId, CallableKind, ClassDescriptor, ClassId,
    ClassKind, Container, DescriptorTable, Modality, TypeParamId, TypeParameterDescriptor,
};
pub use format::TypeFormatter;
pub use intern::TypeInterner;
pub use names::KnownNames;
pub use type_mapping::{TypeMappingMode, Wildcard};
pub use types::{AnnotationRef, TypeArgument, TypeData, TypeId};
pub use variance::{Variance, effective_variance};
