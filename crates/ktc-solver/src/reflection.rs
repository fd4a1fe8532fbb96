//! Types of callable references.
//!
//! A reference to a function has a reflective function type carrying the
//! receiver, parameter and return types; a reference to a property has a
//! reflective property type carrying the receiver, value type and
//! mutability.

use crate::TypeInterner;
use crate::descriptors::{CallableDescriptor, CallableKind};
use crate::types::TypeId;

/// Why a descriptor has no reflective type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReflectionRefusal {
    /// Member and extension at the same time.
    MemberExtension,
    /// Local variables and value parameters cannot be referenced.
    Variable,
    /// A descriptor kind that never reaches reference resolution.
    UnsupportedKind(&'static str),
}

/// Receiver of the reference: the extension receiver takes priority over the
/// dispatch receiver.
pub fn reference_receiver(descriptor: &CallableDescriptor) -> Option<TypeId> {
    descriptor.extension_receiver.or(descriptor.dispatch_receiver)
}

/// Reflective type of a reference to `descriptor`.
pub fn reflection_type(
    types: &TypeInterner,
    descriptor: &CallableDescriptor,
) -> Result<TypeId, ReflectionRefusal> {
    if descriptor.is_member_extension() {
        return Err(ReflectionRefusal::MemberExtension);
    }
    let receiver = reference_receiver(descriptor);
    match descriptor.kind {
        CallableKind::Function | CallableKind::Constructor => Ok(types.function(
            receiver,
            descriptor.value_parameters.iter().copied(),
            descriptor.return_type,
            true,
        )),
        CallableKind::Property { .. } => Ok(types.property(
            receiver,
            descriptor.return_type,
            descriptor.is_var(),
        )),
        CallableKind::LocalVariable | CallableKind::ValueParameter => {
            Err(ReflectionRefusal::Variable)
        }
        CallableKind::PropertyGetter { .. } | CallableKind::PropertySetter { .. } => {
            Err(ReflectionRefusal::UnsupportedKind(descriptor.kind.label()))
        }
    }
}

#[cfg(test)]
#[path = "../tests/reflection_tests.rs"]
mod tests;
