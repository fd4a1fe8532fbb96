//! Callable reference resolution and constructor consistency checks.
//!
//! - **Binding trace**: committed diagnostics and bindings plus speculative
//!   layers that are committed or discarded as a whole.
//! - **Callable references**: `Type::name` resolved through the static scope,
//!   nested classifiers and the instance receiver, in that order.
//! - **Constructor checks**: pseudocode for class initialization, a forward
//!   initialization dataflow, and detection of `this` escaping before the
//!   non-null properties are set.
//! - **Units**: the JSON interchange format and per-unit orchestration.

pub mod call_resolver;
pub mod callable_reference;
pub mod constructor_checker;
pub mod context;
pub mod error;
pub mod flow;
pub mod options;
pub mod scope;
pub mod trace;
pub mod unit;

pub use callable_reference::{CallableReferenceResolver, TargetResolution};
pub use constructor_checker::{ConstructorConsistencyChecker, check_constructor};
pub use context::{CheckerContext, ExpectedType, ResolutionContext};
pub use error::{CheckerError, CheckerResult};
pub use options::{CallableReferenceMode, CheckerOptions};
pub use scope::{ResolutionScope, ScopeId, ScopeTable};
pub use trace::{BindingKey, BindingTrace, BindingValue, ReferenceTarget, RootTrace, TemporaryTrace};
pub use unit::{UnitFile, UnitReport, analyze_unit};

#[cfg(test)]
#[path = "../tests/test_world.rs"]
mod test_world;
