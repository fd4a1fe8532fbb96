//! Rendering types and callables for diagnostics.

use crate::TypeInterner;
use crate::descriptors::{CallableId, Container, DescriptorTable};
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::types::{TypeArgument, TypeData, TypeId};
use ktc_common::Interner;

pub struct TypeFormatter<'a> {
    types: &'a TypeInterner,
    table: &'a DescriptorTable,
    interner: &'a Interner,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(types: &'a TypeInterner, table: &'a DescriptorTable, interner: &'a Interner) -> Self {
        Self {
            types,
            table,
            interner,
        }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeFormatting);
        let mut out = String::new();
        self.write_type(ty, &mut out, &mut guard);
        out
    }

    fn write_type(&self, ty: TypeId, out: &mut String, guard: &mut RecursionGuard<TypeId>) {
        if guard.enter(ty).is_denied() {
            out.push_str("...");
            return;
        }
        match self.types.lookup(ty).as_deref() {
            None | Some(TypeData::Error) => out.push_str("[ERROR]"),
            Some(TypeData::DontCare) => out.push_str("???"),
            Some(TypeData::FunctionPlaceholder) => out.push_str("Function<?>"),
            Some(TypeData::Class {
                class,
                args,
                nullable,
                ..
            }) => {
                let name = self.table.class(*class).map_or("<unknown>", |c| self.interner.resolve(c.name));
                out.push_str(name);
                if !args.is_empty() {
                    out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        match arg {
                            TypeArgument::Star => out.push('*'),
                            TypeArgument::Type {
                                projection,
                                type_id,
                            } => {
                                if !projection.label().is_empty() {
                                    out.push_str(projection.label());
                                    out.push(' ');
                                }
                                self.write_type(*type_id, out, guard);
                            }
                        }
                    }
                    out.push('>');
                }
                if *nullable {
                    out.push('?');
                }
            }
            Some(TypeData::TypeParameter { param, nullable }) => {
                let name = self
                    .table
                    .type_param(*param)
                    .map_or("<unknown>", |p| self.interner.resolve(p.name));
                out.push_str(name);
                if *nullable {
                    out.push('?');
                }
            }
            Some(TypeData::Function {
                receiver,
                params,
                return_type,
                reflective,
            }) => {
                if *reflective {
                    // KFunction<arity><receiver, params..., return>
                    let arity = params.len() + usize::from(receiver.is_some());
                    out.push_str(&format!("KFunction{arity}<"));
                    for ty in receiver.iter().chain(params.iter()) {
                        self.write_type(*ty, out, guard);
                        out.push_str(", ");
                    }
                    self.write_type(*return_type, out, guard);
                    out.push('>');
                } else {
                    if let Some(receiver) = receiver {
                        self.write_type(*receiver, out, guard);
                        out.push('.');
                    }
                    out.push('(');
                    for (i, param) in params.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write_type(*param, out, guard);
                    }
                    out.push_str(") -> ");
                    self.write_type(*return_type, out, guard);
                }
            }
            Some(TypeData::Property {
                receiver,
                value,
                mutable,
            }) => {
                let kind = if *mutable { "KMutableProperty" } else { "KProperty" };
                let arity = usize::from(receiver.is_some());
                out.push_str(&format!("{kind}{arity}<"));
                if let Some(receiver) = receiver {
                    self.write_type(*receiver, out, guard);
                    out.push_str(", ");
                }
                self.write_type(*value, out, guard);
                out.push('>');
            }
        }
        guard.leave(ty);
    }

    /// `Owner.name` for class members, `name` otherwise.
    pub fn format_callable_name(&self, callable: CallableId) -> String {
        let Some(desc) = self.table.callable(callable) else {
            return "<unknown>".to_string();
        };
        let name = self.interner.resolve(desc.name);
        match desc.containing {
            Container::Class(class) => {
                let owner = self.table.class(class).map_or("<unknown>", |c| self.interner.resolve(c.name));
                format!("{owner}.{name}")
            }
            _ => name.to_string(),
        }
    }

    /// `name(P1, P2)` for function-like callables, `name: T` for the rest.
    pub fn format_signature(&self, callable: CallableId) -> String {
        let Some(desc) = self.table.callable(callable) else {
            return "<unknown>".to_string();
        };
        let name = self.format_callable_name(callable);
        if desc.kind.is_function_like() {
            let params: Vec<String> = desc.value_parameters.iter().map(|p| self.format(*p)).collect();
            format!("{name}({})", params.join(", "))
        } else {
            format!("{name}: {}", self.format(desc.return_type))
        }
    }

    /// Comma-separated signatures for an ambiguity message.
    pub fn format_candidates(&self, candidates: &[CallableId]) -> String {
        candidates
            .iter()
            .map(|c| self.format_signature(*c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
