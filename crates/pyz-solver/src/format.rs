//! Type display.

use crate::intern::TypeInterner;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{BuiltinClass, ClassKey, FunctionShape, ParamKind, TypeData, TypeId};

/// Renders types the way they would be written in an annotation.
///
/// `list[int]`, `int | None`, `type[Point]`, `(x: int, *args) -> str`.
pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    depth: DepthCounter,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        TypeFormatter {
            interner,
            depth: DepthCounter::with_profile(RecursionProfile::Formatting),
        }
    }

    pub fn format(&mut self, id: TypeId) -> String {
        if !self.depth.enter() {
            return "...".to_string();
        }
        let text = self.format_inner(id);
        self.depth.leave();
        text
    }

    fn format_inner(&mut self, id: TypeId) -> String {
        let Some(data) = self.interner.lookup(id) else {
            return format!("<invalid {id}>");
        };
        match data {
            TypeData::Unknown => "Unknown".to_string(),
            TypeData::Never => "Never".to_string(),
            TypeData::Any => "Any".to_string(),
            TypeData::Instance { class, args } => {
                let name = class.name().to_string();
                if args.is_empty() {
                    if class == ClassKey::Builtin(BuiltinClass::Tuple) {
                        return "tuple[()]".to_string();
                    }
                    return name;
                }
                let args: Vec<String> = args
                    .iter()
                    .map(|&a| {
                        if a == TypeId::ELLIPSIS {
                            "...".to_string()
                        } else {
                            self.format(a)
                        }
                    })
                    .collect();
                format!("{name}[{}]", args.join(", "))
            }
            TypeData::ClassObject(inner) => format!("type[{}]", self.format(inner)),
            TypeData::Function(shape_id) => match self.interner.function_shape(shape_id) {
                Some(shape) => self.format_signature(&shape, 0),
                None => "function".to_string(),
            },
            TypeData::BoundMethod { function, .. } => {
                let shape = match self.interner.lookup(function) {
                    Some(TypeData::Function(shape_id)) => self.interner.function_shape(shape_id),
                    _ => None,
                };
                match shape {
                    Some(shape) => self.format_signature(&shape, 1),
                    None => self.format(function),
                }
            }
            TypeData::Union(members) => {
                let parts: Vec<String> = members.iter().map(|&m| self.format(m)).collect();
                parts.join(" | ")
            }
            TypeData::Module { name, .. } => format!("Module(\"{name}\")"),
            TypeData::Recursive { name, .. } => name,
        }
    }

    fn format_signature(&mut self, shape: &FunctionShape, skip: usize) -> String {
        let params: Vec<String> = shape
            .params
            .iter()
            .skip(skip)
            .map(|p| {
                let prefix = match p.kind {
                    ParamKind::VarArgs => "*",
                    ParamKind::KwArgs => "**",
                    ParamKind::Positional | ParamKind::KeywordOnly => "",
                };
                let mut text = format!("{prefix}{}", p.name);
                if p.ty != TypeId::UNKNOWN {
                    text.push_str(": ");
                    text.push_str(&self.format(p.ty));
                }
                if p.has_default {
                    text.push_str(" = ...");
                }
                text
            })
            .collect();
        let ret = match shape.ret {
            Some(ret) => self.format(ret),
            None => "Unknown".to_string(),
        };
        format!("({}) -> {ret}", params.join(", "))
    }
}

/// Format a single type.
pub fn format_type(interner: &TypeInterner, id: TypeId) -> String {
    TypeFormatter::new(interner).format(id)
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod format_tests;
