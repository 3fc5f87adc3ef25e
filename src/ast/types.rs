//! Resolved type descriptors attached to tree nodes by the upstream type resolver.
//!
//! A descriptor is only present when resolution succeeded. The engine treats a
//! missing descriptor as "unknown" and never guesses one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{err_msg, RecastError};

/// Fully-qualified name of the textual string type.
pub const JAVA_LANG_STRING: &str = "java.lang.String";

/// The primitive kinds of the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Every primitive except `boolean` is numeric (`char` is an integral type).
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "char" => PrimitiveKind::Char,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind)
    }
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveKind),
    /// A class type identified by its fully-qualified name.
    Class(String),
    Array(Box<Type>),
}

impl Type {
    pub fn class(fqn: impl Into<String>) -> Self {
        Type::Class(fqn.into())
    }

    pub fn string() -> Self {
        Type::Class(JAVA_LANG_STRING.to_string())
    }

    /// Parses a type as written in snippets and configuration: a primitive
    /// keyword, `String`, or a fully-qualified class name, each optionally
    /// followed by `[]` dimensions (`int[]`, `java.lang.String[][]`).
    pub fn parse(text: &str) -> Result<Self, RecastError> {
        let text = text.trim();
        let mut base = text;
        let mut dimensions = 0;
        while let Some(element) = base.strip_suffix("[]") {
            base = element.trim_end();
            dimensions += 1;
        }
        let element = if base == "String" {
            Type::string()
        } else if let Some(kind) = PrimitiveKind::from_keyword(base) {
            kind.into()
        } else if base.contains('.') && base.split('.').all(is_identifier) {
            Type::class(base)
        } else {
            return Err(err_msg!(Parse, "unknown type `{}`", text));
        };
        Ok((0..dimensions).fold(element, |ty, _| Type::Array(Box::new(ty))))
    }

    /// The fully-qualified name of a class type.
    pub fn fqn(&self) -> Option<&str> {
        match self {
            Type::Class(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Primitive(kind) if kind.is_numeric())
    }

    pub fn is_string(&self) -> bool {
        self.fqn() == Some(JAVA_LANG_STRING)
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

impl From<PrimitiveKind> for Type {
    fn from(kind: PrimitiveKind) -> Self {
        Type::Primitive(kind)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => write!(f, "{}", kind.keyword()),
            Type::Class(name) => write!(f, "{}", name),
            Type::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// The overload bound at a call or construction site.
///
/// `parameter_types` are the *declared* parameter types of that overload, which
/// is what alternative selection inspects (not the argument expressions' types).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub declaring_type: String,
    pub parameter_types: Vec<Type>,
}

impl MethodSignature {
    pub fn new(declaring_type: impl Into<String>, parameter_types: Vec<Type>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            parameter_types,
        }
    }

    /// Declared type of parameter `index`, if the signature has exactly `arity` parameters.
    ///
    /// A parameter count differing from the call's argument count (varargs, stale
    /// metadata) makes every position unresolved.
    pub fn parameter(&self, index: usize, arity: usize) -> Option<&Type> {
        if self.parameter_types.len() != arity {
            return None;
        }
        self.parameter_types.get(index)
    }
}
