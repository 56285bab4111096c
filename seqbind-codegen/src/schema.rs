// Declaration model: the exported surface of one package, as produced by the
// upstream package parser. Deserialized from JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Package and declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Package identifier, e.g. `testpkg`.
    pub name: String,
    /// Import path. Informational only.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration {
    Function(Function),
    Struct(StructDecl),
    Interface(InterfaceDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Function(f) => &f.name,
            Declaration::Struct(s) => &s.name,
            Declaration::Interface(i) => &i.name,
        }
    }
}

/// A free function, or a method when nested in a struct/interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub results: Vec<Param>,
}

/// Parameter or result. Results are usually unnamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Pointer-receiver methods, promoted methods already flattened.
    #[serde(default)]
    pub methods: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<Function>,
}

// ---------------------------------------------------------------------------
// Type expressions
// ---------------------------------------------------------------------------

/// Predeclared scalar and string types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basic {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
}

impl Basic {
    pub fn from_name(name: &str) -> Option<Basic> {
        Some(match name {
            "bool" => Basic::Bool,
            "int" => Basic::Int,
            "int8" => Basic::Int8,
            "int16" => Basic::Int16,
            "int32" | "rune" => Basic::Int32,
            "int64" => Basic::Int64,
            "uint" => Basic::Uint,
            "uint8" | "byte" => Basic::Uint8,
            "uint16" => Basic::Uint16,
            "uint32" => Basic::Uint32,
            "uint64" => Basic::Uint64,
            "float32" => Basic::Float32,
            "float64" => Basic::Float64,
            "string" => Basic::String,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Basic::Bool => "bool",
            Basic::Int => "int",
            Basic::Int8 => "int8",
            Basic::Int16 => "int16",
            Basic::Int32 => "int32",
            Basic::Int64 => "int64",
            Basic::Uint => "uint",
            Basic::Uint8 => "uint8",
            Basic::Uint16 => "uint16",
            Basic::Uint32 => "uint32",
            Basic::Uint64 => "uint64",
            Basic::Float32 => "float32",
            Basic::Float64 => "float64",
            Basic::String => "string",
        }
    }
}

/// A parsed type expression (`int64`, `[]byte`, `*S`, `map[string]int`,
/// `other.T`, ...). Serialized as its source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Basic(Basic),
    Error,
    Slice(Box<TypeRef>),
    Pointer(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Named {
        package: Option<String>,
        name: String,
    },
}

impl TypeRef {
    pub fn named(name: &str) -> TypeRef {
        TypeRef::Named {
            package: None,
            name: name.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeRef::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeParseError {
    #[error("empty type expression")]
    Empty,
    #[error("malformed type expression `{0}`")]
    Malformed(String),
}

impl FromStr for TypeRef {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypeParseError::Empty);
        }
        parse_type(s).ok_or_else(|| TypeParseError::Malformed(s.to_string()))
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;

    fn try_from(s: String) -> Result<Self, TypeParseError> {
        s.parse()
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> String {
        ty.to_string()
    }
}

fn parse_type(s: &str) -> Option<TypeRef> {
    if let Some(elem) = s.strip_prefix("[]") {
        return Some(TypeRef::Slice(Box::new(parse_type(elem)?)));
    }
    if let Some(elem) = s.strip_prefix('*') {
        return Some(TypeRef::Pointer(Box::new(parse_type(elem)?)));
    }
    if let Some(rest) = s.strip_prefix("map[") {
        let close = matching_bracket(rest)?;
        let key = parse_type(&rest[..close])?;
        let value = parse_type(&rest[close + 1..])?;
        return Some(TypeRef::Map(Box::new(key), Box::new(value)));
    }
    if let Some(basic) = Basic::from_name(s) {
        return Some(TypeRef::Basic(basic));
    }
    if s == "error" {
        return Some(TypeRef::Error);
    }
    match s.split_once('.') {
        Some((pkg, name)) if is_ident(pkg) && is_ident(name) => Some(TypeRef::Named {
            package: Some(pkg.to_string()),
            name: name.to_string(),
        }),
        None if is_ident(s) => Some(TypeRef::named(s)),
        _ => None,
    }
}

/// Index of the `]` closing a `map[` whose opening bracket was already
/// consumed.
fn matching_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Basic(b) => f.write_str(b.name()),
            TypeRef::Error => f.write_str("error"),
            TypeRef::Slice(elem) => write!(f, "[]{elem}"),
            TypeRef::Pointer(elem) => write!(f, "*{elem}"),
            TypeRef::Map(k, v) => write!(f, "map[{k}]{v}"),
            TypeRef::Named {
                package: Some(pkg),
                name,
            } => write!(f, "{pkg}.{name}"),
            TypeRef::Named {
                package: None,
                name,
            } => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> TypeRef {
        s.parse().unwrap()
    }

    #[test]
    fn parses_basic_types_and_aliases() {
        assert_eq!(ty("int64"), TypeRef::Basic(Basic::Int64));
        assert_eq!(ty("byte"), TypeRef::Basic(Basic::Uint8));
        assert_eq!(ty("rune"), TypeRef::Basic(Basic::Int32));
        assert_eq!(ty(" string "), TypeRef::Basic(Basic::String));
        assert_eq!(ty("error"), TypeRef::Error);
    }

    #[test]
    fn parses_composite_types() {
        assert_eq!(ty("[]byte"), TypeRef::Slice(Box::new(TypeRef::Basic(Basic::Uint8))));
        assert_eq!(ty("*S"), TypeRef::Pointer(Box::new(TypeRef::named("S"))));
        assert_eq!(
            ty("map[string][]int"),
            TypeRef::Map(
                Box::new(TypeRef::Basic(Basic::String)),
                Box::new(TypeRef::Slice(Box::new(TypeRef::Basic(Basic::Int))))
            )
        );
        assert_eq!(
            ty("map[map[string]int]bool").to_string(),
            "map[map[string]int]bool"
        );
        assert_eq!(
            ty("*io.Reader"),
            TypeRef::Pointer(Box::new(TypeRef::Named {
                package: Some("io".into()),
                name: "Reader".into()
            }))
        );
    }

    #[test]
    fn display_round_trips_source_text() {
        for src in ["[]*S", "map[string]float64", "other.T", "**S", "uint16"] {
            assert_eq!(ty(src).to_string(), src);
        }
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert_eq!("".parse::<TypeRef>(), Err(TypeParseError::Empty));
        assert!(matches!("map[string".parse::<TypeRef>(), Err(TypeParseError::Malformed(_))));
        assert!(matches!("a.b.c".parse::<TypeRef>(), Err(TypeParseError::Malformed(_))));
        assert!(matches!("[]".parse::<TypeRef>(), Err(TypeParseError::Malformed(_))));
        assert!(matches!("func()".parse::<TypeRef>(), Err(TypeParseError::Malformed(_))));
    }

    #[test]
    fn deserializes_tagged_declarations() {
        let json = r#"{
            "name": "testpkg",
            "declarations": [
                { "kind": "function", "name": "Sum",
                  "params": [{"name": "x", "type": "int64"}, {"name": "y", "type": "int64"}],
                  "results": [{"type": "int64"}] },
                { "kind": "struct", "name": "S", "fields": [{"name": "X", "type": "float64"}] },
                { "kind": "interface", "name": "I" }
            ]
        }"#;
        let pkg: Package = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.declarations.len(), 3);
        let Declaration::Function(sum) = &pkg.declarations[0] else {
            panic!("expected a function");
        };
        assert_eq!(sum.params[1].ty, TypeRef::Basic(Basic::Int64));
        assert_eq!(sum.results[0].name, "");
        assert_eq!(pkg.declarations[2].name(), "I");
    }

    #[test]
    fn converts_from_owned_strings() {
        assert_eq!(TypeRef::try_from(String::from("error")), Ok(TypeRef::Error));
        assert_eq!(String::from(ty("[]byte")), "[]byte");
        assert_eq!(TypeRef::try_from(String::from("  ")), Err(TypeParseError::Empty));
    }

    #[test]
    fn bad_type_fails_model_loading() {
        let json = r#"{"name": "p", "declarations": [
            { "kind": "function", "name": "F", "params": [{"name": "x", "type": "map["}] }
        ]}"#;
        let err = serde_json::from_str::<Package>(json).unwrap_err();
        assert!(err.to_string().contains("malformed type expression"));
    }
}
