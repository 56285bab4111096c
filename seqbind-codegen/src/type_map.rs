// Source type -> wire type / Rust surface types mapping.

use seqbind_ffi::WireType;

use crate::context::{ObjectKind, ObjectType, ObjectTypes};
use crate::diagnostics::{DiagnosticKind, Position};
use crate::naming::is_exported;
use crate::schema::{Basic, TypeRef};

/// How a value is converted between its Rust type and its wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionKind {
    /// No conversion needed.
    Identity,
    /// Numeric `as` cast to and from the wire width.
    NumericCast,
    /// RefNum on the wire, wrapper on the caller side, native handle on the
    /// callee side.
    ObjectRef(ObjectType),
}

/// Mapped type information for code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub wire: WireType,
    /// Caller parameter type (e.g. "i64", "&str", "&SeqTestpkgS").
    pub caller_param: String,
    /// Caller result type (e.g. "i64", "String", "SeqTestpkgS").
    pub caller_result: String,
    /// Native callee type (e.g. "i64", "String", "seqbind_runtime::Shared<crate::native::S>").
    pub native: String,
    pub conversion: ConversionKind,
}

fn scalar(wire: WireType, rust: &str, conversion: ConversionKind) -> MappedType {
    MappedType {
        wire,
        caller_param: rust.into(),
        caller_result: rust.into(),
        native: rust.into(),
        conversion,
    }
}

fn basic_type(b: Basic) -> MappedType {
    use ConversionKind::{Identity, NumericCast};
    match b {
        Basic::Bool => scalar(WireType::Bool, "bool", Identity),
        Basic::Int8 => scalar(WireType::Int32, "i8", NumericCast),
        Basic::Int16 => scalar(WireType::Int32, "i16", NumericCast),
        Basic::Int32 => scalar(WireType::Int32, "i32", Identity),
        Basic::Uint8 => scalar(WireType::Int32, "u8", NumericCast),
        Basic::Uint16 => scalar(WireType::Int32, "u16", NumericCast),
        Basic::Int | Basic::Int64 => scalar(WireType::Int64, "i64", Identity),
        // uint64 is reinterpreted as two's-complement on the wire.
        Basic::Uint | Basic::Uint64 => scalar(WireType::Int64, "u64", NumericCast),
        Basic::Uint32 => scalar(WireType::Int64, "u32", NumericCast),
        Basic::Float32 => scalar(WireType::Float64, "f32", NumericCast),
        Basic::Float64 => scalar(WireType::Float64, "f64", Identity),
        Basic::String => MappedType {
            wire: WireType::String,
            caller_param: "&str".into(),
            caller_result: "String".into(),
            native: "String".into(),
            conversion: Identity,
        },
    }
}

fn bytes_type() -> MappedType {
    MappedType {
        wire: WireType::Bytes,
        caller_param: "&[u8]".into(),
        caller_result: "Vec<u8>".into(),
        native: "Vec<u8>".into(),
        conversion: ConversionKind::Identity,
    }
}

fn object_type(obj: &ObjectType) -> MappedType {
    MappedType {
        wire: WireType::ObjectRef,
        caller_param: format!("&{}", obj.wrapper),
        caller_result: obj.wrapper.clone(),
        native: obj.native.clone(),
        conversion: ConversionKind::ObjectRef(obj.clone()),
    }
}

/// Map a source type appearing at `position` of a member of `package`.
pub fn map_type(
    ty: &TypeRef,
    package: &str,
    objects: &ObjectTypes,
    position: Position,
) -> Result<MappedType, DiagnosticKind> {
    let reject = |reason: &'static str| DiagnosticKind::UnsupportedType {
        ty: ty.to_string(),
        position: position.clone(),
        reason,
    };

    match ty {
        TypeRef::Basic(b) => Ok(basic_type(*b)),
        TypeRef::Error => Err(reject("`error` is only supported as the last result")),
        TypeRef::Slice(elem) if **elem == TypeRef::Basic(Basic::Uint8) => Ok(bytes_type()),
        TypeRef::Slice(_) => Err(reject("slices of non-byte elements are not supported")),
        TypeRef::Map(..) => Err(reject("maps are not supported")),
        TypeRef::Pointer(elem) => match elem.as_ref() {
            TypeRef::Named { .. } => {
                let obj = resolve_named(elem, package, objects).map_err(reject)?;
                match obj.kind {
                    ObjectKind::Struct => Ok(object_type(obj)),
                    ObjectKind::Interface => Err(reject("pointers to interfaces are not supported")),
                }
            }
            _ => Err(reject("pointers to non-named types are not supported")),
        },
        TypeRef::Named { .. } => resolve_named(ty, package, objects)
            .map(object_type)
            .map_err(reject),
    }
}

fn resolve_named<'a>(
    ty: &TypeRef,
    package: &str,
    objects: &'a ObjectTypes,
) -> Result<&'a ObjectType, &'static str> {
    let TypeRef::Named { package: qualifier, name } = ty else {
        return Err("not a named type");
    };
    if qualifier.as_deref().is_some_and(|q| q != package) {
        return Err("named types from other packages are not supported");
    }
    if !is_exported(name) {
        return Err("unexported named types are not supported");
    }
    objects
        .get(name)
        .ok_or("only structs and interfaces declared in the package can cross")
}

/// Reader/writer suffix on the runtime `Buffer`.
pub fn codec(wire: WireType) -> &'static str {
    wire.codec_suffix()
}

/// Rust type of the raw wire value.
pub fn wire_rust_type(wire: WireType) -> &'static str {
    match wire {
        WireType::Bool => "bool",
        WireType::Int32 => "i32",
        WireType::Int64 => "i64",
        WireType::Float64 => "f64",
        WireType::String => "String",
        WireType::Bytes => "Vec<u8>",
        WireType::ObjectRef => "seqbind_runtime::RefNum",
    }
}

/// Writer argument for the zero value of a wire type. Written in place of a
/// value result when the call failed.
pub fn zero_value(wire: WireType) -> &'static str {
    match wire {
        WireType::Bool => "false",
        WireType::Int32 | WireType::Int64 => "0",
        WireType::Float64 => "0.0",
        WireType::String => "\"\"",
        WireType::Bytes => "&[]",
        WireType::ObjectRef => "seqbind_runtime::RefNum::NULL",
    }
}

impl MappedType {
    /// Caller side: writer argument for the parameter expression `expr`.
    pub fn caller_encode(&self, expr: &str) -> String {
        match &self.conversion {
            ConversionKind::Identity => expr.to_string(),
            ConversionKind::NumericCast => format!("{expr} as {}", wire_rust_type(self.wire)),
            ConversionKind::ObjectRef(_) => format!("{expr}.ref_num()"),
        }
    }

    /// Caller side: result value built from the raw wire value `raw`.
    pub fn caller_decode(&self, raw: &str) -> String {
        match &self.conversion {
            ConversionKind::Identity => raw.to_string(),
            ConversionKind::NumericCast => format!("{raw} as {}", self.caller_result),
            ConversionKind::ObjectRef(obj) => {
                format!("seqbind_runtime::proxy_for::<{}>({raw})", obj.wrapper)
            }
        }
    }

    /// Callee side: native value built from the raw wire value `raw`.
    pub fn native_decode(&self, raw: &str) -> String {
        match &self.conversion {
            ConversionKind::Identity => raw.to_string(),
            ConversionKind::NumericCast => format!("{raw} as {}", self.native),
            ConversionKind::ObjectRef(obj) => {
                format!("seqbind_runtime::refs().get::<{}>({raw})", obj.native)
            }
        }
    }

    /// Callee side: writer argument for the native value `expr`.
    pub fn native_encode(&self, expr: &str) -> String {
        match &self.conversion {
            ConversionKind::Identity => match self.wire {
                WireType::String | WireType::Bytes => format!("&{expr}"),
                _ => expr.to_string(),
            },
            ConversionKind::NumericCast => format!("{expr} as {}", wire_rust_type(self.wire)),
            ConversionKind::ObjectRef(_) => format!("seqbind_runtime::refs().insert({expr})"),
        }
    }
}
