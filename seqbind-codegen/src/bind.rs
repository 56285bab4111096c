// Binding: joins the call table with mapped signatures.
//
// Every call table entry is either bound (it gets a handler and a stub),
// skipped (blocklisted or an interface method) or rejected with a
// diagnostic. Rejection never stops the walk, so one run reports every
// problem in the package.

use crate::call_table::{CallEntry, CallKind};
use crate::context::{CodegenContext, ObjectType};
use crate::diagnostics::{DiagnosticKind, GenerateError, GenerateResult, Position};
use crate::schema::{Declaration, Function, TypeRef};
use crate::signature::{normalize, ResultShape, ShapeParam};
use crate::type_map::{map_type, MappedType};

/// What the callee handler invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Function,
    FieldGet,
    FieldSet,
    Method,
}

/// A call site with everything both emitters need.
#[derive(Debug, Clone)]
pub struct Binding {
    pub entry: CallEntry,
    pub target: Target,
    /// Receiver type for struct members.
    pub receiver: Option<ObjectType>,
    pub params: Vec<ShapeParam<MappedType>>,
    pub result: ResultShape<MappedType>,
}

impl Binding {
    pub fn const_name(&self) -> String {
        self.entry.const_name()
    }
}

/// Name of the value parameter of a field setter.
pub const SETTER_PARAM: &str = "v";

/// Bind every emitted call site of the package, recording diagnostics in
/// `ctx` for rejected members.
pub fn bind_package(ctx: &mut CodegenContext) -> GenerateResult<Vec<Binding>> {
    let mut bindings = Vec::new();
    let entries = ctx.call_table.entries.clone();
    let package = ctx.package.clone();

    for entry in entries {
        let subject = entry.subject(&package.name);
        let owner = entry.owner.as_deref();

        let blocked = match owner {
            None => ctx.blocked.blocks_function(&entry.member),
            Some(o) => ctx.blocked.blocks_member(o, &entry.member),
        };
        if blocked {
            tracing::debug!(%subject, code = entry.code, "blocklisted, no stubs emitted");
            continue;
        }

        let bound = match entry.kind {
            CallKind::InterfaceMethod => {
                tracing::warn!(%subject, "interface methods are not bound, skipping");
                continue;
            }
            CallKind::Function => find_function(&package.declarations, &entry.member)
                .map(|f| bind_function(ctx, &entry, f, None, Target::Function)),
            CallKind::Method => {
                let receiver = owner.and_then(|o| ctx.objects.get(o)).cloned();
                find_method(&package.declarations, owner, &entry.member)
                    .map(|f| bind_function(ctx, &entry, f, receiver, Target::Method))
            }
            CallKind::FieldGet | CallKind::FieldSet => {
                let receiver = owner.and_then(|o| ctx.objects.get(o)).cloned();
                find_field(&package.declarations, owner, &entry.member)
                    .map(|ty| bind_field(ctx, &entry, ty, receiver))
            }
        };

        match bound {
            Some(Ok(binding)) => bindings.push(binding),
            Some(Err(kind)) => ctx.report(subject, kind),
            None => {
                // The table was built from this same model.
                return Err(GenerateError::Internal(format!(
                    "{subject}: call table entry has no declaration"
                )));
            }
        }
    }

    tracing::debug!(
        bound = bindings.len(),
        rejected = ctx.diagnostics.len(),
        "call sites bound"
    );
    Ok(bindings)
}

fn find_function<'a>(decls: &'a [Declaration], name: &str) -> Option<&'a Function> {
    decls.iter().find_map(|d| match d {
        Declaration::Function(f) if f.name == name => Some(f),
        _ => None,
    })
}

fn find_method<'a>(decls: &'a [Declaration], owner: Option<&str>, name: &str) -> Option<&'a Function> {
    decls.iter().find_map(|d| match d {
        Declaration::Struct(s) if Some(s.name.as_str()) == owner => {
            s.methods.iter().find(|m| m.name == name)
        }
        _ => None,
    })
}

fn find_field<'a>(decls: &'a [Declaration], owner: Option<&str>, name: &str) -> Option<&'a TypeRef> {
    decls.iter().find_map(|d| match d {
        Declaration::Struct(s) if Some(s.name.as_str()) == owner => {
            s.fields.iter().find(|f| f.name == name).map(|f| &f.ty)
        }
        _ => None,
    })
}

fn bind_function(
    ctx: &CodegenContext,
    entry: &CallEntry,
    func: &Function,
    receiver: Option<ObjectType>,
    target: Target,
) -> Result<Binding, DiagnosticKind> {
    let shape = normalize(func)?;
    let package = ctx.package_name();

    let params = shape
        .params
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            Ok(ShapeParam {
                name: p.name,
                ty: map_type(&p.ty, package, &ctx.objects, Position::Param(i))?,
            })
        })
        .collect::<Result<Vec<_>, DiagnosticKind>>()?;
    let result = shape
        .result
        .try_map(|ty| map_type(&ty, package, &ctx.objects, Position::Result(0)))?;

    Ok(Binding {
        entry: entry.clone(),
        target,
        receiver,
        params,
        result,
    })
}

fn bind_field(
    ctx: &CodegenContext,
    entry: &CallEntry,
    ty: &TypeRef,
    receiver: Option<ObjectType>,
) -> Result<Binding, DiagnosticKind> {
    let mapped = map_type(ty, ctx.package_name(), &ctx.objects, Position::Field)?;
    let (target, params, result) = match entry.kind {
        CallKind::FieldSet => (
            Target::FieldSet,
            vec![ShapeParam {
                name: SETTER_PARAM.to_string(),
                ty: mapped,
            }],
            ResultShape::Void,
        ),
        _ => (Target::FieldGet, Vec::new(), ResultShape::Value(mapped)),
    };
    Ok(Binding {
        entry: entry.clone(),
        target,
        receiver,
        params,
        result,
    })
}
