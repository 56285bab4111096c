// Build context: object types, the call table and collected diagnostics.

use std::collections::HashMap;

use crate::call_table::CallTable;
use crate::config::{BlockSet, CodegenOptions};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::naming::wrapper_name;
use crate::schema::{Declaration, Package};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Struct,
    Interface,
}

/// A package type whose values cross the boundary as ObjectRef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    /// Source name, e.g. `S`.
    pub name: String,
    pub kind: ObjectKind,
    /// Caller-side wrapper type, e.g. `SeqTestpkgS`.
    pub wrapper: String,
    /// Native handle type the callee stores in its reference table.
    pub native: String,
    /// Descriptor of the type's members, e.g. `testpkg.S`.
    pub descriptor: String,
}

/// All ObjectRef-producing types of a package, in declared order.
#[derive(Debug, Default)]
pub struct ObjectTypes {
    order: Vec<ObjectType>,
    by_name: HashMap<String, usize>,
}

impl ObjectTypes {
    pub fn collect(package: &Package, options: &CodegenOptions) -> Self {
        let mut types = ObjectTypes::default();
        for decl in &package.declarations {
            let (name, kind) = match decl {
                Declaration::Function(_) => continue,
                Declaration::Struct(s) => (&s.name, ObjectKind::Struct),
                Declaration::Interface(i) => (&i.name, ObjectKind::Interface),
            };
            let native_path = &options.native_path;
            let native = match kind {
                ObjectKind::Struct => format!("seqbind_runtime::Shared<{native_path}::{name}>"),
                ObjectKind::Interface => {
                    format!("std::sync::Arc<dyn {native_path}::{name} + Send + Sync>")
                }
            };
            types.by_name.insert(name.clone(), types.order.len());
            types.order.push(ObjectType {
                name: name.clone(),
                kind,
                wrapper: wrapper_name(&options.name_prefix, &package.name, name),
                native,
                descriptor: seqbind_ffi::type_descriptor(&package.name, name),
            });
        }
        types
    }

    pub fn get(&self, name: &str) -> Option<&ObjectType> {
        self.by_name.get(name).map(|&i| &self.order[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectType> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Central build context for the codegen pipeline.
pub struct CodegenContext {
    /// Export-filtered model.
    pub package: Package,
    pub options: CodegenOptions,
    pub objects: ObjectTypes,
    pub blocked: BlockSet,
    pub call_table: CallTable,
    /// Rejected members, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl CodegenContext {
    pub fn new(package: Package, options: CodegenOptions, call_table: CallTable) -> Self {
        let objects = ObjectTypes::collect(&package, &options);
        let blocked = BlockSet::new(&options.blocklist);
        CodegenContext {
            package,
            options,
            objects,
            blocked,
            call_table,
            diagnostics: Vec::new(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package.name
    }

    /// Record a rejected member. A field rejected for both its getter and
    /// its setter is reported once.
    pub fn report(&mut self, subject: String, kind: DiagnosticKind) {
        if self.diagnostics.iter().any(|d| d.subject == subject && d.kind == kind) {
            return;
        }
        tracing::warn!(%subject, problem = %kind, "member rejected");
        self.diagnostics.push(Diagnostic { subject, kind });
    }
}
