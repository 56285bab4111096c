// Call table: deterministic (descriptor, code) for every callable surface.
//
// Codes depend on declared order only. Two generator runs over the same
// model, on different machines or days apart, produce the same table; that
// is the whole agreement mechanism between the caller and callee halves.
// The table is built before type mapping, so a member that is later
// rejected or blocklisted still holds its code.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use seqbind_ffi::{
    field_get_code, field_set_code, func_code, method_code, package_descriptor, type_descriptor,
};

use crate::diagnostics::{GenerateError, GenerateResult};
use crate::naming::to_screaming_snake_case;
use crate::schema::{Declaration, Package};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Function,
    FieldGet,
    FieldSet,
    Method,
    /// Recorded for completeness; interface methods get no stubs.
    InterfaceMethod,
}

/// One callable surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEntry {
    pub descriptor: String,
    pub code: i32,
    pub kind: CallKind,
    /// Declaring struct/interface; `None` for free functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Function, field or method name.
    pub member: String,
    /// Declared position among members of the same kind.
    pub index: u32,
}

impl CallEntry {
    /// Qualified source name, e.g. `testpkg.S.Sum`.
    pub fn subject(&self, package: &str) -> String {
        match &self.owner {
            Some(owner) => format!("{package}.{owner}.{}", self.member),
            None => format!("{package}.{}", self.member),
        }
    }

    /// Name of the generated constant holding this entry's code.
    pub fn const_name(&self) -> String {
        let member = to_screaming_snake_case(&self.member);
        let owner = self.owner.as_deref().map(to_screaming_snake_case);
        match (self.kind, owner) {
            (CallKind::Function, _) => format!("FUNC_{member}"),
            (CallKind::FieldGet, Some(o)) => format!("{o}_FIELD_{member}_GET"),
            (CallKind::FieldSet, Some(o)) => format!("{o}_FIELD_{member}_SET"),
            (_, Some(o)) => format!("{o}_METHOD_{member}"),
            (_, None) => format!("METHOD_{member}"),
        }
    }
}

/// Every call site of one package, in assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTable {
    pub package: String,
    pub entries: Vec<CallEntry>,
}

impl CallTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, descriptor: &str, code: i32) -> Option<&CallEntry> {
        self.entries
            .iter()
            .find(|e| e.descriptor == descriptor && e.code == code)
    }

    /// Entry for a free function by name.
    pub fn function(&self, name: &str) -> Option<&CallEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == CallKind::Function && e.member == name)
    }

    /// Entry for a struct/interface member by kind and name.
    pub fn member(&self, owner: &str, kind: CallKind, name: &str) -> Option<&CallEntry> {
        self.entries.iter().find(|e| {
            e.kind == kind && e.owner.as_deref() == Some(owner) && e.member == name
        })
    }

    /// Pretty JSON manifest (`codes.json`).
    pub fn to_json(&self) -> GenerateResult<String> {
        serde_json::to_string_pretty(self).map_err(GenerateError::Manifest)
    }
}

fn index_u32(index: usize, subject: &str) -> GenerateResult<u32> {
    u32::try_from(index).map_err(|_| GenerateError::Internal(format!("{subject}: index {index} out of range")))
}

fn checked(code: Option<i32>, subject: &str, index: u32) -> GenerateResult<i32> {
    code.ok_or_else(|| {
        GenerateError::Internal(format!("{subject}: member index {index} does not fit a call code"))
    })
}

/// Assign codes to every member of an already export-filtered package.
pub fn build_call_table(package: &Package) -> GenerateResult<CallTable> {
    let pkg = &package.name;
    let mut entries = Vec::new();

    // Free functions first, counting from 1 across the whole package.
    let functions = package.declarations.iter().filter_map(|d| match d {
        Declaration::Function(f) => Some(f),
        _ => None,
    });
    for (i, f) in functions.enumerate() {
        let index = index_u32(i, &f.name)?;
        entries.push(CallEntry {
            descriptor: package_descriptor(pkg),
            code: checked(func_code(index), &f.name, index)?,
            kind: CallKind::Function,
            owner: None,
            member: f.name.clone(),
            index,
        });
    }

    for decl in &package.declarations {
        match decl {
            Declaration::Function(_) => {}
            Declaration::Struct(s) => {
                let descriptor = type_descriptor(pkg, &s.name);
                for (i, field) in s.fields.iter().enumerate() {
                    let index = index_u32(i, &field.name)?;
                    for (kind, code) in [
                        (CallKind::FieldGet, field_get_code(index)),
                        (CallKind::FieldSet, field_set_code(index)),
                    ] {
                        entries.push(CallEntry {
                            descriptor: descriptor.clone(),
                            code: checked(code, &field.name, index)?,
                            kind,
                            owner: Some(s.name.clone()),
                            member: field.name.clone(),
                            index,
                        });
                    }
                }
                for (j, m) in s.methods.iter().enumerate() {
                    let index = index_u32(j, &m.name)?;
                    entries.push(CallEntry {
                        descriptor: descriptor.clone(),
                        code: checked(method_code(index), &m.name, index)?,
                        kind: CallKind::Method,
                        owner: Some(s.name.clone()),
                        member: m.name.clone(),
                        index,
                    });
                }
            }
            Declaration::Interface(iface) => {
                let descriptor = type_descriptor(pkg, &iface.name);
                for (j, m) in iface.methods.iter().enumerate() {
                    let index = index_u32(j, &m.name)?;
                    entries.push(CallEntry {
                        descriptor: descriptor.clone(),
                        code: checked(method_code(index), &m.name, index)?,
                        kind: CallKind::InterfaceMethod,
                        owner: Some(iface.name.clone()),
                        member: m.name.clone(),
                        index,
                    });
                }
            }
        }
    }

    let table = CallTable {
        package: pkg.clone(),
        entries,
    };
    check_unique(&table)?;
    tracing::debug!(package = %pkg, call_sites = table.len(), "call table built");
    Ok(table)
}

/// No two entries share a (descriptor, code).
pub fn check_unique(table: &CallTable) -> GenerateResult<()> {
    let mut seen = HashSet::new();
    for e in &table.entries {
        if !seen.insert((e.descriptor.as_str(), e.code)) {
            return Err(GenerateError::Internal(format!(
                "duplicate call site {}:{:#x} ({})",
                e.descriptor,
                e.code,
                e.subject(&table.package)
            )));
        }
    }
    Ok(())
}
