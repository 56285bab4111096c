// Rust code generation: shared pieces of the caller and callee halves.

pub mod caller;
pub mod callee;

use crate::bind::{Binding, Target};
use crate::call_table::{CallEntry, CallTable};
use crate::naming::{rust_ident, to_screaming_snake_case, to_snake_case};
use crate::schema::Package;

/// Module holding the call site constants in both generated files.
pub const CODES_MODULE: &str = "seq_codes";

/// Standard file header.
pub fn emit_header(out: &mut String, package: &Package, half: &str) {
    out.push_str("// Code generated by seqbind. DO NOT EDIT.\n");
    if package.path.is_empty() {
        out.push_str(&format!("// Package {}: {half}.\n\n", package.name));
    } else {
        out.push_str(&format!("// Package {} ({}): {half}.\n\n", package.name, package.path));
    }
}

/// Constant naming the descriptor of `entry`.
pub fn descriptor_const(entry: &CallEntry) -> String {
    match &entry.owner {
        Some(owner) => format!("TYPE_{}", to_screaming_snake_case(owner)),
        None => "PACKAGE".to_string(),
    }
}

/// The `seq_codes` module. Emitted byte-identically into both halves, so the
/// two files can be diffed for agreement.
pub fn emit_codes_module(out: &mut String, table: &CallTable) {
    out.push_str(&format!("pub mod {CODES_MODULE} {{\n"));
    out.push_str(&format!("    pub const PACKAGE: &str = \"{}\";\n", table.package));

    let mut descriptors: Vec<(String, &str)> = Vec::new();
    for e in &table.entries {
        let name = descriptor_const(e);
        if e.owner.is_some() && !descriptors.iter().any(|(n, _)| *n == name) {
            descriptors.push((name, &e.descriptor));
        }
    }
    for (name, descriptor) in &descriptors {
        out.push_str(&format!("    pub const {name}: &str = \"{descriptor}\";\n"));
    }

    out.push('\n');
    for e in &table.entries {
        out.push_str(&format!("    pub const {}: i32 = {:#05x};\n", e.const_name(), e.code));
    }
    out.push_str("}\n");
}

/// `seq_codes::X` path of a binding's descriptor and code.
pub fn call_site_args(binding: &Binding) -> (String, String) {
    (
        format!("{CODES_MODULE}::{}", descriptor_const(&binding.entry)),
        format!("{CODES_MODULE}::{}", binding.const_name()),
    )
}

/// Rust name of the caller-side function or wrapper method.
pub fn caller_fn_name(binding: &Binding) -> String {
    match binding.target {
        Target::FieldSet => format!("set_{}", to_snake_case(&binding.entry.member)),
        _ => rust_ident(&binding.entry.member),
    }
}

/// Rust name of the native function, method or field.
pub fn native_member_name(binding: &Binding) -> String {
    rust_ident(&binding.entry.member)
}

/// Callee-side local holding a decoded parameter.
pub fn param_local(name: &str) -> String {
    format!("param_{}", name.trim_start_matches("r#"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_table::build_call_table;

    #[test]
    fn codes_module_lists_descriptors_and_codes() {
        let pkg: Package = serde_json::from_str(
            r#"{"name": "testpkg", "declarations": [
                {"kind": "function", "name": "Sum"},
                {"kind": "struct", "name": "S", "fields": [{"name": "X", "type": "float64"}]}
            ]}"#,
        )
        .unwrap();
        let mut out = String::new();
        emit_codes_module(&mut out, &build_call_table(&pkg).unwrap());
        assert!(out.contains("pub const PACKAGE: &str = \"testpkg\";"));
        assert!(out.contains("pub const TYPE_S: &str = \"testpkg.S\";"));
        assert!(out.contains("pub const FUNC_SUM: i32 = 0x001;"));
        assert!(out.contains("pub const S_FIELD_X_GET: i32 = 0x00f;"));
        assert!(out.contains("pub const S_FIELD_X_SET: i32 = 0x01f;"));
    }

    #[test]
    fn param_locals_drop_raw_prefix() {
        assert_eq!(param_local("r#type"), "param_type");
        assert_eq!(param_local("x"), "param_x");
    }
}
