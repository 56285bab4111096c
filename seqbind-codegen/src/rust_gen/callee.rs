// Callee half: one dispatcher per call site, each self-registering in the
// runtime dispatch table.
//
// A dispatcher decodes the receiver (members) and then every parameter in
// declared order, invokes the native declaration and encodes its results.

use crate::bind::{Binding, Target};
use crate::context::CodegenContext;
use crate::signature::ResultShape;
use crate::type_map::{codec, zero_value};

use super::{call_site_args, emit_codes_module, emit_header, native_member_name, param_local};

/// Name of the generated handler function for a binding.
pub fn handler_name(binding: &Binding) -> String {
    format!("handle_{}", binding.const_name().to_ascii_lowercase())
}

/// Generate the complete callee file.
pub fn generate_callee(ctx: &CodegenContext, bindings: &[Binding]) -> String {
    let mut out = String::with_capacity(8192);
    emit_header(&mut out, &ctx.package, "callee dispatchers");
    emit_codes_module(&mut out, &ctx.call_table);

    for b in bindings {
        out.push('\n');
        emit_handler(&mut out, b, &ctx.options.native_path);
        out.push('\n');
        emit_registration(&mut out, b);
    }
    out
}

fn native_call(b: &Binding, native_path: &str, args: &str) -> String {
    let member = native_member_name(b);
    match (&b.target, &b.receiver) {
        // Methods get the shared handle, not a guard: the native side
        // decides when to lock, so an argument aliasing the receiver or a
        // re-entrant call on the same object cannot deadlock.
        (Target::Method, Some(recv)) => {
            let sep = if args.is_empty() { "" } else { ", " };
            format!("{native_path}::{}::{member}(&seq_recv{sep}{args})", recv.name)
        }
        (Target::FieldGet, _) => format!("seqbind_runtime::read(&seq_recv).{member}.clone()"),
        // Handled as a statement.
        (Target::FieldSet, _) => String::new(),
        _ => format!("{native_path}::{member}({args})"),
    }
}

fn emit_handler(out: &mut String, b: &Binding, native_path: &str) {
    let reads_input = b.receiver.is_some() || !b.params.is_empty();
    let writes_output = !matches!(b.result, ResultShape::Void);
    out.push_str(&format!(
        "fn {}({}seq_out: &mut seqbind_runtime::Buffer, {}seq_in: &mut seqbind_runtime::Buffer) {{\n",
        handler_name(b),
        if writes_output { "" } else { "_" },
        if reads_input { "" } else { "_" },
    ));

    if let Some(recv) = &b.receiver {
        out.push_str(&format!(
            "    let seq_recv = seqbind_runtime::refs().get::<{}>(seq_in.read_ref());\n",
            recv.native
        ));
    }
    for p in &b.params {
        let raw = format!("seq_in.read_{}()", codec(p.ty.wire));
        out.push_str(&format!(
            "    let {} = {};\n",
            param_local(&p.name),
            p.ty.native_decode(&raw)
        ));
    }

    if b.target == Target::FieldSet {
        let value = b.params.first().map(|p| param_local(&p.name)).unwrap_or_default();
        out.push_str(&format!(
            "    seqbind_runtime::lock(&seq_recv).{} = {value};\n",
            native_member_name(b)
        ));
        out.push_str("}\n");
        return;
    }

    let args = b
        .params
        .iter()
        .map(|p| param_local(&p.name))
        .collect::<Vec<_>>()
        .join(", ");
    let call = native_call(b, native_path, &args);

    match &b.result {
        ResultShape::Void => {
            out.push_str(&format!("    {call};\n"));
        }
        ResultShape::Value(t) => {
            out.push_str(&format!("    let res = {call};\n"));
            out.push_str(&format!(
                "    seq_out.write_{}({});\n",
                codec(t.wire),
                t.native_encode("res")
            ));
        }
        ResultShape::Fallible => {
            out.push_str(&format!("    let res = {call};\n"));
            out.push_str("    match res {\n");
            out.push_str("        Ok(()) => seq_out.write_string(\"\"),\n");
            out.push_str(
                "        Err(err) => seq_out.write_string(&seqbind_runtime::failure_message(&err)),\n",
            );
            out.push_str("    }\n");
        }
        ResultShape::FallibleValue(t) => {
            let w = codec(t.wire);
            out.push_str(&format!("    let res = {call};\n"));
            out.push_str("    match res {\n");
            out.push_str("        Ok(res) => {\n");
            out.push_str(&format!("            seq_out.write_{w}({});\n", t.native_encode("res")));
            out.push_str("            seq_out.write_string(\"\");\n");
            out.push_str("        }\n");
            out.push_str("        Err(err) => {\n");
            out.push_str(&format!("            seq_out.write_{w}({});\n", zero_value(t.wire)));
            out.push_str(
                "            seq_out.write_string(&seqbind_runtime::failure_message(&err));\n",
            );
            out.push_str("        }\n");
            out.push_str("    }\n");
        }
    }
    out.push_str("}\n");
}

fn emit_registration(out: &mut String, b: &Binding) {
    let (descriptor, code) = call_site_args(b);
    out.push_str(&format!(
        "seqbind_runtime::inventory::submit! {{\n\
         \x20   seqbind_runtime::HandlerRegistration {{\n\
         \x20       descriptor: {descriptor},\n\
         \x20       code: {code},\n\
         \x20       handler: {},\n\
         \x20   }}\n\
         }}\n",
        handler_name(b)
    ));
}
