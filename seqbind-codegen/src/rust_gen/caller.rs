// Caller half: wrapper types for package objects and one stub per call site.
//
// A stub encodes the receiver and arguments, sends them through the runtime
// transport and decodes the response in the order the dispatcher wrote it.

use crate::bind::Binding;
use crate::context::{CodegenContext, ObjectType};
use crate::signature::ResultShape;
use crate::type_map::{codec, MappedType};

use super::{call_site_args, caller_fn_name, emit_codes_module, emit_header};

/// Generate the complete caller file.
pub fn generate_caller(ctx: &CodegenContext, bindings: &[Binding]) -> String {
    let mut out = String::with_capacity(8192);
    emit_header(&mut out, &ctx.package, "caller stubs");
    emit_codes_module(&mut out, &ctx.call_table);

    // Every wrapper is declared before any stub refers to it.
    for obj in ctx.objects.iter() {
        out.push('\n');
        emit_wrapper(&mut out, obj, ctx.package_name());
    }

    for obj in ctx.objects.iter() {
        let members: Vec<&Binding> = bindings
            .iter()
            .filter(|b| b.receiver.as_ref().is_some_and(|r| r.name == obj.name))
            .collect();
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("\nimpl {} {{\n", obj.wrapper));
        for (i, b) in members.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            emit_stub(&mut out, b, "    ");
        }
        out.push_str("}\n");
    }

    for b in bindings.iter().filter(|b| b.receiver.is_none()) {
        out.push('\n');
        emit_stub(&mut out, b, "");
    }

    out
}

/// Wrapper type: a caller-side handle to one callee object.
fn emit_wrapper(out: &mut String, obj: &ObjectType, package: &str) {
    let w = &obj.wrapper;
    out.push_str(&format!(
        "/// Handle to a `{package}.{name}` living on the callee side.\n\
         #[derive(Clone)]\n\
         pub struct {w} {{\n\
         \x20   seq_proxy: std::sync::Arc<seqbind_runtime::Proxy>,\n\
         }}\n\n",
        name = obj.name,
    ));
    out.push_str(&format!(
        "impl seqbind_runtime::ProxyWrapper for {w} {{\n\
         \x20   fn from_proxy(proxy: std::sync::Arc<seqbind_runtime::Proxy>) -> Self {{\n\
         \x20       {w} {{ seq_proxy: proxy }}\n\
         \x20   }}\n\n\
         \x20   fn proxy(&self) -> &std::sync::Arc<seqbind_runtime::Proxy> {{\n\
         \x20       &self.seq_proxy\n\
         \x20   }}\n\
         }}\n\n"
    ));
    out.push_str(&format!(
        "impl {w} {{\n\
         \x20   /// Reference number of the callee object.\n\
         \x20   pub fn ref_num(&self) -> seqbind_runtime::RefNum {{\n\
         \x20       self.seq_proxy.num()\n\
         \x20   }}\n\
         }}\n\n"
    ));
    out.push_str(&format!(
        "impl PartialEq for {w} {{\n\
         \x20   fn eq(&self, other: &Self) -> bool {{\n\
         \x20       std::sync::Arc::ptr_eq(&self.seq_proxy, &other.seq_proxy)\n\
         \x20   }}\n\
         }}\n\n\
         impl Eq for {w} {{}}\n\n"
    ));
    out.push_str(&format!(
        "impl std::fmt::Debug for {w} {{\n\
         \x20   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{\n\
         \x20       f.debug_tuple(\"{w}\").field(&self.seq_proxy.num()).finish()\n\
         \x20   }}\n\
         }}\n"
    ));
}

fn return_type(result: &ResultShape<MappedType>) -> String {
    match result {
        ResultShape::Void => String::new(),
        ResultShape::Value(t) => format!(" -> {}", t.caller_result),
        ResultShape::Fallible => " -> Result<(), seqbind_runtime::CallError>".to_string(),
        ResultShape::FallibleValue(t) => {
            format!(" -> Result<{}, seqbind_runtime::CallError>", t.caller_result)
        }
    }
}

/// One stub. `indent` is the indentation of the `fn` line.
fn emit_stub(out: &mut String, b: &Binding, indent: &str) {
    let name = caller_fn_name(b);
    let mut params: Vec<String> = Vec::new();
    if b.receiver.is_some() {
        params.push("&self".to_string());
    }
    params.extend(b.params.iter().map(|p| format!("{}: {}", p.name, p.ty.caller_param)));

    let body = format!("{indent}    ");
    out.push_str(&format!(
        "{indent}pub fn {name}({}){} {{\n",
        params.join(", "),
        return_type(&b.result)
    ));
    out.push_str(&format!("{body}let mut seq_in = seqbind_runtime::Buffer::new();\n"));
    out.push_str(&format!("{body}let mut seq_out = seqbind_runtime::Buffer::new();\n"));
    if b.receiver.is_some() {
        out.push_str(&format!("{body}seq_in.write_ref(self.ref_num());\n"));
    }
    for p in &b.params {
        out.push_str(&format!(
            "{body}seq_in.write_{}({});\n",
            codec(p.ty.wire),
            p.ty.caller_encode(&p.name)
        ));
    }
    let (descriptor, code) = call_site_args(b);
    out.push_str(&format!(
        "{body}seqbind_runtime::send({descriptor}, {code}, &mut seq_in, &mut seq_out);\n"
    ));

    match &b.result {
        ResultShape::Void => {}
        ResultShape::Value(t) => {
            out.push_str(&format!("{body}let seq_res = seq_out.read_{}();\n", codec(t.wire)));
            out.push_str(&format!("{body}{}\n", t.caller_decode("seq_res")));
        }
        ResultShape::Fallible => {
            out.push_str(&format!("{body}let seq_err = seq_out.read_string();\n"));
            out.push_str(&format!("{body}if seq_err.is_empty() {{\n"));
            out.push_str(&format!("{body}    Ok(())\n"));
            out.push_str(&format!("{body}}} else {{\n"));
            out.push_str(&format!("{body}    Err(seqbind_runtime::CallError::new(seq_err))\n"));
            out.push_str(&format!("{body}}}\n"));
        }
        ResultShape::FallibleValue(t) => {
            // The value is always on the wire; on failure it is the zero
            // value and must not be decoded into a proxy.
            out.push_str(&format!("{body}let seq_res = seq_out.read_{}();\n", codec(t.wire)));
            out.push_str(&format!("{body}let seq_err = seq_out.read_string();\n"));
            out.push_str(&format!("{body}if !seq_err.is_empty() {{\n"));
            out.push_str(&format!("{body}    return Err(seqbind_runtime::CallError::new(seq_err));\n"));
            out.push_str(&format!("{body}}}\n"));
            out.push_str(&format!("{body}Ok({})\n", t.caller_decode("seq_res")));
        }
    }
    out.push_str(&format!("{indent}}}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::bind_package;
    use crate::call_table::build_call_table;
    use crate::config::CodegenOptions;
    use crate::schema::Package;

    fn caller_for(json: &str) -> String {
        let pkg: Package = serde_json::from_str(json).unwrap();
        let table = build_call_table(&pkg).unwrap();
        let mut ctx = CodegenContext::new(pkg, CodegenOptions::default(), table);
        let bindings = bind_package(&mut ctx).unwrap();
        assert!(ctx.diagnostics.is_empty(), "{:?}", ctx.diagnostics);
        generate_caller(&ctx, &bindings)
    }

    #[test]
    fn free_function_stub() {
        let out = caller_for(
            r#"{"name": "testpkg", "declarations": [
                {"kind": "function", "name": "Sum",
                 "params": [{"name": "x", "type": "int64"}, {"name": "y", "type": "int64"}],
                 "results": [{"type": "int64"}]}
            ]}"#,
        );
        assert!(out.contains("pub fn sum(x: i64, y: i64) -> i64 {"));
        assert!(out.contains("    seq_in.write_i64(x);\n    seq_in.write_i64(y);\n"));
        assert!(out.contains(
            "seqbind_runtime::send(seq_codes::PACKAGE, seq_codes::FUNC_SUM, &mut seq_in, &mut seq_out);"
        ));
        assert!(out.contains("    let seq_res = seq_out.read_i64();\n    seq_res\n"));
    }

    #[test]
    fn wrappers_come_before_stubs() {
        let out = caller_for(
            r#"{"name": "testpkg", "declarations": [
                {"kind": "function", "name": "NewS", "results": [{"type": "*S"}]},
                {"kind": "struct", "name": "S", "fields": [{"name": "X", "type": "float64"}]}
            ]}"#,
        );
        let wrapper = out.find("pub struct SeqTestpkgS").unwrap();
        let stub = out.find("pub fn new_s()").unwrap();
        assert!(wrapper < stub);
        assert!(out.contains("seqbind_runtime::proxy_for::<SeqTestpkgS>(seq_res)"));
        assert!(out.contains("    pub fn x(&self) -> f64 {"));
        assert!(out.contains("    pub fn set_x(&self, v: f64) {"));
        assert!(out.contains("        seq_in.write_ref(self.ref_num());"));
    }

    #[test]
    fn fallible_value_checks_error_before_decoding() {
        let out = caller_for(
            r#"{"name": "testpkg", "declarations": [
                {"kind": "struct", "name": "S"},
                {"kind": "function", "name": "Find", "params": [{"name": "key", "type": "string"}],
                 "results": [{"type": "*S"}, {"type": "error"}]}
            ]}"#,
        );
        assert!(out.contains(
            "pub fn find(key: &str) -> Result<SeqTestpkgS, seqbind_runtime::CallError> {"
        ));
        let err_check = out.find("return Err(seqbind_runtime::CallError::new(seq_err));").unwrap();
        let decode = out.find("Ok(seqbind_runtime::proxy_for::<SeqTestpkgS>(seq_res))").unwrap();
        assert!(err_check < decode);
    }

    #[test]
    fn error_only_result_uses_boolean_success() {
        let out = caller_for(
            r#"{"name": "testpkg", "declarations": [
                {"kind": "function", "name": "Validate", "params": [{"name": "n", "type": "int16"}],
                 "results": [{"type": "error"}]}
            ]}"#,
        );
        assert!(out.contains("pub fn validate(n: i16) -> Result<(), seqbind_runtime::CallError> {"));
        assert!(out.contains("seq_in.write_i32(n as i32);"));
        assert!(out.contains("if seq_err.is_empty() {"));
    }
}
