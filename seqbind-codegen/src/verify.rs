// Post-generate verification of the two halves.

use std::collections::HashSet;

use crate::bind::Binding;
use crate::call_table::check_unique;
use crate::context::CodegenContext;
use crate::diagnostics::{GenerateError, GenerateResult};
use crate::rust_gen::callee::handler_name;
use crate::rust_gen::{caller_fn_name, CODES_MODULE};

/// Check generated output integrity. Every failure here is a generator bug
/// or a model the generator cannot express in Rust (a name clash).
pub fn verify_output(
    ctx: &CodegenContext,
    bindings: &[Binding],
    caller: &str,
    callee: &str,
) -> GenerateResult<()> {
    let mut errors: Vec<String> = Vec::new();

    // 1. Call sites are unique.
    if let Err(e) = check_unique(&ctx.call_table) {
        errors.push(e.to_string());
    }

    // 2. Constant names are unique.
    let mut consts = HashSet::new();
    for e in &ctx.call_table.entries {
        if !consts.insert(e.const_name()) {
            errors.push(format!(
                "{}: constant {} clashes with another member",
                e.subject(&ctx.call_table.package),
                e.const_name()
            ));
        }
    }

    // 3. Caller item names are unique per scope; `ref_num` is taken on
    // every wrapper.
    let mut free_fns = HashSet::new();
    let mut members: HashSet<(String, String)> = ctx
        .objects
        .iter()
        .map(|o| (o.name.clone(), "ref_num".to_string()))
        .collect();
    for b in bindings {
        let name = caller_fn_name(b);
        let fresh = match &b.receiver {
            Some(r) => members.insert((r.name.clone(), name.clone())),
            None => free_fns.insert(name.clone()),
        };
        if !fresh {
            errors.push(format!(
                "{}: caller name `{name}` clashes with another member",
                b.entry.subject(ctx.package_name())
            ));
        }
    }
    for b in bindings {
        let mut params = HashSet::new();
        for p in &b.params {
            if !params.insert(p.name.as_str()) {
                errors.push(format!(
                    "{}: parameter name `{}` is used twice",
                    b.entry.subject(ctx.package_name()),
                    p.name
                ));
            }
        }
    }
    let mut wrappers = HashSet::new();
    for o in ctx.objects.iter() {
        if !wrappers.insert(o.wrapper.as_str()) {
            errors.push(format!("wrapper type `{}` is declared twice", o.wrapper));
        }
    }

    // 4. Both halves carry the codes module and every bound call site.
    let codes_header = format!("pub mod {CODES_MODULE} {{");
    for (half, text) in [("caller", caller), ("callee", callee)] {
        if text.is_empty() {
            errors.push(format!("{half} output is empty"));
        } else if !text.contains(&codes_header) {
            errors.push(format!("{half} output has no {CODES_MODULE} module"));
        }
    }
    for b in bindings {
        let handler = format!("fn {}(", handler_name(b));
        if !callee.contains(&handler) {
            errors.push(format!("callee output is missing {handler}..)"));
        }
        let code_ref = format!("{CODES_MODULE}::{}", b.const_name());
        if !caller.contains(&code_ref) {
            errors.push(format!("caller output never uses {code_ref}"));
        }
    }

    if errors.is_empty() {
        tracing::info!(
            call_sites = ctx.call_table.len(),
            bound = bindings.len(),
            wrappers = ctx.objects.len(),
            "output verified"
        );
        Ok(())
    } else {
        for e in &errors {
            tracing::error!("verification failed: {e}");
        }
        Err(GenerateError::Internal(errors.join("; ")))
    }
}
