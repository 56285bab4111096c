// seqbind-codegen: reads a package declaration model, generates the caller
// stubs, the callee dispatchers and the call table manifest.

pub mod schema;
pub mod naming;
pub mod config;
pub mod diagnostics;
pub mod context;
pub mod filter;
pub mod call_table;
pub mod type_map;
pub mod signature;
pub mod bind;
pub mod rust_gen;
pub mod verify;

use std::path::{Path, PathBuf};

pub use call_table::{CallEntry, CallKind, CallTable};
pub use config::{CodegenOptions, SeqbindConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, GenerateError, GenerateResult};
pub use schema::Package;

use crate::context::CodegenContext;

/// Both generated halves plus the table they agree on.
#[derive(Debug, Clone)]
pub struct Generated {
    pub caller: String,
    pub callee: String,
    pub call_table: CallTable,
}

/// Generate both halves for `package`.
///
/// Every rejected member is reported; if any were, the result is
/// `GenerateError::Rejected` with the full list.
pub fn generate(package: &Package, options: &CodegenOptions) -> GenerateResult<Generated> {
    tracing::info!(
        package = %package.name,
        declarations = package.declarations.len(),
        "seqbind-codegen: generating"
    );

    let exported = filter::exported_surface(package);
    let call_table = call_table::build_call_table(&exported)?;
    let mut ctx = CodegenContext::new(exported, options.clone(), call_table);

    let bindings = bind::bind_package(&mut ctx)?;
    if !ctx.diagnostics.is_empty() {
        return Err(GenerateError::Rejected(ctx.diagnostics));
    }

    let caller = rust_gen::caller::generate_caller(&ctx, &bindings);
    let callee = rust_gen::callee::generate_callee(&ctx, &bindings);
    verify::verify_output(&ctx, &bindings, &caller, &callee)?;

    Ok(Generated {
        caller,
        callee,
        call_table: ctx.call_table,
    })
}

/// Call table of a package without generating any code.
pub fn call_table_for(package: &Package) -> GenerateResult<CallTable> {
    call_table::build_call_table(&filter::exported_surface(package))
}

/// Read a declaration model from a JSON file.
pub fn load_package(path: &Path) -> GenerateResult<Package> {
    let data = std::fs::read_to_string(path).map_err(|source| GenerateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| GenerateError::Model {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a `seqbind.config.toml`.
pub fn load_config(path: &Path) -> GenerateResult<SeqbindConfig> {
    let data = std::fs::read_to_string(path).map_err(|source| GenerateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&data).map_err(|source| GenerateError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_output(path: &Path, contents: &str) -> GenerateResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

/// Files written by [`run_generate`].
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub caller: PathBuf,
    pub callee: PathBuf,
    pub codes: Option<PathBuf>,
}

/// Run the generate command. Main entry point for codegen.
///
/// Paths in the config are relative to the config file's directory.
pub fn run_generate(config_path: &Path) -> GenerateResult<WrittenFiles> {
    let config = load_config(config_path)?;
    let codegen = &config.codegen;
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let package = load_package(&config_dir.join(&codegen.package))?;
    let generated = generate(&package, &codegen.options())?;

    let files = WrittenFiles {
        caller: config_dir.join(&codegen.paths.caller_out),
        callee: config_dir.join(&codegen.paths.callee_out),
        codes: codegen.paths.codes_out.as_ref().map(|p| config_dir.join(p)),
    };
    write_output(&files.caller, &generated.caller)?;
    write_output(&files.callee, &generated.callee)?;
    if let Some(codes) = &files.codes {
        write_output(codes, &generated.call_table.to_json()?)?;
    }

    tracing::info!(
        package = %package.name,
        caller = %files.caller.display(),
        callee = %files.callee.display(),
        "seqbind-codegen: done"
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "name": "testpkg",
        "path": "example.com/testpkg",
        "declarations": [
            {"kind": "function", "name": "Hello",
             "params": [{"name": "s", "type": "string"}], "results": [{"type": "string"}]},
            {"kind": "function", "name": "internal"},
            {"kind": "struct", "name": "S",
             "fields": [{"name": "X", "type": "float64"}, {"name": "Y", "type": "float64"}],
             "methods": [{"name": "Sum", "results": [{"type": "float64"}]}]},
            {"kind": "interface", "name": "Greeter",
             "methods": [{"name": "Greet", "params": [{"name": "name", "type": "string"}],
                          "results": [{"type": "string"}]}]},
            {"kind": "function", "name": "Sum",
             "params": [{"name": "x", "type": "int64"}, {"name": "y", "type": "int64"}],
             "results": [{"type": "int64"}]}
        ]
    }"#;

    fn model() -> Package {
        serde_json::from_str(MODEL).unwrap()
    }

    fn with_function(pkg: &mut Package, json: &str) {
        let decl = serde_json::from_str(json).unwrap();
        pkg.declarations.insert(1, decl);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(&model(), &CodegenOptions::default()).unwrap();
        let b = generate(&model(), &CodegenOptions::default()).unwrap();
        assert_eq!(a.caller, b.caller);
        assert_eq!(a.callee, b.callee);
        assert_eq!(a.call_table, b.call_table);
    }

    #[test]
    fn unexported_declarations_take_no_code() {
        let table = call_table_for(&model()).unwrap();
        assert_eq!(table.function("Hello").unwrap().code, 1);
        assert_eq!(table.function("Sum").unwrap().code, 2);
        assert!(table.function("internal").is_none());
    }

    #[test]
    fn every_rejection_is_collected() {
        let mut pkg = model();
        with_function(
            &mut pkg,
            r#"{"kind": "function", "name": "Three",
                "results": [{"type": "int"}, {"type": "int"}, {"type": "error"}]}"#,
        );
        with_function(
            &mut pkg,
            r#"{"kind": "function", "name": "Pair",
                "results": [{"type": "int"}, {"type": "string"}]}"#,
        );
        with_function(
            &mut pkg,
            r#"{"kind": "function", "name": "Keys",
                "params": [{"name": "m", "type": "map[string]int"}]}"#,
        );

        let Err(GenerateError::Rejected(diags)) = generate(&pkg, &CodegenOptions::default()) else {
            panic!("expected rejection");
        };
        let kinds: Vec<(&str, &DiagnosticKind)> =
            diags.iter().map(|d| (d.subject.as_str(), &d.kind)).collect();
        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[0].0, "testpkg.Keys");
        assert!(matches!(kinds[0].1, DiagnosticKind::UnsupportedType { .. }));
        assert_eq!(kinds[1], ("testpkg.Pair", &DiagnosticKind::ResultNotError("string".into())));
        assert_eq!(kinds[2], ("testpkg.Three", &DiagnosticKind::TooManyResults(3)));
    }

    #[test]
    fn error_only_result_is_accepted() {
        let mut pkg = model();
        with_function(
            &mut pkg,
            r#"{"kind": "function", "name": "Validate",
                "params": [{"name": "n", "type": "int"}], "results": [{"type": "error"}]}"#,
        );
        let out = generate(&pkg, &CodegenOptions::default()).unwrap();
        assert!(out.caller.contains("pub fn validate(n: i64) -> Result<(), seqbind_runtime::CallError>"));
    }

    #[test]
    fn rejected_and_blocklisted_members_keep_sibling_codes() {
        let baseline = call_table_for(&model()).unwrap();

        let mut pkg = model();
        let Some(schema::Declaration::Struct(s)) = pkg.declarations.get_mut(2) else {
            panic!("expected struct S");
        };
        s.fields.insert(
            0,
            serde_json::from_str(r#"{"name": "Tags", "type": "[]string"}"#).unwrap(),
        );
        s.methods.insert(
            0,
            serde_json::from_str(r#"{"name": "Lookup", "params": [{"name": "k", "type": "map[string]int"}]}"#)
                .unwrap(),
        );

        // Rejected while unlisted...
        let err = generate(&pkg, &CodegenOptions::default()).unwrap_err();
        let GenerateError::Rejected(diags) = err else {
            panic!("expected rejection");
        };
        assert_eq!(diags.len(), 2, "one diagnostic per member: {diags:?}");

        // ...accepted once blocklisted, with the same codes either way.
        let mut options = CodegenOptions::default();
        options.blocklist.members = vec!["S.Tags".into(), "S.Lookup".into()];
        let out = generate(&pkg, &options).unwrap();
        let table = out.call_table;
        assert_eq!(table.member("S", CallKind::FieldGet, "Tags").unwrap().code, 0x00f);
        assert_eq!(table.member("S", CallKind::FieldGet, "X").unwrap().code, 0x10f);
        assert_eq!(table.member("S", CallKind::Method, "Sum").unwrap().code, 0x10c);
        assert_eq!(table.function("Sum"), baseline.function("Sum"));
        assert!(!out.caller.contains("fn tags("));
        assert!(!out.callee.contains("handle_s_method_lookup"));
        assert!(out.callee.contains("handle_s_method_sum"));
    }

    #[test]
    fn interfaces_get_wrappers_but_no_method_stubs() {
        let out = generate(&model(), &CodegenOptions::default()).unwrap();
        assert!(out.caller.contains("pub struct SeqTestpkgGreeter"));
        assert!(out.caller.contains("pub const GREETER_METHOD_GREET: i32 = 0x00c;"));
        assert!(!out.caller.contains("fn greet("));
        assert!(!out.callee.contains("handle_greeter_method_greet"));
    }

    #[test]
    fn both_halves_share_the_codes_module() {
        let out = generate(&model(), &CodegenOptions::default()).unwrap();
        let codes = |text: &str| {
            let start = text.find("pub mod seq_codes {").unwrap();
            let end = start + text[start..].find("\n}\n").unwrap();
            text[start..end].to_string()
        };
        assert_eq!(codes(&out.caller), codes(&out.callee));
    }

    #[test]
    fn case_colliding_params_stay_distinct_in_both_halves() {
        let mut pkg = model();
        with_function(
            &mut pkg,
            r#"{"kind": "function", "name": "Diff",
                "params": [{"name": "x", "type": "int64"}, {"name": "X", "type": "int64"}],
                "results": [{"type": "int64"}]}"#,
        );
        with_function(
            &mut pkg,
            r#"{"kind": "function", "name": "Pick",
                "params": [{"name": "", "type": "int64"}, {"name": "P0", "type": "int64"}]}"#,
        );
        let out = generate(&pkg, &CodegenOptions::default()).unwrap();
        assert!(out.caller.contains("pub fn diff(x: i64, p1: i64) -> i64 {"));
        assert!(out.caller.contains("pub fn pick(p0: i64, p1: i64) {"));
        assert!(out.callee.contains("let res = crate::native::diff(param_x, param_p1);"));
        assert!(out.callee.contains("crate::native::pick(param_p0, param_p1);"));
    }

    #[test]
    fn name_prefix_is_configurable() {
        let options = CodegenOptions {
            name_prefix: "Go".into(),
            ..CodegenOptions::default()
        };
        let out = generate(&model(), &options).unwrap();
        assert!(out.caller.contains("pub struct GoTestpkgS {"));
    }

    #[test]
    fn caller_name_clash_is_an_internal_error() {
        let mut pkg = model();
        let Some(schema::Declaration::Struct(s)) = pkg.declarations.get_mut(2) else {
            panic!("expected struct S");
        };
        s.methods
            .push(serde_json::from_str(r#"{"name": "SetX", "params": [{"name": "v", "type": "float64"}]}"#).unwrap());
        let err = generate(&pkg, &CodegenOptions::default()).unwrap_err();
        assert!(matches!(err, GenerateError::Internal(msg) if msg.contains("set_x")));
    }

    #[test]
    fn run_generate_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("testpkg.json"), MODEL).unwrap();
        std::fs::write(
            dir.path().join("seqbind.config.toml"),
            r#"
                [codegen]
                package = "testpkg.json"

                [codegen.paths]
                caller_out = "out/caller.rs"
                callee_out = "out/callee.rs"
                codes_out = "out/codes.json"
            "#,
        )
        .unwrap();

        let files = run_generate(&dir.path().join("seqbind.config.toml")).unwrap();
        let caller = std::fs::read_to_string(&files.caller).unwrap();
        assert!(caller.contains("pub fn hello(s: &str) -> String {"));
        let codes: CallTable =
            serde_json::from_str(&std::fs::read_to_string(files.codes.unwrap()).unwrap()).unwrap();
        assert_eq!(codes.function("Sum").unwrap().code, 2);
    }

    #[test]
    fn missing_model_reports_the_path() {
        let err = load_package(Path::new("/nonexistent/testpkg.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/testpkg.json"));
    }
}
