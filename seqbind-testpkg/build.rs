// Build script: runs the generator over testpkg.json and writes both halves
// and the call table manifest into OUT_DIR.
//
// The output paths in seqbind.config.toml are for the CLI; the build script
// only takes the model location and the options from it.

use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let config_path = manifest_dir.join("seqbind.config.toml");
    let config = seqbind_codegen::load_config(&config_path)
        .unwrap_or_else(|e| panic!("{e}"));
    let model_path = manifest_dir.join(&config.codegen.package);

    println!("cargo:rerun-if-changed={}", config_path.display());
    println!("cargo:rerun-if-changed={}", model_path.display());

    let package = seqbind_codegen::load_package(&model_path).unwrap_or_else(|e| panic!("{e}"));
    let generated = seqbind_codegen::generate(&package, &config.codegen.options())
        .unwrap_or_else(|e| panic!("seqbind generation failed for {}:\n{e}", model_path.display()));

    let codes = generated.call_table.to_json().unwrap_or_else(|e| panic!("{e}"));
    for (name, contents) in [
        ("caller.rs", &generated.caller),
        ("callee.rs", &generated.callee),
        ("codes.json", &codes),
    ] {
        seqbind_codegen::write_output(&out_dir.join(name), contents)
            .unwrap_or_else(|e| panic!("{e}"));
    }
}
