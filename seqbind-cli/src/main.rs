// seqbind-cli: CLI entry point for seqbind tools (generate, codes, check).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use seqbind_codegen::{CodegenOptions, GenerateResult};

#[derive(Parser)]
#[command(name = "seqbind", about = "seqbind CLI: cross-boundary binding generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the caller and callee halves described by a config file.
    Generate {
        /// Path to seqbind.config.toml.
        #[arg(long, default_value = "seqbind.config.toml")]
        config: PathBuf,
    },
    /// Print the call table of a declaration model as JSON.
    Codes {
        /// Path to the package declaration model (JSON).
        #[arg(long)]
        package: PathBuf,
    },
    /// Report every member the generator would reject, without writing output.
    Check {
        /// Path to the package declaration model (JSON).
        #[arg(long)]
        package: PathBuf,
        /// Optional config whose blocklist is applied.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("SEQBIND_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate { config } => seqbind_codegen::run_generate(&config).map(|files| {
            println!("caller: {}", files.caller.display());
            println!("callee: {}", files.callee.display());
            if let Some(codes) = files.codes {
                println!("codes:  {}", codes.display());
            }
        }),
        Commands::Codes { package } => print_codes(&package),
        Commands::Check { package, config } => run_check(&package, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_codes(package: &Path) -> GenerateResult<()> {
    let package = seqbind_codegen::load_package(package)?;
    let table = seqbind_codegen::call_table_for(&package)?;
    println!("{}", table.to_json()?);
    Ok(())
}

fn run_check(package: &Path, config: Option<&Path>) -> GenerateResult<()> {
    let options = match config {
        Some(path) => seqbind_codegen::load_config(path)?.codegen.options(),
        None => CodegenOptions::default(),
    };
    let package = seqbind_codegen::load_package(package)?;
    // A rejection lists every diagnostic in its message.
    let generated = seqbind_codegen::generate(&package, &options)?;
    println!(
        "{}: {} call sites, no rejected members",
        package.name,
        generated.call_table.len()
    );
    Ok(())
}
