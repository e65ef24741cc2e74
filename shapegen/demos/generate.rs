//! Generates one file from a template and writes it next to its module.
//!
//! Run with:
//! `cargo run --example generate -- <selector> <template> <output> [args] [--root DIR]... [--format]`
//!
//! `--format` pipes the result through `gofmt` and `goimports`.

use clap::Parser;
use shapegen::prelude::*;
use std::path::PathBuf;

/// Template-driven source generation for one type
#[derive(Parser)]
#[command(name = "generate")]
#[command(about = "Generate source for a record or capability set", long_about = None)]
struct Cli {
    /// Target type, `Name` or `"module/path".Name`
    selector: String,

    /// Path to the template file
    template: PathBuf,

    /// Output file; its directory is the destination module
    output: PathBuf,

    /// Template arguments as `key=value` pairs separated by `;`
    #[arg(default_value = "")]
    args: String,

    /// Directory searched for module manifests (repeatable)
    #[arg(long = "root")]
    roots: Vec<PathBuf>,

    /// Pipe the result through gofmt and goimports
    #[arg(long, default_value_t = false)]
    format: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut builder = Generator::builder().loader(ManifestLoader::new().roots(cli.roots));
    if cli.format {
        builder = builder.formatter(CommandFormatter::default());
    }
    let generator = builder.build();

    let generated = generator.generate(
        &TargetSelector::parse(&cli.selector)?,
        &TemplateSource::read(&cli.template)?,
        &cli.output,
        &cli.args.parse::<ArgMap>()?,
    )?;

    for warning in &generated.warnings {
        eprintln!("[shapegen] warning: {}", warning);
    }
    for diagnostic in &generated.diagnostics {
        eprintln!("[shapegen] {}", diagnostic);
    }

    std::fs::write(&cli.output, generated.as_bytes())?;
    println!("Wrote {} bytes to {}", generated.source.len(), cli.output.display());
    Ok(())
}
