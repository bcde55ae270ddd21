use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use jdecor_classpath::Classpath;
use jdecor_gen::{DecoratorGenerator, DiagnosticsSink, StructuralChecker};

#[derive(Parser)]
#[command(name = "jdecor", version, about = "Generate JVM decorator classes")]
struct Cli {
    /// Binary name of the class or interface to decorate
    class: String,
    /// Name of the decorator class to generate, or of a template class
    /// present on the classpath
    decorator: String,
    /// Output path for the generated classfile
    output: PathBuf,
    /// Classpath entry (a class directory or a jar); may be repeated
    #[arg(long = "classpath", short = 'c')]
    classpath: Vec<PathBuf>,
    /// Verbose logging
    #[arg(long)]
    debug: bool,
    /// Emit a JSON generation report on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    wrapped: &'a str,
    decorator: &'a str,
    template: Option<&'a str>,
    output: &'a std::path::Path,
    size: usize,
    skipped: Vec<SkippedJson<'a>>,
}

#[derive(Serialize)]
struct SkippedJson<'a> {
    owner: &'a str,
    name: &'a str,
    descriptor: &'a str,
    reason: &'static str,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let classpath = Classpath::from_paths(cli.classpath.clone());
    let verifier = StructuralChecker;

    // The second positional doubles as a template reference: when it
    // resolves on the classpath the decorator is built over it and takes
    // its name.
    let decorator_internal = cli.decorator.replace('.', "/");
    let is_template = classpath
        .contains_class(&decorator_internal)
        .with_context(|| format!("reading classpath entry for {}", cli.decorator))?;

    let generator = if is_template {
        DecoratorGenerator::with_template(&classpath, &verifier, &cli.class, &cli.decorator)
    } else {
        DecoratorGenerator::plain(&classpath, &verifier, &cli.class, &cli.decorator)
    };

    let mut diags = DiagnosticsSink::default();
    let bytes = generator.generate(&mut diags)?;

    std::fs::write(&cli.output, &bytes)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    tracing::info!(
        target: "jdecor.cli",
        output = %cli.output.display(),
        size = bytes.len(),
        "wrote decorator class"
    );

    for skipped in diags.warnings() {
        tracing::warn!(
            target: "jdecor.cli",
            "ignored final method {}.{}:{}",
            skipped.owner,
            skipped.name,
            skipped.descriptor
        );
    }

    if cli.json {
        let wrapped_internal = cli.class.replace('.', "/");
        let report = Report {
            wrapped: &wrapped_internal,
            decorator: generator.decorator_name(),
            template: is_template.then_some(generator.decorator_name()),
            output: cli.output.as_path(),
            size: bytes.len(),
            skipped: diags
                .events()
                .iter()
                .map(|event| SkippedJson {
                    owner: &event.owner,
                    name: &event.name,
                    descriptor: &event.descriptor,
                    reason: event.reason.as_str(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(0)
}
