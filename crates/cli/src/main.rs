mod config;
mod runner;
mod tap;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use hashgram_backend::{Backend, ExternalBackend, InProcessBackend, Node, Validator};
use hashgram_core::{compile_path, CompileOptions, FileSystemProvider};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Schema-to-grammar compiler for nested scalar / array / mapping data.
#[derive(Parser)]
#[command(
    name = "hashgram",
    version,
    about = "Schema-to-grammar compiler for nested scalar, array and mapping data"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log pass-level detail to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// TOML file with [compile] and [backend] defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that compiles a schema.
#[derive(clap::Args)]
struct CompileArgs {
    /// Path to the schema file
    schema: PathBuf,
    /// Grammar name for the %grammar directive
    #[arg(long)]
    name: Option<String>,
    /// Root entity as <sigil><name>, e.g. %record (default: first declaration)
    #[arg(long)]
    root: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema to grammar text
    Compile {
        #[command(flatten)]
        args: CompileArgs,
        /// Write the grammar to this file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Validate JSON or YAML documents against a schema
    Check {
        #[command(flatten)]
        args: CompileArgs,
        /// Documents to validate (.json, .yaml or .yml)
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },

    /// Compile a schema and hand the grammar to an external grammar compiler
    Build {
        #[command(flatten)]
        args: CompileArgs,
        /// Grammar compiler executable
        #[arg(long)]
        program: Option<String>,
        /// Argument for the grammar compiler; {grammar} and {name} are substituted
        #[arg(long = "arg", allow_hyphen_values = true)]
        backend_args: Vec<String>,
    },

    /// Run the conformance test suite
    Test {
        /// Path to the conformance suite directory
        #[arg(default_value = "conformance")]
        suite_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match config::read_config(path) {
            Ok(c) => c,
            Err(e) => {
                report_error(&e, cli.output, cli.quiet);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Commands::Compile { args, out } => {
            let options = config.compile_options(args.name, args.root);
            cmd_compile(&args.schema, &options, out.as_deref(), cli.output, cli.quiet);
        }
        Commands::Check { args, documents } => {
            let options = config.compile_options(args.name, args.root);
            cmd_check(&args.schema, &options, &documents, cli.output, cli.quiet);
        }
        Commands::Build {
            args,
            program,
            backend_args,
        } => {
            let options = config.compile_options(args.name, args.root);
            let program = program.or_else(|| config.backend.program.clone());
            let backend_args = if backend_args.is_empty() {
                config.backend.args.clone()
            } else {
                backend_args
            };
            cmd_build(
                &args.schema,
                &options,
                program,
                backend_args,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Test { suite_dir } => {
            cmd_test(&suite_dir);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Compile or exit 1 with the error rendered in the requested format.
fn compile_or_exit(
    schema: &Path,
    options: &CompileOptions,
    output: OutputFormat,
    quiet: bool,
) -> String {
    match compile_path(&FileSystemProvider, schema, options) {
        Ok(text) => text,
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let err_json = serde_json::to_string_pretty(&e.to_json_value())
                        .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
                    eprintln!("{}", err_json);
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("error: {}", e);
                    }
                }
            }
            process::exit(1);
        }
    }
}

fn cmd_compile(
    schema: &Path,
    options: &CompileOptions,
    out: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let text = compile_or_exit(schema, options, output, quiet);

    match out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &text) {
                let msg = format!("cannot write '{}': {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
            if !quiet {
                match output {
                    OutputFormat::Text => println!("wrote {}", path.display()),
                    OutputFormat::Json => {
                        let json = serde_json::json!({ "written": path.display().to_string() });
                        println!("{}", json);
                    }
                }
            }
        }
        None => match output {
            OutputFormat::Text => print!("{}", text),
            OutputFormat::Json => {
                let json = serde_json::json!({ "grammar": text });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                );
            }
        },
    }
}

fn cmd_check(
    schema: &Path,
    options: &CompileOptions,
    documents: &[PathBuf],
    output: OutputFormat,
    quiet: bool,
) {
    let text = compile_or_exit(schema, options, output, quiet);
    let mut validator: Validator = match InProcessBackend.compile(&text) {
        Ok(v) => v,
        Err(e) => {
            report_error(&format!("internal error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let mut rejected = 0usize;
    let mut reports = Vec::new();

    for path in documents {
        let node = match read_document(path) {
            Ok(n) => n,
            Err(e) => {
                report_error(&e, output, quiet);
                process::exit(1);
            }
        };
        let violations = validator.validate(&node);
        if !violations.is_empty() {
            rejected += 1;
        }

        match output {
            OutputFormat::Text => {
                if violations.is_empty() {
                    if !quiet {
                        println!("{}: valid", path.display());
                    }
                } else if !quiet {
                    eprintln!(
                        "{}: {} violation{}",
                        path.display(),
                        violations.len(),
                        if violations.len() == 1 { "" } else { "s" }
                    );
                    for v in violations {
                        eprintln!("  - {}", v);
                    }
                }
            }
            OutputFormat::Json => {
                let errors: Vec<serde_json::Value> = violations
                    .iter()
                    .map(|v| {
                        serde_json::json!({
                            "path": v.path,
                            "found": v.found,
                            "expected": v.expected,
                            "rule": v.rule,
                        })
                    })
                    .collect();
                reports.push(serde_json::json!({
                    "document": path.display().to_string(),
                    "valid": errors.is_empty(),
                    "errors": errors,
                }));
            }
        }
    }

    if output == OutputFormat::Json {
        let json = serde_json::json!({
            "valid": rejected == 0,
            "documents": reports,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_default()
        );
    }

    if rejected > 0 {
        process::exit(1);
    }
}

fn cmd_build(
    schema: &Path,
    options: &CompileOptions,
    program: Option<String>,
    args: Vec<String>,
    output: OutputFormat,
    quiet: bool,
) {
    let Some(program) = program else {
        report_error(
            "no grammar compiler given (use --program or [backend] program in --config)",
            output,
            quiet,
        );
        process::exit(1);
    };

    let text = compile_or_exit(schema, options, output, quiet);
    let backend = ExternalBackend::new(program, args);

    match backend.compile(&text) {
        Ok(artifact) => {
            if quiet {
                return;
            }
            match output {
                OutputFormat::Text => print!("{}", artifact.stdout),
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "program": artifact.program,
                        "exit_code": artifact.exit_code,
                        "stdout": artifact.stdout,
                    });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json).unwrap_or_default()
                    );
                }
            }
        }
        Err(e) => {
            let code = match &e {
                hashgram_backend::BackendError::Invocation {
                    code: Some(code), ..
                } => *code,
                _ => 1,
            };
            report_error(&e.to_string(), output, quiet);
            process::exit(code);
        }
    }
}

fn cmd_test(suite_dir: &Path) {
    if !suite_dir.exists() {
        eprintln!(
            "error: conformance suite directory not found: {}",
            suite_dir.display()
        );
        process::exit(1);
    }

    let result = runner::run_suite(suite_dir);
    if result.failed > 0 {
        process::exit(1);
    }
}

/// Load a JSON or YAML document, choosing the parser by file extension.
pub(crate) fn read_document(path: &Path) -> Result<Node, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        Node::from_yaml_str(&src)
    } else {
        Node::from_json_str(&src)
    };
    parsed.map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
