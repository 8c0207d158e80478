use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use blockly::Block;
use blockly::parser::ParseError;
use interpreter::{CheckConfig, Failure};

const SUBCOMMANDS: &[&str] = &["check", "fmt", "help"];

/// Environment variable holding the tracing filter (e.g. `blockly=debug`).
const LOG_ENV: &str = "BLOCKLY_LOG";

#[derive(Parser)]
#[command(
    name = "blockly",
    version,
    about = "Block program decoder and structural checker"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a block program and check its structure
    Check(CheckArgs),

    /// Decode a block program and print it as canonical XML
    Fmt(FmtArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Block XML file to check
    file: String,

    /// TOML file with check settings and custom block shapes
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many failures (0 = unlimited)
    #[arg(long)]
    error_limit: Option<usize>,

    /// Report blocks whose type has no known shape
    #[arg(long)]
    deny_unknown: bool,

    /// Dump the decoded tree
    #[arg(long)]
    ast: bool,

    /// Print the block tree, one block per line
    #[arg(long)]
    list_blocks: bool,

    /// Only report problems, no summary line
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct FmtArgs {
    /// Block XML file to format
    file: String,
}

fn main() {
    init_tracing();

    // If the first positional arg is not a known subcommand, inject "check"
    // so `blockly file.xml` works like `blockly check file.xml`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|p| p + 1)
    {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "check".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let exit_code = match cli.command {
        Command::Check(check_args) => do_check(check_args, color_choice),
        Command::Fmt(fmt_args) => do_fmt(fmt_args, color_choice),
    };
    process::exit(exit_code);
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Only initialize if the filter variable is set
    if std::env::var(LOG_ENV).is_ok() {
        let filter = EnvFilter::from_env(LOG_ENV);
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    }
}

/// Source text registered in the codespan file database.
struct Loaded {
    files: SimpleFiles<String, String>,
    document: blockly::Document,
}

fn load(file: &str, color_choice: ColorChoice) -> Result<Loaded, i32> {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            return Err(1);
        }
    };

    tracing::debug!(file, bytes = source.len(), "read block program");

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    match blockly::parser::Parser::new(source, file_id).parse() {
        Ok(document) => Ok(Loaded { files, document }),
        Err(errors) => {
            tracing::debug!(file, errors = errors.len(), "block program failed to decode");
            emit_parse_errors(&files, &errors, color_choice);
            Err(1)
        }
    }
}

fn do_check(args: CheckArgs, color_choice: ColorChoice) -> i32 {
    let mut config = match &args.config {
        Some(path) => match CheckConfig::from_path(path) {
            Ok(config) => {
                tracing::debug!(
                    path = %path.display(),
                    custom_shapes = config.blocks.len(),
                    "loaded check config"
                );
                config
            }
            Err(e) => {
                eprintln!("error: {}", e);
                return 1;
            }
        },
        None => CheckConfig::default(),
    };
    if let Some(limit) = args.error_limit {
        config.error_limit = limit;
    }
    if args.deny_unknown {
        config.deny_unknown_blocks = true;
    }

    let loaded = match load(&args.file, color_choice) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let document = &loaded.document;

    if args.ast {
        println!("{:#?}", document);
    }

    if args.list_blocks {
        fn print_chain(head: &Block, indent: usize) {
            for block in head.chain() {
                let pad = "  ".repeat(indent);
                let position = if block.x.is_empty() && block.y.is_empty() {
                    String::new()
                } else {
                    format!(" @ ({}, {})", block.x, block.y)
                };
                println!("{}{}{}", pad, block.block_type, position);
                for value in &block.values {
                    println!("{}  {}:", pad, value.name);
                    for child in &value.blocks {
                        print_chain(child, indent + 2);
                    }
                }
                for statement in &block.statements {
                    println!("{}  {} {{", pad, statement.name);
                    for child in &statement.blocks {
                        print_chain(child, indent + 2);
                    }
                    println!("{}  }}", pad);
                }
            }
        }
        for head in &document.blocks {
            print_chain(head, 0);
        }
    }

    tracing::debug!(
        blocks = document.block_count(),
        error_limit = config.error_limit,
        "checking block program"
    );
    let report = interpreter::check_document(document, &config);

    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    for failure in &report.failures {
        emit_failure(&writer, &term_config, &loaded.files, failure);
    }

    if !args.quiet {
        let halted = if report.halted {
            " (stopped at error limit)"
        } else {
            ""
        };
        eprintln!(
            "{}: {} blocks checked, {} failures{}",
            args.file,
            report.blocks_checked,
            report.failures.len(),
            halted
        );
    }

    if report.is_clean() { 0 } else { 1 }
}

fn do_fmt(args: FmtArgs, color_choice: ColorChoice) -> i32 {
    match load(&args.file, color_choice) {
        Ok(loaded) => {
            print!("{}", loaded.document);
            0
        }
        Err(code) => code,
    }
}

fn emit_parse_errors(
    files: &SimpleFiles<String, String>,
    errors: &[ParseError],
    color_choice: ColorChoice,
) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in errors {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
}

fn emit_failure(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    failure: &Failure,
) {
    if let Some(span) = &failure.span {
        let mut label = Label::primary(failure.source_id, span.clone());
        if let Some(block_type) = &failure.block_type {
            label = label.with_message(format!("in block '{}'", block_type));
        }
        let diagnostic = Diagnostic::new(Severity::Error)
            .with_message(failure.to_string())
            .with_labels(vec![label]);
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    } else {
        eprintln!("structural error: {}", failure);
    }
}
