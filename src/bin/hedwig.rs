//! CLI tool for inspecting how hedwig tokenizes and parses JavaScript
//!
//! Usage: hedwig [options] <tokens|ast> <file.js | ->
//!
//! Output is JSON by default; `--format debug` prints Rust debug output.
//! Parse errors are logged to stderr and included in the AST dump.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, info};
use serde::Serialize;

use hedwig::{Lexer, Parser};

#[derive(ClapParser)]
#[command(name = "hedwig")]
#[command(about = "Tokenize and parse JavaScript source", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token sequence
    Tokens {
        /// Source file, or `-` for stdin
        file: PathBuf,
    },
    /// Print the parsed program
    Ast {
        /// Source file, or `-` for stdin
        file: PathBuf,
        /// Exit with status 1 if any statement failed to parse
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Debug,
}

/// Writes log records to stderr
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => eprintln!("{}: {}", record.level(), record.args()),
            _ => eprintln!("[{} {}] {}", record.level(), record.target(), record.args()),
        }
    }

    fn flush(&self) {}
}

fn init_logger(cli: &Cli) -> Result<(), log::SetLoggerError> {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    log::set_boxed_logger(Box::new(StderrLogger { level }))?;
    log::set_max_level(level);
    Ok(())
}

fn read_source(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| format!("Cannot read stdin: {}", e))?;
        return Ok(source);
    }
    fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))
}

fn render<T: Serialize + std::fmt::Debug>(
    value: &T,
    cli: &Cli,
) -> Result<String, serde_json::Error> {
    match cli.format {
        Format::Debug if cli.compact => Ok(format!("{:?}", value)),
        Format::Debug => Ok(format!("{:#?}", value)),
        Format::Json if cli.compact => serde_json::to_string(value),
        Format::Json => serde_json::to_string_pretty(value),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logger(&cli) {
        eprintln!("Error: {}", e);
    }

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when `--strict` is set and parsing reported errors
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Tokens { file } => {
            let source = read_source(file)?;
            let tokens = Lexer::new().tokenize(&source);
            info!("{}: {} tokens", file.display(), tokens.len());
            println!("{}", render(&tokens, cli)?);
            Ok(true)
        }
        Commands::Ast { file, strict } => {
            let source = read_source(file)?;
            let program = Parser::new().parse(&source);
            info!(
                "{}: {} statements, {} errors",
                file.display(),
                program.body.len(),
                program.errors.len()
            );
            println!("{}", render(&program, cli)?);
            Ok(!(*strict && program.has_errors()))
        }
    }
}
