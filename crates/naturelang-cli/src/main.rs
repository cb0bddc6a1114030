//! NatureLang compiler CLI.
//!
//! Provides the `naturec` binary. The frontend (lexer/parser) is a separate
//! tool that serializes its AST as JSON; `naturec compile` reads that AST,
//! runs the semantic analyzer, lowers to TAC, optimizes, and writes a C
//! translation unit. `naturec check` runs only the analyzer and prints
//! diagnostics.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use naturelang_check::analyzer::SemanticAnalyzer;
use naturelang_codegen::{compile, CompileOptions, OptLevel};
use naturelang_core::ast::Node;

/// NatureLang compiler and tools.
#[derive(Parser)]
#[command(name = "naturec", about = "NatureLang compiler and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compile a frontend AST to a C translation unit.
    Compile {
        /// Path to the AST JSON file produced by the frontend.
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the generated C file.
        #[arg(short, long, default_value = "out.c")]
        output: PathBuf,

        /// Optimization level: O0, O1, O2.
        #[arg(short = 'O', long, default_value = "O0")]
        opt_level: String,

        /// Print the optimized TAC to stderr before emission.
        #[arg(long)]
        emit_tac: bool,

        /// Per-transformation optimizer diagnostics.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run semantic analysis only and report diagnostics.
    Check {
        /// Path to the AST JSON file produced by the frontend.
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Compile {
            input,
            output,
            opt_level,
            emit_tac,
            verbose,
        } => run_compile(&input, &output, &opt_level, emit_tac, verbose),
        Commands::Check { input } => run_check(&input),
    };
    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_ast(path: &PathBuf) -> Result<Node, i32> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("Error: failed to read '{}': {}", path.display(), error);
            return Err(3);
        }
    };
    match serde_json::from_str(&text) {
        Ok(ast) => Ok(ast),
        Err(error) => {
            eprintln!("Error: '{}' is not a valid AST document: {}", path.display(), error);
            Err(1)
        }
    }
}

/// Execute the compile subcommand.
///
/// Returns exit code: 0 = success, 1 = compilation error,
/// 2 = semantic errors, 3 = I/O error.
fn run_compile(
    input: &PathBuf,
    output: &PathBuf,
    opt_level_str: &str,
    emit_tac: bool,
    verbose: bool,
) -> i32 {
    init_logging(verbose);

    let opt_level = match parse_opt_level(opt_level_str) {
        Ok(level) => level,
        Err(message) => {
            eprintln!("Error: {}", message);
            return 1;
        }
    };

    let mut ast = match load_ast(input) {
        Ok(ast) => ast,
        Err(code) => return code,
    };

    let options = CompileOptions {
        opt_level,
        verbose,
        emit_tac,
    };

    match compile(&mut ast, &options) {
        Ok(result) => {
            if let Some(tac) = &result.tac {
                eprintln!("{}", tac);
            }
            for warning in &result.warnings {
                eprintln!("warning: {}", warning);
            }
            for error in &result.codegen_errors {
                eprintln!("codegen: {}", error);
            }
            if let Err(error) = std::fs::write(output, &result.c_source) {
                eprintln!("Error: failed to write '{}': {}", output.display(), error);
                return 3;
            }
            // Machine-readable summary of the run on stdout.
            let summary = serde_json::json!({
                "output": output,
                "opt_stats": result.opt_stats,
                "warnings": result.warnings.len(),
            });
            println!("{}", summary);
            0
        }
        Err(naturelang_codegen::CodegenError::CheckFailed(errors)) => {
            eprintln!("Semantic analysis failed with {} error(s):", errors.len());
            for error in &errors {
                eprintln!("  - {}", error);
            }
            2
        }
        Err(naturelang_codegen::CodegenError::Io(error)) => {
            eprintln!("I/O error: {}", error);
            3
        }
    }
}

/// Execute the check subcommand. Exit code 0 when clean, 2 on errors.
fn run_check(input: &PathBuf) -> i32 {
    init_logging(false);

    let mut ast = match load_ast(input) {
        Ok(ast) => ast,
        Err(code) => return code,
    };

    let report = SemanticAnalyzer::new().analyze(&mut ast);
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    for error in &report.errors {
        eprintln!("error: {}", error);
    }
    println!(
        "{}",
        serde_json::json!({
            "success": report.success,
            "errors": report.error_count,
            "warnings": report.warning_count,
        })
    );
    if report.success {
        0
    } else {
        2
    }
}

/// Parse an optimization level string to `OptLevel`.
fn parse_opt_level(text: &str) -> Result<OptLevel, String> {
    match text {
        "O0" | "o0" | "0" => Ok(OptLevel::O0),
        "O1" | "o1" | "1" => Ok(OptLevel::O1),
        "O2" | "o2" | "2" => Ok(OptLevel::O2),
        _ => Err(format!("invalid optimization level '{}', expected O0/O1/O2", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opt_level_parsing() {
        assert_eq!(parse_opt_level("O0").unwrap(), OptLevel::O0);
        assert_eq!(parse_opt_level("o1").unwrap(), OptLevel::O1);
        assert_eq!(parse_opt_level("2").unwrap(), OptLevel::O2);
        assert!(parse_opt_level("O3").is_err());
    }
}
