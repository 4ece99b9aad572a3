//! DP compiler CLI (`dpc`).
//!
//! A thin driver over the library crates: resolve the script through the
//! filesystem resolver, run one compile, render the diagnostics. Command
//! logic lives here rather than in `main.rs` so it stays testable.
//!
//! # Exit Codes
//!
//! - `0` — compile succeeded (warnings allowed)
//! - `1` — compile failed, script missing, or invalid arguments

pub mod render;

use std::error::Error;
use std::sync::Arc;

use clap::Parser;

use dpscript_base::{CancelToken, DiagnosticBag, Severity};
use dpscript_compile::{Compiler, FsResolver, SourceResolver};
use dpscript_language::printer::dump_program;
use dpscript_language::{Lexer, Parser as DpParser};

use crate::render::{render_diagnostic, Style};

/// Command-line interface for the DP compiler.
#[derive(Parser)]
#[command(name = "dpc")]
#[command(about = "The DP dialogue-script compiler", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Script to compile: a path or a file:// URI.
    pub script: String,

    /// Emit diagnostics as a JSON array instead of rendered text.
    #[arg(long)]
    pub json: bool,

    /// Lex and parse only, printing the parse tree.
    #[arg(long)]
    pub dump_ast: bool,

    /// Suppress the result summary line.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parses arguments and runs the compiler on a fresh tokio runtime.
pub fn run_cli() -> Result<i32, Box<dyn Error>> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(cli))
}

/// Executes one CLI invocation, returning the process exit code.
pub async fn run(cli: Cli) -> Result<i32, Box<dyn Error>> {
    let resolver = FsResolver::new();
    if !resolver.exists(&cli.script).await {
        eprintln!("{}: script not found: {}", Style::bold_red("error"), cli.script);
        return Ok(1);
    }

    if cli.dump_ast {
        return dump_ast(&resolver, &cli.script).await;
    }

    let mut compiler = Compiler::new(Arc::new(resolver));
    let result = compiler.compile(&cli.script, &CancelToken::new()).await?;
    log::debug!("compiled {} labels", result.labels.labels.len());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result.diagnostics)?);
    } else {
        let source = FsResolver::new()
            .get_text(&result.source_id)
            .await
            .unwrap_or_default();
        for diagnostic in &result.diagnostics {
            eprintln!("{}\n", render_diagnostic(diagnostic, &source));
        }
        if !cli.quiet {
            print_summary(&result);
        }
    }
    Ok(if result.success { 0 } else { 1 })
}

async fn dump_ast(resolver: &FsResolver, script: &str) -> Result<i32, Box<dyn Error>> {
    let text = resolver.get_text(script).await?;
    let mut diagnostics = DiagnosticBag::new();
    let tokens = Lexer::new(&text).tokenize(&mut diagnostics);
    let program = DpParser::new(tokens).parse_program(&mut diagnostics);

    print!("{}", dump_program(&program));
    for diagnostic in &diagnostics {
        eprintln!("{}\n", render_diagnostic(diagnostic, &text));
    }
    Ok(if diagnostics.has_errors() { 1 } else { 0 })
}

fn print_summary(result: &dpscript_compile::CompileResult) {
    if result.success {
        println!(
            "{}: {} label(s) compiled",
            Style::green("ok"),
            result.labels.labels.len()
        );
    } else {
        let errors = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let warnings = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        println!(
            "{}: {errors} error(s), {warnings} warning(s)",
            Style::bold_red("failed")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_script(dir: &std::path::Path, name: &str, text: &str) -> String {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create script");
        file.write_all(text.as_bytes()).expect("write script");
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn clean_script_exits_zero() {
        let dir = std::env::temp_dir().join("dpc-test-clean");
        std::fs::create_dir_all(&dir).expect("mkdir");
        let script = write_script(&dir, "ok.dp", "label a:\n    Alice \"hi\"\n");
        let cli = Cli {
            script,
            json: false,
            dump_ast: false,
            quiet: true,
        };
        assert_eq!(run(cli).await.expect("runs"), 0);
    }

    #[tokio::test]
    async fn broken_script_exits_one() {
        let dir = std::env::temp_dir().join("dpc-test-broken");
        std::fs::create_dir_all(&dir).expect("mkdir");
        let script = write_script(&dir, "bad.dp", "label a:\n    jump missing\n");
        let cli = Cli {
            script,
            json: true,
            dump_ast: false,
            quiet: true,
        };
        assert_eq!(run(cli).await.expect("runs"), 1);
    }

    #[tokio::test]
    async fn missing_script_exits_one_without_error() {
        let cli = Cli {
            script: "/definitely/not/here.dp".to_string(),
            json: false,
            dump_ast: false,
            quiet: true,
        };
        assert_eq!(run(cli).await.expect("runs"), 1);
    }

    #[tokio::test]
    async fn dump_ast_mode_parses_only() {
        let dir = std::env::temp_dir().join("dpc-test-dump");
        std::fs::create_dir_all(&dir).expect("mkdir");
        // `jump missing` would be a semantic error, but --dump-ast stops
        // after parsing, so this exits clean.
        let script = write_script(&dir, "dump.dp", "label a:\n    jump missing\n");
        let cli = Cli {
            script,
            json: false,
            dump_ast: true,
            quiet: true,
        };
        assert_eq!(run(cli).await.expect("runs"), 0);
    }
}
