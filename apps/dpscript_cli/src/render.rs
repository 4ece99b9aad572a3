//! Terminal rendering of diagnostics: severity coloring, a line gutter with
//! the offending source line, and a caret underline at the exact span.

use dpscript_base::{Diagnostic, Severity};

/// ANSI escape code styling utilities. Colors reset at the end.
pub struct Style;

impl Style {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const RED: &'static str = "\x1b[31m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const YELLOW: &'static str = "\x1b[33m";
    pub const BLUE: &'static str = "\x1b[34m";
    pub const CYAN: &'static str = "\x1b[36m";

    pub fn red(s: &str) -> String {
        format!("{}{}{}", Self::RED, s, Self::RESET)
    }

    pub fn green(s: &str) -> String {
        format!("{}{}{}", Self::GREEN, s, Self::RESET)
    }

    pub fn yellow(s: &str) -> String {
        format!("{}{}{}", Self::YELLOW, s, Self::RESET)
    }

    pub fn blue(s: &str) -> String {
        format!("{}{}{}", Self::BLUE, s, Self::RESET)
    }

    pub fn cyan(s: &str) -> String {
        format!("{}{}{}", Self::CYAN, s, Self::RESET)
    }

    pub fn bold_red(s: &str) -> String {
        format!("{}{}{}{}", Self::BOLD, Self::RED, s, Self::RESET)
    }
}

/// Renders one diagnostic with its source line and a caret underline.
pub fn render_diagnostic(diagnostic: &Diagnostic, source: &str) -> String {
    let label = match diagnostic.severity {
        Severity::Error => Style::bold_red("error"),
        Severity::Warning => Style::yellow("warning"),
        Severity::Info => Style::cyan("info"),
        Severity::Log => Style::blue("log"),
    };

    let line_no = diagnostic.position.line;
    let line_content = source
        .lines()
        .nth(line_no.saturating_sub(1) as usize)
        .unwrap_or("");

    let column = diagnostic.position.column.max(1) as usize;
    let width = diagnostic
        .span
        .filter(|span| span.end.line == span.start.line)
        .map(|span| span.end.column.saturating_sub(span.start.column).max(1))
        .unwrap_or(1) as usize;
    let underline = format!("{}{}", " ".repeat(column - 1), "^".repeat(width));

    let gutter = Style::blue(&format!("{line_no:4}"));
    let pipe = Style::blue("|");
    format!(
        "{label}: {}\n{gutter} {pipe} {line_content}\n     {pipe} {}",
        diagnostic.message,
        Style::red(&underline),
    )
}
