//! Indented tree dump of a parse tree, for grammar debugging.
//!
//! Used by the CLI's `--dump-ast` flag. One node per line, children
//! indented two spaces.

use crate::ast::{Expr, FStringLit, Fragment, Import, LabelBlock, Program, Stmt};
use crate::visitor::{walk_expr, walk_fstring, walk_label, walk_stmt, Visitor};

/// Renders `program` as an indented tree.
pub fn dump_program(program: &Program) -> String {
    let mut printer = AstPrinter {
        out: String::new(),
        depth: 0,
    };
    printer.line("program");
    printer.depth += 1;
    printer.visit_program(program);
    printer.out
}

struct AstPrinter {
    out: String,
    depth: usize,
}

impl AstPrinter {
    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn nested(&mut self, header: impl AsRef<str>, inner: impl FnOnce(&mut Self)) {
        self.line(header);
        self.depth += 1;
        inner(self);
        self.depth -= 1;
    }
}

impl Visitor for AstPrinter {
    fn visit_import(&mut self, import: &Import) {
        self.line(format!("import {}", import.path.lexeme));
    }

    fn visit_label(&mut self, label: &LabelBlock) {
        self.nested(format!("label {}", label.name.lexeme), |p| {
            walk_label(p, label);
        });
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        let header = match stmt {
            Stmt::Dialogue { speaker, .. } => match speaker {
                Some(speaker) => format!("dialogue speaker={}", speaker.lexeme),
                None => "dialogue".to_string(),
            },
            Stmt::Menu { items, .. } => format!("menu arms={}", items.len()),
            Stmt::Jump { target } => format!("jump {}", target.lexeme),
            Stmt::Tour { target } => format!("tour {}", target.lexeme),
            Stmt::Call { name, args, .. } => {
                format!("call {} args={}", name.lexeme, args.len())
            }
            Stmt::Assign { var, op, .. } => format!("assign {} {:?}", var.lexeme, op),
            Stmt::If { else_body, .. } => {
                format!("if else={}", else_body.is_some())
            }
        };
        self.nested(header, |p| walk_stmt(p, stmt));
    }

    fn visit_expr(&mut self, expr: &Expr) {
        let header = match expr {
            Expr::Literal(token) => format!("literal {}", token.lexeme),
            Expr::Variable(token) => format!("variable {}", token.lexeme),
            Expr::FString(_) => "fstring".to_string(),
            Expr::Binary { op, .. } => format!("binary {op:?}"),
            Expr::Unary { op, .. } => format!("unary {op:?}"),
            Expr::EmbedCall { name, args, .. } => {
                format!("embed-call {} args={}", name.lexeme, args.len())
            }
            Expr::EmbedExpr { .. } => "embed".to_string(),
        };
        self.nested(header, |p| walk_expr(p, expr));
    }

    fn visit_fstring(&mut self, fstring: &FStringLit) {
        let text: String = fstring
            .fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Content(token) | Fragment::Escape(token) => token.lexeme.as_str(),
                Fragment::Placeholder => "{...}",
            })
            .collect();
        self.nested(format!("fstring \"{text}\""), |p| walk_fstring(p, fstring));
    }
}
