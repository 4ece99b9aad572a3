//! Dispatch-by-kind traversal over the parse tree.
//!
//! Implement [`Visitor`] and override the hooks you care about; the default
//! methods delegate to the `walk_*` functions, which recurse into children
//! in source order. Calling `walk_*` from an overridden hook continues the
//! traversal below the current node.

use crate::ast::{Expr, FStringLit, Import, LabelBlock, MenuItem, Program, Stmt};

pub trait Visitor: Sized {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_import(&mut self, _import: &Import) {}

    fn visit_label(&mut self, label: &LabelBlock) {
        walk_label(self, label);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_fstring(&mut self, fstring: &FStringLit) {
        walk_fstring(self, fstring);
    }
}

pub fn walk_program<V: Visitor>(v: &mut V, program: &Program) {
    for import in &program.imports {
        v.visit_import(import);
    }
    for stmt in &program.top_stmts {
        v.visit_stmt(stmt);
    }
    for label in &program.labels {
        v.visit_label(label);
    }
}

pub fn walk_label<V: Visitor>(v: &mut V, label: &LabelBlock) {
    for stmt in &label.body {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Dialogue { text, .. } => v.visit_fstring(text),
        Stmt::Menu { items, .. } => {
            for MenuItem { text, body } in items {
                v.visit_fstring(text);
                for stmt in body {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Jump { .. } | Stmt::Tour { .. } => {}
        Stmt::Call { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Stmt::Assign { value, .. } => v.visit_expr(value),
        Stmt::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            v.visit_expr(cond);
            for stmt in then_body {
                v.visit_stmt(stmt);
            }
            if let Some(else_body) = else_body {
                for stmt in else_body {
                    v.visit_stmt(stmt);
                }
            }
        }
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Literal(_) | Expr::Variable(_) => {}
        Expr::FString(fstring) => v.visit_fstring(fstring),
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        Expr::Unary { operand, .. } => v.visit_expr(operand),
        Expr::EmbedCall { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::EmbedExpr { expr, .. } => v.visit_expr(expr),
    }
}

pub fn walk_fstring<V: Visitor>(v: &mut V, fstring: &FStringLit) {
    for embed in &fstring.embeds {
        v.visit_expr(embed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use dpscript_base::DiagnosticBag;

    /// Counts variable references anywhere in the tree.
    struct VariableCounter {
        count: usize,
    }

    impl Visitor for VariableCounter {
        fn visit_expr(&mut self, expr: &Expr) {
            if matches!(expr, Expr::Variable(_)) {
                self.count += 1;
            }
            walk_expr(self, expr);
        }
    }

    fn parse(source: &str) -> Program {
        let mut diagnostics = DiagnosticBag::new();
        let tokens = Lexer::new(source).tokenize(&mut diagnostics);
        let program = Parser::new(tokens).parse_program(&mut diagnostics);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.iter().collect::<Vec<_>>());
        program
    }

    #[test]
    fn walk_reaches_variables_in_embeds_and_conditions() {
        let source = "label a:\n    if $x == 1:\n        Alice \"hi {$y + $z}\"\n";
        let program = parse(source);
        let mut counter = VariableCounter { count: 0 };
        counter.visit_program(&program);
        assert_eq!(counter.count, 3);
    }

    #[test]
    fn walk_reaches_menu_bodies() {
        let source = "label a:\n    \"yes\":\n        $n = $n + 1\n    \"no\":\n        jump a\n";
        let program = parse(source);
        let mut counter = VariableCounter { count: 0 };
        counter.visit_program(&program);
        assert_eq!(counter.count, 1);
    }
}
