//! Lowers a parse tree into statement IR and symbol-table records.
//!
//! One [`Lowerer`] handles one source unit. It converts expression syntax
//! into evaluable [`Expr`] trees, translates f-string fragments (escapes
//! resolved, one [`PLACEHOLDER`] per embed), and records label/variable
//! definitions and usages as it walks:
//!
//! - `label NAME:` records a label definition and becomes the "current
//!   label" context for everything in its body.
//! - `jump`/`tour` record a label usage under the current context.
//! - `$var op= value` records a variable definition at the variable and a
//!   usage at the value, then builds `var := op(var, value)` for compound
//!   operators.
//! - Variable references in expressions record usages.
//!
//! Stored variable names have the `$` sigil stripped; a `global.` prefix is
//! preserved (scoping is the runtime's concern, the compiler only keeps the
//! name intact).

use dpscript_language::ast::{self, AssignOp, Fragment};
use dpscript_language::token::TokenType;

use crate::expr::{BinaryOp, Expr, UnaryOp, Value, PLACEHOLDER};
use crate::sir::{MenuArm, SirLabel, SirStmt, ENTRANCE_LABEL};
use crate::symbols::{FileSymbolTable, SymbolPosition};

pub struct Lowerer<'a> {
    source_id: &'a str,
    current_label: Option<String>,
    table: FileSymbolTable,
}

impl<'a> Lowerer<'a> {
    pub fn new(source_id: &'a str) -> Self {
        Lowerer {
            source_id,
            current_label: None,
            table: FileSymbolTable::new(),
        }
    }

    pub fn table_mut(&mut self) -> &mut FileSymbolTable {
        &mut self.table
    }

    /// Consumes the lowerer, yielding the populated symbol table.
    pub fn finish(self) -> FileSymbolTable {
        self.table
    }

    /// Lowers one label block; the block's name is the symbol context for
    /// its body.
    pub fn lower_label(&mut self, block: &ast::LabelBlock) -> SirLabel {
        let name = block.name.lexeme.clone();
        let at = self.here(block.name.line, block.name.column);
        self.table.add_label_def(name.clone(), at);

        self.current_label = Some(name.clone());
        let statements = self.lower_stmts(&block.body);
        self.current_label = None;

        SirLabel {
            name,
            source_id: self.source_id.to_string(),
            statements,
        }
    }

    /// Lowers the root file's top-level statements; symbol context is the
    /// synthesized entrance label.
    pub fn lower_top_level(&mut self, stmts: &[ast::Stmt]) -> Vec<SirStmt> {
        self.current_label = Some(ENTRANCE_LABEL.to_string());
        let lowered = self.lower_stmts(stmts);
        self.current_label = None;
        lowered
    }

    fn lower_stmts(&mut self, stmts: &[ast::Stmt]) -> Vec<SirStmt> {
        stmts.iter().map(|stmt| self.lower_stmt(stmt)).collect()
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt) -> SirStmt {
        match stmt {
            ast::Stmt::Dialogue { speaker, text } => SirStmt::Dialogue {
                speaker: speaker.as_ref().map(|token| token.lexeme.clone()),
                text: self.lower_fstring(text),
            },
            ast::Stmt::Menu { items, .. } => SirStmt::Menu {
                arms: items
                    .iter()
                    .map(|item| MenuArm {
                        text: self.lower_fstring(&item.text),
                        body: self.lower_stmts(&item.body),
                    })
                    .collect(),
            },
            ast::Stmt::Jump { target } => {
                let at = self.here(target.line, target.column);
                self.table.add_label_usage(target.lexeme.clone(), at);
                SirStmt::Jump {
                    target: target.lexeme.clone(),
                }
            }
            ast::Stmt::Tour { target } => {
                let at = self.here(target.line, target.column);
                self.table.add_label_usage(target.lexeme.clone(), at);
                SirStmt::Tour {
                    target: target.lexeme.clone(),
                }
            }
            ast::Stmt::Call { name, args, .. } => SirStmt::Call {
                name: name.lexeme.clone(),
                args: args.iter().map(|arg| self.lower_expr(arg)).collect(),
            },
            ast::Stmt::Assign { var, op, value } => {
                let name = variable_name(&var.lexeme);
                let def_at = self.here(var.line, var.column);
                self.table.add_variable_def(name.clone(), def_at);
                let value_pos = value.position();
                let use_at = self.here(value_pos.line, value_pos.column);
                self.table.add_variable_usage(name.clone(), use_at);

                let value_tree = self.lower_expr(value);
                let value = match assign_binary_op(*op) {
                    Some(op) => Expr::binary(op, Expr::variable(name.clone()), value_tree),
                    None => value_tree,
                };
                SirStmt::Assign { name, value }
            }
            ast::Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => SirStmt::If {
                cond: self.lower_expr(cond),
                then_branch: self.lower_stmts(then_body),
                else_branch: else_body.as_ref().map(|body| self.lower_stmts(body)),
            },
        }
    }

    fn lower_expr(&mut self, expr: &ast::Expr) -> Expr {
        match expr {
            ast::Expr::Literal(token) => {
                if token.kind == TokenType::Boolean {
                    Expr::constant(Value::Bool(token.lexeme == "true"))
                } else {
                    // Numeric literals always lower to float; see expr.rs
                    // on why the int path still exists.
                    Expr::constant(Value::Float(token.lexeme.parse().unwrap_or(0.0)))
                }
            }
            ast::Expr::Variable(token) => {
                let name = variable_name(&token.lexeme);
                let at = self.here(token.line, token.column);
                self.table.add_variable_usage(name.clone(), at);
                Expr::Variable { name }
            }
            ast::Expr::FString(fstring) => self.lower_fstring(fstring),
            ast::Expr::Binary { op, lhs, rhs, .. } => Expr::binary(
                lower_binary_op(*op),
                self.lower_expr(lhs),
                self.lower_expr(rhs),
            ),
            ast::Expr::Unary { op, operand, .. } => Expr::Unary {
                op: lower_unary_op(*op),
                operand: Box::new(self.lower_expr(operand)),
            },
            ast::Expr::EmbedCall { name, args, .. } => Expr::EmbedCall {
                name: name.lexeme.clone(),
                args: args.iter().map(|arg| self.lower_expr(arg)).collect(),
            },
            ast::Expr::EmbedExpr { expr, .. } => self.lower_expr(expr),
        }
    }

    fn lower_fstring(&mut self, fstring: &ast::FStringLit) -> Expr {
        let fragments: Vec<String> = fstring
            .fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Content(token) => token.lexeme.clone(),
                Fragment::Escape(token) => resolve_escape(&token.lexeme),
                Fragment::Placeholder => PLACEHOLDER.to_string(),
            })
            .collect();
        let embeds: Vec<Expr> = fstring
            .embeds
            .iter()
            .map(|embed| self.lower_expr(embed))
            .collect();
        debug_assert_eq!(
            fragments.iter().filter(|f| f.as_str() == PLACEHOLDER).count(),
            embeds.len(),
        );
        Expr::FString { fragments, embeds }
    }

    fn here(&self, line: u32, column: u32) -> SymbolPosition {
        SymbolPosition {
            source_id: self.source_id.to_string(),
            label: self.current_label.clone(),
            line,
            column,
        }
    }
}

/// Strips the `$` sigil, keeping any `global.` prefix.
pub fn variable_name(lexeme: &str) -> String {
    lexeme.strip_prefix('$').unwrap_or(lexeme).to_string()
}

fn assign_binary_op(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Set => None,
        AssignOp::Add => Some(BinaryOp::Add),
        AssignOp::Sub => Some(BinaryOp::Sub),
        AssignOp::Mul => Some(BinaryOp::Mul),
        AssignOp::Div => Some(BinaryOp::Div),
        AssignOp::Mod => Some(BinaryOp::Mod),
        AssignOp::Pow => Some(BinaryOp::Pow),
    }
}

fn lower_binary_op(op: ast::BinaryOp) -> BinaryOp {
    match op {
        ast::BinaryOp::Or => BinaryOp::Or,
        ast::BinaryOp::And => BinaryOp::And,
        ast::BinaryOp::Eq => BinaryOp::Eq,
        ast::BinaryOp::NotEq => BinaryOp::NotEq,
        ast::BinaryOp::Lt => BinaryOp::Lt,
        ast::BinaryOp::Gt => BinaryOp::Gt,
        ast::BinaryOp::LtEq => BinaryOp::LtEq,
        ast::BinaryOp::GtEq => BinaryOp::GtEq,
        ast::BinaryOp::Add => BinaryOp::Add,
        ast::BinaryOp::Sub => BinaryOp::Sub,
        ast::BinaryOp::Mul => BinaryOp::Mul,
        ast::BinaryOp::Div => BinaryOp::Div,
        ast::BinaryOp::Mod => BinaryOp::Mod,
        ast::BinaryOp::Pow => BinaryOp::Pow,
    }
}

fn lower_unary_op(op: ast::UnaryOp) -> UnaryOp {
    match op {
        ast::UnaryOp::Neg => UnaryOp::Neg,
        ast::UnaryOp::Pos => UnaryOp::Pos,
        ast::UnaryOp::Not => UnaryOp::Not,
    }
}

fn resolve_escape(lexeme: &str) -> String {
    match lexeme {
        "\\n" => "\n",
        "\\r" => "\r",
        "\\t" => "\t",
        "\\\"" => "\"",
        "\\\\" => "\\",
        "{{" => "{",
        "}}" => "}",
        other => other,
    }
    .to_string()
}
