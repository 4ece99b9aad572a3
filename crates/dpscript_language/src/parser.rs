//! Recursive-descent parser for DP scripts.
//!
//! The parser walks a materialized token vector with single-token lookahead.
//! The one exception is menu disambiguation: a statement starting with an
//! f-string is a menu arm exactly when a `:` token occurs before the next
//! linebreak, which needs an unbounded scan (colons cannot be produced
//! inside f-string or embed modes, so the scan is exact).
//!
//! # Error Recovery
//!
//! The statement is the recovery unit. Any [`ParseError`] raised while
//! parsing a statement is reported as one diagnostic at the offending token,
//! then tokens are skipped up to and including the next `Linebreak` and the
//! enclosing block loop resumes. Errors never unwind past a block boundary,
//! so a malformed block yields one independent diagnostic per broken
//! statement and parsing is total: [`Parser::parse_program`] always returns
//! a [`Program`].
//!
//! `elif` chains are folded here into nested `If` statements in the else
//! branch; later stages only ever see two-way conditionals.

use dpscript_base::DiagnosticBag;

use crate::ast::{
    AssignOp, BinaryOp, Expr, FStringLit, Fragment, Import, LabelBlock, MenuItem, Program, Stmt,
    UnaryOp,
};
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::token::{Token, TokenType};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Creates a parser over a token vector. The vector is expected to end
    /// with `EOF` (the lexer guarantees this); a missing terminator is
    /// supplied defensively so lookahead never runs off the end.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenType::EOF) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", line, 1));
        }
        Parser { tokens, current: 0 }
    }

    /// Parses the whole token stream. Total: syntax problems become
    /// diagnostics and the best-effort program is returned.
    pub fn parse_program(&mut self, diagnostics: &mut DiagnosticBag) -> Program {
        let mut program = Program::default();
        loop {
            match self.peek().kind {
                TokenType::EOF => break,
                TokenType::Linebreak | TokenType::Dedent => {
                    self.advance();
                }
                TokenType::Import => match self.parse_import() {
                    Ok(import) => program.imports.push(import),
                    Err(err) => self.recover(err, diagnostics),
                },
                TokenType::Label => match self.parse_label(diagnostics) {
                    Ok(label) => program.labels.push(label),
                    Err(err) => self.recover(err, diagnostics),
                },
                _ => match self.parse_statement(diagnostics) {
                    Ok(stmt) => program.top_stmts.push(stmt),
                    Err(err) => self.recover(err, diagnostics),
                },
            }
        }
        program
    }

    // ------------------------------------------------------------------
    // Top-level constructs
    // ------------------------------------------------------------------

    fn parse_import(&mut self) -> ParseResult<Import> {
        self.advance(); // `import`
        let path = self.expect(TokenType::Path)?;
        self.expect(TokenType::Linebreak)?;
        Ok(Import { path })
    }

    fn parse_label(&mut self, diagnostics: &mut DiagnosticBag) -> ParseResult<LabelBlock> {
        self.advance(); // `label`
        let name = self.expect(TokenType::Identifier)?;
        self.expect(TokenType::Colon)?;
        let body = self.parse_suite(diagnostics)?;
        Ok(LabelBlock { name, body })
    }

    /// `LINEBREAK INDENT statement+ DEDENT` — the indented body shared by
    /// labels, menu arms, and conditionals.
    fn parse_suite(&mut self, diagnostics: &mut DiagnosticBag) -> ParseResult<Vec<Stmt>> {
        self.expect(TokenType::Linebreak)?;
        self.expect(TokenType::Indent)?;
        let mut body = Vec::new();
        loop {
            match self.peek().kind {
                TokenType::Dedent => {
                    self.advance();
                    break;
                }
                TokenType::EOF => break,
                TokenType::Linebreak => {
                    self.advance();
                }
                _ => match self.parse_statement(diagnostics) {
                    Ok(stmt) => body.push(stmt),
                    Err(err) => self.recover(err, diagnostics),
                },
            }
        }
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self, diagnostics: &mut DiagnosticBag) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenType::Jump => {
                self.advance();
                let target = self.expect(TokenType::Identifier)?;
                self.expect(TokenType::Linebreak)?;
                Ok(Stmt::Jump { target })
            }
            TokenType::Tour => {
                self.advance();
                let target = self.expect(TokenType::Identifier)?;
                self.expect(TokenType::Linebreak)?;
                Ok(Stmt::Tour { target })
            }
            TokenType::Call => {
                let keyword = self.advance();
                let name = self.expect(TokenType::Identifier)?;
                self.expect(TokenType::LParen)?;
                let args = self.parse_call_args()?;
                self.expect(TokenType::Linebreak)?;
                Ok(Stmt::Call {
                    name,
                    args,
                    line: keyword.line,
                    column: keyword.column,
                })
            }
            TokenType::If => self.parse_if(diagnostics),
            TokenType::Variable => {
                let var = self.advance();
                let op_token = self.peek().clone();
                let Some(op) = AssignOp::from_token(op_token.kind) else {
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedAssignOp {
                            found: op_token.kind,
                        },
                        op_token.line,
                        op_token.column,
                    ));
                };
                self.advance();
                let value = self.parse_expression()?;
                self.expect(TokenType::Linebreak)?;
                Ok(Stmt::Assign { var, op, value })
            }
            TokenType::Identifier => {
                let speaker = self.advance();
                let text = self.parse_fstring()?;
                self.expect(TokenType::Linebreak)?;
                Ok(Stmt::Dialogue {
                    speaker: Some(speaker),
                    text,
                })
            }
            TokenType::FstringQuote => {
                if self.colon_before_linebreak() {
                    self.parse_menu(diagnostics)
                } else {
                    let text = self.parse_fstring()?;
                    self.expect(TokenType::Linebreak)?;
                    Ok(Stmt::Dialogue {
                        speaker: None,
                        text,
                    })
                }
            }
            TokenType::Elif | TokenType::Else => {
                let token = self.peek().clone();
                Err(ParseError::new(
                    ParseErrorKind::DanglingBranch {
                        keyword: token.kind,
                    },
                    token.line,
                    token.column,
                ))
            }
            found => {
                let token = self.peek().clone();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedStatement { found },
                    token.line,
                    token.column,
                ))
            }
        }
    }

    /// Menu arms: consecutive `fstring ':' suite` groups folded into one
    /// `Menu` statement. Caller has already confirmed the colon lookahead.
    fn parse_menu(&mut self, diagnostics: &mut DiagnosticBag) -> ParseResult<Stmt> {
        let first = self.peek().clone();
        let mut items = Vec::new();
        loop {
            let text = self.parse_fstring()?;
            self.expect(TokenType::Colon)?;
            let body = self.parse_suite(diagnostics)?;
            items.push(MenuItem { text, body });
            if !(self.check(TokenType::FstringQuote) && self.colon_before_linebreak()) {
                break;
            }
        }
        Ok(Stmt::Menu {
            items,
            line: first.line,
            column: first.column,
        })
    }

    fn parse_if(&mut self, diagnostics: &mut DiagnosticBag) -> ParseResult<Stmt> {
        let keyword = self.advance(); // `if` or `elif`
        let cond = self.parse_expression()?;
        self.expect(TokenType::Colon)?;
        let then_body = self.parse_suite(diagnostics)?;
        let else_body = if self.check(TokenType::Elif) {
            // Fold the chain: `elif` becomes a nested `If` in the else arm.
            Some(vec![self.parse_if(diagnostics)?])
        } else if self.check(TokenType::Else) {
            self.advance();
            self.expect(TokenType::Colon)?;
            Some(self.parse_suite(diagnostics)?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
            line: keyword.line,
            column: keyword.column,
        })
    }

    // ------------------------------------------------------------------
    // F-strings
    // ------------------------------------------------------------------

    fn parse_fstring(&mut self) -> ParseResult<FStringLit> {
        let open = self.expect(TokenType::FstringQuote)?;
        let mut fragments = Vec::new();
        let mut embeds = Vec::new();
        loop {
            match self.peek().kind {
                TokenType::FstringContent => fragments.push(Fragment::Content(self.advance())),
                TokenType::FstringEscape => fragments.push(Fragment::Escape(self.advance())),
                TokenType::LBrace => {
                    let brace = self.advance();
                    let embed = self.parse_embed(&brace)?;
                    self.expect(TokenType::RBrace)?;
                    fragments.push(Fragment::Placeholder);
                    embeds.push(embed);
                }
                TokenType::FstringQuote => {
                    self.advance();
                    break;
                }
                // A linebreak implicitly closes the f-string; leave it for
                // the statement to consume.
                TokenType::Linebreak | TokenType::EOF => break,
                found => {
                    let token = self.peek().clone();
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken {
                            expected: TokenType::FstringQuote,
                            found,
                        },
                        token.line,
                        token.column,
                    ));
                }
            }
        }
        Ok(FStringLit {
            fragments,
            embeds,
            line: open.line,
            column: open.column,
        })
    }

    /// The inside of `{...}`: an embedded call or a plain expression.
    fn parse_embed(&mut self, brace: &Token) -> ParseResult<Expr> {
        if self.check(TokenType::Call) {
            self.advance();
            let name = self.expect(TokenType::Identifier)?;
            self.expect(TokenType::LParen)?;
            let args = self.parse_call_args()?;
            Ok(Expr::EmbedCall {
                name,
                args,
                line: brace.line,
                column: brace.column,
            })
        } else {
            let expr = self.parse_expression()?;
            Ok(Expr::EmbedExpr {
                expr: Box::new(expr),
                line: brace.line,
                column: brace.column,
            })
        }
    }

    /// Comma-separated expressions up to and including the closing `)`.
    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen)?;
        Ok(args)
    }

    // ------------------------------------------------------------------
    // Expressions, lowest to highest precedence
    // ------------------------------------------------------------------

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.check(TokenType::Or) {
            let op = self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs, &op);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.check(TokenType::And) {
            let op = self.advance();
            let rhs = self.parse_equality()?;
            lhs = binary(BinaryOp::And, lhs, rhs, &op);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let kind = match self.peek().kind {
                TokenType::EqEq => BinaryOp::Eq,
                TokenType::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            let op = self.advance();
            let rhs = self.parse_comparison()?;
            lhs = binary(kind, lhs, rhs, &op);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let kind = match self.peek().kind {
                TokenType::Lt => BinaryOp::Lt,
                TokenType::Gt => BinaryOp::Gt,
                TokenType::LtEq => BinaryOp::LtEq,
                TokenType::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            let op = self.advance();
            let rhs = self.parse_additive()?;
            lhs = binary(kind, lhs, rhs, &op);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let kind = match self.peek().kind {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Sub,
                _ => break,
            };
            let op = self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(kind, lhs, rhs, &op);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_power()?;
        loop {
            let kind = match self.peek().kind {
                TokenType::Star => BinaryOp::Mul,
                TokenType::Slash => BinaryOp::Div,
                TokenType::Percent => BinaryOp::Mod,
                _ => break,
            };
            let op = self.advance();
            let rhs = self.parse_power()?;
            lhs = binary(kind, lhs, rhs, &op);
        }
        Ok(lhs)
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary()?;
        if self.check(TokenType::Power) {
            let op = self.advance();
            // Right-associative: recurse at the same level.
            let rhs = self.parse_power()?;
            return Ok(binary(BinaryOp::Pow, lhs, rhs, &op));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenType::Minus => Some(UnaryOp::Neg),
            TokenType::Plus => Some(UnaryOp::Pos),
            TokenType::Not => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                line: token.line,
                column: token.column,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.peek().kind {
            TokenType::Number | TokenType::Boolean => Ok(Expr::Literal(self.advance())),
            TokenType::Variable => Ok(Expr::Variable(self.advance())),
            TokenType::FstringQuote => Ok(Expr::FString(self.parse_fstring()?)),
            TokenType::LBrace => {
                let brace = self.advance();
                let embed = self.parse_embed(&brace)?;
                self.expect(TokenType::RBrace)?;
                Ok(embed)
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenType::RParen)?;
                Ok(inner)
            }
            found => {
                let token = self.peek().clone();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedExpression { found },
                    token.line,
                    token.column,
                ))
            }
        }
    }

    // ------------------------------------------------------------------
    // Lookahead and recovery machinery
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenType::EOF {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenType) -> bool {
        self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenType) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            Err(ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    expected: kind,
                    found: token.kind,
                },
                token.line,
                token.column,
            ))
        }
    }

    /// Menu disambiguation: is there a `:` before the next linebreak?
    fn colon_before_linebreak(&self) -> bool {
        for token in &self.tokens[self.current..] {
            match token.kind {
                TokenType::Colon => return true,
                TokenType::Linebreak | TokenType::EOF => return false,
                _ => {}
            }
        }
        false
    }

    /// Statement-level recovery: report the error, skip to the next
    /// linebreak, consume it, and let the enclosing block loop resume.
    fn recover(&mut self, err: ParseError, diagnostics: &mut DiagnosticBag) {
        diagnostics.error(err.to_string(), err.position());
        while !matches!(self.peek().kind, TokenType::Linebreak | TokenType::EOF) {
            self.advance();
        }
        if self.check(TokenType::Linebreak) {
            self.advance();
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, token: &Token) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        line: token.line,
        column: token.column,
    }
}
