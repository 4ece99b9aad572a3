//! Mode-stacked, line-oriented lexer for DP scripts.
//!
//! The lexer reads the source a whole line at a time so that indentation can
//! be measured before the line body is tokenized. Two stacks drive it:
//!
//! - **Indent stack**: indentation levels (leading spaces / 4, tab = 4).
//!   Entering a deeper level emits one `Indent`; leaving emits one `Dedent`
//!   per popped level. A dedent that lands between two known levels is
//!   inconsistent indentation and fatal for the file.
//!
//! - **Mode stack**: the active sub-grammar. `Default` is the statement
//!   grammar; `"` enters `Fstring`; `{` inside an f-string enters `Embed`
//!   (expression sub-grammar, `call` is the only keyword); `import` switches
//!   to `Path` for the rest of the line. A linebreak unwinds every
//!   non-default mode in one step, so each new line starts in `Default`.
//!
//! Tokenization within a line is greedy longest-match: `**=` wins over `**`
//! wins over `*=` wins over `*`, and so on. Characters no pattern accepts
//! accumulate into an error run that is flushed as a single `Error` token
//! with a span-exact diagnostic; the parser skips over `Error` tokens during
//! recovery.
//!
//! Comments (`#` to end of line) are recognized only when `#` is the first
//! non-whitespace character of the line. Inside f-strings `#` is literal
//! content.
//!
//! The produced vector always ends with one `Dedent` per open indent level
//! followed by exactly one `EOF`. A lexer instance is consumed by
//! [`Lexer::tokenize`] and cannot be reused for another source.

use dpscript_base::{Diagnostic, DiagnosticBag, Position, Span};

use crate::token::{Token, TokenType};

/// The active lexical sub-grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LexMode {
    #[default]
    Default,
    Fstring,
    Path,
    Embed,
}

pub struct Lexer<'a> {
    source: &'a str,
    modes: Vec<LexMode>,
    indents: Vec<usize>,
    tokens: Vec<Token>,
    /// Pending unrecognized run: (start column index, accumulated text).
    error_run: Option<(usize, String)>,
    fatal: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            modes: vec![LexMode::Default],
            indents: vec![0],
            tokens: Vec::new(),
            error_run: None,
            fatal: false,
        }
    }

    /// Tokenizes the whole source, reporting lexical problems into
    /// `diagnostics`. Consumes the lexer; its stacks are single-use.
    pub fn tokenize(mut self, diagnostics: &mut DiagnosticBag) -> Vec<Token> {
        let mut line_no: u32 = 0;
        for raw_line in self.source.split('\n') {
            line_no += 1;
            if self.fatal {
                break;
            }
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let chars: Vec<char> = line.chars().collect();

            let Some(first) = chars.iter().position(|c| *c != ' ' && *c != '\t') else {
                continue; // blank line
            };
            if chars[first] == '#' {
                continue; // comment line
            }

            if !self.handle_indentation(&chars, first, line_no, diagnostics) {
                break;
            }
            self.lex_line(&chars, first, line_no, diagnostics);

            // Implicit close: a linebreak unwinds Fstring/Embed/Path back to
            // Default in one step.
            self.modes.truncate(1);
            self.tokens.push(Token::new(
                TokenType::Linebreak,
                "\n",
                line_no,
                chars.len() as u32 + 1,
            ));
        }

        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens
                .push(Token::new(TokenType::Dedent, "", line_no + 1, 1));
        }
        self.tokens.push(Token::new(TokenType::EOF, "", line_no + 1, 1));
        self.tokens
    }

    /// Measures the line's indentation and emits `Indent`/`Dedent` tokens.
    /// Returns `false` when the indentation is inconsistent (fatal).
    fn handle_indentation(
        &mut self,
        chars: &[char],
        content_start: usize,
        line_no: u32,
        diagnostics: &mut DiagnosticBag,
    ) -> bool {
        let mut width = 0usize;
        for c in &chars[..content_start] {
            width += if *c == '\t' { 4 } else { 1 };
        }
        let level = width / 4;
        let current = self.indents.last().copied().unwrap_or(0);

        if level > current {
            self.indents.push(level);
            self.tokens.push(Token::new(TokenType::Indent, "", line_no, 1));
        } else if level < current {
            while self.indents.last().copied().unwrap_or(0) > level {
                self.indents.pop();
                self.tokens.push(Token::new(TokenType::Dedent, "", line_no, 1));
            }
            if self.indents.last().copied().unwrap_or(0) != level {
                diagnostics.report(
                    Diagnostic::error(
                        format!("Inconsistent indentation (level {level})"),
                        Position::new(line_no, 1),
                    )
                    .with_span(Span::on_line(line_no, 1, content_start as u32)),
                );
                self.fatal = true;
                return false;
            }
        }
        true
    }

    fn lex_line(
        &mut self,
        chars: &[char],
        content_start: usize,
        line_no: u32,
        diagnostics: &mut DiagnosticBag,
    ) {
        let mut i = content_start;
        while i < chars.len() {
            i = match self.modes.last().copied().unwrap_or(LexMode::Default) {
                LexMode::Default => self.lex_default(chars, i, line_no, diagnostics),
                LexMode::Fstring => self.lex_fstring(chars, i, line_no, diagnostics),
                LexMode::Path => self.lex_path(chars, i, line_no, diagnostics),
                LexMode::Embed => self.lex_embed(chars, i, line_no, diagnostics),
            };
        }
        self.flush_error_run(line_no, diagnostics);
    }

    // ------------------------------------------------------------------
    // Default mode
    // ------------------------------------------------------------------

    fn lex_default(
        &mut self,
        chars: &[char],
        i: usize,
        line_no: u32,
        diagnostics: &mut DiagnosticBag,
    ) -> usize {
        let c = chars[i];
        if c == ' ' || c == '\t' {
            self.flush_error_run(line_no, diagnostics);
            return i + 1;
        }
        if c == '"' {
            self.flush_error_run(line_no, diagnostics);
            self.push(TokenType::FstringQuote, "\"", line_no, i);
            self.modes.push(LexMode::Fstring);
            return i + 1;
        }
        if let Some((kind, len)) = match_operator(chars, i, true) {
            self.flush_error_run(line_no, diagnostics);
            let lexeme: String = chars[i..i + len].iter().collect();
            self.push(kind, lexeme, line_no, i);
            return i + len;
        }
        if c.is_ascii_digit() {
            self.flush_error_run(line_no, diagnostics);
            return self.lex_number(chars, i, line_no);
        }
        if c == '$' {
            return self.lex_variable(chars, i, line_no, diagnostics);
        }
        if c.is_alphabetic() || c == '_' {
            self.flush_error_run(line_no, diagnostics);
            let end = scan_identifier(chars, i);
            let word: String = chars[i..end].iter().collect();
            let kind = TokenType::keyword(&word).unwrap_or(TokenType::Identifier);
            self.push(kind, word, line_no, i);
            if kind == TokenType::Import {
                self.modes.push(LexMode::Path);
            }
            return end;
        }
        self.accumulate_error(i, c);
        i + 1
    }

    // ------------------------------------------------------------------
    // F-string mode
    // ------------------------------------------------------------------

    fn lex_fstring(
        &mut self,
        chars: &[char],
        i: usize,
        line_no: u32,
        diagnostics: &mut DiagnosticBag,
    ) -> usize {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '"' => {
                self.flush_error_run(line_no, diagnostics);
                self.push(TokenType::FstringQuote, "\"", line_no, i);
                self.modes.pop();
                i + 1
            }
            '{' if next == Some('{') => {
                self.flush_error_run(line_no, diagnostics);
                self.push(TokenType::FstringEscape, "{{", line_no, i);
                i + 2
            }
            '{' => {
                self.flush_error_run(line_no, diagnostics);
                self.push(TokenType::LBrace, "{", line_no, i);
                self.modes.push(LexMode::Embed);
                i + 1
            }
            '}' if next == Some('}') => {
                self.flush_error_run(line_no, diagnostics);
                self.push(TokenType::FstringEscape, "}}", line_no, i);
                i + 2
            }
            '\\' => match next {
                Some(e) if matches!(e, 'n' | 'r' | 't' | '"' | '\\') => {
                    self.flush_error_run(line_no, diagnostics);
                    let lexeme: String = chars[i..i + 2].iter().collect();
                    self.push(TokenType::FstringEscape, lexeme, line_no, i);
                    i + 2
                }
                _ => {
                    self.accumulate_error(i, c);
                    i + 1
                }
            },
            '}' => {
                self.accumulate_error(i, c);
                i + 1
            }
            _ => {
                self.flush_error_run(line_no, diagnostics);
                let mut end = i;
                while end < chars.len() && !matches!(chars[end], '"' | '{' | '}' | '\\') {
                    end += 1;
                }
                let content: String = chars[i..end].iter().collect();
                self.push(TokenType::FstringContent, content, line_no, i);
                end
            }
        }
    }

    // ------------------------------------------------------------------
    // Path mode
    // ------------------------------------------------------------------

    fn lex_path(
        &mut self,
        chars: &[char],
        i: usize,
        line_no: u32,
        diagnostics: &mut DiagnosticBag,
    ) -> usize {
        self.flush_error_run(line_no, diagnostics);
        let start = chars[i..]
            .iter()
            .position(|c| *c != ' ' && *c != '\t')
            .map(|off| i + off);
        if let Some(start) = start {
            let end = chars
                .iter()
                .rposition(|c| *c != ' ' && *c != '\t')
                .map_or(chars.len(), |last| last + 1);
            let path: String = chars[start..end].iter().collect();
            self.push(TokenType::Path, path, line_no, start);
        }
        chars.len()
    }

    // ------------------------------------------------------------------
    // Embed mode
    // ------------------------------------------------------------------

    fn lex_embed(
        &mut self,
        chars: &[char],
        i: usize,
        line_no: u32,
        diagnostics: &mut DiagnosticBag,
    ) -> usize {
        let c = chars[i];
        if c == ' ' || c == '\t' {
            self.flush_error_run(line_no, diagnostics);
            return i + 1;
        }
        if c == '}' {
            self.flush_error_run(line_no, diagnostics);
            self.push(TokenType::RBrace, "}", line_no, i);
            self.modes.pop();
            return i + 1;
        }
        if c == '"' {
            self.flush_error_run(line_no, diagnostics);
            self.push(TokenType::FstringQuote, "\"", line_no, i);
            self.modes.push(LexMode::Fstring);
            return i + 1;
        }
        if let Some((kind, len)) = match_operator(chars, i, false) {
            self.flush_error_run(line_no, diagnostics);
            let lexeme: String = chars[i..i + len].iter().collect();
            self.push(kind, lexeme, line_no, i);
            return i + len;
        }
        if c.is_ascii_digit() {
            self.flush_error_run(line_no, diagnostics);
            return self.lex_number(chars, i, line_no);
        }
        if c == '$' {
            return self.lex_variable(chars, i, line_no, diagnostics);
        }
        if c.is_alphabetic() || c == '_' {
            self.flush_error_run(line_no, diagnostics);
            let end = scan_identifier(chars, i);
            let word: String = chars[i..end].iter().collect();
            // Statement keywords are plain identifiers inside an embed; only
            // `call`, the operator words, and booleans keep their meaning.
            let kind = match word.as_str() {
                "call" => TokenType::Call,
                "and" => TokenType::And,
                "or" => TokenType::Or,
                "not" => TokenType::Not,
                "true" | "false" => TokenType::Boolean,
                _ => TokenType::Identifier,
            };
            self.push(kind, word, line_no, i);
            return end;
        }
        self.accumulate_error(i, c);
        i + 1
    }

    // ------------------------------------------------------------------
    // Shared scanners
    // ------------------------------------------------------------------

    fn lex_number(&mut self, chars: &[char], i: usize, line_no: u32) -> usize {
        let mut end = i;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        if end < chars.len()
            && chars[end] == '.'
            && chars.get(end + 1).is_some_and(|c| c.is_ascii_digit())
        {
            end += 1;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
        }
        let lexeme: String = chars[i..end].iter().collect();
        self.push(TokenType::Number, lexeme, line_no, i);
        end
    }

    fn lex_variable(
        &mut self,
        chars: &[char],
        i: usize,
        line_no: u32,
        diagnostics: &mut DiagnosticBag,
    ) -> usize {
        const GLOBAL: &[char] = &['g', 'l', 'o', 'b', 'a', 'l', '.'];
        let mut j = i + 1;
        if chars[j..].starts_with(GLOBAL) {
            j += GLOBAL.len();
        }
        if j < chars.len() && (chars[j].is_alphabetic() || chars[j] == '_') {
            self.flush_error_run(line_no, diagnostics);
            let end = scan_identifier(chars, j);
            let lexeme: String = chars[i..end].iter().collect();
            self.push(TokenType::Variable, lexeme, line_no, i);
            end
        } else {
            // A bare `$` (or `$global.` without a name) joins the error run.
            self.accumulate_error(i, chars[i]);
            i + 1
        }
    }

    fn push(&mut self, kind: TokenType, lexeme: impl Into<String>, line: u32, char_index: usize) {
        self.tokens
            .push(Token::new(kind, lexeme, line, char_index as u32 + 1));
    }

    fn accumulate_error(&mut self, char_index: usize, c: char) {
        match &mut self.error_run {
            Some((_, text)) => text.push(c),
            None => self.error_run = Some((char_index, String::from(c))),
        }
    }

    fn flush_error_run(&mut self, line_no: u32, diagnostics: &mut DiagnosticBag) {
        if let Some((start, text)) = self.error_run.take() {
            let len = text.chars().count() as u32;
            diagnostics.report(
                Diagnostic::error(
                    format!("Unrecognized character sequence '{text}'"),
                    Position::new(line_no, start as u32 + 1),
                )
                .with_span(Span::on_line(line_no, start as u32 + 1, len)),
            );
            self.push(TokenType::Error, text, line_no, start);
        }
    }
}

fn scan_identifier(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    end
}

/// Greedy longest-match over the operator/punctuation table.
///
/// `full` selects the `Default`-mode table; the embed sub-grammar excludes
/// assignment operators, `:` and `{`.
fn match_operator(chars: &[char], i: usize, full: bool) -> Option<(TokenType, usize)> {
    let c = chars[i];
    let next = chars.get(i + 1).copied();
    let third = chars.get(i + 2).copied();

    // Three- and two-character operators first: `**=` before `**` before
    // `*=` before `*`, comparisons before their single-char prefixes.
    if c == '*' && next == Some('*') {
        if full && third == Some('=') {
            return Some((TokenType::PowerAssign, 3));
        }
        return Some((TokenType::Power, 2));
    }
    if next == Some('=') {
        let double = match c {
            '=' => Some(TokenType::EqEq),
            '!' => Some(TokenType::NotEq),
            '<' => Some(TokenType::LtEq),
            '>' => Some(TokenType::GtEq),
            '+' if full => Some(TokenType::PlusAssign),
            '-' if full => Some(TokenType::MinusAssign),
            '*' if full => Some(TokenType::StarAssign),
            '/' if full => Some(TokenType::SlashAssign),
            '%' if full => Some(TokenType::PercentAssign),
            _ => None,
        };
        if let Some(kind) = double {
            return Some((kind, 2));
        }
    }
    let single = match c {
        '+' => Some(TokenType::Plus),
        '-' => Some(TokenType::Minus),
        '*' => Some(TokenType::Star),
        '/' => Some(TokenType::Slash),
        '%' => Some(TokenType::Percent),
        '<' => Some(TokenType::Lt),
        '>' => Some(TokenType::Gt),
        ',' => Some(TokenType::Comma),
        '(' => Some(TokenType::LParen),
        ')' => Some(TokenType::RParen),
        '=' if full => Some(TokenType::Assign),
        ':' if full => Some(TokenType::Colon),
        '{' if full => Some(TokenType::LBrace),
        '}' if full => Some(TokenType::RBrace),
        _ => None,
    };
    single.map(|kind| (kind, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, DiagnosticBag) {
        let mut diagnostics = DiagnosticBag::new();
        let tokens = Lexer::new(source).tokenize(&mut diagnostics);
        (tokens, diagnostics)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        let (tokens, diagnostics) = lex("");
        assert_eq!(kinds(&tokens), vec![TokenType::EOF]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn label_line_tokenizes_in_order() {
        let (tokens, diagnostics) = lex("label start:\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenType::Label,
                TokenType::Identifier,
                TokenType::Colon,
                TokenType::Linebreak,
                TokenType::EOF,
            ]
        );
        assert_eq!(tokens[1].lexeme, "start");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn stream_ends_with_dedents_then_single_eof() {
        let (tokens, _) = lex("label a:\n    jump a\n");
        let eof_count = tokens.iter().filter(|t| t.kind == TokenType::EOF).count();
        assert_eq!(eof_count, 1);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenType::EOF));
        let indents = tokens.iter().filter(|t| t.kind == TokenType::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenType::Dedent).count();
        assert_eq!(indents, dedents);
    }

    #[test]
    fn indent_levels_nest_and_unwind() {
        let source = "label a:\n    if $x == 1:\n        jump a\n    jump a\n";
        let (tokens, diagnostics) = lex(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.iter().collect::<Vec<_>>());
        let structural: Vec<TokenType> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenType::Indent | TokenType::Dedent))
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            structural,
            vec![
                TokenType::Indent,
                TokenType::Indent,
                TokenType::Dedent,
                TokenType::Dedent,
            ]
        );
    }

    #[test]
    fn tab_counts_as_four_spaces() {
        let (tokens, diagnostics) = lex("label a:\n\tjump a\n");
        assert!(diagnostics.is_empty());
        assert!(tokens.iter().any(|t| t.kind == TokenType::Indent));
    }

    #[test]
    fn inconsistent_dedent_is_fatal() {
        let source = "label a:\n        jump a\n    jump a\n";
        let (tokens, diagnostics) = lex(source);
        assert_eq!(diagnostics.error_count(), 1);
        let message = &diagnostics.iter().next().map(|d| d.message.clone()).unwrap_or_default();
        assert!(message.contains("Inconsistent indentation"), "{message}");
        // Close-out still holds: balanced stream ending in one EOF.
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenType::EOF));
    }

    #[test]
    fn blank_and_comment_lines_produce_no_tokens() {
        let (tokens, diagnostics) = lex("# heading\n\n   \nlabel a:\n");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenType::Label);
    }

    #[test]
    fn hash_midline_is_an_error_run() {
        let (_, diagnostics) = lex("jump a # trailing\n");
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn operator_longest_match_order() {
        let (tokens, diagnostics) = lex("$x **= 2 ** 3\n");
        assert!(diagnostics.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenType::Variable,
                TokenType::PowerAssign,
                TokenType::Number,
                TokenType::Power,
                TokenType::Number,
                TokenType::Linebreak,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn comparison_operators_before_single_char() {
        let (tokens, _) = lex("$a = $b <= $c\n");
        let ops: Vec<TokenType> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenType::Assign | TokenType::LtEq))
            .map(|t| t.kind)
            .collect();
        assert_eq!(ops, vec![TokenType::Assign, TokenType::LtEq]);
    }

    #[test]
    fn variable_with_global_prefix_keeps_lexeme() {
        let (tokens, diagnostics) = lex("$global.score = 1\n");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenType::Variable);
        assert_eq!(tokens[0].lexeme, "$global.score");
    }

    #[test]
    fn bare_dollar_is_an_error_token() {
        let (tokens, diagnostics) = lex("$ = 1\n");
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(tokens[0].kind, TokenType::Error);
    }

    #[test]
    fn import_switches_to_path_mode() {
        let (tokens, diagnostics) = lex("import  chapters/intro.dp  \n");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenType::Import);
        assert_eq!(tokens[1].kind, TokenType::Path);
        assert_eq!(tokens[1].lexeme, "chapters/intro.dp");
    }

    #[test]
    fn fstring_content_and_escapes() {
        let (tokens, diagnostics) = lex("\"a\\n{{b}}\"\n");
        assert!(diagnostics.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenType::FstringQuote,
                TokenType::FstringContent,
                TokenType::FstringEscape,
                TokenType::FstringEscape,
                TokenType::FstringContent,
                TokenType::FstringEscape,
                TokenType::FstringQuote,
                TokenType::Linebreak,
                TokenType::EOF,
            ]
        );
        assert_eq!(tokens[2].lexeme, "\\n");
        assert_eq!(tokens[3].lexeme, "{{");
        assert_eq!(tokens[5].lexeme, "}}");
    }

    #[test]
    fn fstring_embed_uses_expression_subgrammar() {
        let (tokens, diagnostics) = lex("\"hi {call add($x, 1)}\"\n");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.iter().collect::<Vec<_>>());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenType::FstringQuote,
                TokenType::FstringContent,
                TokenType::LBrace,
                TokenType::Call,
                TokenType::Identifier,
                TokenType::LParen,
                TokenType::Variable,
                TokenType::Comma,
                TokenType::Number,
                TokenType::RParen,
                TokenType::RBrace,
                TokenType::FstringQuote,
                TokenType::Linebreak,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn statement_keywords_are_identifiers_inside_embeds() {
        let (tokens, _) = lex("\"{jump}\"\n");
        let embedded = tokens
            .iter()
            .find(|t| t.lexeme == "jump")
            .map(|t| t.kind);
        assert_eq!(embedded, Some(TokenType::Identifier));
    }

    #[test]
    fn assignment_is_not_an_operator_inside_embeds() {
        let (_, diagnostics) = lex("\"{$x = 1}\"\n");
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn linebreak_implicitly_closes_fstring_and_embed() {
        let source = "\"open {1 + \njump a\n";
        let (tokens, _) = lex(source);
        // The second line lexes in Default mode again.
        assert!(tokens.iter().any(|t| t.kind == TokenType::Jump));
    }

    #[test]
    fn error_run_flushes_as_single_token_with_span() {
        let (tokens, diagnostics) = lex("jump ;;; a\n");
        assert_eq!(diagnostics.error_count(), 1);
        let diagnostic = diagnostics.iter().next().cloned().unwrap_or_else(|| {
            panic!("expected a diagnostic")
        });
        assert!(diagnostic.message.contains(";;;"));
        let span = diagnostic.span.unwrap_or_else(|| panic!("expected a span"));
        assert_eq!(span.start.column, 6);
        assert_eq!(span.end.column, 9);
        let error_tokens: Vec<_> = tokens.iter().filter(|t| t.kind == TokenType::Error).collect();
        assert_eq!(error_tokens.len(), 1);
        assert_eq!(error_tokens[0].lexeme, ";;;");
    }

    #[test]
    fn number_with_fraction_is_one_token() {
        let (tokens, _) = lex("$x = 3.25\n");
        let number = tokens.iter().find(|t| t.kind == TokenType::Number);
        assert_eq!(number.map(|t| t.lexeme.as_str()), Some("3.25"));
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let (tokens, diagnostics) = lex("$x = 3.\n");
        let number = tokens.iter().find(|t| t.kind == TokenType::Number);
        assert_eq!(number.map(|t| t.lexeme.as_str()), Some("3"));
        assert_eq!(diagnostics.error_count(), 1); // the dangling '.'
    }

    #[test]
    fn file_without_trailing_newline_still_ends_lines() {
        let (tokens, _) = lex("jump a");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenType::Jump,
                TokenType::Identifier,
                TokenType::Linebreak,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn lexemes_round_trip_line_content() {
        let source = "Alice \"hi {$name}!\"\n";
        let (tokens, diagnostics) = lex(source);
        assert!(diagnostics.is_empty());
        let rebuilt: String = tokens
            .iter()
            .filter(|t| {
                !matches!(
                    t.kind,
                    TokenType::Linebreak | TokenType::EOF | TokenType::Indent | TokenType::Dedent
                )
            })
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(rebuilt, "Alice\"hi {$name}!\"");
    }

    #[test]
    fn token_columns_are_one_based() {
        let (tokens, _) = lex("jump target\n");
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[1].column, 6);
    }
}
