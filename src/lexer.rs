//! Single-pass tokenizer.
//!
//! The lexer itself only recognizes lexeme *shapes* (numbers, identifier
//! runs, operator runs, brace/quote-delimited literals, punctuation). It
//! never touches the symbol table. Classifying an identifier or operator
//! run as a variable, builtin, user function, keyword, or operator symbol
//! is the caller's job (see [`crate::arena::Arena::lookup`] and
//! [`Lexer::next_token`]) -- this mirrors the original's split between a
//! raw character scanner and the symbol-resolving token fetch used
//! everywhere except when a statement is about to introduce a fresh name.

use crate::arena::Arena;
use crate::error::TsError;
use crate::strview::StringView;
use crate::symbol::SymbolKind;
use crate::Value;

const OPERATOR_CHARS: &[u8] = b"+-/*=<>&|^";

fn is_operator_byte(b: u8) -> bool {
    OPERATOR_CHARS.contains(&b)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'.' | b':' | b'_')
}

/// A classified token. Identifier-shaped tokens that weren't resolved
/// against the symbol table (because the caller asked for a raw fetch,
/// or because no symbol exists with that name) come back as `Ident`.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Eof,
    /// A standalone punctuation or terminator character: `( ) , \n ;` and
    /// so on, plus the newline a `#` comment is terminated by.
    Char(char),
    Number(Value),
    Ident(StringView),
    Var(StringView),
    Operator(StringView),
    Builtin(StringView),
    UserFunc(StringView),
    Keyword(crate::symbol::Keyword),
    /// A `{ ... }` literal, braces stripped, nesting already balanced.
    Body(StringView),
    /// A `"..."` literal, quotes stripped.
    Str(StringView),
}

enum RawTok {
    Eof,
    Char(char),
    Number(Value),
    Ident(StringView),
    Body(StringView),
    Str(StringView),
    OperatorRun(StringView),
}

/// A cursor over a single source buffer. Lexers are created fresh for
/// every `Interp::run` call (including the recursive calls `if`/`while`
/// bodies and procedure calls make), so they never outlive the borrow
/// of the text they scan.
pub struct Lexer<'s> {
    rest: &'s str,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Lexer { rest: src }
    }

    pub fn remaining(&self) -> &'s str {
        self.rest
    }

    pub fn set_remaining(&mut self, rest: &'s str) {
        self.rest = rest;
    }

    fn peek_byte(&self) -> Option<u8> {
        self.rest.as_bytes().first().copied()
    }

    fn advance(&mut self, n: usize) {
        self.rest = &self.rest[n..];
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek_byte(), Some(b' ') | Some(b'\t')) {
            self.advance(1);
        }
    }

    fn lex_number(&mut self) -> Result<RawTok, TsError> {
        if self.peek_byte() == Some(b'0') {
            let save = self.rest;
            self.advance(1);
            if matches!(self.peek_byte(), Some(b'x') | Some(b'X')) {
                self.advance(1);
                let start = self.rest;
                let mut n = 0usize;
                while self.peek_byte().is_some_and(|b| b.is_ascii_hexdigit()) {
                    self.advance(1);
                    n += 1;
                }
                if n == 0 {
                    return Err(TsError::Syntax);
                }
                let v = Value::from_str_radix(&start[..n], 16).map_err(|_| TsError::Syntax)?;
                return Ok(RawTok::Number(v));
            }
            self.rest = save;
        }
        let start = self.rest;
        let mut n = 0usize;
        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.advance(1);
            n += 1;
        }
        let v: Value = start[..n].parse().map_err(|_| TsError::Syntax)?;
        Ok(RawTok::Number(v))
    }

    fn lex_ident(&mut self) -> RawTok {
        let start = self.rest;
        let mut n = 0usize;
        while self.peek_byte().is_some_and(is_ident_cont) {
            self.advance(1);
            n += 1;
        }
        RawTok::Ident(StringView::new(&start[..n]))
    }

    fn lex_body(&mut self) -> Result<RawTok, TsError> {
        self.advance(1); // opening '{'
        let start = self.rest;
        let mut depth = 1i32;
        let mut n = 0usize;
        loop {
            match self.peek_byte() {
                None => return Err(TsError::Syntax),
                Some(b'{') => {
                    depth += 1;
                    self.advance(1);
                    n += 1;
                }
                Some(b'}') => {
                    depth -= 1;
                    self.advance(1);
                    if depth == 0 {
                        break;
                    }
                    n += 1;
                }
                Some(_) => {
                    self.advance(1);
                    n += 1;
                }
            }
        }
        Ok(RawTok::Body(StringView::new(&start[..n])))
    }

    fn lex_string(&mut self) -> Result<RawTok, TsError> {
        self.advance(1); // opening quote
        let start = self.rest;
        let mut n = 0usize;
        loop {
            match self.peek_byte() {
                None | Some(b'\n') => return Err(TsError::Syntax),
                Some(b'"') => {
                    self.advance(1);
                    break;
                }
                Some(_) => {
                    self.advance(1);
                    n += 1;
                }
            }
        }
        Ok(RawTok::Str(StringView::new(&start[..n])))
    }

    fn lex_operator_run(&mut self) -> RawTok {
        let start = self.rest;
        let mut n = 0usize;
        while self.peek_byte().is_some_and(is_operator_byte) {
            self.advance(1);
            n += 1;
        }
        RawTok::OperatorRun(StringView::new(&start[..n]))
    }

    fn raw_next(&mut self) -> Result<RawTok, TsError> {
        self.skip_ws();
        match self.peek_byte() {
            None => Ok(RawTok::Eof),
            Some(b'#') => loop {
                match self.peek_byte() {
                    None => return Ok(RawTok::Eof),
                    Some(b'\n') => {
                        self.advance(1);
                        return Ok(RawTok::Char('\n'));
                    }
                    Some(_) => self.advance(1),
                }
            },
            Some(b) if b.is_ascii_digit() => self.lex_number(),
            Some(b) if is_ident_start(b) => Ok(self.lex_ident()),
            Some(b'{') => self.lex_body(),
            Some(b'"') => self.lex_string(),
            Some(b) if is_operator_byte(b) => Ok(self.lex_operator_run()),
            Some(b) => {
                self.advance(1);
                Ok(RawTok::Char(b as char))
            }
        }
    }

    /// Fetches the next token. In raw mode, identifier-shaped lexemes are
    /// always returned as `Ident` without a symbol table lookup -- used
    /// by `var`, `func`, and formal-parameter parsing to capture a fresh
    /// name that may coincide with an existing symbol in an outer scope.
    pub fn next_token(&mut self, arena: &Arena, raw: bool) -> Result<Token, TsError> {
        match self.raw_next()? {
            RawTok::Eof => Ok(Token::Eof),
            RawTok::Char(c) => Ok(Token::Char(c)),
            RawTok::Number(v) => Ok(Token::Number(v)),
            RawTok::Body(s) => Ok(Token::Body(s)),
            RawTok::Str(s) => Ok(Token::Str(s)),
            RawTok::OperatorRun(s) => match arena.lookup(s.as_str()) {
                Some(sym) if matches!(sym.kind, SymbolKind::Operator { .. }) => Ok(Token::Operator(s)),
                _ => Err(TsError::Syntax),
            },
            RawTok::Ident(s) => {
                if raw {
                    return Ok(Token::Ident(s));
                }
                match arena.lookup(s.as_str()) {
                    None => Ok(Token::Ident(s)),
                    Some(sym) => match &sym.kind {
                        SymbolKind::Int => Ok(Token::Var(s)),
                        SymbolKind::Builtin { .. } => Ok(Token::Builtin(s)),
                        SymbolKind::UserFunc { .. } => Ok(Token::UserFunc(s)),
                        SymbolKind::Keyword(k) => Ok(Token::Keyword(*k)),
                        SymbolKind::Operator { .. } => Ok(Token::Operator(s)),
                    },
                }
            }
        }
    }
}

/// Fetches the next token into `cur`, threading the lexer/token pair
/// through the expression and statement parsers the way the original
/// threads `curToken` through every parse routine -- except here it's an
/// explicit pair of arguments instead of module-wide globals.
pub(crate) fn advance<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    arena: &Arena,
    raw: bool,
) -> Result<(), TsError> {
    *cur = lexer.next_token(arena, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(src: &str) -> Vec<Token> {
        let arena = Arena::new(65536);
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            match lexer.next_token(&arena, false).unwrap() {
                Token::Eof => break,
                t => out.push(t),
            }
        }
        out
    }

    #[test]
    fn decimal_and_hex_numbers() {
        let toks = scan_all("123 0x1A 0xff 007");
        let vals: Vec<Value> = toks
            .into_iter()
            .map(|t| match t {
                Token::Number(v) => v,
                other => panic!("expected number, got {other:?}"),
            })
            .collect();
        assert_eq!(vals, vec![123, 26, 255, 7]);
    }

    #[test]
    fn bad_hex_prefix_is_syntax_error() {
        let arena = Arena::new(65536);
        let mut lexer = Lexer::new("0x");
        assert_eq!(lexer.next_token(&arena, false), Err(TsError::Syntax));
    }

    #[test]
    fn comment_is_skipped_and_newline_still_terminates() {
        let toks = scan_all("1 # a comment\n2");
        assert!(matches!(toks[0], Token::Number(1)));
        assert!(matches!(toks[1], Token::Char('\n')));
        assert!(matches!(toks[2], Token::Number(2)));
    }

    #[test]
    fn unterminated_brace_body_is_syntax_error() {
        let arena = Arena::new(65536);
        let mut lexer = Lexer::new("{ a = 1");
        assert_eq!(lexer.next_token(&arena, false), Err(TsError::Syntax));
    }

    #[test]
    fn nested_braces_are_balanced() {
        let toks = scan_all("{ if (1) { x } }");
        match &toks[0] {
            Token::Body(s) => assert_eq!(s.as_str(), " if (1) { x } "),
            other => panic!("expected body, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_identifier_is_ident() {
        let toks = scan_all("frobnicate");
        assert!(matches!(&toks[0], Token::Ident(s) if s.as_str() == "frobnicate"));
    }

    #[test]
    fn unknown_operator_run_is_syntax_error() {
        let arena = Arena::new(65536);
        let mut lexer = Lexer::new("~~");
        assert_eq!(lexer.next_token(&arena, false), Err(TsError::Syntax));
    }
}
