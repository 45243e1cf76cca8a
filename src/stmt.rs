//! Statement-level parse+eval and the re-entrant block runner.
//!
//! `exec_block` is the "statement loop" the original calls `ParseString`:
//! it repeatedly fetches a token, skips blank statement separators,
//! dispatches one statement, and checks that a terminator follows. It is
//! re-entered (on a fresh [`Lexer`] over a captured substring) by `if`,
//! `while`, and user procedure calls -- there is no separate AST to build
//! for a procedure body or a loop body, just the source text re-parsed.

use crate::error::{Status, TsError};
use crate::expr::eval_expr;
use crate::interp::{Host, Interp};
use crate::lexer::{advance, Lexer, Token};
use crate::symbol::{Keyword, Symbol, SymbolKind, UserProc};
use crate::{Value, MAX_BUILTIN_PARAMS};

pub(crate) fn exec_block<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
    save_strings: bool,
) -> Result<Status, TsError> {
    loop {
        while matches!(cur, Token::Char('\n') | Token::Char(';')) {
            advance(lexer, cur, interp.arena(), false)?;
        }
        if matches!(cur, Token::Eof) {
            return Ok(Status::Ok);
        }
        match eval_stmt(lexer, cur, interp, host, save_strings)? {
            Status::Return(v) => return Ok(Status::Return(v)),
            Status::Else | Status::Ok => {}
        }
        if !matches!(cur, Token::Char('\n') | Token::Char(';') | Token::Eof) {
            return Err(TsError::Syntax);
        }
    }
}

fn eval_stmt<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
    save_strings: bool,
) -> Result<Status, TsError> {
    match cur.clone() {
        Token::Keyword(Keyword::Var) => eval_var_def(lexer, cur, interp, host, save_strings),
        Token::Var(name) => eval_assign(name.as_str().to_string(), lexer, cur, interp, host),
        Token::Keyword(Keyword::Print) => eval_print(lexer, cur, interp, host),
        Token::Keyword(Keyword::If) => eval_if(lexer, cur, interp, host, save_strings),
        Token::Keyword(Keyword::While) => eval_while(lexer, cur, interp, host, save_strings),
        Token::Keyword(Keyword::Func) => eval_funcdef(lexer, cur, interp, host, save_strings),
        Token::Keyword(Keyword::Return) => eval_return(lexer, cur, interp, host),
        Token::Builtin(_) | Token::UserFunc(_) => {
            eval_expr(lexer, cur, interp, host)?;
            Ok(Status::Ok)
        }
        // A bare `{ ... }` statement introduces its own nested scope
        // without a condition -- used for lexical-scope tests and to let
        // a script group a handful of statements into one block.
        Token::Body(body) => {
            advance(lexer, cur, interp.arena(), false)?;
            interp.run_nested(body.as_str(), save_strings, host)
        }
        _ => Err(TsError::Syntax),
    }
}

fn expect_char(cur: &Token, c: char) -> Result<(), TsError> {
    match cur {
        Token::Char(x) if *x == c => Ok(()),
        _ => Err(TsError::Syntax),
    }
}

/// Expects the `=` that separates an assignment target from its
/// right-hand side. `=` is registered as the equality operator (§6), so
/// the lexer's operator-run path resolves a bare `=` to `Token::Operator`
/// rather than `Token::Char` -- the statement parser has to recognize
/// that token shape itself, per §6: "`=` in assignment is recognised by
/// the statement parser before expression parsing begins."
fn expect_assign(cur: &Token) -> Result<(), TsError> {
    match cur {
        Token::Operator(s) if s.as_str() == "=" => Ok(()),
        _ => Err(TsError::Syntax),
    }
}

fn eval_var_def<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
    save_strings: bool,
) -> Result<Status, TsError> {
    advance(lexer, cur, interp.arena(), true)?; // 'var' -> raw fetch of the fresh name
    let name = match cur.clone() {
        Token::Ident(s) => s,
        _ => return Err(TsError::Syntax),
    };
    if save_strings {
        interp.arena_mut().retain_string(&name)?;
    }
    let idx = interp.arena_mut().push_symbol(Symbol { name: name.clone(), kind: SymbolKind::Int, value: 0 })?;
    advance(lexer, cur, interp.arena(), false)?; // name -> '='
    expect_assign(cur)?;
    advance(lexer, cur, interp.arena(), false)?; // '=' -> expr
    let v = eval_expr(lexer, cur, interp, host)?;
    interp.arena_mut().symbols[idx].value = v;
    Ok(Status::Ok)
}

fn eval_assign<'s>(
    name: String,
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<Status, TsError> {
    advance(lexer, cur, interp.arena(), false)?; // var -> '='
    expect_assign(cur)?;
    advance(lexer, cur, interp.arena(), false)?; // '=' -> expr
    let v = eval_expr(lexer, cur, interp, host)?;
    match interp.arena_mut().lookup_mut(&name) {
        Some(sym) => {
            sym.value = v;
            Ok(Status::Ok)
        }
        None => Err(TsError::UnknownSym),
    }
}

fn print_number(host: &mut dyn Host, v: Value) {
    for b in v.to_string().bytes() {
        host.out_char(b);
    }
}

fn eval_print<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<Status, TsError> {
    loop {
        advance(lexer, cur, interp.arena(), false)?; // 'print' or ',' -> next item
        match cur.clone() {
            Token::Str(s) => {
                for b in s.as_str().bytes() {
                    host.out_char(b);
                }
                advance(lexer, cur, interp.arena(), false)?;
            }
            _ => {
                let v = eval_expr(lexer, cur, interp, host)?;
                print_number(host, v);
            }
        }
        if !matches!(cur, Token::Char(',')) {
            break;
        }
    }
    host.out_char(b'\n');
    Ok(Status::Ok)
}

/// Parses `EXPR { BODY }` -- the shape shared by `if` and each iteration
/// of `while`. Always consumes the body token (so the caller can look
/// past it for a trailing `else`, or simply move on to the statement
/// terminator); only *runs* the body, in its own nested scope, when the
/// condition is nonzero. A false condition reports `Status::Else`, which
/// must never escape `if`/`while` themselves.
fn eval_cond_body<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
    save_strings: bool,
) -> Result<Status, TsError> {
    let cond = eval_expr(lexer, cur, interp, host)?;
    let body = match cur.clone() {
        Token::Body(s) => s,
        _ => return Err(TsError::Syntax),
    };
    advance(lexer, cur, interp.arena(), false)?; // body -> whatever follows
    if cond == 0 {
        return Ok(Status::Else);
    }
    interp.run_nested(body.as_str(), save_strings, host)
}

fn eval_if<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
    save_strings: bool,
) -> Result<Status, TsError> {
    advance(lexer, cur, interp.arena(), false)?; // 'if' -> condition
    match eval_cond_body(lexer, cur, interp, host, save_strings)? {
        Status::Else => {
            if matches!(cur, Token::Keyword(Keyword::Else)) {
                advance(lexer, cur, interp.arena(), false)?; // 'else' -> body
                let body = match cur.clone() {
                    Token::Body(s) => s,
                    _ => return Err(TsError::Syntax),
                };
                advance(lexer, cur, interp.arena(), false)?; // body -> terminator
                interp.run_nested(body.as_str(), save_strings, host)
            } else {
                Ok(Status::Ok)
            }
        }
        other => Ok(other),
    }
}

fn eval_while<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
    save_strings: bool,
) -> Result<Status, TsError> {
    // `cur` already holds the `while` keyword; the text right after it is
    // the condition+body pair that gets re-lexed on every iteration.
    let resume = lexer.remaining();
    loop {
        lexer.set_remaining(resume);
        advance(lexer, cur, interp.arena(), false)?;
        match eval_cond_body(lexer, cur, interp, host, save_strings)? {
            Status::Else => return Ok(Status::Ok),
            Status::Return(v) => return Ok(Status::Return(v)),
            Status::Ok => continue,
        }
    }
}

fn eval_funcdef<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    _host: &mut dyn Host,
    save_strings: bool,
) -> Result<Status, TsError> {
    advance(lexer, cur, interp.arena(), true)?; // 'func' -> raw name
    let name = match cur.clone() {
        Token::Ident(s) => s,
        _ => return Err(TsError::Syntax),
    };
    advance(lexer, cur, interp.arena(), false)?; // name -> '('
    expect_char(cur, '(')?;
    advance(lexer, cur, interp.arena(), true)?; // '(' -> raw first param name, or ')'

    let mut arg_names = Vec::new();
    if !matches!(cur, Token::Char(')')) {
        loop {
            let pname = match cur.clone() {
                Token::Ident(s) => s,
                _ => return Err(TsError::Syntax),
            };
            arg_names.push(pname);
            advance(lexer, cur, interp.arena(), false)?; // param name -> ',' or ')'
            if matches!(cur, Token::Char(',')) {
                advance(lexer, cur, interp.arena(), true)?; // ',' -> raw next param name
                continue;
            }
            break;
        }
    }
    expect_char(cur, ')')?;
    if arg_names.len() > MAX_BUILTIN_PARAMS {
        return Err(TsError::TooManyArgs);
    }
    advance(lexer, cur, interp.arena(), false)?; // ')' -> body
    let body = match cur.clone() {
        Token::Body(s) => s,
        _ => return Err(TsError::Syntax),
    };
    advance(lexer, cur, interp.arena(), false)?; // body -> terminator

    if save_strings {
        interp.arena_mut().retain_string(&name)?;
        interp.arena_mut().retain_string(&body)?;
        for a in &arg_names {
            interp.arena_mut().retain_string(a)?;
        }
    }
    let nargs = arg_names.len() as u8;
    let proc_idx = interp.arena_mut().push_proc(UserProc { body, arg_names, nargs })?;
    interp.define(name.as_str(), SymbolKind::UserFunc { proc_idx }, 0)?;
    Ok(Status::Ok)
}

fn eval_return<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<Status, TsError> {
    advance(lexer, cur, interp.arena(), false)?; // 'return' -> expr, or terminator
    if matches!(cur, Token::Char('\n') | Token::Char(';') | Token::Eof) {
        return Ok(Status::Return(0));
    }
    let v = eval_expr(lexer, cur, interp, host)?;
    Ok(Status::Return(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Interp;

    struct Sink(Vec<u8>);
    impl Host for Sink {
        fn out_char(&mut self, c: u8) {
            self.0.push(c);
        }
    }

    fn run(src: &str) -> (Result<Value, TsError>, String) {
        let mut interp = Interp::new(1 << 16).unwrap();
        let mut host = Sink(Vec::new());
        let r = interp.run(src, false, true, &mut host);
        (r, String::from_utf8(host.0).unwrap())
    }

    #[test]
    fn var_assign_and_print() {
        let (r, out) = run("var a=3; var b=4; print a*a+b*b");
        assert_eq!(r, Ok(0));
        assert_eq!(out, "25\n");
    }

    #[test]
    fn while_loop_computes_factorial() {
        let (r, out) = run("var n=5; var f=1; while (n > 1) { f = f*n; n = n-1 }; print f");
        assert_eq!(r, Ok(0));
        assert_eq!(out, "120\n");
    }

    #[test]
    fn if_else_picks_the_right_branch() {
        let (r, out) = run("var x=0; if (1 < 2) { x = 10 } else { x = 20 }; print x");
        assert_eq!(r, Ok(0));
        assert_eq!(out, "10\n");
    }

    #[test]
    fn comma_print_list_stays_on_one_line() {
        // Only one `Newline()` happens after the whole comma list, as in
        // the original source's `print_more` loop -- not one per item.
        let (_, out) = run("print 0xFF, 0x10");
        assert_eq!(out, "25516\n");
    }

    #[test]
    fn nested_scope_shadows_and_unshadows() {
        let (_, out) = run("var a=1; { var a=2; print a }; print a");
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn assign_to_unknown_symbol_is_an_error() {
        let (r, _) = run("x = 1");
        assert_eq!(r, Err(TsError::UnknownSym));
    }

    #[test]
    fn return_inside_while_terminates_both_the_loop_and_the_enclosing_run() {
        let (r, out) = run("var n=0; while (1) { n = n+1; if (n = 3) { return n } }; print 999");
        assert_eq!(r, Ok(3));
        assert_eq!(out, "");
    }
}
