//! Expression evaluation: precedence climbing over the operator levels
//! carried in each `Operator` symbol's own tag, plus the primary forms
//! (parenthesized subexpression, number, variable, builtin call, user
//! procedure call, unary operator use).
//!
//! There is no separate parse step that builds an expression tree: each
//! function below both consumes tokens and produces the resulting
//! [`Value`] in the same pass, exactly as the original evaluates while it
//! parses.

use crate::error::TsError;
use crate::interp::{Host, Interp};
use crate::lexer::{advance, Lexer, Token};
use crate::symbol::{Symbol, SymbolKind};
use crate::{Value, MAX_BUILTIN_PARAMS, MAX_EXPR_LEVEL};

pub(crate) fn eval_expr<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<Value, TsError> {
    eval_level(lexer, cur, interp, host, MAX_EXPR_LEVEL)
}

/// One rung of the precedence ladder: level 0 is a primary; each level
/// above it parses a lower-level operand, then folds in same-level
/// operators left to right, recursing one level down for every operand.
/// This generalizes the original's fixed two-rung `ParseTerm`/
/// `ParseSimpleExpr` ladder to however many levels are registered.
fn eval_level<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
    level: u8,
) -> Result<Value, TsError> {
    if level == 0 {
        return eval_primary(lexer, cur, interp, host);
    }
    let mut lhs = eval_level(lexer, cur, interp, host, level - 1)?;
    loop {
        let op = match cur.clone() {
            Token::Operator(name) => match interp.arena().lookup(name.as_str()) {
                Some(Symbol { kind: SymbolKind::Operator { level: op_level, func }, .. })
                    if *op_level == level =>
                {
                    Some(*func)
                }
                _ => None,
            },
            _ => None,
        };
        let Some(func) = op else { break };
        advance(lexer, cur, interp.arena(), false)?;
        let rhs = eval_level(lexer, cur, interp, host, level - 1)?;
        lhs = func(lhs, rhs);
    }
    Ok(lhs)
}

fn eval_primary<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<Value, TsError> {
    match cur.clone() {
        Token::Char('(') => {
            advance(lexer, cur, interp.arena(), false)?;
            let v = eval_level(lexer, cur, interp, host, MAX_EXPR_LEVEL)?;
            match cur {
                Token::Char(')') => {
                    advance(lexer, cur, interp.arena(), false)?;
                    Ok(v)
                }
                _ => Err(TsError::Syntax),
            }
        }
        Token::Number(n) => {
            advance(lexer, cur, interp.arena(), false)?;
            Ok(n)
        }
        Token::Var(name) => {
            let v = interp
                .arena()
                .lookup(name.as_str())
                .map(|s| s.value)
                .ok_or(TsError::UnknownSym)?;
            advance(lexer, cur, interp.arena(), false)?;
            Ok(v)
        }
        Token::Builtin(name) => eval_builtin_call(&name.as_str().to_string(), lexer, cur, interp, host),
        Token::UserFunc(name) => eval_user_call(&name.as_str().to_string(), lexer, cur, interp, host),
        Token::Operator(name) => {
            let func = match interp.arena().lookup(name.as_str()) {
                Some(Symbol { kind: SymbolKind::Operator { func, .. }, .. }) => *func,
                _ => return Err(TsError::Syntax),
            };
            advance(lexer, cur, interp.arena(), false)?;
            // A binop used in primary position is applied as a unary
            // prefix: `-x` is `op(0, x)` for whatever function `-` names.
            let rhs = eval_primary(lexer, cur, interp, host)?;
            Ok(func(0, rhs))
        }
        _ => Err(TsError::Syntax),
    }
}

/// Parses a parenthesized, comma-separated argument list starting at the
/// `(` that `cur` currently holds, pushing each evaluated argument onto
/// the arena's value stack as it goes (mirroring "push each result on
/// the value stack" from the call-argument contract). Returns the
/// number of arguments parsed; `cur` ends up on the token after the
/// closing `)`.
fn parse_call_args<'s>(
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<u8, TsError> {
    match cur {
        Token::Char('(') => advance(lexer, cur, interp.arena(), false)?,
        _ => return Err(TsError::Syntax),
    }
    let mut n: u8 = 0;
    if !matches!(cur, Token::Char(')')) {
        loop {
            let v = eval_level(lexer, cur, interp, host, MAX_EXPR_LEVEL)?;
            interp.arena_mut().push_val(v)?;
            n += 1;
            match cur {
                Token::Char(',') => {
                    advance(lexer, cur, interp.arena(), false)?;
                    continue;
                }
                _ => break,
            }
        }
    }
    match cur {
        Token::Char(')') => {
            advance(lexer, cur, interp.arena(), false)?;
            Ok(n)
        }
        _ => Err(TsError::Syntax),
    }
}

fn eval_builtin_call<'s>(
    name: &str,
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<Value, TsError> {
    let (arity, func) = match interp.arena().lookup(name) {
        Some(Symbol { kind: SymbolKind::Builtin { arity, func }, .. }) => (*arity, *func),
        _ => return Err(TsError::Syntax),
    };
    advance(lexer, cur, interp.arena(), false)?;
    let n = match parse_call_args(lexer, cur, interp, host) {
        Ok(n) => n,
        Err(e) => return Err(e),
    };
    if n != arity {
        for _ in 0..n {
            interp.arena_mut().pop_val();
        }
        return Err(TsError::BadArgs);
    }
    let mut args = [0 as Value; MAX_BUILTIN_PARAMS];
    for i in (0..n as usize).rev() {
        args[i] = interp.arena_mut().pop_val();
    }
    Ok(func(args[0], args[1], args[2], args[3]))
}

fn eval_user_call<'s>(
    name: &str,
    lexer: &mut Lexer<'s>,
    cur: &mut Token,
    interp: &mut Interp,
    host: &mut dyn Host,
) -> Result<Value, TsError> {
    let proc_idx = match interp.arena().lookup(name) {
        Some(Symbol { kind: SymbolKind::UserFunc { proc_idx }, .. }) => *proc_idx,
        _ => return Err(TsError::Syntax),
    };
    advance(lexer, cur, interp.arena(), false)?;
    let n = parse_call_args(lexer, cur, interp, host)?;
    let proc = interp.arena().procs[proc_idx].clone();
    if n != proc.nargs {
        for _ in 0..n {
            interp.arena_mut().pop_val();
        }
        return Err(TsError::BadArgs);
    }
    let mut actuals = [0 as Value; MAX_BUILTIN_PARAMS];
    for i in (0..n as usize).rev() {
        actuals[i] = interp.arena_mut().pop_val();
    }
    let mark = interp.arena().mark();
    for (formal, actual) in proc.arg_names.iter().zip(actuals.iter()) {
        interp.arena_mut().push_symbol(Symbol {
            name: formal.clone(),
            kind: SymbolKind::Int,
            value: *actual,
        })?;
    }
    let result = interp.run(proc.body.as_str(), false, false, host);
    interp.arena_mut().restore(mark);
    result
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

    fn eval(src: &str) -> Result<Value, TsError> {
        let mut interp = Interp::new(1 << 16).unwrap();
        let mut host = Sink(Vec::new());
        let mut lexer = Lexer::new(src);
        let mut cur = lexer.next_token(interp.arena(), false)?;
        eval_level(&mut lexer, &mut cur, &mut interp, &mut host, MAX_EXPR_LEVEL)
    }

    #[test]
    fn precedence_multiplication_binds_tighter_than_addition() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14);
    }

    #[test]
    fn parens_override_precedence() {
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20);
    }

    #[test]
    fn unary_minus_is_zero_minus_operand() {
        assert_eq!(eval("-5 + 2").unwrap(), -3);
    }

    #[test]
    fn comparisons_live_at_the_loosest_registered_level() {
        assert_eq!(eval("1 + 1 = 2").unwrap(), 1);
        assert_eq!(eval("1 < 2").unwrap(), 1);
        assert_eq!(eval("3 <= 2").unwrap(), 0);
    }

    #[test]
    fn unresolved_identifier_in_expression_is_syntax_error() {
        assert_eq!(eval("never_defined"), Err(TsError::Syntax));
    }
}
