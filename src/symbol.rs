//! Symbol table value types.
//!
//! The original design encodes a symbol's behavior by stuffing a function
//! pointer into the same integer-sized slot used for plain variable
//! values, distinguished only by a side type tag. `SymbolKind` replaces
//! that trick with a proper tagged union, so a symbol's shape is checked
//! by the compiler instead of by convention.

use crate::strview::StringView;
use crate::Value;

/// A binary operator implementation: `func(lhs, rhs) -> result`.
pub type OperatorFn = fn(Value, Value) -> Value;

/// A builtin function implementation. Every builtin takes exactly four
/// slots regardless of its declared arity; unused trailing slots are
/// zero. This mirrors the fixed-size argument array the evaluator fills
/// before a call, which in turn is what lets builtins be plain function
/// pointers rather than closures over a variable-length argument list.
pub type BuiltinFn = fn(Value, Value, Value, Value) -> Value;

/// Reserved words recognized by the statement parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    While,
    Print,
    Var,
    Func,
    Return,
}

/// What a symbol table entry actually is.
#[derive(Clone)]
pub enum SymbolKind {
    /// A plain integer variable; `Symbol::value` holds its current value.
    Int,
    /// A binary infix/prefix operator at a given precedence level (1 =
    /// tightest-binding, per [`crate::MAX_EXPR_LEVEL`]).
    Operator { level: u8, func: OperatorFn },
    /// A host-registered builtin function.
    Builtin { arity: u8, func: BuiltinFn },
    /// A user-defined procedure; `proc_idx` indexes [`crate::arena::Arena`]'s
    /// procedure table.
    UserFunc { proc_idx: usize },
    /// A reserved word (`if`, `while`, ...).
    Keyword(Keyword),
}

/// One symbol table entry: a name, what it is, and (for `Int`) its
/// current value.
#[derive(Clone)]
pub struct Symbol {
    pub name: StringView,
    pub kind: SymbolKind,
    pub value: Value,
}

/// A user-defined procedure's captured body and formal parameter names.
///
/// The body is kept as an unparsed [`StringView`] rather than any parsed
/// representation -- invoking the procedure just runs that text as a
/// fresh, recursive `Interp::run` call in a new symbol-table scope. There
/// is no separate AST or bytecode form to build or garbage-collect.
#[derive(Clone)]
pub struct UserProc {
    pub body: StringView,
    pub arg_names: Vec<StringView>,
    pub nargs: u8,
}
