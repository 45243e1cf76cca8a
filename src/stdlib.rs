//! Optional standard library: boolean helpers and a byte-list type for
//! scripts that need to build up binary buffers (packet bodies, small
//! records) a field at a time.
//!
//! [`crate::symbol::BuiltinFn`] is a bare function pointer with no access
//! to interpreter state, so a "list" can't be a `Vec` owned by the arena --
//! instead each list is heap-allocated on its own and a script holds onto
//! it by an opaque handle (its pointer, reinterpreted as a [`Value`]).
//! That reinterpretation is the only unsafe code in this crate; it is
//! confined to this module, which is the one place `#![deny(unsafe_code)]`
//! at the crate root is relaxed.

#![allow(unsafe_code)]

use crate::error::TsError;
use crate::interp::Interp;
use crate::symbol::SymbolKind;
use crate::Value;

struct TsList {
    data: Vec<u8>,
}

fn handle_to_list<'a>(handle: Value) -> Option<&'a mut TsList> {
    if handle == 0 {
        return None;
    }
    // SAFETY: `handle` only ever comes from a previous `list_new`/`list_dup`
    // call's `list_to_handle` return value, and a list is only ever freed
    // by `list_free`, which consumes the handle -- a script that stashes a
    // freed handle in a variable and calls another list builtin on it is a
    // use-after-free the original C library has the same hazard for.
    Some(unsafe { &mut *(handle as usize as *mut TsList) })
}

fn list_to_handle(list: Box<TsList>) -> Value {
    Box::into_raw(list) as usize as Value
}

fn free_handle(handle: Value) {
    if handle == 0 {
        return;
    }
    // SAFETY: see `handle_to_list`; this is the one call site allowed to
    // reclaim the allocation `list_to_handle` produced.
    drop(unsafe { Box::from_raw(handle as usize as *mut TsList) });
}

fn ts_not(a: Value, _b: Value, _c: Value, _d: Value) -> Value {
    (a == 0) as Value
}

fn ts_bool(a: Value, _b: Value, _c: Value, _d: Value) -> Value {
    (a != 0) as Value
}

fn ts_list_new(capacity: Value, _b: Value, _c: Value, _d: Value) -> Value {
    let cap = capacity.max(0) as usize;
    list_to_handle(Box::new(TsList { data: Vec::with_capacity(cap) }))
}

fn ts_list_dup(handle: Value, _b: Value, _c: Value, _d: Value) -> Value {
    match handle_to_list(handle) {
        Some(list) => list_to_handle(Box::new(TsList { data: list.data.clone() })),
        None => 0,
    }
}

fn ts_list_free(handle: Value, _b: Value, _c: Value, _d: Value) -> Value {
    free_handle(handle);
    0
}

fn ts_list_size(handle: Value, _b: Value, _c: Value, _d: Value) -> Value {
    handle_to_list(handle).map(|l| l.data.len() as Value).unwrap_or(0)
}

fn ts_list_get(handle: Value, idx: Value, _c: Value, _d: Value) -> Value {
    handle_to_list(handle)
        .and_then(|l| l.data.get(idx.max(0) as usize))
        .map(|b| *b as Value)
        .unwrap_or(-1)
}

fn ts_list_set(handle: Value, idx: Value, byte: Value, _d: Value) -> Value {
    match handle_to_list(handle).and_then(|l| l.data.get_mut(idx.max(0) as usize)) {
        Some(slot) => {
            *slot = byte as u8;
            1
        }
        None => 0,
    }
}

fn ts_list_pop(handle: Value, _b: Value, _c: Value, _d: Value) -> Value {
    handle_to_list(handle).and_then(|l| l.data.pop()).map(|b| b as Value).unwrap_or(-1)
}

/// Appends one byte.
fn ts_list_push(handle: Value, byte: Value, _c: Value, _d: Value) -> Value {
    match handle_to_list(handle) {
        Some(list) => {
            list.data.push(byte as u8);
            list.data.len() as Value
        }
        None => -1,
    }
}

/// Appends a 16-bit value, low byte first.
fn ts_list_push_(handle: Value, value: Value, _c: Value, _d: Value) -> Value {
    match handle_to_list(handle) {
        Some(list) => {
            list.data.extend_from_slice(&(value as u16).to_le_bytes());
            list.data.len() as Value
        }
        None => -1,
    }
}

/// Appends a 32-bit value, low byte first.
fn ts_list_push__(handle: Value, value: Value, _c: Value, _d: Value) -> Value {
    match handle_to_list(handle) {
        Some(list) => {
            list.data.extend_from_slice(&(value as u32).to_le_bytes());
            list.data.len() as Value
        }
        None => -1,
    }
}

fn ts_list_truncate(handle: Value, new_len: Value, _c: Value, _d: Value) -> Value {
    match handle_to_list(handle) {
        Some(list) => {
            list.data.truncate(new_len.max(0) as usize);
            list.data.len() as Value
        }
        None => -1,
    }
}

fn ts_list_expand(handle: Value, extra: Value, _c: Value, _d: Value) -> Value {
    match handle_to_list(handle) {
        Some(list) => {
            list.data.reserve(extra.max(0) as usize);
            list.data.len() as Value
        }
        None => -1,
    }
}

/// Appends a copy of `src`'s bytes onto `dst`; `src` is left untouched.
fn ts_list_cat(dst: Value, src: Value, _c: Value, _d: Value) -> Value {
    let src_bytes = match handle_to_list(src) {
        Some(list) => list.data.clone(),
        None => return -1,
    };
    match handle_to_list(dst) {
        Some(list) => {
            list.data.extend_from_slice(&src_bytes);
            list.data.len() as Value
        }
        None => -1,
    }
}

/// Registers the optional standard library on `interp`: `not`, `bool`, and
/// the `list_*` byte-buffer family. A host that doesn't want scripts to
/// allocate off-arena memory can skip calling this.
pub fn define_stdlib(interp: &mut Interp) -> Result<(), TsError> {
    let builtins: &[(&str, u8, crate::symbol::BuiltinFn)] = &[
        ("not", 1, ts_not),
        ("bool", 1, ts_bool),
        ("list_new", 1, ts_list_new),
        ("list_dup", 1, ts_list_dup),
        ("list_free", 1, ts_list_free),
        ("list_size", 1, ts_list_size),
        ("list_pop", 1, ts_list_pop),
        ("list_get", 2, ts_list_get),
        ("list_set", 3, ts_list_set),
        ("list_push", 2, ts_list_push),
        ("list_push_", 2, ts_list_push_),
        ("list_push__", 2, ts_list_push__),
        ("list_truncate", 2, ts_list_truncate),
        ("list_expand", 2, ts_list_expand),
        ("list_cat", 2, ts_list_cat),
    ];
    for (name, arity, func) in builtins {
        interp.define(name, SymbolKind::Builtin { arity: *arity, func: *func }, 0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Host;

    struct Sink(Vec<u8>);
    impl Host for Sink {
        fn out_char(&mut self, c: u8) {
            self.0.push(c);
        }
    }

    fn interp_with_stdlib() -> Interp {
        let mut interp = Interp::new(1 << 16).unwrap();
        define_stdlib(&mut interp).unwrap();
        interp
    }

    #[test]
    fn not_and_bool_invert_and_normalize_truthiness() {
        let mut interp = interp_with_stdlib();
        let mut host = Sink(Vec::new());
        interp.run("print not(0), not(5), bool(0), bool(5)", false, true, &mut host).unwrap();
        assert_eq!(String::from_utf8(host.0).unwrap(), "1001\n");
    }

    #[test]
    fn list_push_pop_round_trips_in_order() {
        let mut interp = interp_with_stdlib();
        let mut host = Sink(Vec::new());
        let src = "\
            var l = list_new(4)\n\
            list_push(l, 10)\n\
            list_push(l, 20)\n\
            var sz = list_size(l)\n\
            var top = list_pop(l)\n\
            print sz, top, list_size(l)\n\
            list_free(l)\n";
        interp.run(src, false, true, &mut host).unwrap();
        assert_eq!(String::from_utf8(host.0).unwrap(), "2201\n");
    }

    #[test]
    fn list_cat_appends_without_consuming_the_source() {
        let mut interp = interp_with_stdlib();
        let mut host = Sink(Vec::new());
        let src = "\
            var a = list_new(2)\n\
            var b = list_new(2)\n\
            list_push(a, 1)\n\
            list_push(b, 2)\n\
            list_cat(a, b)\n\
            print list_size(a), list_size(b)\n\
            list_free(a)\n\
            list_free(b)\n";
        interp.run(src, false, true, &mut host).unwrap();
        assert_eq!(String::from_utf8(host.0).unwrap(), "21\n");
    }

    #[test]
    fn list_get_out_of_range_reports_negative_one() {
        let mut interp = interp_with_stdlib();
        let mut host = Sink(Vec::new());
        interp
            .run("var l = list_new(1); print list_get(l, 5); list_free(l)", false, true, &mut host)
            .unwrap();
        assert_eq!(String::from_utf8(host.0).unwrap(), "-1\n");
    }
}
