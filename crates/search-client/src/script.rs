//! A best-effort interpreter for the tiny subset of Painless the
//! pipeline's scripted upserts actually emit (spec.md §4.9, §9 "wire-level
//! contracts... opaque byte templates"). [`InMemoryBackend`](crate::fake::InMemoryBackend)
//! uses this to apply scripted `_update` bodies the way a real engine
//! would, instead of ignoring the `script` field entirely.
//!
//! Four statement shapes are recognized, one per line of `source`:
//!
//! - `ctx._source.FIELD = RHS;` — unconditional assignment
//! - `if (ctx._source.FIELD == null) ctx._source.FIELD = RHS;` — assign
//!   only if absent (first-writer-wins)
//! - `ctx._source.ARRAY.removeIf(item -> item.KEY == RHS);` — filter an array
//! - `ctx._source.ARRAY.addAll(RHS);` — append to an array
//!
//! `RHS` is either `params.KEY` or the namespaced `params["N"].KEY` form
//! spec.md §4.9.5 describes for combined account-upsert scripts, or the
//! literal `true`/`false`.
//!
//! Nothing here parses general Painless; a statement shape this module
//! doesn't recognize is a bug in the script-building code, not malformed
//! input, so it panics rather than silently no-op-ing.

use serde_json::{Map, Value};

/// Extracts the `source` text from a `{"lang": "painless", "source":
/// "...", "params": {...}}` script body.
pub(crate) fn source(script: &Value) -> &str {
    script.get("source").and_then(|v| v.as_str()).unwrap_or_default()
}

/// Extracts the `params` object from a script body (empty object if absent).
pub(crate) fn params(script: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    script.get("params").unwrap_or(&EMPTY)
}

fn resolve_rhs(rhs: &str, params: &Value) -> Value {
    let rhs = rhs.trim();
    if rhs == "true" {
        return Value::Bool(true);
    }
    if rhs == "false" {
        return Value::Bool(false);
    }
    if let Some(rest) = rhs.strip_prefix("params[\"") {
        let close = rest.find("\"]").expect("malformed params[\"N\"] reference");
        let idx = &rest[..close];
        let key = rest[close + 2..]
            .strip_prefix('.')
            .expect("params[\"N\"] reference missing field access");
        return params.get(idx).and_then(|v| v.get(key)).cloned().unwrap_or(Value::Null);
    }
    if let Some(key) = rhs.strip_prefix("params.") {
        return params.get(key).cloned().unwrap_or(Value::Null);
    }
    panic!("unrecognized script rhs: {rhs:?}");
}

fn is_absent(ctx: &Map<String, Value>, field: &str) -> bool {
    matches!(ctx.get(field), None | Some(Value::Null))
}

fn eval_assignment(stmt: &str, ctx: &mut Map<String, Value>, params: &Value) {
    let rest = stmt
        .strip_prefix("ctx._source.")
        .expect("assignment statement must start with ctx._source.");
    let (field, rhs) = rest.split_once(" = ").expect("assignment statement missing ' = '");
    let rhs = rhs.trim_end_matches(';');
    ctx.insert(field.to_string(), resolve_rhs(rhs, params));
}

fn eval_statement(stmt: &str, ctx: &mut Map<String, Value>, params: &Value) {
    let stmt = stmt.trim();
    if stmt.is_empty() {
        return;
    }

    if let Some(rest) = stmt.strip_prefix("if (ctx._source.") {
        let (field, rest) = rest
            .split_once(" == null) ")
            .expect("conditional statement missing ' == null) '");
        if is_absent(ctx, field) {
            eval_assignment(rest, ctx, params);
        }
        return;
    }

    let rest = stmt
        .strip_prefix("ctx._source.")
        .unwrap_or_else(|| panic!("unrecognized script statement: {stmt:?}"));

    if let Some(at) = rest.find(".removeIf(item -> item.") {
        let array = &rest[..at];
        let after = &rest[at + ".removeIf(item -> item.".len()..];
        let (key, after) = after.split_once(" == ").expect("removeIf missing ' == '");
        let rhs = after
            .trim_end_matches(';')
            .trim_end_matches(')')
            .trim_end_matches(' ');
        let target = resolve_rhs(rhs, params);
        if let Some(Value::Array(items)) = ctx.get_mut(array) {
            items.retain(|item| item.get(key) != Some(&target));
        }
        return;
    }

    if let Some(at) = rest.find(".addAll(") {
        let array = &rest[..at];
        let after = &rest[at + ".addAll(".len()..];
        let rhs = after.trim_end_matches(';').trim_end_matches(')');
        let addition = resolve_rhs(rhs, params);
        let entry = ctx.entry(array.to_string()).or_insert_with(|| Value::Array(Vec::new()));
        if let (Value::Array(items), Value::Array(new_items)) = (entry, addition) {
            items.extend(new_items);
        }
        return;
    }

    eval_assignment(stmt, ctx, params);
}

/// Runs `source` (one statement per line) against `base`, mutating and
/// returning it. `base` is the existing document when updating, or the
/// scripted-upsert's `upsert` body when none exists yet and
/// `scripted_upsert: true` was set.
pub(crate) fn eval(source: &str, params: &Value, mut base: Value) -> Value {
    let ctx = base.as_object_mut().expect("script base document must be a JSON object");
    for line in source.lines() {
        eval_statement(line, ctx, params);
    }
    base
}
