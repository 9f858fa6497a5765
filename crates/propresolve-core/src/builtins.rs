//! Built-in functions for computed expressions
//!
//! These are always consulted first by a registry created with
//! [`FunctionRegistry::with_builtins`](crate::FunctionRegistry::with_builtins).

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::function::{Arity, Function, FunctionResolver, FunctionTable};

/// The engine's own function table
#[derive(Clone)]
pub struct BuiltinFunctions {
    table: FunctionTable,
}

impl Default for BuiltinFunctions {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinFunctions {
    /// Create the built-in table (echo, concat, upper, lower, trim, coalesce, replace, base64, unbase64)
    pub fn new() -> Self {
        let mut table = FunctionTable::new();
        table.register_fn("echo", Arity::Any, echo);
        table.register_fn("concat", Arity::Any, concat);
        table.register_fn("upper", Arity::Exact(1), upper);
        table.register_fn("lower", Arity::Exact(1), lower);
        table.register_fn("trim", Arity::Exact(1), trim);
        table.register_fn("coalesce", Arity::AtLeast(1), coalesce);
        table.register_fn("replace", Arity::Exact(3), replace);
        table.register_fn("base64", Arity::Exact(1), base64_encode);
        table.register_fn("unbase64", Arity::Exact(1), base64_decode);
        Self { table }
    }
}

impl FunctionResolver for BuiltinFunctions {
    fn resolve(&self, name: &str, arity: usize) -> Option<Arc<dyn Function>> {
        self.table.resolve(name, arity)
    }

    fn arity_of(&self, name: &str) -> Option<Arity> {
        self.table.arity_of(name)
    }

    fn name(&self) -> &str {
        "builtin"
    }
}

/// Echo - join arguments with a single space
///
/// Usage:
///   ${$echo('a','b')}        - "a b"
///   ${$echo(first,last)}     - values of keys first and last, space separated
fn echo(args: &[String]) -> Option<String> {
    Some(args.join(" "))
}

/// Concat - join arguments with no separator
fn concat(args: &[String]) -> Option<String> {
    Some(args.concat())
}

fn upper(args: &[String]) -> Option<String> {
    args.first().map(|s| s.to_uppercase())
}

fn lower(args: &[String]) -> Option<String> {
    args.first().map(|s| s.to_lowercase())
}

fn trim(args: &[String]) -> Option<String> {
    args.first().map(|s| s.trim().to_string())
}

/// Coalesce - first non-empty argument
///
/// Yields no value when every argument is empty, so the expression falls
/// back to its default: ${$coalesce(override,base):fallback}
fn coalesce(args: &[String]) -> Option<String> {
    args.iter().find(|s| !s.is_empty()).cloned()
}

/// Replace - ${$replace(input,'from','to')}
fn replace(args: &[String]) -> Option<String> {
    let [input, from, to] = args else {
        return None;
    };
    if from.is_empty() {
        return Some(input.clone());
    }
    Some(input.replace(from.as_str(), to))
}

/// Base64 - encode the argument with the standard alphabet
fn base64_encode(args: &[String]) -> Option<String> {
    args.first().map(|s| STANDARD.encode(s))
}

/// Unbase64 - decode standard base64 into UTF-8 text
///
/// Yields no value for invalid base64 or non UTF-8 content.
fn base64_decode(args: &[String]) -> Option<String> {
    let decoded = STANDARD.decode(args.first()?.trim()).ok()?;
    String::from_utf8(decoded).ok()
}
