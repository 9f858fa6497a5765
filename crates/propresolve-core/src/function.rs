//! Function dispatch for computed expressions
//!
//! A computed expression like `${$echo(a,'b')}` names a function and passes
//! it resolved arguments. Functions are looked up by (name, arity) through an
//! ordered chain of [`FunctionResolver`] strategies held by a
//! [`FunctionRegistry`]; the first strategy that knows the pair wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::builtins::BuiltinFunctions;
use crate::error::{Error, Result};

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments
    Exact(usize),
    /// This many arguments or more
    AtLeast(usize),
    /// Any number of arguments, including none
    Any,
}

impl Arity {
    /// Check whether a call with `count` arguments is accepted
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "{}+", n),
            Arity::Any => write!(f, "*"),
        }
    }
}

/// A callable usable from computed expressions
///
/// Returning `None` means "no result": the expression's default is used if it
/// has one, otherwise resolution fails.
pub trait Function: Send + Sync {
    /// Invoke the function with resolved arguments
    fn call(&self, args: &[String]) -> Option<String>;

    /// Get the name of this function
    fn name(&self) -> &str;

    /// Get the argument counts this function accepts
    fn arity(&self) -> Arity;
}

/// A simple closure-based function
pub struct FnFunction<F>
where
    F: Fn(&[String]) -> Option<String> + Send + Sync,
{
    name: String,
    arity: Arity,
    func: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&[String]) -> Option<String> + Send + Sync,
{
    /// Create a new closure-based function
    pub fn new(name: impl Into<String>, arity: Arity, func: F) -> Self {
        Self {
            name: name.into(),
            arity,
            func,
        }
    }
}

impl<F> Function for FnFunction<F>
where
    F: Fn(&[String]) -> Option<String> + Send + Sync,
{
    fn call(&self, args: &[String]) -> Option<String> {
        (self.func)(args)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }
}

/// A strategy that maps a function name and argument count to a callable
pub trait FunctionResolver: Send + Sync {
    /// Look up a function accepting `arity` arguments
    fn resolve(&self, name: &str, arity: usize) -> Option<Arc<dyn Function>>;

    /// Get the arity accepted under `name`, if this strategy knows it
    fn arity_of(&self, name: &str) -> Option<Arity>;

    /// Check whether this strategy knows `name` at any arity
    fn provides(&self, name: &str) -> bool {
        self.arity_of(name).is_some()
    }

    /// Get the name of this strategy (used in diagnostics)
    fn name(&self) -> &str;
}

/// An explicit name → function table
///
/// Names are matched ASCII case-insensitively.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any function of the same name
    pub fn register(&mut self, function: Arc<dyn Function>) {
        self.functions
            .insert(function.name().to_ascii_lowercase(), function);
    }

    /// Register a function with optional force overwrite.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Error)` if force=false and a function with the same name exists
    pub fn register_with_force(&mut self, function: Arc<dyn Function>, force: bool) -> Result<()> {
        if !force && self.provides(function.name()) {
            return Err(Error::already_registered(function.name()));
        }
        self.register(function);
        Ok(())
    }

    /// Register a closure as a function
    pub fn register_fn<F>(&mut self, name: impl Into<String>, arity: Arity, func: F)
    where
        F: Fn(&[String]) -> Option<String> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnFunction::new(name, arity, func)));
    }

    /// Get a function by name, regardless of arity
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FunctionResolver for FunctionTable {
    fn resolve(&self, name: &str, arity: usize) -> Option<Arc<dyn Function>> {
        self.get(name)
            .filter(|function| function.arity().accepts(arity))
            .cloned()
    }

    fn arity_of(&self, name: &str) -> Option<Arity> {
        self.get(name).map(|function| function.arity())
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Registry of available functions
///
/// Lookup order is fixed: strategies in the order they were added (built-ins
/// first when created with [`FunctionRegistry::with_builtins`]), then the
/// functions registered directly on the registry.
#[derive(Clone)]
pub struct FunctionRegistry {
    strategies: Vec<Arc<dyn FunctionResolver>>,
    registered: FunctionTable,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FunctionRegistry {
    /// Create a new registry with no functions at all
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            registered: FunctionTable::new(),
        }
    }

    /// Create a registry with the built-in functions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.push(Arc::new(BuiltinFunctions::new()));
        registry
    }

    /// Append a lookup strategy after the existing ones
    pub fn push(&mut self, strategy: Arc<dyn FunctionResolver>) {
        self.strategies.push(strategy);
    }

    /// Register a function, replacing an earlier registration of the same name
    ///
    /// Fails if a strategy already provides the name, since the strategy
    /// would always win the lookup.
    pub fn register(&mut self, function: Arc<dyn Function>) -> Result<()> {
        self.register_with_force(function, true)
    }

    /// Register a function with optional force overwrite.
    ///
    /// # Arguments
    /// * `function` - The function to register
    /// * `force` - If true, overwrite a function registered earlier with the
    ///   same name. Names provided by a strategy can never be overwritten.
    pub fn register_with_force(&mut self, function: Arc<dyn Function>, force: bool) -> Result<()> {
        if let Some(strategy) = self
            .strategies
            .iter()
            .find(|strategy| strategy.provides(function.name()))
        {
            return Err(Error::already_registered(function.name()).with_help(format!(
                "'{}' is provided by the {} functions and takes precedence; choose another name",
                function.name(),
                strategy.name()
            )));
        }
        self.registered.register_with_force(function, force)
    }

    /// Register a closure as a function
    pub fn register_fn<F>(&mut self, name: impl Into<String>, arity: Arity, func: F) -> Result<()>
    where
        F: Fn(&[String]) -> Option<String> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnFunction::new(name, arity, func)))
    }

    /// Check if any strategy or registration knows the name
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.iter().any(|strategy| strategy.provides(name))
            || self.registered.provides(name)
    }

    /// Find the function for a name and argument count
    pub fn resolve(&self, name: &str, arity: usize) -> Result<Arc<dyn Function>> {
        let strategies = self
            .strategies
            .iter()
            .map(|strategy| &**strategy as &dyn FunctionResolver)
            .chain(std::iter::once(&self.registered as &dyn FunctionResolver));

        for strategy in strategies {
            if let Some(function) = strategy.resolve(name, arity) {
                log::trace!(
                    "Function '{}'/{} resolved by {} strategy",
                    name,
                    arity,
                    strategy.name()
                );
                return Ok(function);
            }
        }

        let err = Error::unknown_function(name, arity);
        match self.arity_of(name) {
            Some(accepted) => Err(err.with_cause(format!(
                "'{}' exists but accepts {} argument(s)",
                name, accepted
            ))),
            None => Err(err),
        }
    }

    fn arity_of(&self, name: &str) -> Option<Arity> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.arity_of(name))
            .or_else(|| self.registered.arity_of(name))
    }
}
