//! Placeholder resolution engine
//!
//! A [`Resolver`] owns an immutable [`SourceMap`] and a [`FunctionRegistry`].
//! Each call to [`Resolver::resolve_all`] or [`Resolver::resolve`] runs in its
//! own session holding the resolved-value cache and the stack of keys being
//! resolved, so a resolver can be shared across threads.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};
use crate::expression::{self, Argument, Expression};
use crate::function::FunctionRegistry;
use crate::properties::{Properties, SourceMap};

/// Prefix of the token substituted for malformed expressions under [`MalformedPolicy::Mark`]
pub const UNMATCHED_MARKER: &str = "_unmatched_";

/// Default limit on nested key references
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// What to do with a `${...}` region that does not match the expression grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Abort resolution with a `MalformedExpression` error
    #[default]
    Fail,
    /// Substitute `_unmatched_` followed by the expression text
    Mark,
}

/// Options controlling resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Handling of malformed placeholder expressions
    pub malformed: MalformedPolicy,
    /// Maximum number of placeholder-bearing keys being expanded at once
    ///
    /// Values without placeholders never count toward the limit, so with
    /// `0` plain values still resolve and any placeholder fails.
    pub max_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            malformed: MalformedPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Resolves placeholders across a set of properties
#[derive(Clone)]
pub struct Resolver {
    /// The raw (unresolved) merged properties
    source: Arc<SourceMap>,
    /// Functions available to computed expressions
    functions: Arc<FunctionRegistry>,
    /// Resolution options
    options: ResolverOptions,
}

impl Resolver {
    /// Create a resolver over a single mapping
    pub fn new<I, K, V>(source: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Ok(Self::from_source_map(SourceMap::new(source)?))
    }

    /// Create a resolver over several mappings; later ones take precedence
    pub fn from_sources<I, S, K, V>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Ok(Self::from_source_map(SourceMap::merged(sources)?))
    }

    /// Create a resolver over an already merged source map
    pub fn from_source_map(source: SourceMap) -> Self {
        Self {
            source: Arc::new(source),
            functions: Arc::new(FunctionRegistry::with_builtins()),
            options: ResolverOptions::default(),
        }
    }

    /// Use a custom function registry
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = Arc::new(functions);
        self
    }

    /// Use custom resolution options
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the raw merged properties
    pub fn source(&self) -> &SourceMap {
        &self.source
    }

    /// Get the function registry
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Get the resolution options
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve every key in the source map
    ///
    /// Fails on the first error; no partial result is returned.
    pub fn resolve_all(&self) -> Result<Properties> {
        let mut session = Session::new(self);
        let mut resolved = IndexMap::with_capacity(self.source.len());

        for key in self.source.keys() {
            if let Some(value) = session.value(key)? {
                resolved.insert(key.to_string(), value);
            }
        }

        log::debug!("Resolved {} properties", resolved.len());
        Ok(Properties::from_map(resolved))
    }

    /// Resolve a single key
    ///
    /// Returns `Ok(None)` if the key is not in the source map.
    pub fn resolve(&self, key: &str) -> Result<Option<String>> {
        Session::new(self).value(key)
    }
}

/// Per-call resolution state
struct Session<'r> {
    source: &'r SourceMap,
    functions: &'r FunctionRegistry,
    options: &'r ResolverOptions,
    /// Fully substituted values, final once inserted
    resolved: HashMap<String, String>,
    /// Keys on the active resolution stack, in entry order
    pending: IndexSet<String>,
}

impl<'r> Session<'r> {
    fn new(resolver: &'r Resolver) -> Self {
        Self {
            source: &resolver.source,
            functions: &resolver.functions,
            options: &resolver.options,
            resolved: HashMap::new(),
            pending: IndexSet::new(),
        }
    }

    /// Resolve a key, or `None` if the source map does not hold it
    fn value(&mut self, key: &str) -> Result<Option<String>> {
        if let Some(cached) = self.resolved.get(key) {
            return Ok(Some(cached.clone()));
        }

        let source = self.source;
        let Some(raw) = source.get(key) else {
            return Ok(None);
        };

        if let Some(start) = self.pending.get_index_of(key) {
            let chain = self.pending.iter().skip(start).cloned().collect();
            return Err(Error::circular_reference(key, chain));
        }
        if !expression::contains_placeholder(raw) {
            self.resolved.insert(key.to_string(), raw.to_string());
            return Ok(Some(raw.to_string()));
        }
        if self.pending.len() >= self.options.max_depth {
            return Err(Error::depth_exceeded(self.options.max_depth).with_key(key));
        }

        log::trace!("Resolving '{}'", key);
        self.pending.insert(key.to_string());
        let result = expression::substitute(raw, |text| self.replacement(text));
        self.pending.shift_remove(key);
        let value = result.map_err(|e| e.or_key(key))?;

        self.resolved.insert(key.to_string(), value.clone());
        Ok(Some(value))
    }

    /// Evaluate the text between `${` and `}`
    fn replacement(&mut self, text: &str) -> Result<String> {
        let expression = match Expression::parse(text) {
            Ok(expression) => expression,
            Err(err) => match self.options.malformed {
                MalformedPolicy::Fail => return Err(err),
                MalformedPolicy::Mark => {
                    log::warn!("Malformed placeholder expression '${{{}}}' left marked", text);
                    return Ok(format!("{}{}", UNMATCHED_MARKER, text));
                }
            },
        };

        match expression {
            Expression::Reference { key, default } => match (self.value(&key)?, default) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => {
                    log::debug!("No value for '{}', using default", key);
                    Ok(default)
                }
                (None, None) => {
                    log::debug!("No value for '{}', leaving placeholder in place", key);
                    Ok(format!("${{{}}}", text))
                }
            },
            Expression::Call {
                name,
                args,
                default,
            } => self.call(&name, &args, default),
        }
    }

    /// Evaluate a computed expression
    fn call(&mut self, name: &str, args: &[Argument], default: Option<String>) -> Result<String> {
        let arity = args.len();
        let mut values = Vec::with_capacity(arity);
        for arg in args {
            let value = match arg {
                Argument::Literal(literal) => literal.clone(),
                Argument::Key(key) => self
                    .value(key)?
                    .unwrap_or_else(|| format!("${{{}}}", key)),
            };
            values.push(value);
        }

        let function = self.functions.resolve(name, arity).map_err(|e| {
            let unresolved = Error::unresolved_function(name, arity);
            let unresolved = match e.cause {
                Some(cause) => unresolved.with_cause(format!("{}; {}", e.kind, cause)),
                None => unresolved.with_cause(e.kind.to_string()),
            };
            match e.help {
                Some(help) => unresolved.with_help(help),
                None => unresolved,
            }
        })?;

        log::trace!("Calling '{}' with {} argument(s)", function.name(), arity);
        match (function.call(&values), default) {
            (Some(value), _) => Ok(value),
            (None, Some(default)) => {
                log::debug!("Function '{}' returned no value, using default", name);
                Ok(default)
            }
            (None, None) => Err(Error::unresolved_function(name, arity)
                .with_cause("The function returned no value")),
        }
    }
}
