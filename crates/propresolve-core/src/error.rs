//! Error types for propresolve
//!
//! Errors are structured: a kind, the source key that was being resolved,
//! an optional underlying cause and an actionable help message.

use std::fmt;

/// Result type alias for propresolve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for propresolve operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Source key whose resolution failed (e.g., "db.url")
    pub key: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Constructor input is not a usable mapping
    #[error("Invalid input")]
    InvalidInput,
    /// A key depends on itself, directly or transitively
    #[error("Circular reference detected on key '{key}'")]
    CircularReference { key: String, chain: Vec<String> },
    /// No registered strategy provides the function
    #[error("Unknown function: {name}/{arity}")]
    UnknownFunction { name: String, arity: usize },
    /// A computed expression could not produce a value
    #[error("Could not resolve function '{name}' with {arity} argument(s)")]
    UnresolvedFunction { name: String, arity: usize },
    /// Placeholder content does not match the expression grammar
    #[error("Malformed placeholder expression: ${{{expression}}}")]
    MalformedExpression { expression: String },
    /// A function table already holds the name
    #[error("Function '{name}' is already registered")]
    AlreadyRegistered { name: String },
    /// Nested key references went deeper than the configured limit
    #[error("Maximum resolution depth of {limit} exceeded")]
    DepthExceeded { limit: usize },
    /// Serializing resolved properties failed
    #[error("Export error")]
    Export,
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            help: None,
            cause: None,
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::InvalidInput)
        }
    }

    /// Create a circular reference error
    ///
    /// `chain` is the list of keys pending resolution, in the order they were
    /// entered; the offending key is appended to close the loop.
    pub fn circular_reference(key: impl Into<String>, chain: Vec<String>) -> Self {
        let key = key.into();
        let mut full_chain = chain;
        full_chain.push(key.clone());
        let chain_str = full_chain.join(" → ");
        Self {
            kind: ErrorKind::CircularReference {
                key: key.clone(),
                chain: full_chain,
            },
            key: Some(key),
            help: Some("Break the circular dependency by removing one of the references".into()),
            cause: Some(format!("Chain: {}", chain_str)),
        }
    }

    /// Create an unknown function error
    pub fn unknown_function(name: impl Into<String>, arity: usize) -> Self {
        let name = name.into();
        Self {
            help: Some(format!(
                "Register a function named '{}' accepting {} argument(s) or check for typos",
                name, arity
            )),
            ..Self::from_kind(ErrorKind::UnknownFunction { name, arity })
        }
    }

    /// Create an unresolved function error
    pub fn unresolved_function(name: impl Into<String>, arity: usize) -> Self {
        let name = name.into();
        Self {
            help: Some(format!(
                "Provide a default for the expression: ${{${}(...):default}}",
                name
            )),
            ..Self::from_kind(ErrorKind::UnresolvedFunction { name, arity })
        }
    }

    /// Create a malformed expression error
    pub fn malformed_expression(expression: impl Into<String>) -> Self {
        Self {
            help: Some(
                "Expected ${key}, ${key:default}, or ${$function(arg,'literal'):default}".into(),
            ),
            ..Self::from_kind(ErrorKind::MalformedExpression {
                expression: expression.into(),
            })
        }
    }

    /// Create a function already registered error
    pub fn already_registered(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            help: Some(format!(
                "Use register_with_force(..., true) to override the '{}' function",
                name
            )),
            ..Self::from_kind(ErrorKind::AlreadyRegistered { name })
        }
    }

    /// Create a depth exceeded error
    pub fn depth_exceeded(limit: usize) -> Self {
        Self {
            help: Some("Shorten the reference chain or raise ResolverOptions::max_depth".into()),
            ..Self::from_kind(ErrorKind::DepthExceeded { limit })
        }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Export)
        }
    }

    /// Add key context to the error
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add key context only if the error does not carry one yet
    pub fn or_key(mut self, key: &str) -> Self {
        if self.key.is_none() {
            self.key = Some(key.to_string());
        }
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add an underlying cause to the error
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(key) = &self.key {
            write!(f, "\n  Key: {}", key)?;
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
