//! propresolve-core: Placeholder resolution for flat key/value properties
//!
//! This crate takes one or more mappings of string keys to raw values and
//! resolves placeholders inside the values:
//! - `${key}` - the resolved value of another key (left in place if absent)
//! - `${key:default}` - a literal default when the key is absent
//! - `${$fn(arg,'literal'):default}` - the result of a registered function
//!
//! # Example
//!
//! ```rust
//! use propresolve_core::Resolver;
//!
//! let resolved = Resolver::from_sources([
//!     vec![("db.host", "localhost"), ("db.port", "5432")],
//!     vec![("db.host", "db.internal")],
//!     vec![
//!         ("db.url", "postgres://${db.host}:${db.port}/${db.name:app}"),
//!         ("banner", "${$upper(db.host)}"),
//!     ],
//! ])
//! .unwrap()
//! .resolve_all()
//! .unwrap();
//!
//! assert_eq!(resolved.get("db.url"), Some("postgres://db.internal:5432/app"));
//! assert_eq!(resolved.get("banner"), Some("DB.INTERNAL"));
//! ```

pub mod builtins;
pub mod error;
pub mod expression;
pub mod function;
pub mod properties;
pub mod resolver;

pub use builtins::BuiltinFunctions;
pub use error::{Error, ErrorKind, Result};
pub use expression::{Argument, Expression};
pub use function::{Arity, FnFunction, Function, FunctionRegistry, FunctionResolver, FunctionTable};
pub use properties::{Properties, SourceMap};
pub use resolver::{MalformedPolicy, Resolver, ResolverOptions};
