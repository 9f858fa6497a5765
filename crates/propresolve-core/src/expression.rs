//! Placeholder expression parsing
//!
//! Raw values are scanned for `${...}` regions whose content holds no braces.
//! Each region parses into an [`Expression`]:
//! - `${key}` - key reference
//! - `${key:default}` - key reference with a literal default
//! - `${$fn(arg,'literal')}` - computed function call
//! - `${$fn(arg):default}` - computed function call with a default
//!
//! Regions do not nest: `${${a}}` substitutes the inner `${a}` and leaves the
//! surrounding `${` and `}` as literal text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// A `${...}` region whose content contains no `{` or `}`
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}{]+)\}").expect("placeholder pattern is valid"));

/// Compute marker, name, optional argument list, optional default
static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(\$)?([^$}{:()]+)(?:\(([^$}{()]*)\))?(?::(.*))?$")
        .expect("expression pattern is valid")
});

/// A parsed placeholder expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A key reference: ${key} or ${key:default}
    Reference {
        /// The referenced source key
        key: String,
        /// Text used verbatim when the key is absent
        default: Option<String>,
    },
    /// A computed function call: ${$name(args):default}
    Call {
        /// Function name (matched case-insensitively by the registry)
        name: String,
        /// Arguments in call order
        args: Vec<Argument>,
        /// Text used verbatim when the function yields no value
        default: Option<String>,
    },
}

/// An argument to a computed function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// A single-quoted literal, passed through as-is
    Literal(String),
    /// A source key, resolved with a plain key lookup
    Key(String),
}

impl Expression {
    /// Parse the text found between `${` and `}`
    pub fn parse(text: &str) -> Result<Self> {
        let caps = EXPRESSION
            .captures(text)
            .ok_or_else(|| Error::malformed_expression(text))?;

        let compute = caps.get(1).is_some();
        let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
        let arguments = caps.get(3).map(|m| m.as_str());
        let default = caps.get(4).map(|m| m.as_str().to_string());

        if !compute {
            if arguments.is_some() {
                return Err(Error::malformed_expression(text)
                    .with_help("Argument lists are only allowed on computed expressions: ${$name(...)}"));
            }
            return Ok(Expression::Reference { key: name, default });
        }

        let args = match arguments {
            Some(list) => split_arguments(list).ok_or_else(|| Error::malformed_expression(text))?,
            None => Vec::new(),
        };

        Ok(Expression::Call {
            name,
            args,
            default,
        })
    }

    #[cfg(test)]
    fn default(&self) -> Option<&str> {
        match self {
            Expression::Reference { default, .. } | Expression::Call { default, .. } => {
                default.as_deref()
            }
        }
    }
}

/// Split an argument list on commas outside single-quoted literals.
///
/// Returns `None` for an unterminated quote or an empty argument.
fn split_arguments(list: &str) -> Option<Vec<Argument>> {
    if list.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_quote = false;

    for (i, c) in list.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ',' if !in_quote => {
                pieces.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quote {
        return None;
    }
    pieces.push(&list[start..]);

    pieces
        .into_iter()
        .map(|piece| {
            let piece = piece.trim();
            if piece.is_empty() {
                None
            } else if let Some(literal) = piece
                .strip_prefix('\'')
                .and_then(|rest| rest.strip_suffix('\''))
            {
                Some(Argument::Literal(literal.to_string()))
            } else {
                Some(Argument::Key(piece.to_string()))
            }
        })
        .collect()
}

/// Replace every `${...}` region of `raw` with the result of `replace`.
///
/// `replace` receives the text between the delimiters. Text outside regions
/// is copied through unchanged. The first error aborts the substitution.
pub fn substitute<F>(raw: &str, mut replace: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut result = String::with_capacity(raw.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(raw) {
        let (Some(region), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        result.push_str(&raw[last..region.start()]);
        result.push_str(&replace(inner.as_str())?);
        last = region.end();
    }

    result.push_str(&raw[last..]);
    Ok(result)
}

/// Check if a string contains any `${...}` region
pub fn contains_placeholder(raw: &str) -> bool {
    PLACEHOLDER.is_match(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            Expression::parse("db.host").unwrap(),
            Expression::Reference {
                key: "db.host".into(),
                default: None,
            }
        );
    }

    #[test]
    fn test_parse_reference_with_default() {
        assert_eq!(
            Expression::parse("db.port:5432").unwrap(),
            Expression::Reference {
                key: "db.port".into(),
                default: Some("5432".into()),
            }
        );
    }

    #[test]
    fn test_default_keeps_later_colons() {
        let expr = Expression::parse("url:http://localhost:8080").unwrap();
        assert_eq!(expr.default(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_empty_default_is_present() {
        let expr = Expression::parse("missing:").unwrap();
        assert_eq!(expr.default(), Some(""));
    }

    #[test]
    fn test_parse_call_with_literals_and_keys() {
        assert_eq!(
            Expression::parse("$echo('a', user.name ,'b')").unwrap(),
            Expression::Call {
                name: "echo".into(),
                args: vec![
                    Argument::Literal("a".into()),
                    Argument::Key("user.name".into()),
                    Argument::Literal("b".into()),
                ],
                default: None,
            }
        );
    }

    #[test]
    fn test_quoted_comma_is_one_argument() {
        assert_eq!(
            Expression::parse("$echo('x,y')").unwrap(),
            Expression::Call {
                name: "echo".into(),
                args: vec![Argument::Literal("x,y".into())],
                default: None,
            }
        );
    }

    #[test]
    fn test_parse_call_with_default() {
        let expr = Expression::parse("$coalesce(a,b):none").unwrap();
        assert_eq!(expr.default(), Some("none"));
        assert!(matches!(expr, Expression::Call { ref args, .. } if args.len() == 2));
    }

    #[test]
    fn test_call_without_arguments() {
        for text in ["$echo", "$echo()", "$echo(  )"] {
            assert_eq!(
                Expression::parse(text).unwrap(),
                Expression::Call {
                    name: "echo".into(),
                    args: Vec::new(),
                    default: None,
                },
                "parsing {}",
                text
            );
        }
    }

    #[test]
    fn test_empty_literal() {
        assert_eq!(
            Expression::parse("$concat('',x)").unwrap(),
            Expression::Call {
                name: "concat".into(),
                args: vec![Argument::Literal(String::new()), Argument::Key("x".into())],
                default: None,
            }
        );
    }

    #[test]
    fn test_malformed_expressions() {
        for text in [
            "a(b",
            "a)b",
            ":default",
            "$$double",
            "$fn(a)trailing",
            "$fn('unterminated)",
            "$fn(a,,b)",
            "key(arg)",
        ] {
            let err = Expression::parse(text).unwrap_err();
            assert_eq!(
                err.kind,
                ErrorKind::MalformedExpression {
                    expression: text.into()
                },
                "parsing {}",
                text
            );
        }
    }

    #[test]
    fn test_substitute_copies_text_around_regions() {
        let result = substitute("jdbc:${db}://${host}/x", |inner| Ok(inner.to_uppercase())).unwrap();
        assert_eq!(result, "jdbc:DB://HOST/x");
    }

    #[test]
    fn test_substitute_does_not_nest() {
        let mut seen = Vec::new();
        let result = substitute("${${a}}", |inner| {
            seen.push(inner.to_string());
            Ok("v".into())
        })
        .unwrap();

        assert_eq!(seen, vec!["a".to_string()]);
        assert_eq!(result, "${v}");
    }

    #[test]
    fn test_substitute_leaves_unclosed_and_empty_regions() {
        let result = substitute("${} ${open $plain", |_| Ok("X".into())).unwrap();
        assert_eq!(result, "${} ${open $plain");
    }

    #[test]
    fn test_substitute_propagates_errors() {
        let result = substitute("a ${b} c", |inner| Err(Error::malformed_expression(inner)));
        assert!(result.is_err());
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder("${a}"));
        assert!(contains_placeholder("x ${$echo('a')} y"));
        assert!(!contains_placeholder("no placeholders"));
        assert!(!contains_placeholder("${}"));
        assert!(!contains_placeholder("just $dollar {braces}"));
    }
}
