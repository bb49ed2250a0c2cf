//! Directive syntax: the parse step that classifies a configuration node

use std::fmt;
use std::str::FromStr;

use serde_json::{Map as JsonMap, Value};
use thiserror::Error;
use tracing::warn;

use super::resolver::ResolveOptions;

/// Key naming the constructor of a construction directive
pub const CLASS_KEY: &str = "cls";

/// Key holding the positional arguments of a construction directive
pub const ARGS_KEY: &str = "arg";

/// Key naming the property read by a property directive
pub const VALUE_KEY: &str = "val";

/// Scalar string replaced by the caller's placeholder handle
pub const DEFAULT_SENTINEL: &str = "div";

/// Structural problems in a directive mapping
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    /// A directive key holds a value of the wrong shape
    #[error("'{key}' must be {expected}")]
    InvalidKey {
        key: &'static str,
        expected: &'static str,
    },

    /// A dotted path is empty or has an empty segment
    #[error("invalid dotted path '{path}'")]
    InvalidPath { path: String },

    /// `cls` and `val` on the same mapping (strict mode only)
    #[error("directive sets both 'cls' and 'val'")]
    Ambiguous,
}

/// A `.`-separated name such as `MapTypeId.ROADMAP`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DottedPath {
    segments: Vec<String>,
}

impl DottedPath {
    /// Parse a dotted path; every segment must be non-empty
    pub fn parse(path: &str) -> Result<Self, DirectiveError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(DirectiveError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Final segment, the member's own name
    pub fn name(&self) -> &str {
        // parse() never produces an empty path
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path made of the first `len` segments, rendered for messages
    pub fn prefix(&self, len: usize) -> String {
        self.segments[..len.min(self.segments.len())].join(".")
    }
}

impl FromStr for DottedPath {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Interpretation of one configuration node
///
/// Precedence is fixed: placeholder sentinel, then `cls`, then `val`, then
/// generic container, then literal scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive<'a> {
    /// The sentinel string; resolves to the caller's placeholder
    Placeholder,
    /// `{"cls": path, "arg": [...]}`; `args` is empty when `arg` is absent
    Construct { path: DottedPath, args: &'a [Value] },
    /// `{"val": path}`
    PropertyRef { path: DottedPath },
    /// An array without directive meaning
    Sequence(&'a [Value]),
    /// An object without directive keys
    Mapping(&'a JsonMap<String, Value>),
    /// Any other scalar
    Literal(&'a Value),
}

impl<'a> Directive<'a> {
    /// Classify a node. Does not look inside children.
    pub fn parse(value: &'a Value, options: &ResolveOptions) -> Result<Self, DirectiveError> {
        match value {
            Value::String(s) if *s == options.sentinel => Ok(Directive::Placeholder),
            Value::Object(map) => {
                if let Some(class) = map.get(CLASS_KEY) {
                    if map.contains_key(VALUE_KEY) {
                        if options.strict {
                            return Err(DirectiveError::Ambiguous);
                        }
                        warn!(%class, "directive sets both 'cls' and 'val'; using 'cls'");
                    }
                    let path = expect_path(CLASS_KEY, class)?;
                    let args = match map.get(ARGS_KEY) {
                        None => &[][..],
                        Some(Value::Array(items)) => items.as_slice(),
                        Some(_) => {
                            return Err(DirectiveError::InvalidKey {
                                key: ARGS_KEY,
                                expected: "an array",
                            })
                        }
                    };
                    return Ok(Directive::Construct { path, args });
                }
                if let Some(property) = map.get(VALUE_KEY) {
                    let path = expect_path(VALUE_KEY, property)?;
                    return Ok(Directive::PropertyRef { path });
                }
                Ok(Directive::Mapping(map))
            }
            Value::Array(items) => Ok(Directive::Sequence(items)),
            other => Ok(Directive::Literal(other)),
        }
    }
}

fn expect_path(key: &'static str, value: &Value) -> Result<DottedPath, DirectiveError> {
    match value {
        Value::String(path) => DottedPath::parse(path),
        _ => Err(DirectiveError::InvalidKey {
            key,
            expected: "a dotted path string",
        }),
    }
}
