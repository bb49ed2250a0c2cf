//! Declarative resolution - replaces directives with live values

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::ast::{Directive, DirectiveError, ARGS_KEY, DEFAULT_SENTINEL};
use super::registry::{Args, ConstructionError, NameError, Namespace};
use super::value::Resolved;

/// Errors that abort a resolution. There is no partial result.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A dotted path did not name a usable member
    #[error("at {location}: {source}")]
    NameResolution {
        location: String,
        #[source]
        source: NameError,
    },

    /// A constructor rejected its arguments
    #[error("at {location}: cannot construct '{class}': {source}")]
    Construction {
        location: String,
        class: String,
        #[source]
        source: ConstructionError,
    },

    /// A directive mapping is structurally invalid
    #[error("at {location}: malformed directive: {source}")]
    Malformed {
        location: String,
        #[source]
        source: DirectiveError,
    },
}

impl ResolveError {
    /// JSON pointer of the node that failed
    pub fn location(&self) -> &str {
        match self {
            Self::NameResolution { location, .. }
            | Self::Construction { location, .. }
            | Self::Malformed { location, .. } => location,
        }
    }
}

/// Options controlling directive interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// String replaced by the placeholder handle
    pub sentinel: String,
    /// Reject mappings that set both `cls` and `val`
    pub strict: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            strict: false,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder sentinel string
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Enable or disable strict directive checking
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Position of the node being resolved, for error locations
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    path: Vec<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    pub fn leave(&mut self) {
        self.path.pop();
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// RFC 6901 pointer of the current node; `/` for the root
    pub fn pointer(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        self.path
            .iter()
            .map(|s| format!("/{}", s.replace('~', "~0").replace('/', "~1")))
            .collect()
    }
}

/// Resolves configuration values against a namespace
#[derive(Debug)]
pub struct Resolver<'n, H> {
    namespace: &'n Namespace<H>,
    options: ResolveOptions,
}

impl<'n, H: Clone> Resolver<'n, H> {
    pub fn new(namespace: &'n Namespace<H>) -> Self {
        Self::with_options(namespace, ResolveOptions::default())
    }

    pub fn with_options(namespace: &'n Namespace<H>, options: ResolveOptions) -> Self {
        Self { namespace, options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn namespace(&self) -> &'n Namespace<H> {
        self.namespace
    }

    /// Resolve `value`, substituting `placeholder` for every sentinel
    pub fn resolve(&self, value: &Value, placeholder: &H) -> Result<Resolved<H>, ResolveError> {
        let mut ctx = ResolutionContext::new();
        self.resolve_node(value, placeholder, &mut ctx)
    }

    fn resolve_node(
        &self,
        value: &Value,
        placeholder: &H,
        ctx: &mut ResolutionContext,
    ) -> Result<Resolved<H>, ResolveError> {
        let directive =
            Directive::parse(value, &self.options).map_err(|source| ResolveError::Malformed {
                location: ctx.pointer(),
                source,
            })?;

        match directive {
            Directive::Placeholder => Ok(Resolved::Placeholder(placeholder.clone())),
            Directive::Construct { path, args } => {
                let constructor =
                    self.namespace
                        .constructor(&path)
                        .map_err(|source| ResolveError::NameResolution {
                            location: ctx.pointer(),
                            source,
                        })?;

                ctx.enter(ARGS_KEY);
                let mut resolved = Vec::with_capacity(args.len());
                for (index, arg) in args.iter().enumerate() {
                    ctx.enter(index.to_string());
                    resolved.push(self.resolve_node(arg, placeholder, ctx)?);
                    ctx.leave();
                }
                ctx.leave();

                let instance =
                    constructor(Args::new(resolved)).map_err(|source| ResolveError::Construction {
                        location: ctx.pointer(),
                        class: path.to_string(),
                        source,
                    })?;
                debug!(class = %path, location = %ctx.pointer(), "constructed instance");
                Ok(instance)
            }
            Directive::PropertyRef { path } => {
                self.namespace
                    .property(&path)
                    .map_err(|source| ResolveError::NameResolution {
                        location: ctx.pointer(),
                        source,
                    })
            }
            Directive::Sequence(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    ctx.enter(index.to_string());
                    resolved.push(self.resolve_node(item, placeholder, ctx)?);
                    ctx.leave();
                }
                Ok(Resolved::Array(resolved))
            }
            Directive::Mapping(map) => {
                let mut resolved = Vec::with_capacity(map.len());
                for (key, item) in map {
                    ctx.enter(key.as_str());
                    resolved.push((key.clone(), self.resolve_node(item, placeholder, ctx)?));
                    ctx.leave();
                }
                Ok(Resolved::Object(resolved))
            }
            Directive::Literal(scalar) => Ok(Resolved::from_json(scalar)),
        }
    }
}

/// Resolve `value` against `namespace` with default options
pub fn resolve<H: Clone>(
    value: &Value,
    placeholder: &H,
    namespace: &Namespace<H>,
) -> Result<Resolved<H>, ResolveError> {
    Resolver::new(namespace).resolve(value, placeholder)
}
