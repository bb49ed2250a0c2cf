//! Namespace registry of constructors and constants addressed by dotted path

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use super::ast::DottedPath;
use super::value::Resolved;
use crate::sdk::Instance;

/// Errors looking up or registering namespace members
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NameError {
    /// A path segment does not exist
    #[error("'{path}' is not defined (no member '{segment}')")]
    Undefined { path: String, segment: String },

    /// An intermediate segment is a constructor or constant
    #[error("'{path}' is not a namespace ('{segment}' has no members)")]
    NotANamespace { path: String, segment: String },

    /// `cls` named something that cannot be invoked
    #[error("'{path}' is not a constructor")]
    NotAConstructor { path: String },

    /// `val` named a constructor
    #[error("'{path}' is a constructor, not a value")]
    NotAValue { path: String },

    /// Registration collided with an existing member
    #[error("'{path}' is already registered")]
    Duplicate { path: String },

    /// Registration used an unusable name
    #[error("invalid member path '{path}'")]
    InvalidPath { path: String },
}

/// Errors raised by a constructor while building an instance
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    /// A required positional argument was absent or null
    #[error("missing argument {index} ({name})")]
    MissingArgument { index: usize, name: &'static str },

    /// A positional argument had the wrong shape
    #[error("argument {index} ({name}) must be {expected}")]
    InvalidArgument {
        index: usize,
        name: &'static str,
        expected: &'static str,
    },

    /// An option inside an options object had the wrong shape
    #[error("option '{option}' must be {expected}")]
    InvalidOption {
        option: String,
        expected: &'static str,
    },

    /// Any other rejection by the constructor
    #[error("{0}")]
    Rejected(String),
}

impl ConstructionError {
    pub fn invalid_option(option: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidOption {
            option: option.into(),
            expected,
        }
    }
}

/// A registered factory, invoked with resolved positional arguments
pub type Constructor<H> = Rc<dyn Fn(Args<H>) -> Result<Resolved<H>, ConstructionError>>;

/// One entry in a namespace
pub enum Member<H> {
    Constructor(Constructor<H>),
    Constant(Value),
    Namespace(Namespace<H>),
}

impl<H> fmt::Debug for Member<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Constructor(_) => f.write_str("Constructor"),
            Member::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Member::Namespace(ns) => ns.fmt(f),
        }
    }
}

/// Read-only tree of named constructors and constants
///
/// Built once at startup, then shared by every resolution.
pub struct Namespace<H> {
    members: BTreeMap<String, Member<H>>,
}

impl<H> Default for Namespace<H> {
    fn default() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }
}

impl<H> fmt::Debug for Namespace<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.members.iter()).finish()
    }
}

impl<H> Namespace<H> {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor, creating intermediate namespaces
    pub fn register_constructor<F>(&mut self, path: &str, constructor: F) -> Result<(), NameError>
    where
        F: Fn(Args<H>) -> Result<Resolved<H>, ConstructionError> + 'static,
    {
        self.insert(path, Member::Constructor(Rc::new(constructor)))
    }

    /// Register a constant, creating intermediate namespaces
    pub fn register_constant(&mut self, path: &str, value: impl Into<Value>) -> Result<(), NameError> {
        self.insert(path, Member::Constant(value.into()))
    }

    fn insert(&mut self, path: &str, member: Member<H>) -> Result<(), NameError> {
        let parsed = DottedPath::parse(path).map_err(|_| NameError::InvalidPath {
            path: path.to_string(),
        })?;
        let (name, parents) = match parsed.segments().split_last() {
            Some(split) => split,
            None => {
                return Err(NameError::InvalidPath {
                    path: path.to_string(),
                })
            }
        };

        let mut current = self;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = current
                .members
                .entry(segment.clone())
                .or_insert_with(|| Member::Namespace(Namespace::new()));
            current = match entry {
                Member::Namespace(ns) => ns,
                _ => {
                    return Err(NameError::NotANamespace {
                        path: parsed.prefix(depth + 1),
                        segment: segment.clone(),
                    })
                }
            };
        }

        if current.members.contains_key(name) {
            return Err(NameError::Duplicate {
                path: path.to_string(),
            });
        }
        current.members.insert(name.clone(), member);
        Ok(())
    }

    /// Walk `path` one segment at a time from this namespace
    pub fn lookup(&self, path: &DottedPath) -> Result<&Member<H>, NameError> {
        trace!(%path, "namespace lookup");
        let segments = path.segments();
        let mut current = self;
        for (depth, segment) in segments.iter().enumerate() {
            let member = current
                .members
                .get(segment)
                .ok_or_else(|| NameError::Undefined {
                    path: path.to_string(),
                    segment: segment.clone(),
                })?;
            if depth + 1 == segments.len() {
                return Ok(member);
            }
            current = match member {
                Member::Namespace(ns) => ns,
                _ => {
                    return Err(NameError::NotANamespace {
                        path: path.to_string(),
                        segment: segment.clone(),
                    })
                }
            };
        }
        // Only reachable for an empty path, which DottedPath rules out
        Err(NameError::InvalidPath {
            path: path.to_string(),
        })
    }

    /// Sub-namespace at `path`, usable as an alternate lookup root
    pub fn namespace(&self, path: &DottedPath) -> Result<&Namespace<H>, NameError> {
        match self.lookup(path)? {
            Member::Namespace(ns) => Ok(ns),
            _ => Err(NameError::NotANamespace {
                path: path.to_string(),
                segment: path.name().to_string(),
            }),
        }
    }

    /// Constructor at `path`
    pub fn constructor(&self, path: &DottedPath) -> Result<Constructor<H>, NameError> {
        match self.lookup(path)? {
            Member::Constructor(constructor) => Ok(Rc::clone(constructor)),
            _ => Err(NameError::NotAConstructor {
                path: path.to_string(),
            }),
        }
    }

    /// Value at `path`. A namespace reads as an object of its constants.
    pub fn property(&self, path: &DottedPath) -> Result<Resolved<H>, NameError> {
        match self.lookup(path)? {
            Member::Constant(value) => Ok(Resolved::from_json(value)),
            Member::Namespace(ns) => Ok(ns.constants()),
            Member::Constructor(_) => Err(NameError::NotAValue {
                path: path.to_string(),
            }),
        }
    }

    fn constants(&self) -> Resolved<H> {
        Resolved::Object(
            self.members
                .iter()
                .filter_map(|(name, member)| match member {
                    Member::Constant(value) => Some((name.clone(), Resolved::from_json(value))),
                    Member::Namespace(ns) => Some((name.clone(), ns.constants())),
                    Member::Constructor(_) => None,
                })
                .collect(),
        )
    }

    /// Whether `path` names any member
    pub fn contains(&self, path: &str) -> bool {
        DottedPath::parse(path)
            .map(|p| self.lookup(&p).is_ok())
            .unwrap_or(false)
    }

    /// Names directly under this namespace
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

/// Resolved positional arguments handed to a constructor
///
/// Absent and `null` arguments are treated alike. Extra trailing arguments
/// are ignored.
#[derive(Debug, Clone)]
pub struct Args<H> {
    values: Vec<Resolved<H>>,
}

impl<H> Args<H> {
    pub fn new(values: Vec<Resolved<H>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `index`, `None` when absent or null
    pub fn get(&self, index: usize) -> Option<&Resolved<H>> {
        self.values.get(index).filter(|v| !v.is_null())
    }

    pub fn into_vec(self) -> Vec<Resolved<H>> {
        self.values
    }

    fn require(&self, index: usize, name: &'static str) -> Result<&Resolved<H>, ConstructionError> {
        self.get(index)
            .ok_or(ConstructionError::MissingArgument { index, name })
    }

    pub fn f64(&self, index: usize, name: &'static str) -> Result<f64, ConstructionError> {
        self.require(index, name)?
            .as_f64()
            .ok_or(ConstructionError::InvalidArgument {
                index,
                name,
                expected: "a number",
            })
    }

    pub fn opt_f64(&self, index: usize, name: &'static str) -> Result<Option<f64>, ConstructionError> {
        match self.get(index) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or(ConstructionError::InvalidArgument {
                index,
                name,
                expected: "a number",
            }),
        }
    }

    pub fn opt_bool(&self, index: usize, name: &'static str) -> Result<Option<bool>, ConstructionError> {
        match self.get(index) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or(ConstructionError::InvalidArgument {
                index,
                name,
                expected: "a boolean",
            }),
        }
    }

    pub fn string(&self, index: usize, name: &'static str) -> Result<String, ConstructionError> {
        self.require(index, name)?
            .as_str()
            .map(str::to_string)
            .ok_or(ConstructionError::InvalidArgument {
                index,
                name,
                expected: "a string",
            })
    }

    pub fn opt_string(&self, index: usize, name: &'static str) -> Result<Option<String>, ConstructionError> {
        match self.get(index) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or(ConstructionError::InvalidArgument {
                    index,
                    name,
                    expected: "a string",
                }),
        }
    }

    /// Options object at `index`
    pub fn opt_object(
        &self,
        index: usize,
        name: &'static str,
    ) -> Result<Option<&[(String, Resolved<H>)]>, ConstructionError> {
        match self.get(index) {
            None => Ok(None),
            Some(v) => v.as_object().map(Some).ok_or(ConstructionError::InvalidArgument {
                index,
                name,
                expected: "an options object",
            }),
        }
    }

    /// Instance at `index`, narrowed by `pick`
    pub fn opt_instance<T>(
        &self,
        index: usize,
        name: &'static str,
        expected: &'static str,
        pick: impl FnOnce(&Instance<H>) -> Option<T>,
    ) -> Result<Option<T>, ConstructionError> {
        match self.get(index) {
            None => Ok(None),
            Some(v) => v
                .as_instance()
                .and_then(pick)
                .map(Some)
                .ok_or(ConstructionError::InvalidArgument {
                    index,
                    name,
                    expected,
                }),
        }
    }
}

impl<H: Clone> Args<H> {
    /// Caller-supplied placeholder at `index`
    pub fn placeholder(&self, index: usize, name: &'static str) -> Result<H, ConstructionError> {
        self.require(index, name)?
            .as_placeholder()
            .cloned()
            .ok_or(ConstructionError::InvalidArgument {
                index,
                name,
                expected: "the placeholder element",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> DottedPath {
        DottedPath::parse(p).unwrap()
    }

    fn sample() -> Namespace<()> {
        let mut ns = Namespace::new();
        ns.register_constant("MAX_ZOOM", 21).unwrap();
        ns.register_constant("MapTypeId.ROADMAP", "roadmap").unwrap();
        ns.register_constant("MapTypeId.SATELLITE", "satellite").unwrap();
        ns.register_constructor("Pair", |args: Args<()>| {
            Ok(Resolved::Array(args.into_vec()))
        })
        .unwrap();
        ns
    }

    #[test]
    fn test_lookup_constant() {
        let ns = sample();
        assert_eq!(
            ns.property(&path("MAX_ZOOM")).unwrap(),
            Resolved::from_json(&json!(21))
        );
        assert_eq!(
            ns.property(&path("MapTypeId.ROADMAP")).unwrap(),
            Resolved::String("roadmap".to_string())
        );
    }

    #[test]
    fn test_lookup_from_alternate_root() {
        let ns = sample();
        let root = ns.namespace(&path("MapTypeId")).unwrap();
        assert_eq!(
            root.property(&path("SATELLITE")).unwrap(),
            Resolved::String("satellite".to_string())
        );
        assert!(root.property(&path("MAX_ZOOM")).is_err());
    }

    #[test]
    fn test_namespace_reads_as_object() {
        let ns = sample();
        let value = ns.property(&path("MapTypeId")).unwrap();
        assert_eq!(
            value.to_json(),
            json!({"ROADMAP": "roadmap", "SATELLITE": "satellite"})
        );
    }

    #[test]
    fn test_undefined_segment() {
        let ns = sample();
        let err = ns.property(&path("MapTypeId.STREET")).unwrap_err();
        assert_eq!(
            err,
            NameError::Undefined {
                path: "MapTypeId.STREET".to_string(),
                segment: "STREET".to_string()
            }
        );
    }

    #[test]
    fn test_walk_through_constant_fails() {
        let ns = sample();
        let err = ns.property(&path("MAX_ZOOM.value")).unwrap_err();
        assert!(matches!(err, NameError::NotANamespace { .. }));
    }

    #[test]
    fn test_constructor_kind_checks() {
        let ns = sample();
        assert!(ns.constructor(&path("Pair")).is_ok());
        assert!(matches!(
            ns.constructor(&path("MAX_ZOOM")),
            Err(NameError::NotAConstructor { .. })
        ));
        assert!(matches!(
            ns.property(&path("Pair")),
            Err(NameError::NotAValue { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut ns = sample();
        assert!(matches!(
            ns.register_constant("MapTypeId.ROADMAP", "x"),
            Err(NameError::Duplicate { .. })
        ));
        assert!(matches!(
            ns.register_constant("MAX_ZOOM.inner", 1),
            Err(NameError::NotANamespace { .. })
        ));
        assert!(matches!(
            ns.register_constant("bad..path", 1),
            Err(NameError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_contains_and_names() {
        let ns = sample();
        assert!(ns.contains("MapTypeId.ROADMAP"));
        assert!(!ns.contains("MapTypeId.NOPE"));
        assert_eq!(ns.names().collect::<Vec<_>>(), vec!["MAX_ZOOM", "MapTypeId", "Pair"]);
    }

    #[test]
    fn test_args_accessors() {
        let args: Args<()> = Args::new(vec![
            Resolved::from_json(&json!(1.5)),
            Resolved::Null,
            Resolved::from_json(&json!("x")),
        ]);
        assert_eq!(args.f64(0, "a").unwrap(), 1.5);
        assert_eq!(args.opt_f64(1, "b").unwrap(), None);
        assert_eq!(
            args.f64(1, "b").unwrap_err(),
            ConstructionError::MissingArgument { index: 1, name: "b" }
        );
        assert_eq!(args.string(2, "c").unwrap(), "x");
        assert!(matches!(
            args.f64(2, "c"),
            Err(ConstructionError::InvalidArgument { index: 2, .. })
        ));
        assert_eq!(args.opt_bool(5, "d").unwrap(), None);
    }
}
