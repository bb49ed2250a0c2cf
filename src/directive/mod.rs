//! Declarative directives and their resolution into live values
//!
//! Configuration data is plain JSON. A handful of shapes inside it are
//! directives that the resolver replaces with live values:
//!
//! ```text
//! {"cls": "LatLng", "arg": [38, -97]}   // construct LatLng(38, -97)
//! {"val": "MapTypeId.ROADMAP"}          // read a constant
//! "div"                                 // the caller-supplied placeholder
//! ```
//!
//! Names are dotted paths looked up in a [`Namespace`] of registered
//! constructors and constants. Everything else passes through unchanged.

pub mod ast;
mod registry;
mod resolver;
mod value;

pub use ast::{Directive, DirectiveError, DottedPath, ARGS_KEY, CLASS_KEY, DEFAULT_SENTINEL, VALUE_KEY};
pub use registry::{Args, ConstructionError, Constructor, Member, NameError, Namespace};
pub use resolver::{resolve, ResolveError, ResolveOptions, ResolutionContext, Resolver};
pub use value::Resolved;
