//! gmapi - declarative map configuration resolved into live map objects
//!
//! A map is described as plain JSON. Mappings with a `cls` key construct an
//! object, mappings with a `val` key read a constant, and the string `"div"`
//! stands for the element the map is drawn in. The resolver turns such a
//! description into live [`sdk`] objects.
//!
//! # Example
//!
//! ```rust
//! use gmapi::{resolve_str, sdk};
//!
//! let ns = sdk::namespace().unwrap();
//! let map = resolve_str(
//!     r#"{"cls": "Map", "arg": ["div", {"zoom": 4, "mapTypeId": {"val": "MapTypeId.TERRAIN"}}]}"#,
//!     &"canvas",
//!     &ns,
//! )
//! .unwrap();
//! let map = map.as_map().unwrap();
//! assert_eq!(map.div(), "canvas");
//! assert_eq!(map.map_type_id().as_deref(), Some("terrain"));
//! ```

pub mod builder;
pub mod config;
pub mod directive;
pub mod error;
pub mod page;
pub mod sdk;
pub mod widget;

pub use builder::{static_map_url, MapBuilder, MarkerBuilder, ToConfig};
pub use config::{ConfigError, HostConfig};
pub use directive::{resolve, Namespace, ResolveError, ResolveOptions, Resolved, Resolver};
pub use error::Error;
pub use page::{init_page, MapContainer};
pub use widget::{render_widget, Widget};

/// Parse `json` and resolve it with default options
pub fn resolve_str<H: Clone>(
    json: &str,
    placeholder: &H,
    namespace: &Namespace<H>,
) -> Result<Resolved<H>, Error> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(resolve(&value, placeholder, namespace)?)
}

/// Parse `json` and resolve it with the resolver options of `config`
pub fn resolve_str_with_config<H: Clone>(
    json: &str,
    placeholder: &H,
    namespace: &Namespace<H>,
    config: &HostConfig,
) -> Result<Resolved<H>, Error> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let resolver = Resolver::with_options(namespace, config.resolve_options());
    Ok(resolver.resolve(&value, placeholder)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_str() {
        let ns = sdk::namespace().unwrap();
        let value = resolve_str(r#"{"val": "MAX_ZOOM"}"#, &(), &ns).unwrap();
        assert_eq!(value.as_f64(), Some(21.0));
    }

    #[test]
    fn test_resolve_str_bad_json() {
        let ns = sdk::namespace().unwrap();
        let err = resolve_str("{", &(), &ns).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_resolve_str_with_strict_config() {
        let ns = sdk::namespace().unwrap();
        let json = r#"{"cls": "Point", "val": "MAX_ZOOM", "arg": [1, 2]}"#;
        assert!(resolve_str(json, &(), &ns).is_ok());
        let strict = HostConfig::default().with_strict_directives(true);
        let err = resolve_str_with_config(json, &(), &ns, &strict).unwrap_err();
        assert!(matches!(err, Error::Resolve(ResolveError::Malformed { .. })));
    }
}
