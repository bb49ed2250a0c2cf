//! In-memory mapping object model
//!
//! This is the namespace configuration directives resolve against: map,
//! marker and geometry constructors plus the map-type and control constants.
//! [`namespace`] registers all of them under their unqualified names, so a
//! directive says `{"cls": "LatLng"}` and `{"val": "MapTypeId.ROADMAP"}`.

mod geometry;
mod map;
mod marker;

pub use geometry::{format_degrees, LatLng, LatLngBounds, Point, Size};
pub use map::{ListenerId, Map, Viewport, MAX_ZOOM, TILES_LOADED};
pub use marker::{Marker, MarkerImage};

use serde_json::{json, Value};

use crate::directive::{Args, NameError, Namespace, Resolved};

/// A live object produced by a registered constructor
#[derive(Debug, Clone)]
pub enum Instance<H> {
    LatLng(LatLng),
    LatLngBounds(LatLngBounds),
    Point(Point),
    Size(Size),
    MarkerImage(MarkerImage),
    Map(Map<H>),
    Marker(Marker<H>),
}

impl<H> Instance<H> {
    /// Name of the constructor that builds this kind of instance
    pub fn class_name(&self) -> &'static str {
        match self {
            Instance::LatLng(_) => "LatLng",
            Instance::LatLngBounds(_) => "LatLngBounds",
            Instance::Point(_) => "Point",
            Instance::Size(_) => "Size",
            Instance::MarkerImage(_) => "MarkerImage",
            Instance::Map(_) => "Map",
            Instance::Marker(_) => "Marker",
        }
    }

    pub fn as_lat_lng(&self) -> Option<LatLng> {
        match self {
            Instance::LatLng(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_bounds(&self) -> Option<LatLngBounds> {
        match self {
            Instance::LatLngBounds(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Instance::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            Instance::Size(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// JSON summary of the instance's observable state
    pub fn describe(&self) -> Value {
        match self {
            Instance::LatLng(p) => describe_lat_lng(Some(*p)),
            Instance::LatLngBounds(b) => describe_bounds(b),
            Instance::Point(p) => json!({"x": p.x, "y": p.y}),
            Instance::Size(s) => json!({"width": s.width, "height": s.height}),
            Instance::MarkerImage(image) => json!({
                "url": image.url,
                "size": image.size.as_ref().map(|s| json!({"width": s.width, "height": s.height})),
            }),
            Instance::Map(map) => json!({
                "center": describe_lat_lng(map.center()),
                "zoom": map.zoom(),
                "mapTypeId": map.map_type_id(),
                "bounds": map.bounds().map(|b| describe_bounds(&b)),
                "markers": map.marker_count(),
            }),
            Instance::Marker(marker) => json!({
                "position": describe_lat_lng(marker.position()),
                "title": marker.title(),
                "visible": marker.visible(),
                "attached": marker.map().is_some(),
            }),
        }
    }
}

/// `{"lat", "lng"}` or null
pub fn describe_lat_lng(point: Option<LatLng>) -> Value {
    match point {
        Some(p) => json!({"lat": p.lat(), "lng": p.lng()}),
        None => Value::Null,
    }
}

fn describe_bounds(bounds: &LatLngBounds) -> Value {
    match (bounds.south_west(), bounds.north_east()) {
        (Some(sw), Some(ne)) => json!({
            "sw": describe_lat_lng(Some(sw)),
            "ne": describe_lat_lng(Some(ne)),
        }),
        _ => Value::Null,
    }
}

impl<H> PartialEq for Instance<H> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Instance::LatLng(a), Instance::LatLng(b)) => a == b,
            (Instance::LatLngBounds(a), Instance::LatLngBounds(b)) => a == b,
            (Instance::Point(a), Instance::Point(b)) => a == b,
            (Instance::Size(a), Instance::Size(b)) => a == b,
            (Instance::MarkerImage(a), Instance::MarkerImage(b)) => a == b,
            (Instance::Map(a), Instance::Map(b)) => a.ptr_eq(b),
            (Instance::Marker(a), Instance::Marker(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Map type ids, by constant name
const MAP_TYPE_IDS: &[(&str, &str)] = &[
    ("HYBRID", "hybrid"),
    ("ROADMAP", "roadmap"),
    ("SATELLITE", "satellite"),
    ("TERRAIN", "terrain"),
];

const MAP_TYPE_CONTROL_STYLES: &[(&str, u32)] =
    &[("DEFAULT", 0), ("HORIZONTAL_BAR", 1), ("DROPDOWN_MENU", 2)];

const NAVIGATION_CONTROL_STYLES: &[(&str, u32)] =
    &[("DEFAULT", 0), ("SMALL", 1), ("ANDROID", 2), ("ZOOM_PAN", 3)];

const SCALE_CONTROL_STYLES: &[(&str, u32)] = &[("DEFAULT", 0)];

const CONTROL_POSITIONS: &[(&str, u32)] = &[
    ("TOP_LEFT", 1),
    ("TOP", 2),
    ("TOP_RIGHT", 3),
    ("LEFT", 4),
    ("RIGHT", 8),
    ("BOTTOM_LEFT", 10),
    ("BOTTOM", 11),
    ("BOTTOM_RIGHT", 12),
];

/// Build the namespace of every constructor and constant
pub fn namespace<H: Clone + 'static>() -> Result<Namespace<H>, NameError> {
    let mut ns = Namespace::new();

    ns.register_constructor("LatLng", |args: Args<H>| {
        let lat = args.f64(0, "lat")?;
        let lng = args.f64(1, "lng")?;
        let no_wrap = args.opt_bool(2, "noWrap")?.unwrap_or(false);
        Ok(Resolved::Instance(Instance::LatLng(LatLng::with_wrap(lat, lng, no_wrap))))
    })?;

    ns.register_constructor("LatLngBounds", |args: Args<H>| {
        let sw = args.opt_instance(0, "sw", "a LatLng", Instance::as_lat_lng)?;
        let ne = args.opt_instance(1, "ne", "a LatLng", Instance::as_lat_lng)?;
        Ok(Resolved::Instance(Instance::LatLngBounds(LatLngBounds::new(sw, ne))))
    })?;

    ns.register_constructor("Point", |args: Args<H>| {
        let point = Point::new(args.f64(0, "x")?, args.f64(1, "y")?);
        Ok(Resolved::Instance(Instance::Point(point)))
    })?;

    ns.register_constructor("Size", |args: Args<H>| {
        let mut size = Size::new(args.f64(0, "width")?, args.f64(1, "height")?);
        size.width_unit = args.opt_string(2, "widthUnit")?;
        size.height_unit = args.opt_string(3, "heightUnit")?;
        Ok(Resolved::Instance(Instance::Size(size)))
    })?;

    ns.register_constructor("MarkerImage", |args: Args<H>| {
        let mut image = MarkerImage::new(args.string(0, "url")?);
        image.size = args.opt_instance(1, "size", "a Size", Instance::as_size)?;
        image.origin = args.opt_instance(2, "origin", "a Point", Instance::as_point)?;
        image.anchor = args.opt_instance(3, "anchor", "a Point", Instance::as_point)?;
        image.scaled_size = args.opt_instance(4, "scaledSize", "a Size", Instance::as_size)?;
        Ok(Resolved::Instance(Instance::MarkerImage(image)))
    })?;

    ns.register_constructor("Map", |args: Args<H>| {
        let map = Map::new(args.placeholder(0, "mapDiv")?);
        if let Some(options) = args.opt_object(1, "opts")? {
            map.set_options(options)?;
        }
        Ok(Resolved::Instance(Instance::Map(map)))
    })?;

    ns.register_constructor("Marker", |args: Args<H>| {
        let marker = Marker::new();
        if let Some(options) = args.opt_object(0, "opts")? {
            marker.set_options(options)?;
        }
        Ok(Resolved::Instance(Instance::Marker(marker)))
    })?;

    for (name, id) in MAP_TYPE_IDS {
        ns.register_constant(&format!("MapTypeId.{name}"), *id)?;
    }
    for (group, constants) in [
        ("MapTypeControlStyle", MAP_TYPE_CONTROL_STYLES),
        ("NavigationControlStyle", NAVIGATION_CONTROL_STYLES),
        ("ScaleControlStyle", SCALE_CONTROL_STYLES),
        ("ControlPosition", CONTROL_POSITIONS),
    ] {
        for (name, value) in constants {
            ns.register_constant(&format!("{group}.{name}"), *value)?;
        }
    }
    ns.register_constant("MAX_ZOOM", MAX_ZOOM)?;

    Ok(ns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::resolve;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_namespace_registers_everything() {
        let ns: Namespace<()> = namespace().unwrap();
        for name in ["LatLng", "LatLngBounds", "Point", "Size", "MarkerImage", "Map", "Marker"] {
            assert!(ns.contains(name), "missing constructor {}", name);
        }
        assert!(ns.contains("MapTypeId.TERRAIN"));
        assert!(ns.contains("ControlPosition.TOP_RIGHT"));
        assert!(ns.contains("NavigationControlStyle.ZOOM_PAN"));
        assert!(ns.contains("MAX_ZOOM"));
    }

    #[test]
    fn test_bounds_from_corners() {
        let ns: Namespace<()> = namespace().unwrap();
        let config = serde_json::json!({"cls": "LatLngBounds", "arg": [
            {"cls": "LatLng", "arg": [18, -119]},
            {"cls": "LatLng", "arg": [53, -74]}
        ]});
        let bounds = resolve(&config, &(), &ns).unwrap().as_bounds().unwrap();
        assert!(bounds.contains(LatLng::new(38.0, -97.0)));
    }

    #[test]
    fn test_bounds_rejects_non_lat_lng() {
        let ns: Namespace<()> = namespace().unwrap();
        let config = serde_json::json!({"cls": "LatLngBounds", "arg": [{"cls": "Point", "arg": [1, 2]}]});
        assert!(resolve(&config, &(), &ns).is_err());
    }

    #[test]
    fn test_marker_image_with_sizes() {
        let ns: Namespace<()> = namespace().unwrap();
        let config = serde_json::json!({"cls": "MarkerImage", "arg": [
            "/pin.png",
            {"cls": "Size", "arg": [20, 32]},
            {"cls": "Point", "arg": [0, 0]},
            {"cls": "Point", "arg": [10, 32]}
        ]});
        let resolved = resolve(&config, &(), &ns).unwrap();
        match resolved.as_instance() {
            Some(Instance::MarkerImage(image)) => {
                assert_eq!(image.url, "/pin.png");
                assert_eq!(image.size, Some(Size::new(20.0, 32.0)));
                assert_eq!(image.anchor, Some(Point::new(10.0, 32.0)));
                assert_eq!(image.scaled_size, None);
            }
            other => panic!("expected MarkerImage, got {:?}", other),
        }
    }

    #[test]
    fn test_map_requires_placeholder() {
        let ns: Namespace<()> = namespace().unwrap();
        let config = serde_json::json!({"cls": "Map", "arg": ["canvas"]});
        assert!(resolve(&config, &(), &ns).is_err());
    }

    #[test]
    fn test_describe_map() {
        let ns: Namespace<()> = namespace().unwrap();
        let config = serde_json::json!({"cls": "Map", "arg": ["div", {
            "center": {"cls": "LatLng", "arg": [38, -97]},
            "zoom": 3,
            "mapTypeId": {"val": "MapTypeId.ROADMAP"}
        }]});
        let resolved = resolve(&config, &(), &ns).unwrap();
        assert_eq!(
            resolved.to_json(),
            serde_json::json!({
                "center": {"lat": 38.0, "lng": -97.0},
                "zoom": 3.0,
                "mapTypeId": "roadmap",
                "bounds": null,
                "markers": 0
            })
        );
    }
}
