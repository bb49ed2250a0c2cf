//! Typed builders for map configurations
//!
//! Server-side code describes a map with these types and serializes it with
//! [`ToConfig::to_config`]. The output is exactly the directive JSON the
//! resolver consumes:
//!
//! ```
//! use gmapi::builder::{LatLngSpec, MapBuilder, MapConstant, ToConfig};
//!
//! let map = MapBuilder::new()
//!     .with_center(LatLngSpec::new(38.0, -97.0))
//!     .with_zoom(3)
//!     .with_map_type_id(MapConstant::ROADMAP);
//! let config = map.to_config();
//! assert_eq!(config["cls"], "Map");
//! assert_eq!(config["arg"][1]["mapTypeId"]["val"], "MapTypeId.ROADMAP");
//! ```
//!
//! Every type also renders the parameter form used by static map image
//! URLs through [`std::fmt::Display`].

use std::fmt;

use serde_json::{json, Map as JsonMap, Number, Value};
use url::form_urlencoded;

use crate::directive::{ARGS_KEY, CLASS_KEY, DEFAULT_SENTINEL, VALUE_KEY};
use crate::page::MARKERS_KEY;
use crate::sdk::{format_degrees, LatLng, Map, Marker, MAX_ZOOM};

/// Decimals kept for latitudes and longitudes
pub const DEGREE_PRECISION: usize = 6;

/// Conversion into declarative configuration JSON
pub trait ToConfig {
    fn to_config(&self) -> Value;
}

/// `{"cls": class, "arg": args}` with trailing nulls dropped
fn construct(class: &str, mut args: Vec<Value>) -> Value {
    while args.last().is_some_and(Value::is_null) {
        args.pop();
    }
    let mut object = JsonMap::new();
    object.insert(CLASS_KEY.to_string(), Value::from(class));
    object.insert(ARGS_KEY.to_string(), Value::Array(args));
    Value::Object(object)
}

/// A degree value with at most six decimals; whole values become integers
pub fn degree_value(value: f64) -> Value {
    let scale = 10f64.powi(DEGREE_PRECISION as i32);
    let rounded = (value * scale).round() / scale;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        Value::from(rounded as i64)
    } else {
        Number::from_f64(rounded).map_or(Value::Null, Value::Number)
    }
}

fn to_config_or_null<T: ToConfig>(value: Option<&T>) -> Value {
    value.map_or(Value::Null, ToConfig::to_config)
}

/// A `LatLng` constructor call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngSpec {
    pub lat: f64,
    pub lng: f64,
    pub no_wrap: Option<bool>,
}

impl LatLngSpec {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            no_wrap: None,
        }
    }

    pub fn with_no_wrap(mut self, no_wrap: bool) -> Self {
        self.no_wrap = Some(no_wrap);
        self
    }
}

impl From<LatLng> for LatLngSpec {
    fn from(point: LatLng) -> Self {
        Self::new(point.lat(), point.lng())
    }
}

impl ToConfig for LatLngSpec {
    fn to_config(&self) -> Value {
        let no_wrap = self.no_wrap.map_or(Value::Null, Value::Bool);
        construct(
            "LatLng",
            vec![degree_value(self.lat), degree_value(self.lng), no_wrap],
        )
    }
}

impl fmt::Display for LatLngSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            format_degrees(self.lat, DEGREE_PRECISION),
            format_degrees(self.lng, DEGREE_PRECISION)
        )
    }
}

/// A `LatLngBounds` constructor call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLngBoundsSpec {
    pub sw: Option<LatLngSpec>,
    pub ne: Option<LatLngSpec>,
}

impl LatLngBoundsSpec {
    pub fn new(sw: LatLngSpec, ne: LatLngSpec) -> Self {
        Self {
            sw: Some(sw),
            ne: Some(ne),
        }
    }
}

impl ToConfig for LatLngBoundsSpec {
    fn to_config(&self) -> Value {
        construct(
            "LatLngBounds",
            vec![
                to_config_or_null(self.sw.as_ref()),
                to_config_or_null(self.ne.as_ref()),
            ],
        )
    }
}

impl fmt::Display for LatLngBoundsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.sw, self.ne) {
            (Some(sw), Some(ne)) => write!(f, "{},{}", sw, ne),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSpec {
    pub x: f64,
    pub y: f64,
}

impl PointSpec {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl ToConfig for PointSpec {
    fn to_config(&self) -> Value {
        construct("Point", vec![json!(self.x), json!(self.y)])
    }
}

impl fmt::Display for PointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A `Size` in whole pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeSpec {
    pub width: u32,
    pub height: u32,
    pub width_unit: Option<String>,
    pub height_unit: Option<String>,
}

impl SizeSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            width_unit: None,
            height_unit: None,
        }
    }

    pub fn with_units(mut self, width_unit: impl Into<String>, height_unit: impl Into<String>) -> Self {
        self.width_unit = Some(width_unit.into());
        self.height_unit = Some(height_unit.into());
        self
    }
}

impl ToConfig for SizeSpec {
    fn to_config(&self) -> Value {
        construct(
            "Size",
            vec![
                json!(self.width),
                json!(self.height),
                json!(self.width_unit),
                json!(self.height_unit),
            ],
        )
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerImageSpec {
    pub url: String,
    pub size: Option<SizeSpec>,
    pub origin: Option<PointSpec>,
    pub anchor: Option<PointSpec>,
    pub scaled_size: Option<SizeSpec>,
}

impl MarkerImageSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size: None,
            origin: None,
            anchor: None,
            scaled_size: None,
        }
    }

    pub fn with_size(mut self, size: SizeSpec) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_origin(mut self, origin: PointSpec) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_anchor(mut self, anchor: PointSpec) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_scaled_size(mut self, size: SizeSpec) -> Self {
        self.scaled_size = Some(size);
        self
    }
}

impl ToConfig for MarkerImageSpec {
    fn to_config(&self) -> Value {
        construct(
            "MarkerImage",
            vec![
                Value::from(self.url.as_str()),
                to_config_or_null(self.size.as_ref()),
                to_config_or_null(self.origin.as_ref()),
                to_config_or_null(self.anchor.as_ref()),
                to_config_or_null(self.scaled_size.as_ref()),
            ],
        )
    }
}

impl fmt::Display for MarkerImageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A reference to a namespace constant, such as `MapTypeId.ROADMAP`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConstant {
    pub group: &'static str,
    pub name: &'static str,
}

impl MapConstant {
    pub const HYBRID: Self = Self::new("MapTypeId", "HYBRID");
    pub const ROADMAP: Self = Self::new("MapTypeId", "ROADMAP");
    pub const SATELLITE: Self = Self::new("MapTypeId", "SATELLITE");
    pub const TERRAIN: Self = Self::new("MapTypeId", "TERRAIN");

    pub const fn new(group: &'static str, name: &'static str) -> Self {
        Self { group, name }
    }

    /// Map type constant for a lower-case map type id
    pub fn map_type(id: &str) -> Option<Self> {
        [Self::HYBRID, Self::ROADMAP, Self::SATELLITE, Self::TERRAIN]
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(id))
    }

    /// Dotted path of the constant
    pub fn path(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }
}

impl ToConfig for MapConstant {
    fn to_config(&self) -> Value {
        let mut object = JsonMap::new();
        object.insert(VALUE_KEY.to_string(), Value::from(self.path()));
        Value::Object(object)
    }
}

impl fmt::Display for MapConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name.to_ascii_lowercase())
    }
}

/// A marker icon: a plain image URL or a `MarkerImage`
#[derive(Debug, Clone, PartialEq)]
pub enum Icon {
    Url(String),
    Image(MarkerImageSpec),
}

impl ToConfig for Icon {
    fn to_config(&self) -> Value {
        match self {
            Icon::Url(url) => Value::from(url.as_str()),
            Icon::Image(image) => image.to_config(),
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Icon::Url(url) => f.write_str(url),
            Icon::Image(image) => fmt::Display::fmt(image, f),
        }
    }
}

/// A `Marker` constructor call
///
/// `size`, `color` and `label` only style the static image; the live marker
/// keeps them as plain options.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerBuilder {
    pub position: Option<LatLngSpec>,
    pub title: Option<String>,
    pub icon: Option<Icon>,
    pub shadow: Option<bool>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub label: Option<String>,
    pub extra: JsonMap<String, Value>,
}

impl MarkerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: LatLngSpec) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Any other marker option, such as `draggable` or `zIndex`
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Builder reproducing a live marker's position, title and URL icon
    pub fn from_marker<H>(marker: &Marker<H>) -> Self
    where
        H: Clone,
    {
        let icon = marker
            .icon()
            .and_then(|icon| icon.as_str().map(|url| Icon::Url(url.to_string())));
        Self {
            position: marker.position().map(LatLngSpec::from),
            title: marker.title(),
            icon,
            ..Self::default()
        }
    }

    fn options(&self) -> JsonMap<String, Value> {
        let mut opts = JsonMap::new();
        if let Some(position) = &self.position {
            opts.insert("position".to_string(), position.to_config());
        }
        if let Some(title) = &self.title {
            opts.insert("title".to_string(), Value::from(title.as_str()));
        }
        if let Some(icon) = &self.icon {
            opts.insert("icon".to_string(), icon.to_config());
        }
        if let Some(shadow) = self.shadow {
            opts.insert("shadow".to_string(), Value::Bool(shadow));
        }
        for (key, value) in [("size", &self.size), ("color", &self.color), ("label", &self.label)] {
            if let Some(value) = value {
                opts.insert(key.to_string(), Value::from(value.as_str()));
            }
        }
        for (key, value) in &self.extra {
            opts.insert(key.clone(), value.clone());
        }
        opts
    }
}

impl ToConfig for MarkerBuilder {
    fn to_config(&self) -> Value {
        let opts = self.options();
        let args = if opts.is_empty() {
            Vec::new()
        } else {
            vec![Value::Object(opts)]
        };
        construct("Marker", args)
    }
}

/// Static map marker descriptor: style parts then the position, `|`-separated
impl fmt::Display for MarkerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for (key, value) in [("size", &self.size), ("color", &self.color), ("label", &self.label)] {
            if let Some(value) = value {
                parts.push(format!("{}:{}", key, value));
            }
        }
        if let Some(icon) = &self.icon {
            parts.push(format!("icon:{}", icon));
        }
        if let Some(shadow) = self.shadow {
            parts.push(format!("shadow:{}", shadow));
        }
        if let Some(position) = &self.position {
            parts.push(position.to_string());
        }
        f.write_str(&parts.join("|"))
    }
}

/// A `Map` constructor call together with its markers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapBuilder {
    pub center: Option<LatLngSpec>,
    pub zoom: Option<u32>,
    pub map_type_id: Option<MapConstant>,
    pub size: Option<SizeSpec>,
    pub format: Option<String>,
    pub language: Option<String>,
    pub mobile: Option<bool>,
    pub sensor: Option<bool>,
    pub visible: Vec<LatLngSpec>,
    pub extra: JsonMap<String, Value>,
    pub markers: Vec<MarkerBuilder>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center(mut self, center: LatLngSpec) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_zoom(mut self, zoom: u32) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_map_type_id(mut self, map_type_id: MapConstant) -> Self {
        self.map_type_id = Some(map_type_id);
        self
    }

    /// Static image size; the live map ignores it
    pub fn with_size(mut self, size: SizeSpec) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_mobile(mut self, mobile: bool) -> Self {
        self.mobile = Some(mobile);
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// Locations the static image must show
    pub fn with_visible(mut self, visible: Vec<LatLngSpec>) -> Self {
        self.visible = visible;
        self
    }

    /// Any other map option, such as `disableDefaultUI`
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_marker(mut self, marker: MarkerBuilder) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn add_marker(&mut self, marker: MarkerBuilder) {
        self.markers.push(marker);
    }

    /// Builder reproducing the view and markers of a live map, for rendering
    /// its static preview
    pub fn from_map<H>(map: &Map<H>) -> Self
    where
        H: Clone,
    {
        let zoom = map
            .zoom()
            .filter(|z| z.is_finite())
            .map(|z| z.round().clamp(0.0, f64::from(MAX_ZOOM)) as u32);
        Self {
            center: map.center().map(LatLngSpec::from),
            zoom,
            map_type_id: map.map_type_id().as_deref().and_then(MapConstant::map_type),
            markers: map.markers().iter().map(MarkerBuilder::from_marker).collect(),
            ..Self::default()
        }
    }

    fn options(&self) -> JsonMap<String, Value> {
        let mut opts = JsonMap::new();
        if let Some(center) = &self.center {
            opts.insert("center".to_string(), center.to_config());
        }
        if let Some(zoom) = self.zoom {
            opts.insert("zoom".to_string(), Value::from(zoom));
        }
        if let Some(map_type_id) = &self.map_type_id {
            opts.insert("mapTypeId".to_string(), map_type_id.to_config());
        }
        if let Some(size) = &self.size {
            opts.insert("size".to_string(), size.to_config());
        }
        for (key, value) in [("format", &self.format), ("language", &self.language)] {
            if let Some(value) = value {
                opts.insert(key.to_string(), Value::from(value.as_str()));
            }
        }
        for (key, value) in [("mobile", self.mobile), ("sensor", self.sensor)] {
            if let Some(value) = value {
                opts.insert(key.to_string(), Value::Bool(value));
            }
        }
        if !self.visible.is_empty() {
            let visible = self.visible.iter().map(ToConfig::to_config).collect();
            opts.insert("visible".to_string(), Value::Array(visible));
        }
        for (key, value) in &self.extra {
            opts.insert(key.clone(), value.clone());
        }
        opts
    }
}

impl MapBuilder {
    /// Configuration naming the map element with `sentinel`
    pub fn to_config_with_sentinel(&self, sentinel: &str) -> Value {
        let mut args = vec![Value::from(sentinel)];
        let opts = self.options();
        if !opts.is_empty() {
            args.push(Value::Object(opts));
        }
        let mut config = construct("Map", args);
        if !self.markers.is_empty() {
            if let Value::Object(object) = &mut config {
                let markers = self.markers.iter().map(ToConfig::to_config).collect();
                object.insert(MARKERS_KEY.to_string(), Value::Array(markers));
            }
        }
        config
    }
}

impl ToConfig for MapBuilder {
    fn to_config(&self) -> Value {
        self.to_config_with_sentinel(DEFAULT_SENTINEL)
    }
}

/// Static image URL for `map`
///
/// Parameters are form-encoded except for `|`, `,` and `:`, which the static
/// map service uses as delimiters. Without a size the caller appends
/// `&size=WxH` itself.
pub fn static_map_url(map: &MapBuilder, base: &str) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(center) = &map.center {
        params.push(("center", center.to_string()));
    }
    if let Some(zoom) = map.zoom {
        params.push(("zoom", zoom.to_string()));
    }
    if let Some(size) = &map.size {
        params.push(("size", size.to_string()));
    }
    if let Some(format) = &map.format {
        params.push(("format", format.clone()));
    }
    if let Some(language) = &map.language {
        params.push(("language", language.clone()));
    }
    if let Some(map_type_id) = &map.map_type_id {
        params.push(("maptype", map_type_id.to_string()));
    }
    if let Some(mobile) = map.mobile {
        params.push(("mobile", mobile.to_string()));
    }
    if !map.visible.is_empty() {
        let visible: Vec<String> = map.visible.iter().map(ToString::to_string).collect();
        params.push(("visible", visible.join("|")));
    }
    for marker in &map.markers {
        params.push(("markers", marker.to_string()));
    }
    params.push(("sensor", map.sensor.unwrap_or(false).to_string()));

    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect();
    format!("{}?{}", base, query.join("&"))
}

/// `application/x-www-form-urlencoded` with the static map delimiters kept
fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace("%7C", "|")
        .replace("%2C", ",")
        .replace("%3A", ":")
}
