//! Map containers: a live map, its markers and the load signal

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::discover::MarkupError;
use crate::config::HostConfig;
use crate::directive::{Namespace, ResolveError, ResolveOptions, Resolver};
use crate::sdk::{LatLngBounds, Map, Marker, Viewport, TILES_LOADED};

/// Key of the marker list in a map configuration
pub const MARKERS_KEY: &str = "mkr";

/// Notification sent after `new_map` completes
pub const NEW_MAP: &str = "newmap";

#[derive(Error, Debug)]
pub enum HostError {
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("configuration resolved to {found}, not a Map")]
    NotAMap { found: &'static str },

    #[error("marker {index} resolved to {found}, not a Marker")]
    NotAMarker { index: usize, found: &'static str },

    #[error("'{MARKERS_KEY}' must be an array of marker configurations")]
    InvalidMarkerList,

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Whether the live map has replaced the static placeholder image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No map yet
    #[default]
    Idle,
    /// Map created, static image still on top
    Loading,
    /// The map reported its tiles loaded
    TilesLoaded,
    /// The reveal delay ran out first
    TimedOut,
}

impl LoadState {
    /// The static image has been sent behind the live map
    pub fn is_revealed(self) -> bool {
        matches!(self, LoadState::TilesLoaded | LoadState::TimedOut)
    }
}

type NewMapCallback<H> = Box<dyn FnMut(&Map<H>)>;

/// A page element hosting one live map
///
/// `element` is the outer container and receives marker placeholders;
/// `canvas` is the inner element the map is drawn in.
pub struct MapContainer<'n, H> {
    id: String,
    element: H,
    canvas: H,
    resolver: Resolver<'n, H>,
    viewport: Viewport,
    reveal_delay: Duration,
    map: Option<Map<H>>,
    markers: Vec<Marker<H>>,
    load: Rc<Cell<LoadState>>,
    new_map_listeners: Vec<NewMapCallback<H>>,
}

impl<H> fmt::Debug for MapContainer<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapContainer")
            .field("id", &self.id)
            .field("map", &self.map)
            .field("markers", &self.markers.len())
            .field("load", &self.load.get())
            .finish()
    }
}

impl<'n, H: Clone + 'static> MapContainer<'n, H> {
    pub fn new(id: impl Into<String>, element: H, canvas: H, namespace: &'n Namespace<H>) -> Self {
        Self {
            id: id.into(),
            element,
            canvas,
            resolver: Resolver::new(namespace),
            viewport: Viewport::default(),
            reveal_delay: HostConfig::default().reveal_delay(),
            map: None,
            markers: Vec::new(),
            load: Rc::new(Cell::new(LoadState::Idle)),
            new_map_listeners: Vec::new(),
        }
    }

    /// Take resolver options, viewport and reveal delay from `config`
    pub fn with_config(mut self, config: &HostConfig) -> Self {
        self.resolver = Resolver::with_options(self.resolver.namespace(), config.resolve_options());
        self.viewport = config.viewport;
        self.reveal_delay = config.reveal_delay();
        self
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.resolver = Resolver::with_options(self.resolver.namespace(), options);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> &H {
        &self.element
    }

    pub fn canvas(&self) -> &H {
        &self.canvas
    }

    pub fn map(&self) -> Option<&Map<H>> {
        self.map.as_ref()
    }

    pub fn markers(&self) -> &[Marker<H>] {
        &self.markers
    }

    pub fn load_state(&self) -> LoadState {
        self.load.get()
    }

    /// Run `callback` after every successful `new_map`
    pub fn on_new_map(&mut self, callback: impl FnMut(&Map<H>) + 'static) {
        self.new_map_listeners.push(Box::new(callback));
    }

    /// Replace the map with one built from `config`
    ///
    /// Existing markers are removed first. Markers listed under `mkr` are
    /// added to the new map, and when the map has no center or no zoom it
    /// is fitted to them. On failure the container is left without a map.
    pub fn new_map(&mut self, config: &Value) -> Result<Map<H>, HostError> {
        self.remove_markers();
        self.map = None;
        self.load.set(LoadState::Idle);

        let resolved = self.resolver.resolve(config, &self.canvas)?;
        let map = resolved
            .as_map()
            .cloned()
            .ok_or(HostError::NotAMap {
                found: resolved.kind(),
            })?;
        // null and false under `mkr` mean no markers
        let markers = match config.get(MARKERS_KEY) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => None,
            Some(list) => Some(self.resolve_markers(list)?),
        };

        self.map = Some(map.clone());
        self.watch_tiles(&map);
        if let Some(markers) = markers {
            self.attach_markers(markers);
            let placed = map.center().is_some() && map.zoom().is_some_and(|z| z >= 0.0);
            if !placed {
                self.fit_markers();
            }
        }

        info!(container = %self.id, markers = self.markers.len(), "created map");
        self.trigger_new_map(&map);
        Ok(map)
    }

    /// Resolve each marker configuration and show it on the map
    ///
    /// Without a map the markers are kept but not attached.
    pub fn add_markers(&mut self, list: &Value) -> Result<(), HostError> {
        let added = self.resolve_markers(list)?;
        self.attach_markers(added);
        Ok(())
    }

    /// Every marker of `list`, or the first failure
    fn resolve_markers(&self, list: &Value) -> Result<Vec<Marker<H>>, HostError> {
        let configs = list.as_array().ok_or(HostError::InvalidMarkerList)?;
        let mut added = Vec::with_capacity(configs.len());
        for (index, config) in configs.iter().enumerate() {
            let resolved = self.resolver.resolve(config, &self.element)?;
            let marker = resolved
                .as_marker()
                .cloned()
                .ok_or(HostError::NotAMarker {
                    index,
                    found: resolved.kind(),
                })?;
            added.push(marker);
        }
        Ok(added)
    }

    fn attach_markers(&mut self, added: Vec<Marker<H>>) {
        for marker in &added {
            marker.set_map(self.map.as_ref());
        }
        debug!(container = %self.id, count = added.len(), "added markers");
        self.markers.extend(added);
    }

    /// Detach every marker and forget them
    pub fn remove_markers(&mut self) {
        for marker in self.markers.drain(..) {
            marker.set_map(None);
        }
    }

    /// Fit the map to the positions of its markers
    pub fn fit_markers(&self) {
        let Some(map) = &self.map else {
            return;
        };
        if self.markers.is_empty() {
            return;
        }
        let mut bounds = LatLngBounds::empty();
        for position in self.markers.iter().filter_map(Marker::position) {
            bounds.extend(position);
        }
        map.fit_bounds(&bounds, self.viewport);
    }

    /// Advance the reveal timer; `elapsed` counts from the last `new_map`
    pub fn tick(&self, elapsed: Duration) -> LoadState {
        if self.load.get() == LoadState::Loading && elapsed >= self.reveal_delay {
            self.load.set(LoadState::TimedOut);
        }
        self.load.get()
    }

    fn watch_tiles(&self, map: &Map<H>) {
        self.load.set(LoadState::Loading);
        let load = Rc::clone(&self.load);
        map.add_listener_once(TILES_LOADED, move || {
            if load.get() == LoadState::Loading {
                load.set(LoadState::TilesLoaded);
            }
        });
    }

    fn trigger_new_map(&mut self, map: &Map<H>) {
        for callback in &mut self.new_map_listeners {
            callback(map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{self, LatLng};
    use serde_json::json;
    use std::cell::RefCell;

    /// Stand-in for a page element
    #[derive(Debug, Clone, PartialEq)]
    enum Node {
        Outer,
        Canvas,
    }

    fn container(ns: &Namespace<Node>) -> MapContainer<'_, Node> {
        MapContainer::new("m", Node::Outer, Node::Canvas, ns)
    }

    fn marker(lat: f64, lng: f64) -> Value {
        json!({"cls": "Marker", "arg": [{"position": {"cls": "LatLng", "arg": [lat, lng]}}]})
    }

    #[test]
    fn test_new_map_uses_canvas() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let map = host
            .new_map(&json!({"cls": "Map", "arg": ["div", {"zoom": 4}]}))
            .unwrap();
        assert_eq!(map.div(), Node::Canvas);
        assert_eq!(host.load_state(), LoadState::Loading);
    }

    #[test]
    fn test_new_map_rejects_other_instances() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let err = host
            .new_map(&json!({"cls": "LatLng", "arg": [1, 2]}))
            .unwrap_err();
        assert!(matches!(err, HostError::NotAMap { found: "LatLng" }));
        assert!(host.map().is_none());
    }

    #[test]
    fn test_markers_attached_and_fitted() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let config = json!({
            "cls": "Map",
            "arg": ["div", {"mapTypeId": {"val": "MapTypeId.ROADMAP"}}],
            "mkr": [marker(18.0, -119.0), marker(53.0, -74.0)]
        });
        let map = host.new_map(&config).unwrap();
        assert_eq!(map.marker_count(), 2);
        assert_eq!(host.markers().len(), 2);
        assert_eq!(map.center(), Some(LatLng::new(35.5, -96.5)));
        assert_eq!(map.zoom(), Some(3.0));
    }

    #[test]
    fn test_placed_map_not_fitted() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let config = json!({
            "cls": "Map",
            "arg": ["div", {"center": {"cls": "LatLng", "arg": [0, 0]}, "zoom": 9}],
            "mkr": [marker(18.0, -119.0), marker(53.0, -74.0)]
        });
        let map = host.new_map(&config).unwrap();
        assert_eq!(map.center(), Some(LatLng::new(0.0, 0.0)));
        assert_eq!(map.zoom(), Some(9.0));
    }

    #[test]
    fn test_new_map_replaces_markers() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let first = host
            .new_map(&json!({"cls": "Map", "arg": ["div"], "mkr": [marker(1.0, 1.0)]}))
            .unwrap();
        let second = host.new_map(&json!({"cls": "Map", "arg": ["div"]})).unwrap();
        assert_eq!(first.marker_count(), 0);
        assert_eq!(second.marker_count(), 0);
        assert!(host.markers().is_empty());
    }

    #[test]
    fn test_markers_receive_outer_element() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        host.new_map(&json!({"cls": "Map", "arg": ["div"]})).unwrap();
        let config = json!([{"cls": "Marker", "arg": [{"title": "div"}]}]);
        // "div" anywhere in a marker is the outer element, so a title cannot be the sentinel
        let err = host.add_markers(&config).unwrap_err();
        assert!(matches!(err, HostError::Resolve(_)));
    }

    #[test]
    fn test_add_markers_without_map() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        host.add_markers(&json!([marker(1.0, 2.0)])).unwrap();
        assert_eq!(host.markers().len(), 1);
        assert!(host.markers()[0].map().is_none());
    }

    #[test]
    fn test_add_markers_rejects_non_markers() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let err = host
            .add_markers(&json!([marker(1.0, 2.0), {"cls": "Point", "arg": [1, 2]}]))
            .unwrap_err();
        assert!(matches!(err, HostError::NotAMarker { index: 1, found: "Point" }));
        assert!(host.markers().is_empty());
        let err = host.add_markers(&json!({"cls": "Marker"})).unwrap_err();
        assert!(matches!(err, HostError::InvalidMarkerList));
    }

    #[test]
    fn test_remove_markers_detaches() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let map = host
            .new_map(&json!({"cls": "Map", "arg": ["div"], "mkr": [marker(1.0, 1.0), marker(2.0, 2.0)]}))
            .unwrap();
        let markers = host.markers().to_vec();
        host.remove_markers();
        assert_eq!(map.marker_count(), 0);
        assert!(markers.iter().all(|m| m.map().is_none()));
    }

    #[test]
    fn test_fit_markers_ignores_unplaced_markers() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        host.new_map(&json!({"cls": "Map", "arg": ["div", {"zoom": 2}]})).unwrap();
        host.add_markers(&json!([{"cls": "Marker"}])).unwrap();
        host.fit_markers();
        let map = host.map().unwrap();
        assert_eq!(map.zoom(), Some(2.0));
        assert!(map.bounds().is_none());
    }

    #[test]
    fn test_tiles_loaded_reveals_once() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let map = host.new_map(&json!({"cls": "Map", "arg": ["div"]})).unwrap();
        assert_eq!(map.trigger(TILES_LOADED), 1);
        assert_eq!(host.load_state(), LoadState::TilesLoaded);
        assert_eq!(map.trigger(TILES_LOADED), 0);
        assert_eq!(host.tick(Duration::from_secs(10)), LoadState::TilesLoaded);
    }

    #[test]
    fn test_timeout_reveals() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns).with_config(&HostConfig::default());
        let map = host.new_map(&json!({"cls": "Map", "arg": ["div"]})).unwrap();
        assert_eq!(host.tick(Duration::from_millis(1999)), LoadState::Loading);
        assert_eq!(host.tick(Duration::from_millis(2000)), LoadState::TimedOut);
        assert!(host.load_state().is_revealed());
        // A late tilesloaded does not change the outcome
        map.trigger(TILES_LOADED);
        assert_eq!(host.load_state(), LoadState::TimedOut);
    }

    #[test]
    fn test_new_map_notifies() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        host.on_new_map(move |map| log.borrow_mut().push(map.zoom()));
        host.new_map(&json!({"cls": "Map", "arg": ["div", {"zoom": 5}]})).unwrap();
        host.new_map(&json!({"cls": "Map", "arg": ["div", {"zoom": 6}]})).unwrap();
        assert_eq!(*seen.borrow(), vec![Some(5.0), Some(6.0)]);
    }

    #[test]
    fn test_failed_new_map_does_not_notify() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        let calls = Rc::new(Cell::new(0));
        let count = Rc::clone(&calls);
        host.on_new_map(move |_| count.set(count.get() + 1));
        assert!(host.new_map(&json!({"cls": "Nope"})).is_err());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_falsy_marker_list_is_absent() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        for mkr in [json!(null), json!(false)] {
            let map = host
                .new_map(&json!({"cls": "Map", "arg": ["div", {"zoom": 2}], "mkr": mkr}))
                .unwrap();
            assert_eq!(map.zoom(), Some(2.0));
            assert!(host.markers().is_empty());
        }
        let err = host
            .new_map(&json!({"cls": "Map", "arg": ["div"], "mkr": 3}))
            .unwrap_err();
        assert!(matches!(err, HostError::InvalidMarkerList));
    }

    #[test]
    fn test_failing_marker_leaves_no_map() {
        let ns = sdk::namespace().unwrap();
        let mut host = container(&ns);
        host.new_map(&json!({"cls": "Map", "arg": ["div"], "mkr": [marker(1.0, 1.0)]}))
            .unwrap();
        let err = host
            .new_map(&json!({
                "cls": "Map",
                "arg": ["div"],
                "mkr": [marker(2.0, 2.0), {"cls": "Point", "arg": [1, 2]}]
            }))
            .unwrap_err();
        assert!(matches!(err, HostError::NotAMarker { index: 1, .. }));
        assert!(host.map().is_none());
        assert!(host.markers().is_empty());
        assert_eq!(host.load_state(), LoadState::Idle);
    }
}
