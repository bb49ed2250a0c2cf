//! The live map object and its event listeners

use std::cell::RefCell;
use std::f64::consts::{LN_2, PI};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Deserialize;

use super::geometry::{LatLng, LatLngBounds};
use super::marker::{Marker, MarkerState};
use crate::directive::{ConstructionError, Resolved};

/// Highest zoom level
pub const MAX_ZOOM: u32 = 21;

/// Width and height of a world tile at zoom 0, in pixels
const TILE_SIZE: f64 = 256.0;

/// Event fired once the map has finished loading its tiles
pub const TILES_LOADED: &str = "tilesloaded";

/// Pixel size of the area a map is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 500,
            height: 400,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Handle returned by listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Callback = Rc<RefCell<dyn FnMut()>>;

struct Listener {
    id: ListenerId,
    event: String,
    once: bool,
    callback: Callback,
}

struct MapState<H> {
    div: H,
    center: Option<LatLng>,
    zoom: Option<f64>,
    map_type_id: Option<String>,
    bounds: Option<LatLngBounds>,
    options: Vec<(String, Resolved<H>)>,
    markers: Vec<Weak<RefCell<MarkerState<H>>>>,
    listeners: Vec<Listener>,
    next_listener: u64,
}

/// A live map bound to a display element
///
/// Cloning yields another handle to the same map.
pub struct Map<H> {
    inner: Rc<RefCell<MapState<H>>>,
}

impl<H> Clone for Map<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H> fmt::Debug for Map<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Map")
            .field("center", &state.center)
            .field("zoom", &state.zoom)
            .field("map_type_id", &state.map_type_id)
            .field("markers", &state.markers.len())
            .finish()
    }
}

impl<H> Map<H> {
    /// Create a map displayed in `div`
    pub fn new(div: H) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MapState {
                div,
                center: None,
                zoom: None,
                map_type_id: None,
                bounds: None,
                options: Vec::new(),
                markers: Vec::new(),
                listeners: Vec::new(),
                next_listener: 0,
            })),
        }
    }

    /// Apply an options object. `center`, `zoom` and `mapTypeId` are typed;
    /// anything else is kept as given.
    pub fn set_options(&self, options: &[(String, Resolved<H>)]) -> Result<(), ConstructionError>
    where
        H: Clone,
    {
        for (key, value) in options {
            match key.as_str() {
                "center" => match value {
                    Resolved::Null => self.inner.borrow_mut().center = None,
                    v => {
                        let center = v
                            .as_lat_lng()
                            .ok_or_else(|| ConstructionError::invalid_option(key, "a LatLng"))?;
                        self.set_center(center);
                    }
                },
                "zoom" => match value {
                    Resolved::Null => self.inner.borrow_mut().zoom = None,
                    v => {
                        let zoom = v
                            .as_f64()
                            .ok_or_else(|| ConstructionError::invalid_option(key, "a number"))?;
                        self.set_zoom(zoom);
                    }
                },
                "mapTypeId" => {
                    let id = value
                        .as_str()
                        .ok_or_else(|| ConstructionError::invalid_option(key, "a map type id"))?;
                    self.set_map_type_id(id);
                }
                _ => {
                    let mut state = self.inner.borrow_mut();
                    match state.options.iter().position(|(k, _)| k == key) {
                        Some(index) => state.options[index].1 = value.clone(),
                        None => state.options.push((key.clone(), value.clone())),
                    }
                }
            }
        }
        Ok(())
    }

    pub fn center(&self) -> Option<LatLng> {
        self.inner.borrow().center
    }

    pub fn set_center(&self, center: LatLng) {
        self.inner.borrow_mut().center = Some(center);
    }

    pub fn zoom(&self) -> Option<f64> {
        self.inner.borrow().zoom
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.inner.borrow_mut().zoom = Some(zoom);
    }

    pub fn map_type_id(&self) -> Option<String> {
        self.inner.borrow().map_type_id.clone()
    }

    pub fn set_map_type_id(&self, id: impl Into<String>) {
        self.inner.borrow_mut().map_type_id = Some(id.into());
    }

    /// An option without a typed accessor
    pub fn option(&self, key: &str) -> Option<Resolved<H>>
    where
        H: Clone,
    {
        self.inner
            .borrow()
            .options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn div(&self) -> H
    where
        H: Clone,
    {
        self.inner.borrow().div.clone()
    }

    /// Bounds of the last `fit_bounds`, if any
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.inner.borrow().bounds
    }

    /// Center on `bounds` at the highest zoom that shows all of it in
    /// `viewport`. Empty bounds leave the map unchanged.
    pub fn fit_bounds(&self, bounds: &LatLngBounds, viewport: Viewport) {
        if bounds.is_empty() {
            return;
        }
        let (Some(sw), Some(ne), Some(center)) =
            (bounds.south_west(), bounds.north_east(), bounds.center())
        else {
            return;
        };
        let zoom = zoom_to_fit(sw, ne, viewport);
        let mut state = self.inner.borrow_mut();
        state.center = Some(center);
        state.zoom = Some(zoom);
        state.bounds = Some(*bounds);
    }

    /// Markers currently attached to this map
    pub fn markers(&self) -> Vec<Marker<H>> {
        self.inner
            .borrow()
            .markers
            .iter()
            .filter_map(Weak::upgrade)
            .map(Marker::from_inner)
            .collect()
    }

    pub fn marker_count(&self) -> usize {
        self.inner
            .borrow()
            .markers
            .iter()
            .filter(|m| m.strong_count() > 0)
            .count()
    }

    pub(crate) fn attach(&self, marker: &Rc<RefCell<MarkerState<H>>>) {
        let mut state = self.inner.borrow_mut();
        state.markers.retain(|m| m.strong_count() > 0);
        if !state.markers.iter().any(|m| m.as_ptr() == Rc::as_ptr(marker)) {
            state.markers.push(Rc::downgrade(marker));
        }
    }

    pub(crate) fn detach(&self, marker: &Rc<RefCell<MarkerState<H>>>) {
        self.inner
            .borrow_mut()
            .markers
            .retain(|m| m.strong_count() > 0 && m.as_ptr() != Rc::as_ptr(marker));
    }

    /// Whether both handles refer to the same map
    pub fn ptr_eq(&self, other: &Map<H>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Call `callback` every time `event` fires
    pub fn add_listener(&self, event: &str, callback: impl FnMut() + 'static) -> ListenerId {
        self.register(event, false, Rc::new(RefCell::new(callback)))
    }

    /// Call `callback` the first time `event` fires, then forget it
    pub fn add_listener_once(&self, event: &str, callback: impl FnMut() + 'static) -> ListenerId {
        self.register(event, true, Rc::new(RefCell::new(callback)))
    }

    fn register(&self, event: &str, once: bool, callback: Callback) -> ListenerId {
        let mut state = self.inner.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(Listener {
            id,
            event: event.to_string(),
            once,
            callback,
        });
        id
    }

    /// Returns whether a listener was removed
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.inner.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|l| l.id != id);
        state.listeners.len() != before
    }

    /// Fire `event`; returns the number of listeners called
    pub fn trigger(&self, event: &str) -> usize {
        // Listeners may touch the map, so none may run while it is borrowed
        let callbacks: Vec<Callback> = {
            let mut state = self.inner.borrow_mut();
            let callbacks = state
                .listeners
                .iter()
                .filter(|l| l.event == event)
                .map(|l| Rc::clone(&l.callback))
                .collect();
            state.listeners.retain(|l| !(l.once && l.event == event));
            callbacks
        };
        for callback in &callbacks {
            (&mut *callback.borrow_mut())();
        }
        callbacks.len()
    }
}

/// Highest integer zoom at which the span between `sw` and `ne` fits
fn zoom_to_fit(sw: LatLng, ne: LatLng, viewport: Viewport) -> f64 {
    fn lat_rad(lat: f64) -> f64 {
        let sin = lat.to_radians().sin();
        let rad_x2 = ((1.0 + sin) / (1.0 - sin)).ln() / 2.0;
        rad_x2.clamp(-PI, PI) / 2.0
    }

    fn zoom(pixels: u32, fraction: f64) -> f64 {
        (f64::from(pixels) / TILE_SIZE / fraction).ln() / LN_2
    }

    let lat_fraction = (lat_rad(ne.lat()) - lat_rad(sw.lat())) / PI;
    let lng_diff = ne.lng() - sw.lng();
    let lng_fraction = if lng_diff < 0.0 { lng_diff + 360.0 } else { lng_diff } / 360.0;

    let best = zoom(viewport.height, lat_fraction).min(zoom(viewport.width, lng_fraction));
    best.floor().clamp(0.0, f64::from(MAX_ZOOM))
}
