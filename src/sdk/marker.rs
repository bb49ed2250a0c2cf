//! Markers and marker images

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::geometry::{LatLng, Point, Size};
use super::map::Map;
use crate::directive::{ConstructionError, Resolved};

pub(crate) struct MarkerState<H> {
    position: Option<LatLng>,
    title: Option<String>,
    visible: bool,
    icon: Option<Resolved<H>>,
    z_index: Option<f64>,
    options: Vec<(String, Resolved<H>)>,
    map: Option<Map<H>>,
}

/// A marker that can be shown on at most one map
///
/// Cloning yields another handle to the same marker.
pub struct Marker<H> {
    inner: Rc<RefCell<MarkerState<H>>>,
}

impl<H> Clone for Marker<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H> fmt::Debug for Marker<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Marker")
            .field("position", &state.position)
            .field("title", &state.title)
            .field("visible", &state.visible)
            .field("attached", &state.map.is_some())
            .finish()
    }
}

impl<H> Default for Marker<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Marker<H> {
    pub fn new() -> Self {
        Self::from_inner(Rc::new(RefCell::new(MarkerState {
            position: None,
            title: None,
            visible: true,
            icon: None,
            z_index: None,
            options: Vec::new(),
            map: None,
        })))
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<MarkerState<H>>>) -> Self {
        Self { inner }
    }

    /// Apply an options object. A `map` option attaches or detaches the marker.
    pub fn set_options(&self, options: &[(String, Resolved<H>)]) -> Result<(), ConstructionError>
    where
        H: Clone,
    {
        for (key, value) in options {
            match (key.as_str(), value) {
                ("map", Resolved::Null) => self.set_map(None),
                ("map", v) => {
                    let map = v
                        .as_map()
                        .ok_or_else(|| ConstructionError::invalid_option(key, "a Map"))?;
                    self.set_map(Some(map));
                }
                ("position", Resolved::Null) => self.inner.borrow_mut().position = None,
                ("position", v) => {
                    let position = v
                        .as_lat_lng()
                        .ok_or_else(|| ConstructionError::invalid_option(key, "a LatLng"))?;
                    self.set_position(position);
                }
                ("title", v) => {
                    let title = v
                        .as_str()
                        .ok_or_else(|| ConstructionError::invalid_option(key, "a string"))?;
                    self.set_title(title);
                }
                ("visible", v) => {
                    let visible = v
                        .as_bool()
                        .ok_or_else(|| ConstructionError::invalid_option(key, "a boolean"))?;
                    self.set_visible(visible);
                }
                ("zIndex", v) => {
                    let z_index = v
                        .as_f64()
                        .ok_or_else(|| ConstructionError::invalid_option(key, "a number"))?;
                    self.inner.borrow_mut().z_index = Some(z_index);
                }
                ("icon", v) => {
                    let is_image = matches!(v.as_instance(), Some(super::Instance::MarkerImage(_)));
                    if v.as_str().is_none() && !is_image {
                        return Err(ConstructionError::invalid_option(key, "a URL or MarkerImage"));
                    }
                    self.inner.borrow_mut().icon = Some(v.clone());
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

    pub fn position(&self) -> Option<LatLng> {
        self.inner.borrow().position
    }

    pub fn set_position(&self, position: LatLng) {
        self.inner.borrow_mut().position = Some(position);
    }

    pub fn title(&self) -> Option<String> {
        self.inner.borrow().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.inner.borrow_mut().title = Some(title.into());
    }

    pub fn visible(&self) -> bool {
        self.inner.borrow().visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.inner.borrow_mut().visible = visible;
    }

    pub fn z_index(&self) -> Option<f64> {
        self.inner.borrow().z_index
    }

    pub fn icon(&self) -> Option<Resolved<H>>
    where
        H: Clone,
    {
        self.inner.borrow().icon.clone()
    }

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

    /// Map the marker is shown on
    pub fn map(&self) -> Option<Map<H>> {
        self.inner.borrow().map.clone()
    }

    /// Show on `map`, leaving any previous map; `None` removes the marker
    pub fn set_map(&self, map: Option<&Map<H>>) {
        let previous = self.inner.borrow_mut().map.take();
        if let Some(old) = previous {
            old.detach(&self.inner);
        }
        if let Some(map) = map {
            map.attach(&self.inner);
            self.inner.borrow_mut().map = Some(map.clone());
        }
    }

    pub fn ptr_eq(&self, other: &Marker<H>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// An image used as a marker icon or shadow
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerImage {
    pub url: String,
    pub size: Option<Size>,
    pub origin: Option<Point>,
    pub anchor: Option<Point>,
    pub scaled_size: Option<Size>,
}

impl MarkerImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size: None,
            origin: None,
            anchor: None,
            scaled_size: None,
        }
    }
}
