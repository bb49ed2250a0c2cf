//! Geographic and screen geometry value types

use std::fmt;

/// Format degrees with at most `precision` decimals, trailing zeros trimmed
pub fn format_degrees(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// A point in geographical coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    /// Latitude is clamped to [-90, 90]. Longitude in [-180, 180] is kept,
    /// anything else is wrapped into [-180, 180).
    pub fn new(lat: f64, lng: f64) -> Self {
        Self::with_wrap(lat, lng, false)
    }

    /// With `no_wrap` the coordinates are kept as given
    pub fn with_wrap(lat: f64, lng: f64, no_wrap: bool) -> Self {
        if no_wrap {
            return Self { lat, lng };
        }
        let lat = lat.clamp(-90.0, 90.0);
        let lng = if (-180.0..=180.0).contains(&lng) {
            lng
        } else {
            (lng + 180.0).rem_euclid(360.0) - 180.0
        };
        Self { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Equal within 1e-9 degrees
    pub fn equals(&self, other: &LatLng) -> bool {
        (self.lat - other.lat).abs() < 1e-9 && (self.lng - other.lng).abs() < 1e-9
    }

    /// `lat,lng` as used in URLs
    pub fn to_url_value(&self, precision: usize) -> String {
        format!(
            "{},{}",
            format_degrees(self.lat, precision),
            format_degrees(self.lng, precision)
        )
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// A rectangle in geographical coordinates
///
/// Longitude spans are linear; bounds never cross the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLngBounds {
    /// (south-west, north-east); `None` when empty
    corners: Option<(LatLng, LatLng)>,
}

impl LatLngBounds {
    /// Bounds from optional corners; a single corner gives a point bounds
    pub fn new(sw: Option<LatLng>, ne: Option<LatLng>) -> Self {
        let corners = match (sw, ne) {
            (Some(sw), Some(ne)) => Some((sw, ne)),
            (Some(p), None) | (None, Some(p)) => Some((p, p)),
            (None, None) => None,
        };
        Self { corners }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Grow to include `point`
    pub fn extend(&mut self, point: LatLng) -> &mut Self {
        self.corners = Some(match self.corners {
            None => (point, point),
            Some((sw, ne)) => (
                LatLng::with_wrap(sw.lat.min(point.lat), sw.lng.min(point.lng), true),
                LatLng::with_wrap(ne.lat.max(point.lat), ne.lng.max(point.lng), true),
            ),
        });
        self
    }

    /// Grow to include `other`
    pub fn union(&mut self, other: &LatLngBounds) -> &mut Self {
        if let Some((sw, ne)) = other.corners {
            self.extend(sw);
            self.extend(ne);
        }
        self
    }

    pub fn contains(&self, point: LatLng) -> bool {
        match self.corners {
            None => false,
            Some((sw, ne)) => {
                (sw.lat..=ne.lat).contains(&point.lat) && (sw.lng..=ne.lng).contains(&point.lng)
            }
        }
    }

    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        match (self.corners, other.corners) {
            (Some((a_sw, a_ne)), Some((b_sw, b_ne))) => {
                a_sw.lat <= b_ne.lat
                    && b_sw.lat <= a_ne.lat
                    && a_sw.lng <= b_ne.lng
                    && b_sw.lng <= a_ne.lng
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.corners {
            None => true,
            Some((sw, ne)) => sw.lat > ne.lat,
        }
    }

    pub fn south_west(&self) -> Option<LatLng> {
        self.corners.map(|(sw, _)| sw)
    }

    pub fn north_east(&self) -> Option<LatLng> {
        self.corners.map(|(_, ne)| ne)
    }

    pub fn center(&self) -> Option<LatLng> {
        self.corners.map(|(sw, ne)| {
            LatLng::with_wrap((sw.lat + ne.lat) / 2.0, (sw.lng + ne.lng) / 2.0, true)
        })
    }

    /// Latitude and longitude extent
    pub fn to_span(&self) -> LatLng {
        match self.corners {
            None => LatLng::with_wrap(0.0, 0.0, true),
            Some((sw, ne)) => LatLng::with_wrap(ne.lat - sw.lat, ne.lng - sw.lng, true),
        }
    }

    /// `sw_lat,sw_lng,ne_lat,ne_lng`; empty string when empty
    pub fn to_url_value(&self, precision: usize) -> String {
        match self.corners {
            None => String::new(),
            Some((sw, ne)) => format!(
                "{},{}",
                sw.to_url_value(precision),
                ne.to_url_value(precision)
            ),
        }
    }
}

impl fmt::Display for LatLngBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.corners {
            None => f.write_str("()"),
            Some((sw, ne)) => write!(f, "({}, {})", sw, ne),
        }
    }
}

/// A point on a two-dimensional plane, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn equals(&self, other: &Point) -> bool {
        self == other
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A two-dimensional size
#[derive(Debug, Clone, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
    pub width_unit: Option<String>,
    pub height_unit: Option<String>,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            width_unit: None,
            height_unit: None,
        }
    }

    /// Same width and height; units are ignored
    pub fn equals(&self, other: &Size) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_degrees_trims() {
        assert_eq!(format_degrees(38.0, 6), "38");
        assert_eq!(format_degrees(-97.1234567, 6), "-97.123457");
        assert_eq!(format_degrees(0.5, 6), "0.5");
        assert_eq!(format_degrees(-0.0000001, 6), "0");
        assert_eq!(format_degrees(12.0, 0), "12");
    }

    #[test]
    fn test_lat_clamped_and_lng_wrapped() {
        let p = LatLng::new(95.0, 190.0);
        assert_eq!(p.lat(), 90.0);
        assert_eq!(p.lng(), -170.0);
        assert_eq!(LatLng::new(0.0, 180.0).lng(), 180.0);
        assert_eq!(LatLng::new(0.0, -540.0).lng(), -180.0);
        assert_eq!(LatLng::new(0.0, 540.0).lng(), -180.0);
        assert_eq!(LatLng::new(0.0, -180.0).lng(), -180.0);
        assert_eq!(LatLng::new(0.0, 360.0).lng(), 0.0);
    }

    #[test]
    fn test_no_wrap_keeps_values() {
        let p = LatLng::with_wrap(95.0, 190.0, true);
        assert_eq!((p.lat(), p.lng()), (95.0, 190.0));
    }

    #[test]
    fn test_lat_lng_display_and_url() {
        let p = LatLng::new(38.5, -97.0);
        assert_eq!(p.to_string(), "(38.5, -97)");
        assert_eq!(p.to_url_value(6), "38.5,-97");
    }

    #[test]
    fn test_empty_bounds() {
        let b = LatLngBounds::empty();
        assert!(b.is_empty());
        assert!(b.center().is_none());
        assert!(!b.contains(LatLng::new(0.0, 0.0)));
        assert_eq!(b.to_url_value(6), "");
        assert_eq!(b.to_string(), "()");
    }

    #[test]
    fn test_extend_and_contains() {
        let mut b = LatLngBounds::empty();
        b.extend(LatLng::new(18.0, -119.0)).extend(LatLng::new(53.0, -74.0));
        assert!(!b.is_empty());
        assert_eq!(b.south_west(), Some(LatLng::new(18.0, -119.0)));
        assert_eq!(b.north_east(), Some(LatLng::new(53.0, -74.0)));
        assert!(b.contains(LatLng::new(38.0, -97.0)));
        assert!(!b.contains(LatLng::new(60.0, -97.0)));
        assert_eq!(b.center(), Some(LatLng::new(35.5, -96.5)));
        assert_eq!(b.to_span(), LatLng::new(35.0, 45.0));
    }

    #[test]
    fn test_union_and_intersects() {
        let mut a = LatLngBounds::new(Some(LatLng::new(0.0, 0.0)), Some(LatLng::new(10.0, 10.0)));
        let b = LatLngBounds::new(Some(LatLng::new(5.0, 5.0)), Some(LatLng::new(20.0, 20.0)));
        let c = LatLngBounds::new(Some(LatLng::new(30.0, 30.0)), Some(LatLng::new(40.0, 40.0)));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        a.union(&c);
        assert_eq!(a.north_east(), Some(LatLng::new(40.0, 40.0)));
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_single_corner_is_point_bounds() {
        let b = LatLngBounds::new(Some(LatLng::new(1.0, 2.0)), None);
        assert_eq!(b.south_west(), b.north_east());
        assert!(b.contains(LatLng::new(1.0, 2.0)));
    }

    #[test]
    fn test_inverted_corners_are_empty() {
        let b = LatLngBounds::new(Some(LatLng::new(10.0, 0.0)), Some(LatLng::new(0.0, 5.0)));
        assert!(b.is_empty());
    }

    #[test]
    fn test_point_and_size() {
        assert_eq!(Point::new(1.0, 2.5).to_string(), "(1, 2.5)");
        let mut a = Size::new(10.0, 20.0);
        let b = Size::new(10.0, 20.0);
        a.width_unit = Some("px".to_string());
        assert!(a.equals(&b));
        assert_ne!(a, b);
    }
}
