use crate::error::GeoError;

/// Earth radius in meters used by every length computation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A (longitude, latitude) pair in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoPoint {
    lon: f64,
    lat: f64,
}

impl GeoPoint {
    /// Rejects NaN and infinite ordinates. Out-of-range degrees are accepted.
    pub fn new(lon: f64, lat: f64) -> Result<Self, GeoError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GeoError::NonFiniteCoordinate { lon, lat });
        }
        Ok(GeoPoint { lon, lat })
    }

    /// Builds a point from a GeoJSON-style position `[lon, lat, ...]`.
    /// Ordinates past the second (elevation) are ignored.
    pub fn from_position(position: &[f64]) -> Result<Self, GeoError> {
        match position {
            [lon, lat, ..] => GeoPoint::new(*lon, *lat),
            _ => Err(GeoError::PositionArity {
                len: position.len(),
            }),
        }
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance(*self, *other)
    }

    /// Wraps a coordinate already known to be finite, e.g. a vertex of a `Polyline`.
    pub(crate) fn from_coord(coord: ::geo::Coord<f64>) -> Self {
        GeoPoint {
            lon: coord.x,
            lat: coord.y,
        }
    }
}

impl From<GeoPoint> for ::geo::Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        ::geo::Coord { x: p.lon, y: p.lat }
    }
}

impl From<GeoPoint> for ::geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        ::geo::Point::new(p.lon, p.lat)
    }
}

/// Great-circle distance between two points, in meters.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_meters(a.lat, a.lon, b.lat, b.lon)
}

/// Great-circle distance using the haversine formula.
/// Input lat/lon in degrees. Output in meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * a.clamp(0.0, 1.0).sqrt().asin()
}
