//! Chainage of a station along a rail line.
//!
//! The nearest point on the line is found in the flat (lon, lat) plane, while
//! every length along the line is measured with the haversine metric. The two
//! steps stay separate: the projection is planar, the chainage is in meters.

use geo::{Closest, ClosestPoint, Coord, EuclideanDistance, Line, LineString, Point};

use crate::error::GeoError;
use crate::geo::{distance, GeoPoint};

/// Planar distance, in degrees, under which a point counts as lying on a segment.
const ON_SEGMENT_TOLERANCE: f64 = 1e-9;

/// Ordered vertices of a rail line. Vertex 0 is chainage 0.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    line: LineString<f64>,
}

impl Default for Polyline {
    fn default() -> Self {
        Polyline {
            line: LineString::new(Vec::new()),
        }
    }
}

impl Polyline {
    pub fn new(vertices: Vec<GeoPoint>) -> Self {
        Polyline {
            line: vertices.into_iter().map(Coord::from).collect(),
        }
    }

    /// Builds a line from GeoJSON-style `[lon, lat]` positions.
    pub fn from_positions(positions: &[Vec<f64>]) -> Result<Self, GeoError> {
        let vertices = positions
            .iter()
            .map(|p| GeoPoint::from_position(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Polyline::new(vertices))
    }

    pub fn vertices(&self) -> Vec<GeoPoint> {
        self.line.coords().map(|c| GeoPoint::from_coord(*c)).collect()
    }

    pub fn as_line_string(&self) -> &LineString<f64> {
        &self.line
    }

    pub fn len(&self) -> usize {
        self.line.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.0.is_empty()
    }

    /// Consecutive vertex pairs, in line order.
    pub fn segments(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        self.line
            .lines()
            .map(|l| (GeoPoint::from_coord(l.start), GeoPoint::from_coord(l.end)))
    }

    /// Haversine length of the whole line, in meters.
    pub fn length_m(&self) -> f64 {
        self.segments().map(|(a, b)| distance(a, b)).sum()
    }
}

/// Where a station lands on a line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinePosition {
    /// Distance along the line from vertex 0, in meters.
    pub chainage_m: f64,
    /// Index of the segment holding the projected point.
    /// Segment `i` runs from vertex `i` to `i + 1`.
    pub segment: usize,
    /// Nearest point on the line.
    pub projected: GeoPoint,
    /// Distance between the station and `projected`, in meters.
    pub offset_m: f64,
}

/// Chainage of `station` along `line` in meters, or `None` when it cannot be determined.
pub fn chainage(station: GeoPoint, line: &Polyline) -> Option<f64> {
    locate(station, line).map(|pos| pos.chainage_m)
}

/// Projects `station` onto `line` and measures the distance travelled to get there.
///
/// Returns `None` for lines with fewer than two vertices, or when no segment
/// contains the projected point.
pub fn locate(station: GeoPoint, line: &Polyline) -> Option<LinePosition> {
    if line.len() < 2 {
        return None;
    }
    let nearest = nearest_point(&Point::from(station), &line.line)?;
    let segment = containing_segment(&line.line, &nearest)?;
    let projected = GeoPoint::new(nearest.x(), nearest.y()).ok()?;

    let before: f64 = line
        .segments()
        .take(segment)
        .map(|(a, b)| distance(a, b))
        .sum();
    let start = GeoPoint::from_coord(line.line.0[segment]);

    Some(LinePosition {
        chainage_m: before + distance(start, projected),
        segment,
        projected,
        offset_m: distance(station, projected),
    })
}

/// Planar nearest point on the line. Ties go to the earliest segment.
fn nearest_point(p: &Point<f64>, line: &LineString<f64>) -> Option<Point<f64>> {
    let mut best: Option<(Point<f64>, f64)> = None;
    for segment in line.lines() {
        let candidate = match segment.closest_point(p) {
            Closest::Intersection(q) | Closest::SinglePoint(q) => q,
            // A zero-length segment is all start vertex.
            Closest::Indeterminate if segment.start == segment.end => segment.start_point(),
            Closest::Indeterminate => continue,
        };
        let d = candidate.euclidean_distance(p);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((candidate, d));
        }
    }
    best.map(|(q, _)| q)
}

/// Index of the first segment holding `q`.
fn containing_segment(line: &LineString<f64>, q: &Point<f64>) -> Option<usize> {
    line.lines().position(|segment| on_segment(&segment, q))
}

/// Whether `q` lies on `segment`, endpoints included.
fn on_segment(segment: &Line<f64>, q: &Point<f64>) -> bool {
    q.euclidean_distance(segment) <= ON_SEGMENT_TOLERANCE
}
