//! Station nodes and line geometry from an Overpass Turbo GeoJSON export.

use std::fs;
use std::path::Path;

use geojson::{Feature, GeoJson, Geometry, Value};
use log::debug;

use crate::chainage::Polyline;
use crate::error::GeoError;
use crate::geo::GeoPoint;

/// A named point feature, typically a `railway=station` node.
#[derive(Clone, Debug, PartialEq)]
pub struct StationNode {
    pub name: String,
    pub location: GeoPoint,
}

pub fn load_geojson(path: impl AsRef<Path>) -> Result<GeoJson, GeoError> {
    let text = fs::read_to_string(path)?;
    Ok(text.parse::<GeoJson>()?)
}

/// Every `Point` feature, in input order. Missing names become empty strings.
pub fn station_nodes(geojson: &GeoJson) -> Result<Vec<StationNode>, GeoError> {
    let mut nodes = Vec::new();
    for feature in features(geojson) {
        let Some(Value::Point(position)) = feature.geometry.as_ref().map(|g| &g.value) else {
            continue;
        };
        nodes.push(StationNode {
            name: feature_name(feature).trim().to_string(),
            location: GeoPoint::from_position(position)?,
        });
    }
    debug!("Found {} point features", nodes.len());
    Ok(nodes)
}

/// The first line feature, optionally restricted to names containing `name_filter`.
pub fn line_geometry(
    geojson: &GeoJson,
    name_filter: Option<&str>,
) -> Result<Polyline, GeoError> {
    let filter = name_filter.map(str::to_lowercase);
    let bare_geometry = match geojson {
        GeoJson::Geometry(g) => Some(g),
        _ => None,
    };

    let found = features(geojson)
        .filter(|f| match &filter {
            Some(filter) => feature_name(f).to_lowercase().contains(filter.as_str()),
            None => true,
        })
        .find_map(|f| f.geometry.as_ref().and_then(line_value))
        .or_else(|| bare_geometry.and_then(line_value));

    match found {
        Some(value) => polyline_from_value(value),
        None => Err(GeoError::NoLineGeometry {
            filter: name_filter.map(str::to_string),
        }),
    }
}

fn features(geojson: &GeoJson) -> Box<dyn Iterator<Item = &Feature> + '_> {
    match geojson {
        GeoJson::FeatureCollection(fc) => Box::new(fc.features.iter()),
        GeoJson::Feature(f) => Box::new(std::iter::once(f)),
        GeoJson::Geometry(_) => Box::new(std::iter::empty()),
    }
}

fn feature_name(feature: &Feature) -> &str {
    feature
        .property("name")
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn line_value(geometry: &Geometry) -> Option<&Value> {
    match &geometry.value {
        v @ (Value::LineString(_) | Value::MultiLineString(_)) => Some(v),
        _ => None,
    }
}

fn polyline_from_value(value: &Value) -> Result<Polyline, GeoError> {
    let line = match value {
        Value::LineString(positions) => Polyline::from_positions(positions)?,
        Value::MultiLineString(parts) => {
            let mut vertices: Vec<GeoPoint> = Vec::new();
            for part in parts {
                let part = Polyline::from_positions(part)?;
                let points = part.vertices();
                let repeated = matches!(
                    (vertices.last(), points.first()),
                    (Some(last), Some(first)) if last == first
                );
                vertices.extend(points.into_iter().skip(usize::from(repeated)));
            }
            Polyline::new(vertices)
        }
        _ => Polyline::default(),
    };
    debug!("Line geometry has {} vertices", line.len());
    Ok(line)
}
