use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};
use log::warn;

use crate::chainage::{locate, Polyline};
use crate::error::GeoError;
use crate::geo::GeoPoint;
use crate::osm::StationNode;

pub const LAT_COLUMN: &str = "lat";
pub const LON_COLUMN: &str = "lon";
pub const CHAINAGE_COLUMN: &str = "chainage_m";
pub const OFFSET_COLUMN: &str = "offset_m";

/// Looks stations up by name among point features.
///
/// A target matches a node when the node's name contains it, ignoring case.
/// The first such node in input order wins, so ambiguous names resolve to
/// whatever the export lists first.
pub struct StationMatcher<'a> {
    nodes: &'a [StationNode],
    lowered: Vec<String>,
}

impl<'a> StationMatcher<'a> {
    pub fn new(nodes: &'a [StationNode]) -> Self {
        let lowered = nodes.iter().map(|n| n.name.to_lowercase()).collect();
        StationMatcher { nodes, lowered }
    }

    pub fn find(&self, target: &str) -> Option<&'a StationNode> {
        let target = target.trim().to_lowercase();
        if target.is_empty() {
            return None;
        }
        self.lowered
            .iter()
            .position(|name| !name.is_empty() && name.contains(&target))
            .map(|i| &self.nodes[i])
    }
}

/// A CSV of station rows. Columns not touched here are written back unchanged.
#[derive(Clone, Debug, Default)]
pub struct StationTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl StationTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeoError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(GeoError::MissingHeader);
        }
        let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;
        Ok(StationTable { headers, rows })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GeoError> {
        StationTable::from_reader(std::fs::File::open(path)?)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), GeoError> {
        let mut wtr = Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), GeoError> {
        self.write_to(std::fs::File::create(path)?)
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Result<usize, GeoError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| GeoError::MissingColumn(name.to_string()))
    }

    /// Field `column` of row `row`; short rows read as empty.
    pub fn get(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or("")
    }

    /// Overwrites column `name`, appending it first if the table lacks it.
    /// `values` must hold exactly one entry per row.
    pub fn set_column(&mut self, name: &str, values: &[String]) -> Result<(), GeoError> {
        if values.len() != self.rows.len() {
            return Err(GeoError::ColumnLength {
                column: name.to_string(),
                expected: self.rows.len(),
                got: values.len(),
            });
        }
        let idx = match self.column(name) {
            Ok(idx) => idx,
            Err(_) => {
                self.headers.push_field(name);
                self.headers.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            let mut fields: Vec<&str> = row.iter().collect();
            if fields.len() <= idx {
                fields.resize(idx + 1, "");
            }
            fields[idx] = value.as_str();
            *row = StringRecord::from(fields);
        }
        Ok(())
    }

    /// The row's `lat`/`lon` as a point. Blank cells mean the station was never matched.
    pub fn location(&self, row: usize) -> Option<GeoPoint> {
        let lat_idx = self.column(LAT_COLUMN).ok()?;
        let lon_idx = self.column(LON_COLUMN).ok()?;
        let lat = self.get(row, lat_idx).trim().parse::<f64>().ok()?;
        let lon = self.get(row, lon_idx).trim().parse::<f64>().ok()?;
        GeoPoint::new(lon, lat).ok()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct MatchSummary {
    pub matched: usize,
    pub unmatched: Vec<String>,
}

/// Fills `lat`/`lon` for every row whose `name_column` matches a node.
/// Unmatched rows get empty coordinates.
pub fn attach_coordinates(
    table: &mut StationTable,
    matcher: &StationMatcher,
    name_column: &str,
) -> Result<MatchSummary, GeoError> {
    let name_idx = table.column(name_column)?;
    let mut summary = MatchSummary::default();
    let mut lats = Vec::with_capacity(table.len());
    let mut lons = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        let name = table.get(row, name_idx);
        match matcher.find(name) {
            Some(node) => {
                lats.push(node.location.lat().to_string());
                lons.push(node.location.lon().to_string());
                summary.matched += 1;
            }
            None => {
                warn!("No point feature matches station '{}'", name);
                lats.push(String::new());
                lons.push(String::new());
                summary.unmatched.push(name.to_string());
            }
        }
    }

    table.set_column(LAT_COLUMN, &lats)?;
    table.set_column(LON_COLUMN, &lons)?;
    Ok(summary)
}

#[derive(Debug, Default, PartialEq)]
pub struct ChainageSummary {
    pub computed: usize,
    pub undetermined: usize,
    pub missing_coordinates: usize,
}

/// Computes `chainage_m` and `offset_m` for every row with usable coordinates.
///
/// Rows without coordinates, and rows whose chainage is undetermined, are left
/// blank rather than written as zero.
pub fn attach_chainage(
    table: &mut StationTable,
    line: &Polyline,
) -> Result<ChainageSummary, GeoError> {
    table.column(LAT_COLUMN)?;
    table.column(LON_COLUMN)?;
    let mut summary = ChainageSummary::default();
    let mut chainages = Vec::with_capacity(table.len());
    let mut offsets = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        let Some(station) = table.location(row) else {
            warn!("Row {} has no usable coordinates", row + 1);
            summary.missing_coordinates += 1;
            chainages.push(String::new());
            offsets.push(String::new());
            continue;
        };
        match locate(station, line) {
            Some(pos) => {
                chainages.push(format!("{:.3}", pos.chainage_m));
                offsets.push(format!("{:.3}", pos.offset_m));
                summary.computed += 1;
            }
            None => {
                warn!(
                    "Chainage undetermined for row {} ({}, {})",
                    row + 1,
                    station.lon(),
                    station.lat()
                );
                summary.undetermined += 1;
                chainages.push(String::new());
                offsets.push(String::new());
            }
        }
    }

    table.set_column(CHAINAGE_COLUMN, &chainages)?;
    table.set_column(OFFSET_COLUMN, &offsets)?;
    Ok(summary)
}

/// Printable chainage of a row after `attach_chainage`.
///
/// Rows that were never given coordinates read `no coordinates`; rows with
/// coordinates but no chainage read `undetermined`.
pub fn chainage_label(table: &StationTable, row: usize) -> Result<&str, GeoError> {
    let chainage_idx = table.column(CHAINAGE_COLUMN)?;
    let value = table.get(row, chainage_idx);
    Ok(if !value.is_empty() {
        value
    } else if table.location(row).is_none() {
        "no coordinates"
    } else {
        "undetermined"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, lon: f64, lat: f64) -> StationNode {
        StationNode {
            name: name.to_string(),
            location: GeoPoint::new(lon, lat).unwrap(),
        }
    }

    fn nodes() -> Vec<StationNode> {
        vec![
            node("", 80.0, 26.0),
            node("Lucknow Charbagh", 80.9205, 26.8316),
            node("Unnao Junction", 80.4878, 26.5393),
            node("Kanpur Central", 80.3319, 26.4499),
            node("Kanpur Anwarganj", 80.3392, 26.4658),
        ]
    }

    fn table(csv: &str) -> StationTable {
        StationTable::from_reader(csv.as_bytes()).unwrap()
    }

    fn written(table: &StationTable) -> String {
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn find_is_case_insensitive_substring() {
        let nodes = nodes();
        let matcher = StationMatcher::new(&nodes);
        assert_eq!(matcher.find("UNNAO").unwrap().name, "Unnao Junction");
        assert_eq!(matcher.find(" charbagh ").unwrap().name, "Lucknow Charbagh");
    }

    #[test]
    fn first_match_wins() {
        let nodes = nodes();
        let matcher = StationMatcher::new(&nodes);
        assert_eq!(matcher.find("Kanpur").unwrap().name, "Kanpur Central");
    }

    #[test]
    fn no_match() {
        let nodes = nodes();
        let matcher = StationMatcher::new(&nodes);
        assert!(matcher.find("Delhi").is_none());
        assert!(matcher.find("").is_none());
        assert!(matcher.find("   ").is_none());
    }

    #[test]
    fn attaches_coordinates_and_keeps_other_columns() {
        let nodes = nodes();
        let matcher = StationMatcher::new(&nodes);
        let mut t = table("code,station_name\nLKO,Lucknow\nXYZ,Nowhere\nON,Unnao\n");

        let summary = attach_coordinates(&mut t, &matcher, "station_name").unwrap();

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched, vec!["Nowhere".to_string()]);
        assert_eq!(
            written(&t),
            "code,station_name,lat,lon\n\
             LKO,Lucknow,26.8316,80.9205\n\
             XYZ,Nowhere,,\n\
             ON,Unnao,26.5393,80.4878\n"
        );
    }

    #[test]
    fn overwrites_existing_coordinate_columns() {
        let nodes = nodes();
        let matcher = StationMatcher::new(&nodes);
        let mut t = table("station_name,lat,lon\nKanpur,1,2\n");
        attach_coordinates(&mut t, &matcher, "station_name").unwrap();
        assert_eq!(written(&t), "station_name,lat,lon\nKanpur,26.4499,80.3319\n");
    }

    #[test]
    fn missing_name_column() {
        let nodes = nodes();
        let matcher = StationMatcher::new(&nodes);
        let mut t = table("name\nLucknow\n");
        let err = attach_coordinates(&mut t, &matcher, "station_name").unwrap_err();
        assert!(matches!(err, GeoError::MissingColumn(c) if c == "station_name"));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            StationTable::from_reader("".as_bytes()),
            Err(GeoError::MissingHeader)
        ));
    }

    #[test]
    fn attaches_chainage() {
        let line = Polyline::new(vec![
            GeoPoint::new(80.9205, 26.8316).unwrap(),
            GeoPoint::new(80.4878, 26.5393).unwrap(),
            GeoPoint::new(80.3319, 26.4499).unwrap(),
        ]);
        let mut t = table(
            "station_name,lat,lon\n\
             Lucknow,26.8316,80.9205\n\
             Unknown,,\n\
             Kanpur,26.4499,80.3319\n\
             Broken,abc,80.0\n",
        );

        let summary = attach_chainage(&mut t, &line).unwrap();

        assert_eq!(
            summary,
            ChainageSummary {
                computed: 2,
                undetermined: 0,
                missing_coordinates: 2,
            }
        );
        let chainage_idx = t.column(CHAINAGE_COLUMN).unwrap();
        assert_eq!(t.get(0, chainage_idx), "0.000");
        assert_eq!(t.get(1, chainage_idx), "");
        let end: f64 = t.get(2, chainage_idx).parse().unwrap();
        assert!((end - line.length_m()).abs() < 0.01);
        assert_eq!(t.get(3, chainage_idx), "");
    }

    #[test]
    fn undetermined_chainage_is_left_blank() {
        let line = Polyline::new(vec![GeoPoint::new(80.0, 26.0).unwrap()]);
        let mut t = table("station_name,lat,lon\nA,26.0,80.0\n");
        let summary = attach_chainage(&mut t, &line).unwrap();
        assert_eq!(summary.undetermined, 1);
        assert_eq!(written(&t), "station_name,lat,lon,chainage_m,offset_m\nA,26.0,80.0,,\n");
    }

    #[test]
    fn labels_keep_missing_coordinates_apart_from_undetermined() {
        let line = Polyline::new(vec![
            GeoPoint::new(80.0, 26.0).unwrap(),
            GeoPoint::new(80.1, 26.0).unwrap(),
        ]);
        let mut t = table("station_name,lat,lon\nA,26.0,80.0\nB,,\n");
        attach_chainage(&mut t, &line).unwrap();
        assert_eq!(chainage_label(&t, 0).unwrap(), "0.000");
        assert_eq!(chainage_label(&t, 1).unwrap(), "no coordinates");

        let short = Polyline::new(vec![GeoPoint::new(80.0, 26.0).unwrap()]);
        attach_chainage(&mut t, &short).unwrap();
        assert_eq!(chainage_label(&t, 0).unwrap(), "undetermined");
        assert_eq!(chainage_label(&t, 1).unwrap(), "no coordinates");
    }

    #[test]
    fn set_column_rejects_wrong_length() {
        let mut t = table("station_name\nA\nB\n");
        let err = t.set_column("lat", &["1".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            GeoError::ColumnLength {
                expected: 2,
                got: 1,
                ..
            }
        ));
        assert_eq!(written(&t), "station_name\nA\nB\n");
    }

    #[test]
    fn location_reads_lat_lon_cells() {
        let t = table("station_name,lat,lon\nA,26.5,80.25\nB, ,80.0\n");
        let a = t.location(0).unwrap();
        assert_eq!((a.lon(), a.lat()), (80.25, 26.5));
        assert!(t.location(1).is_none());
        assert!(table("station_name\nA\n").location(0).is_none());
    }
}
