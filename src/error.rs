use thiserror::Error;

/// Errors raised while reading station and line data.
///
/// A chainage that cannot be determined is not an error; the locator returns
/// `None` for it.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("non-finite coordinate (lon {lon}, lat {lat})")]
    NonFiniteCoordinate { lon: f64, lat: f64 },

    #[error("position must have at least 2 ordinates, got {len}")]
    PositionArity { len: usize },

    #[error("no LineString geometry found{}", filter_suffix(.filter))]
    NoLineGeometry { filter: Option<String> },

    #[error("column '{0}' not found in station table")]
    MissingColumn(String),

    #[error("column '{column}' needs {expected} values, got {got}")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("station table has no header row")]
    MissingHeader,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn filter_suffix(filter: &Option<String>) -> String {
    match filter {
        Some(f) => format!(" with name matching '{f}'"),
        None => String::new(),
    }
}
