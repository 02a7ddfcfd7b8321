// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Columns that are never treated as party-vote columns: identifiers,
/// totals and metadata. Every other header column is a party.
pub const RESERVED_COLUMNS: [&str; 6] = [
    "YEAR",
    "PS CODE",
    "PS NAME",
    "TOTAL VOTES",
    "REG VOTERS",
    "REJECTED",
];

/// The registered-voters column, the only reserved column that may be
/// selected as a change metric.
pub const REG_VOTERS: &str = "REG VOTERS";

/// A single spreadsheet cell, as handed over by the file readers.
///
/// The readers do not apply any numeric policy themselves; coercion to a
/// vote count happens in the builder through [CellValue::as_count].
#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Permissive coercion to a count: anything that is not a clean
    /// non-negative number contributes zero. This is a deliberate leniency
    /// policy for hand-maintained spreadsheets, not an error path.
    pub fn as_count(&self) -> u64 {
        match self {
            CellValue::Int(i) if *i >= 0 => *i as u64,
            CellValue::Float(f) if *f >= 0.0 && f.is_finite() => *f as u64,
            CellValue::Text(s) => s.trim().parse::<u64>().unwrap_or(0),
            _ => 0,
        }
    }

    /// The cell as a display label. Integral floats lose their trailing
    /// `.0`, which matters for station codes stored as numbers.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

// ******** Output data structures *********

/// The measure used to rank polling stations.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RankMethod {
    /// Raw summed vote count for the party.
    Number,
    /// Party votes divided by the station's own total votes cast.
    LocalFraction,
    /// Party votes divided by the summed total votes across all the
    /// stations of the current filter.
    GlobalFraction,
}

/// Party totals for a single year, in party-column order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct YearTotals {
    pub year: u16,
    pub totals: Vec<(String, u64)>,
}

/// One entry of a station ranking.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedStation {
    /// The station code, the only identifier that is unique within a year.
    pub code: String,
    /// The first label recorded for this code in the filtered rows. Names
    /// are not stable across years, so this is display-only.
    pub name: String,
    pub value: f64,
}

/// Errors surfaced by the table builder and the aggregations.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TableError {
    /// The header is missing one of the reserved columns.
    MissingColumn(String),
    /// Two rows share the same (year, station code).
    DuplicateStation { year: u16, code: String },
    /// A row has fewer cells than the header.
    ShortRow { row: usize },
    /// A multi-year operation received an empty year selection.
    EmptyYears,
    /// The requested party is not a party column of this table.
    UnknownParty(String),
    /// The change metric is neither `REG VOTERS` nor a party column.
    UnknownMetric(String),
    /// Rankings need at least one entry.
    InvalidTopN,
    /// The year filter left no rows to aggregate.
    NoRows,
    /// The from/to years of a change query must differ.
    SameYears,
    /// Ranking by change across years has no stable station join key.
    NotSupported,
}

impl Error for TableError {}

impl Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::MissingColumn(name) => {
                write!(f, "the header is missing the reserved column {:?}", name)
            }
            TableError::DuplicateStation { year, code } => {
                write!(f, "duplicate row for station {:?} in year {}", code, year)
            }
            TableError::ShortRow { row } => {
                write!(f, "row {} has fewer cells than the header", row)
            }
            TableError::EmptyYears => write!(f, "at least one year must be selected"),
            TableError::UnknownParty(name) => {
                write!(f, "{:?} is not a party column of this table", name)
            }
            TableError::UnknownMetric(name) => {
                write!(f, "{:?} is neither {} nor a party column", name, REG_VOTERS)
            }
            TableError::InvalidTopN => write!(f, "the number of ranked stations must be at least 1"),
            TableError::NoRows => write!(f, "no data for the selected years"),
            TableError::SameYears => write!(f, "the from and to years must differ"),
            TableError::NotSupported => write!(
                f,
                "not implemented: polling station names change across years and no stable join key is available"
            ),
        }
    }
}
