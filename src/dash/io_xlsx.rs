//! Reads one combined results spreadsheet into an [ElectionTable].
//!
//! The first worksheet is used. Its first row is the header; every other row
//! is one polling station in one election year.

use std::path::Path;

use calamine::{open_workbook, DataType, Reader, Xlsx};
use snafu::{OptionExt, ResultExt};

use poll_tables::{builder::TableBuilder, CellValue, ElectionTable};

use crate::dash::{BadTableSnafu, EmptyExcelSnafu, OpeningExcelSnafu, ScopeResult};

pub fn read_election_table(path: &Path) -> ScopeResult<ElectionTable> {
    let path_str = path.to_string_lossy().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_str.clone(),
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu {
            path: path_str.clone(),
        })?
        .context(OpeningExcelSnafu {
            path: path_str.clone(),
        })?;
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(header_text).collect())
        .unwrap_or_default();
    let mut builder = TableBuilder::new(&header).context(BadTableSnafu {
        path: path_str.clone(),
    })?;
    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(read_cell).collect();
        builder.push_row(&cells).context(BadTableSnafu {
            path: path_str.clone(),
        })?;
    }
    builder.build().context(BadTableSnafu { path: path_str })
}

fn header_text(cell: &DataType) -> String {
    read_cell(cell).as_text().trim().to_string()
}

fn read_cell(cell: &DataType) -> CellValue {
    match cell {
        DataType::Int(i) => CellValue::Int(*i),
        DataType::Float(f) => CellValue::Float(*f),
        DataType::String(s) => CellValue::Text(s.clone()),
        DataType::Bool(b) => CellValue::Int(*b as i64),
        _ => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cell() {
        assert_eq!(read_cell(&DataType::Int(42)), CellValue::Int(42));
        assert_eq!(read_cell(&DataType::Float(1.5)), CellValue::Float(1.5));
        assert_eq!(
            read_cell(&DataType::String("x".to_string())),
            CellValue::Text("x".to_string())
        );
        assert_eq!(read_cell(&DataType::Bool(true)), CellValue::Int(1));
        assert_eq!(read_cell(&DataType::Empty), CellValue::Empty);
    }

    #[test]
    fn test_header_text_normalizes_numbers() {
        assert_eq!(header_text(&DataType::Float(2020.0)), "2020");
        assert_eq!(header_text(&DataType::String(" YEAR ".to_string())), "YEAR");
    }
}
