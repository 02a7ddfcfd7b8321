use std::collections::HashSet;

use log::debug;

use crate::config::*;
use crate::{ElectionTable, StationRow};

/// Builds an [ElectionTable] from a header row and cell rows.
///
/// The party columns are discovered once from the header: every column
/// that is not in [RESERVED_COLUMNS] is a party. All count cells go
/// through the permissive coercion of [CellValue::as_count].
///
/// ```
/// use poll_tables::builder::TableBuilder;
/// use poll_tables::CellValue;
/// # use poll_tables::TableError;
///
/// let header: Vec<String> = [
///     "YEAR", "PS CODE", "PS NAME", "TOTAL VOTES", "REG VOTERS", "REJECTED", "Party X",
/// ]
/// .iter()
/// .map(|s| s.to_string())
/// .collect();
///
/// let mut builder = TableBuilder::new(&header)?;
/// builder.push_row(&[
///     CellValue::Int(2020),
///     CellValue::Text("PS-1".to_string()),
///     CellValue::Text("Town Hall".to_string()),
///     CellValue::Int(100),
///     CellValue::Int(150),
///     CellValue::Int(2),
///     CellValue::Int(98),
/// ])?;
/// let table = builder.build()?;
/// assert_eq!(table.parties().to_vec(), vec!["Party X".to_string()]);
///
/// # Ok::<(), TableError>(())
/// ```
pub struct TableBuilder {
    parties: Vec<String>,
    // Header positions of the reserved and party columns.
    year_idx: usize,
    code_idx: usize,
    name_idx: usize,
    total_idx: usize,
    reg_idx: usize,
    rejected_idx: usize,
    party_idx: Vec<usize>,
    width: usize,
    rows: Vec<StationRow>,
}

impl TableBuilder {
    pub fn new(header: &[String]) -> Result<TableBuilder, TableError> {
        let find = |name: &str| -> Result<usize, TableError> {
            header
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| TableError::MissingColumn(name.to_string()))
        };
        let year_idx = find("YEAR")?;
        let code_idx = find("PS CODE")?;
        let name_idx = find("PS NAME")?;
        let total_idx = find("TOTAL VOTES")?;
        let reg_idx = find(REG_VOTERS)?;
        let rejected_idx = find("REJECTED")?;

        let reserved: HashSet<&str> = RESERVED_COLUMNS.iter().copied().collect();
        let mut parties: Vec<String> = Vec::new();
        let mut party_idx: Vec<usize> = Vec::new();
        for (idx, col) in header.iter().enumerate() {
            if !reserved.contains(col.as_str()) {
                parties.push(col.clone());
                party_idx.push(idx);
            }
        }
        debug!(
            "TableBuilder: {} party columns: {:?}",
            parties.len(),
            parties
        );

        Ok(TableBuilder {
            parties,
            year_idx,
            code_idx,
            name_idx,
            total_idx,
            reg_idx,
            rejected_idx,
            party_idx,
            width: header.len(),
            rows: Vec::new(),
        })
    }

    /// Adds one (year, station) row. The cells must be aligned with the
    /// header the builder was created with.
    pub fn push_row(&mut self, cells: &[CellValue]) -> Result<(), TableError> {
        if cells.len() < self.width {
            return Err(TableError::ShortRow {
                row: self.rows.len() + 1,
            });
        }
        let row = StationRow {
            year: cells[self.year_idx].as_count() as u16,
            code: cells[self.code_idx].as_text(),
            name: cells[self.name_idx].as_text(),
            total_votes: cells[self.total_idx].as_count(),
            reg_voters: cells[self.reg_idx].as_count(),
            rejected: cells[self.rejected_idx].as_count(),
            party_votes: self
                .party_idx
                .iter()
                .map(|&i| cells[i].as_count())
                .collect(),
        };
        self.rows.push(row);
        Ok(())
    }

    /// Checks the (year, station code) uniqueness invariant and freezes
    /// the table.
    pub fn build(self) -> Result<ElectionTable, TableError> {
        let mut seen: HashSet<(u16, &str)> = HashSet::new();
        for row in self.rows.iter() {
            if !seen.insert((row.year, row.code.as_str())) {
                return Err(TableError::DuplicateStation {
                    year: row.year,
                    code: row.code.clone(),
                });
            }
        }
        Ok(ElectionTable {
            parties: self.parties,
            rows: self.rows,
        })
    }
}
