//! Tabular ingestion of bookkeeping exports.
//!
//! The export is delimited text whose first row carries localized column
//! names. Columns are mapped through [`CanonicalField::from_localized_header`];
//! unmapped columns are dropped from every row.

use crate::{CanonicalField, CanonicalRecord, Error, FieldValue, Result};
use std::io::Read;
use tracing::debug;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parse a ledger export into canonical records.
///
/// Rows whose cell count differs from the header are skipped. The whole input
/// is read eagerly so callers can replace stored data in one step.
pub fn parse_ledger<R: Read>(reader: R) -> Result<Vec<CanonicalRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = rdr.records();

    let header = match rows.next() {
        Some(Ok(header)) => header,
        Some(Err(err)) => return Err(Error::malformed(format!("cannot read header row: {}", err))),
        None => return Err(Error::malformed("missing header row")),
    };

    let columns: Vec<Option<CanonicalField>> = header
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let cell = if index == 0 {
                cell.strip_prefix(BYTE_ORDER_MARK).unwrap_or(cell)
            } else {
                cell
            };
            CanonicalField::from_localized_header(cell)
        })
        .collect();

    let mut records = Vec::new();
    for row in rows {
        let row = row.map_err(|err| Error::malformed(format!("cannot read row: {}", err)))?;
        if row.len() != columns.len() {
            continue;
        }

        let mut record = CanonicalRecord::new();
        for (cell, column) in row.iter().zip(&columns) {
            let Some(field) = *column else { continue };
            let value = if field == CanonicalField::Amount {
                FieldValue::amount(cell)
            } else {
                FieldValue::from(cell)
            };
            record.insert(field, value);
        }
        records.push(record);
    }

    debug!(
        "parsed {} ledger records ({} of {} columns mapped)",
        records.len(),
        columns.iter().filter(|c| c.is_some()).count(),
        columns.len()
    );
    Ok(records)
}
