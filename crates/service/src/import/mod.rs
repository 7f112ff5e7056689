//! Bulk import of legacy `.xls` workbooks.

pub mod row_mapper;
pub mod workbook;
pub mod xldate;

use models::record::NewPrestation;
use serde::Serialize;

use crate::errors::ServiceError;
use row_mapper::{CellValue, RowMapper};
use workbook::Sheet;

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: u64,
}

/// Reject anything that is not named like a legacy workbook.
pub fn ensure_xls_name(file_name: &str) -> Result<(), ServiceError> {
    if file_name.to_ascii_lowercase().ends_with(".xls") {
        Ok(())
    } else {
        Err(ServiceError::UnsupportedFile(format!(
            "only .xls workbooks are accepted, got `{}`",
            file_name
        )))
    }
}

/// Map every data row of the sheet. Fully blank rows are skipped.
///
/// The first invalid row aborts the whole sheet; `row` in the error is the
/// 1-based sheet row number.
pub fn map_sheet(sheet: &Sheet) -> Result<Vec<NewPrestation>, ServiceError> {
    let mapper = RowMapper::new(&sheet.headers[..], sheet.date_system);
    let mut records = Vec::with_capacity(sheet.rows.len());
    for (idx, cells) in sheet.rows.iter().enumerate() {
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        // data rows start at sheet row 1, shown to users as row 2
        let record = mapper
            .map(cells)
            .map_err(|source| ServiceError::ImportRow { row: idx + 2, source })?;
        records.push(record);
    }
    Ok(records)
}
