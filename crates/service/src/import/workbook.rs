use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, ExcelDateTime, ExcelDateTimeType, Range, Reader, Xls};

use super::row_mapper::CellValue;
use super::xldate::DateSystem;
use crate::errors::ServiceError;

/// First sheet of a workbook, laid out by absolute sheet position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Sheet row 0, trimmed.
    pub headers: Vec<String>,
    /// Sheet rows 1.., each padded to the header width.
    pub rows: Vec<Vec<CellValue>>,
    pub date_system: DateSystem,
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            // raw serial, decoded later with the sheet's date system
            Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// Parse a legacy `.xls` workbook held in memory and extract its first sheet.
pub fn read_xls(bytes: &[u8]) -> Result<Sheet, ServiceError> {
    let mut workbook = open_workbook_from_rs::<Xls<_>, _>(Cursor::new(bytes.to_vec()))
        .map_err(|e| ServiceError::UnreadableFile(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ServiceError::UnreadableFile("workbook has no sheet".into()))?
        .map_err(|e| ServiceError::UnreadableFile(e.to_string()))?;
    Ok(sheet_from_range(&range))
}

/// Date system of the workbook, as recorded on its date-formatted cells.
fn date_system_of(range: &Range<Data>) -> DateSystem {
    let is_1904 = range.used_cells().any(|(_, _, cell)| match cell {
        Data::DateTime(dt) => {
            let kind = if dt.is_duration() { ExcelDateTimeType::TimeDelta } else { ExcelDateTimeType::DateTime };
            *dt == ExcelDateTime::new(dt.as_f64(), kind, true)
        }
        _ => false,
    });
    DateSystem::from_indicator(u8::from(is_1904))
}

/// Lay a calamine range out on absolute sheet coordinates.
pub fn sheet_from_range(range: &Range<Data>) -> Sheet {
    let Some((last_row, last_col)) = range.end() else {
        return Sheet::default();
    };
    let cell = |row: u32, col: u32| range.get_value((row, col)).map(CellValue::from).unwrap_or(CellValue::Empty);

    let headers = (0..=last_col).map(|c| cell(0, c).to_text()).collect();
    let rows = (1..=last_row)
        .map(|r| (0..=last_col).map(|c| cell(r, c)).collect())
        .collect();

    Sheet { headers, rows, date_system: date_system_of(range) }
}
