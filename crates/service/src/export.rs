//! CSV rendering of stored prestations.

use csv::WriterBuilder;
use models::prestation::Model;

use crate::errors::ServiceError;

pub const EXPORT_FILE_NAME: &str = "prestations.csv";

pub const CSV_HEADER: [&str; 15] = [
    "id",
    "order_number",
    "date",
    "last_name",
    "first_name",
    "invoice_number",
    "patient_index",
    "matricule",
    "specialty",
    "act",
    "rate_percent",
    "patient_share",
    "employee_share",
    "total_amount",
    "adjustment",
];

fn csv_row(m: &Model) -> [String; 15] {
    [
        m.id.to_string(),
        m.order_number.map(|n| n.to_string()).unwrap_or_default(),
        m.date.format("%Y-%m-%d").to_string(),
        m.last_name.clone(),
        m.first_name.clone(),
        m.invoice_number.clone(),
        m.patient_index.clone(),
        m.matricule.clone(),
        m.specialty.clone(),
        m.act.clone(),
        m.rate_percent.to_string(),
        m.patient_share.to_string(),
        m.employee_share.to_string(),
        m.total_amount.to_string(),
        m.adjustment.to_string(),
    ]
}

/// Serialize rows as UTF-8 CSV with a fixed header line.
pub fn write_csv(rows: &[Model]) -> Result<Vec<u8>, ServiceError> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)
        .map_err(|e| ServiceError::Export(e.to_string()))?;
    for m in rows {
        wtr.write_record(csv_row(m))
            .map_err(|e| ServiceError::Export(format!("row {}: {}", m.id, e)))?;
    }
    wtr.into_inner().map_err(|e| ServiceError::Export(e.to_string()))
}
