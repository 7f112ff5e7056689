//! Service layer for prestations.
//! - Record validation lives in `models::record`; this crate orchestrates it.
//! - `import` turns a legacy `.xls` sheet into validated records.
//! - `prestation` holds the repository seam and the application service.
//! - `export` renders records as CSV.

pub mod errors;
pub mod pagination;
pub mod prestation;
pub mod import;
pub mod export;
#[cfg(test)]
pub mod test_support;
