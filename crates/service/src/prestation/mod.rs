//! Prestation resource: listing filters, repository seam and application service.

pub mod filter;
pub mod repository;
pub mod service;

pub use filter::{FilterParams, PrestationFilter};
pub use repository::{PrestationRepository, SeaOrmPrestationRepository};
pub use service::{Page, PrestationService, NOT_FOUND_DETAIL};
