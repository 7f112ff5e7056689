use std::sync::Arc;

use models::prestation::Model;
use models::record::{apply_patch, NewPrestation, PrestationInput, PrestationPatch};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::filter::PrestationFilter;
use super::repository::PrestationRepository;
use crate::errors::ServiceError;
use crate::export;
use crate::import::{self, workbook, workbook::Sheet, ImportSummary};
use crate::pagination::Pagination;

pub const NOT_FOUND_DETAIL: &str = "Prestation non trouvée";

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter, regardless of `skip`/`limit`.
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), total: self.total, skip: self.skip, limit: self.limit }
    }
}

/// Prestation business service independent of web framework
pub struct PrestationService {
    repo: Arc<dyn PrestationRepository>,
    max_page_size: u64,
}

impl PrestationService {
    pub fn new(repo: Arc<dyn PrestationRepository>, max_page_size: u64) -> Self {
        Self { repo, max_page_size: max_page_size.max(1) }
    }

    pub async fn list(&self, filter: &PrestationFilter, page: Pagination) -> Result<Vec<Model>, ServiceError> {
        self.repo.list(filter, page.normalize(self.max_page_size)).await
    }

    pub async fn page(&self, filter: &PrestationFilter, page: Pagination) -> Result<Page<Model>, ServiceError> {
        let page = page.normalize(self.max_page_size);
        let items = self.repo.list(filter, page).await?;
        let total = self.repo.count(filter).await?;
        Ok(Page { items, total, skip: page.skip, limit: page.limit })
    }

    pub async fn get(&self, id: i32) -> Result<Model, ServiceError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND_DETAIL.into()))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: PrestationInput) -> Result<Model, ServiceError> {
        let record = input.validate()?;
        let created = self.repo.create(record).await?;
        info!(id = created.id, event = "prestation_created", "prestation created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn replace(&self, id: i32, input: PrestationInput) -> Result<Model, ServiceError> {
        let record = input.validate()?;
        let updated = self
            .repo
            .replace(id, record)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND_DETAIL.into()))?;
        info!(id, event = "prestation_replaced", "prestation replaced");
        Ok(updated)
    }

    #[instrument(skip(self, patch))]
    pub async fn patch(&self, id: i32, patch: PrestationPatch) -> Result<Model, ServiceError> {
        let current: NewPrestation = self.get(id).await?.into();
        let next = apply_patch(&current, patch)?;
        let updated = self
            .repo
            .replace(id, next)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND_DETAIL.into()))?;
        info!(id, event = "prestation_patched", "prestation patched");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound(NOT_FOUND_DETAIL.into()));
        }
        info!(id, event = "prestation_deleted", "prestation deleted");
        Ok(())
    }

    /// Import an uploaded workbook: every row is inserted, or none is.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn import_xls(&self, file_name: &str, bytes: &[u8]) -> Result<ImportSummary, ServiceError> {
        import::ensure_xls_name(file_name)?;
        let sheet = workbook::read_xls(bytes)?;
        self.import_sheet(&sheet).await
    }

    /// Map then insert an already parsed sheet.
    pub async fn import_sheet(&self, sheet: &Sheet) -> Result<ImportSummary, ServiceError> {
        let records = match import::map_sheet(sheet) {
            Ok(records) => records,
            Err(e) => {
                warn!(event = "import_rejected", error = %e, "import aborted before any write");
                return Err(e);
            }
        };
        let created = self.repo.insert_all(records).await?;
        info!(event = "import_completed", created, "import committed");
        Ok(ImportSummary { created })
    }

    /// Render every matching row as CSV.
    pub async fn export_csv(&self, filter: &PrestationFilter) -> Result<Vec<u8>, ServiceError> {
        let rows = self.repo.list_all(filter).await?;
        let body = export::write_csv(&rows)?;
        info!(event = "export_rendered", rows = rows.len(), bytes = body.len(), "csv export rendered");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::row_mapper::CellValue;
    use crate::import::xldate::DateSystem;
    use crate::prestation::filter::FilterParams;
    use crate::prestation::repository::mock::InMemoryPrestationRepository;
    use crate::test_support::sample_record;

    fn service(repo: Arc<InMemoryPrestationRepository>) -> PrestationService {
        PrestationService::new(repo, 1000)
    }

    fn input(matricule: &str, date: &str) -> PrestationInput {
        serde_json::from_value(serde_json::json!({
            "date": date, "last_name": "Ba", "first_name": "Moussa",
            "invoice_number": "F1", "patient_index": "P1", "matricule": matricule,
            "specialty": "Dentaire", "act": "Soins", "rate_percent": 70,
            "patient_share": 30, "employee_share": 70, "total_amount": 100,
            "adjustment": 0
        }))
        .unwrap()
    }

    fn import_sheet(rows: Vec<Vec<CellValue>>) -> Sheet {
        let headers = ["Date", "Nom", "Prenom", "N° Facture", "Index Patient", "Matricule", "Spécialité",
            "Acte", "Taux", "Part Patient", "Part Employé", "Montant Total", "Reglage"];
        Sheet { headers: headers.iter().map(|h| h.to_string()).collect(), rows, date_system: DateSystem::Excel1900 }
    }

    fn row(rate: f64) -> Vec<CellValue> {
        let mut r = vec![CellValue::Text("05/03/2024".into())];
        r.extend(["Ba", "Awa", "F1", "P1", "M1", "Cardio", "Consult"].map(|s| CellValue::Text(s.into())));
        r.extend([rate, 20.0, 80.0, 100.0, 0.0].map(CellValue::Float));
        r
    }

    #[tokio::test]
    async fn combined_filters_and_malformed_bound() {
        let repo = Arc::new(InMemoryPrestationRepository::new());
        let svc = service(repo);
        svc.create(input("M123", "2023-12-31")).await.unwrap();
        svc.create(input("M123", "2024-02-01")).await.unwrap();
        svc.create(input("M999", "2024-02-01")).await.unwrap();

        let both = PrestationFilter::from(FilterParams {
            matricule: Some("M123".into()),
            date_from: Some("2024-01-01".into()),
            ..Default::default()
        });
        let rows = svc.list(&both, Pagination::default()).await.unwrap();
        assert_eq!(rows.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2]);

        let bad_bound = PrestationFilter::from(FilterParams {
            matricule: Some("M123".into()),
            date_from: Some("not-a-date".into()),
            ..Default::default()
        });
        let no_bound = PrestationFilter::from(FilterParams { matricule: Some("M123".into()), ..Default::default() });
        assert_eq!(
            svc.list(&bad_bound, Pagination::default()).await.unwrap(),
            svc.list(&no_bound, Pagination::default()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn page_total_ignores_limit_and_limit_is_clamped() {
        let repo = Arc::new(InMemoryPrestationRepository::new());
        let svc = PrestationService::new(repo.clone(), 2);
        for _ in 0..5 {
            repo.create(sample_record("M1")).await.unwrap();
        }
        let page = svc.page(&PrestationFilter::default(), Pagination { skip: 1, limit: 50 }).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.limit, 2);
        assert_eq!(page.items.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn import_is_all_or_nothing_on_row_failure() {
        let repo = Arc::new(InMemoryPrestationRepository::new());
        let svc = service(repo.clone());
        let sheet = import_sheet(vec![row(80.0), row(80.0), row(1000.0)]);
        let err = svc.import_sheet(&sheet).await.unwrap_err();
        assert!(matches!(err, ServiceError::ImportRow { row: 4, .. }));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn import_is_all_or_nothing_on_store_failure() {
        let repo = Arc::new(InMemoryPrestationRepository::failing_after(1));
        let svc = service(repo.clone());
        let err = svc.import_sheet(&import_sheet(vec![row(80.0), row(70.0)])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Db(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn import_inserts_every_row() {
        let repo = Arc::new(InMemoryPrestationRepository::new());
        let svc = service(repo.clone());
        let summary = svc.import_sheet(&import_sheet(vec![row(80.0), row(70.0)])).await.unwrap();
        assert_eq!(summary, ImportSummary { created: 2 });
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn import_xls_stores_every_row_of_a_workbook() {
        let repo = Arc::new(InMemoryPrestationRepository::new());
        let svc = service(repo.clone());
        let bytes = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/prestations.xls"));
        let summary = svc.import_xls("Janvier.XLS", bytes).await.unwrap();
        assert_eq!(summary, ImportSummary { created: 3 });
        let stored = svc.list(&PrestationFilter::default(), Pagination::default()).await.unwrap();
        assert_eq!(stored.iter().map(|m| m.matricule.as_str()).collect::<Vec<_>>(), vec!["1042.0", "M77", "M88"]);
    }

    #[tokio::test]
    async fn import_xls_with_a_bad_row_stores_nothing() {
        let repo = Arc::new(InMemoryPrestationRepository::new());
        let svc = service(repo.clone());
        let bytes = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/prestations_bad_row.xls"));
        let err = svc.import_xls("fevrier.xls", bytes).await.unwrap_err();
        assert!(matches!(err, ServiceError::ImportRow { row: 3, .. }));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn import_rejects_wrong_extension_before_reading() {
        let svc = service(Arc::new(InMemoryPrestationRepository::new()));
        let err = svc.import_xls("data.xlsx", b"whatever").await.unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedFile(_)));
        let err = svc.import_xls("data.xls", b"whatever").await.unwrap_err();
        assert!(matches!(err, ServiceError::UnreadableFile(_)));
    }

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let svc = service(Arc::new(InMemoryPrestationRepository::new()));
        let created = svc.create(input("M1", "2024-01-10")).await.unwrap();
        let patch: PrestationPatch = serde_json::from_str(r#"{"act": "Détartrage", "order_number": 9}"#).unwrap();
        let patched = svc.patch(created.id, patch).await.unwrap();
        assert_eq!(patched.act, "Détartrage");
        assert_eq!(patched.order_number, Some(9));
        assert_eq!(patched.matricule, created.matricule);
        assert_eq!(svc.get(created.id).await.unwrap(), patched);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let svc = service(Arc::new(InMemoryPrestationRepository::new()));
        assert!(matches!(svc.get(42).await, Err(ServiceError::NotFound(d)) if d == NOT_FOUND_DETAIL));
        assert!(matches!(svc.delete(42).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.replace(42, input("M1", "2024-01-01")).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.patch(42, PrestationPatch::default()).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn api_validation_errors_are_client_errors() {
        let svc = service(Arc::new(InMemoryPrestationRepository::new()));
        let mut bad = input("M1", "2024-01-01");
        bad.last_name = String::new();
        let err = svc.create(bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn export_follows_filter() {
        let svc = service(Arc::new(InMemoryPrestationRepository::new()));
        svc.create(input("M1", "2024-01-01")).await.unwrap();
        svc.create(input("M2", "2024-01-01")).await.unwrap();
        let filter = PrestationFilter { matricule: Some("M2".into()), ..Default::default() };
        let body = String::from_utf8(svc.export_csv(&filter).await.unwrap()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2,,2024-01-01,Ba,Moussa,F1,P1,M2,"));
        assert!(lines[1].ends_with(",70.00,30.00,70.00,100.00,0.00"));
    }
}
