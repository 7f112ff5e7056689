use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use models::prestation::PrestationRead;
use models::record::{PrestationInput, PrestationPatch};
use serde::Deserialize;
use service::export::EXPORT_FILE_NAME;
use service::import::ImportSummary;
use service::pagination::{Pagination, LIST_DEFAULT_LIMIT, PAGE_DEFAULT_LIMIT};
use service::prestation::{FilterParams, Page, PrestationFilter};
use tracing::{info, warn};

use crate::errors::JsonApiError;
use crate::routes::ServerState;

/// Listing query: filters plus offset/limit.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub invoice_number: Option<String>,
    pub matricule: Option<String>,
    pub specialty: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`. Ignored when malformed.
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`. Ignored when malformed.
    pub date_to: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> PrestationFilter {
        PrestationFilter::from(FilterParams {
            invoice_number: self.invoice_number.clone(),
            matricule: self.matricule.clone(),
            specialty: self.specialty.clone(),
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
        })
    }

    fn pagination(&self, default_limit: u64) -> Pagination {
        Pagination::from_query(self.skip, self.limit, default_limit)
    }
}

#[utoipa::path(
    get, path = "/api/v1/prestations", tag = "prestations",
    params(ListQuery),
    responses(
        (status = 200, description = "List OK", body = [crate::openapi::PrestationReadDoc]),
        (status = 500, description = "List Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<ListQuery>) -> Result<Json<Vec<PrestationRead>>, JsonApiError> {
    let rows = state.prestations.list(&q.filter(), q.pagination(LIST_DEFAULT_LIMIT)).await?;
    Ok(Json(rows.into_iter().map(PrestationRead::from).collect()))
}

#[utoipa::path(
    get, path = "/api/v1/prestations/page", tag = "prestations",
    params(ListQuery),
    responses(
        (status = 200, description = "Page OK", body = crate::openapi::PrestationPageDoc),
        (status = 500, description = "List Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn page(State(state): State<ServerState>, Query(q): Query<ListQuery>) -> Result<Json<Page<PrestationRead>>, JsonApiError> {
    let page = state.prestations.page(&q.filter(), q.pagination(PAGE_DEFAULT_LIMIT)).await?;
    Ok(Json(page.map(PrestationRead::from)))
}

#[utoipa::path(
    get, path = "/api/v1/prestations/{id}", tag = "prestations",
    params(("id" = i32, Path, description = "Prestation ID")),
    responses(
        (status = 200, description = "OK", body = crate::openapi::PrestationReadDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<Json<PrestationRead>, JsonApiError> {
    let m = state.prestations.get(id).await?;
    Ok(Json(m.into()))
}

#[utoipa::path(
    post, path = "/api/v1/prestations", tag = "prestations",
    request_body = crate::openapi::PrestationInputDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::PrestationReadDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBodyDoc),
        (status = 422, description = "Malformed body")
    )
)]
pub async fn create(State(state): State<ServerState>, Json(input): Json<PrestationInput>) -> Result<(StatusCode, Json<PrestationRead>), JsonApiError> {
    let m = state.prestations.create(input).await?;
    Ok((StatusCode::CREATED, Json(m.into())))
}

#[utoipa::path(
    put, path = "/api/v1/prestations/{id}", tag = "prestations",
    params(("id" = i32, Path, description = "Prestation ID")),
    request_body = crate::openapi::PrestationInputDoc,
    responses(
        (status = 200, description = "Replaced", body = crate::openapi::PrestationReadDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn replace(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(input): Json<PrestationInput>,
) -> Result<Json<PrestationRead>, JsonApiError> {
    let m = state.prestations.replace(id, input).await?;
    Ok(Json(m.into()))
}

#[utoipa::path(
    patch, path = "/api/v1/prestations/{id}", tag = "prestations",
    params(("id" = i32, Path, description = "Prestation ID")),
    request_body = crate::openapi::PrestationPatchDoc,
    responses(
        (status = 200, description = "Patched", body = crate::openapi::PrestationReadDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn patch(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(patch): Json<PrestationPatch>,
) -> Result<Json<PrestationRead>, JsonApiError> {
    let m = state.prestations.patch(id, patch).await?;
    Ok(Json(m.into()))
}

#[utoipa::path(
    delete, path = "/api/v1/prestations/{id}", tag = "prestations",
    params(("id" = i32, Path, description = "Prestation ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<StatusCode, JsonApiError> {
    state.prestations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/api/v1/prestations/import", tag = "prestations",
    request_body(content = crate::openapi::ImportUploadDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Imported", body = crate::openapi::ImportSummaryDoc),
        (status = 400, description = "Invalid File", body = crate::openapi::ErrorBodyDoc),
        (status = 413, description = "Upload too large"),
        (status = 422, description = "Import Failed", body = crate::openapi::ErrorBodyDoc),
        (status = 500, description = "Database Error", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn import(State(state): State<ServerState>, mut multipart: Multipart) -> Result<Json<ImportSummary>, JsonApiError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(upload_error)?;
        info!(file_name = %file_name, size = bytes.len(), event = "import_received", "import upload received");

        let summary = state
            .prestations
            .import_xls(&file_name, &bytes)
            .await
            .map_err(|e| {
                warn!(file_name = %file_name, error = %e, event = "import_failed", "import failed");
                JsonApiError::import(e)
            })?;
        return Ok(Json(summary));
    }
    Err(JsonApiError::new(StatusCode::BAD_REQUEST, "Invalid Upload", Some("multipart field `file` is missing".into()))
        .with_created(0))
}

// oversized bodies surface here as 413
fn upload_error(e: MultipartError) -> JsonApiError {
    JsonApiError::new(e.status(), "Invalid Upload", Some(e.body_text())).with_created(0)
}

#[utoipa::path(
    get, path = "/api/v1/prestations/export", tag = "prestations",
    params(ListQuery),
    responses(
        (status = 200, description = "CSV export", body = String, content_type = "text/csv"),
        (status = 500, description = "Export Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn export(State(state): State<ServerState>, Query(q): Query<ListQuery>) -> Result<Response, JsonApiError> {
    let body = state.prestations.export_csv(&q.filter()).await?;
    let disposition = format!("attachment; filename={}", EXPORT_FILE_NAME);
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        body,
    )
        .into_response())
}
