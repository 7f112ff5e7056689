use chrono::NaiveDate;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
pub struct ErrorBodyDoc {
    pub error: String,
    pub detail: Option<String>,
    /// Present on import failures, always 0.
    pub created: Option<u64>,
}

#[derive(ToSchema)]
pub struct PrestationInputDoc {
    pub order_number: Option<i32>,
    pub date: NaiveDate,
    pub last_name: String,
    pub first_name: String,
    pub invoice_number: String,
    pub patient_index: String,
    pub matricule: String,
    pub specialty: String,
    pub act: String,
    pub rate_percent: f64,
    pub patient_share: f64,
    pub employee_share: f64,
    pub total_amount: f64,
    pub adjustment: f64,
}

/// Every key optional; `order_number: null` clears the value.
#[derive(ToSchema)]
pub struct PrestationPatchDoc {
    pub order_number: Option<i32>,
    pub date: Option<NaiveDate>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub invoice_number: Option<String>,
    pub patient_index: Option<String>,
    pub matricule: Option<String>,
    pub specialty: Option<String>,
    pub act: Option<String>,
    pub rate_percent: Option<f64>,
    pub patient_share: Option<f64>,
    pub employee_share: Option<f64>,
    pub total_amount: Option<f64>,
    pub adjustment: Option<f64>,
}

#[derive(ToSchema)]
pub struct PrestationReadDoc {
    pub id: i32,
    pub order_number: Option<i32>,
    pub date: NaiveDate,
    pub last_name: String,
    pub first_name: String,
    pub invoice_number: String,
    pub patient_index: String,
    pub matricule: String,
    pub specialty: String,
    pub act: String,
    pub rate_percent: f64,
    pub patient_share: f64,
    pub employee_share: f64,
    pub total_amount: f64,
    pub adjustment: f64,
}

#[derive(ToSchema)]
pub struct PrestationPageDoc {
    pub items: Vec<PrestationReadDoc>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(ToSchema)]
pub struct ImportUploadDoc {
    /// Legacy `.xls` workbook.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(ToSchema)]
pub struct ImportSummaryDoc { pub created: u64 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::meta::root,
        crate::routes::meta::health,
        crate::routes::meta::config,
        crate::routes::prestations::list,
        crate::routes::prestations::page,
        crate::routes::prestations::get,
        crate::routes::prestations::create,
        crate::routes::prestations::replace,
        crate::routes::prestations::patch,
        crate::routes::prestations::delete,
        crate::routes::prestations::import,
        crate::routes::prestations::export,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            ErrorBodyDoc,
            PrestationInputDoc,
            PrestationPatchDoc,
            PrestationReadDoc,
            PrestationPageDoc,
            ImportUploadDoc,
            ImportSummaryDoc,
            crate::routes::meta::ApiSettings,
        )
    ),
    tags(
        (name = "meta"),
        (name = "prestations")
    )
)]
pub struct ApiDoc;
