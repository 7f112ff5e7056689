use axum::{extract::State, Json};
use common::types::{Health, Message};
use serde::Serialize;
use utoipa::OpenApi;

use crate::openapi::ApiDoc;
use crate::routes::ServerState;

/// Public view of the API settings.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ApiSettings {
    pub project_name: String,
    pub cors_origins: Vec<String>,
    pub api_prefix: String,
}

#[utoipa::path(get, path = "/", tag = "meta", responses((status = 200, description = "Greeting", body = crate::openapi::MessageDoc)))]
pub async fn root() -> Json<Message> {
    Json(Message { message: "Hello World".into() })
}

#[utoipa::path(get, path = "/health", tag = "meta", responses((status = 200, description = "Healthy", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[utoipa::path(get, path = "/api/v1/config", tag = "meta", responses((status = 200, description = "API settings", body = ApiSettings)))]
pub async fn config(State(state): State<ServerState>) -> Json<ApiSettings> {
    let api = &state.config.api;
    Json(ApiSettings {
        project_name: api.project_name.clone(),
        cors_origins: api.cors_origins.clone(),
        api_prefix: api.prefix.clone(),
    })
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
