pub mod meta;
pub mod prestations;

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use configs::{ApiConfig, AppConfig};
use service::prestation::{PrestationRepository, PrestationService};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub prestations: Arc<PrestationService>,
    pub config: Arc<AppConfig>,
}

impl ServerState {
    pub fn new(repo: Arc<dyn PrestationRepository>, config: AppConfig) -> Self {
        let prestations = Arc::new(PrestationService::new(repo, config.api.max_page_size));
        Self { prestations, config: Arc::new(config) }
    }
}

/// CORS from the configured origins; `*` (or no origin at all) allows everything.
pub fn build_cors(api: &ApiConfig) -> CorsLayer {
    if api.allows_any_origin() {
        return CorsLayer::very_permissive();
    }
    let origins: Vec<HeaderValue> = api
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the full application router: meta routes at the root, the
/// prestation resource under the configured prefix.
pub fn build_router(state: ServerState) -> Router {
    let upload_limit = state.config.api.max_upload_bytes;
    let prefix = state.config.api.prefix.clone();
    let cors = build_cors(&state.config.api);

    let api = Router::new()
        .route("/config", get(meta::config))
        .route("/prestations", get(prestations::list).post(prestations::create))
        .route("/prestations/page", get(prestations::page))
        .route("/prestations/export", get(prestations::export))
        .route(
            "/prestations/import",
            post(prestations::import)
                .layer::<_, Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_limit)),
        )
        .route(
            "/prestations/:id",
            get(prestations::get)
                .put(prestations::replace)
                .patch(prestations::patch)
                .delete(prestations::delete),
        );

    let public = Router::new()
        .route("/", get(meta::root))
        .route("/health", get(meta::health))
        .route("/api-docs/openapi.json", get(meta::openapi_json));

    let app = if prefix.is_empty() { public.merge(api) } else { public.nest(&prefix, api) };

    app.with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx and transport errors
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                ),
        )
}
