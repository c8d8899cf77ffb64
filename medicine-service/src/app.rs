use std::any::Any;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use common_auth::{JwtConfig, JwtVerifier};
use common_http_errors::ApiError;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
};
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::config::{HttpConfig, JwtSettings, HEALTH_PATH};
use crate::instrumentation::track_requests;
use crate::medicine_handlers::{complete_sale, create_medicine, delete_medicine, list_medicines, update_medicine};

/// Medicine API behind the request instrumentation, plus the unmetered scrape and health routes.
pub fn build_router(state: AppState, http: &HttpConfig) -> Router {
    let api = Router::new()
        .route("/api/medicine/GetAllMedicines", get(list_medicines))
        .route("/api/medicine/CreateNewMedicine", post(create_medicine))
        .route("/api/medicine/UpdateMedicine/:id", put(update_medicine))
        .route("/api/medicine/DeleteMedicine/:id", put(delete_medicine))
        .route("/api/medicine/CompleteSale", post(complete_sale))
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.metrics.clone(), track_requests))
                .layer(cors_layer(&http.cors_allowed_origins))
                .layer(CatchPanicLayer::custom(panic_response)),
        );

    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(&http.metrics_path, get(metrics_endpoint))
        .with_state(state)
        .merge(api)
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            error!(%err, "metrics encode failed");
            ApiError::internal(err).into_response()
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "handler panicked");
    ApiError::Internal { message: None }.into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION])
}

/// HS256 when a shared secret is configured, otherwise RS256 from a PEM public key.
pub fn build_jwt_verifier(settings: &JwtSettings) -> Result<JwtVerifier> {
    let mut config = JwtConfig::new();
    if let Some(issuer) = &settings.issuer {
        config = config.with_issuer(issuer.clone());
    }
    if let Some(audience) = &settings.audience {
        config = config.with_audience(audience.clone());
    }
    if let Some(leeway) = settings.leeway_seconds {
        config = config.with_leeway(leeway);
    }

    let mut builder = JwtVerifier::builder(config);
    if let Some(secret) = &settings.secret {
        builder = builder.with_hmac_secret(secret.as_bytes());
    } else if let Some(pem) = &settings.public_key_pem {
        builder = builder
            .with_rsa_pem(pem.as_bytes())
            .context("JWT_PUBLIC_KEY_PEM is not a valid RSA public key")?;
    }
    if settings.secret.is_some() && settings.public_key_pem.is_some() {
        warn!("both JWT_SECRET and JWT_PUBLIC_KEY_PEM set; using the shared secret");
    }

    let verifier = builder.build().context("JWT verifier needs a key")?;
    info!(algorithm = ?verifier.algorithm(), "JWT verifier initialised");
    Ok(verifier)
}
