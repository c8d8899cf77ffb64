use std::sync::Arc;

use axum::extract::FromRef;
use common_auth::JwtVerifier;

use crate::metrics::MedicineMetrics;
use crate::store::{MedicineStore, TimedStore};

/// Shared application state used by handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MedicineStore>,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub metrics: Arc<MedicineMetrics>,
}

impl AppState {
    /// Wraps `store` so every call is timed into `database_query_duration_seconds`.
    pub fn new<S>(store: S, jwt_verifier: Arc<JwtVerifier>, metrics: Arc<MedicineMetrics>) -> Self
    where
        S: MedicineStore + 'static,
    {
        let timed = TimedStore::new(store, metrics.database_query_duration_seconds.clone());
        Self { store: Arc::new(timed), jwt_verifier, metrics }
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

impl FromRef<AppState> for Arc<MedicineMetrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
