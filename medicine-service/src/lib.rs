pub mod app;
pub mod app_state;
pub mod config;
pub mod instrumentation;
pub mod medicine_handlers;
pub mod memory_store;
pub mod metrics;
pub mod model;
pub mod pg_store;
pub mod store;

pub use app::{build_jwt_verifier, build_router};
pub use app_state::AppState;
pub use common_http_errors::ApiError;
pub use memory_store::InMemoryMedicineStore;
pub use metrics::MedicineMetrics;
pub use pg_store::PgMedicineStore;
pub use store::{MedicineStore, SaleOutcome, StoreError, TimedStore};
