//! Data store seam for the medicine catalog.
//!
//! Handlers only ever see `Arc<dyn MedicineStore>`; [`crate::app_state::AppState`]
//! wraps whatever backend it is given in a [`TimedStore`] so every call site is
//! measured exactly once.

use async_trait::async_trait;
use common_observability::HistogramHandle;
use thiserror::Error;

use crate::model::{Medicine, MedicineInput};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SaleOutcome {
    Completed(Medicine),
    NotFound,
    InsufficientStock { on_hand: i32 },
}

#[async_trait]
pub trait MedicineStore: Send + Sync {
    /// Every row, soft-deleted included, ordered by id.
    async fn list(&self) -> StoreResult<Vec<Medicine>>;
    async fn get(&self, id: i32) -> StoreResult<Option<Medicine>>;
    async fn insert(&self, input: MedicineInput) -> StoreResult<Medicine>;
    /// Overwrites every field except `id` and `status`. `None` when the id is unknown.
    async fn update(&self, id: i32, input: MedicineInput) -> StoreResult<Option<Medicine>>;
    async fn soft_delete(&self, id: i32) -> StoreResult<Option<Medicine>>;
    /// Check-then-decrement for the lowest-id row named `name`, serialised per row.
    async fn complete_sale(&self, name: &str, quantity: i32) -> StoreResult<SaleOutcome>;
}

pub const OP_LIST: &str = "list";
pub const OP_GET: &str = "get";
pub const OP_INSERT: &str = "insert";
pub const OP_UPDATE: &str = "update";
pub const OP_SOFT_DELETE: &str = "soft_delete";
pub const OP_COMPLETE_SALE: &str = "complete_sale";

/// Records the wall time of each store call into a histogram labelled by operation.
/// The timer observes on drop, so failed calls are measured too.
pub struct TimedStore<S> {
    inner: S,
    timer: HistogramHandle,
}

impl<S> TimedStore<S> {
    pub fn new(inner: S, timer: HistogramHandle) -> Self {
        Self { inner, timer }
    }
}

#[async_trait]
impl<S: MedicineStore> MedicineStore for TimedStore<S> {
    async fn list(&self) -> StoreResult<Vec<Medicine>> {
        let _timer = self.timer.start_timer(&[OP_LIST]);
        self.inner.list().await
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Medicine>> {
        let _timer = self.timer.start_timer(&[OP_GET]);
        self.inner.get(id).await
    }

    async fn insert(&self, input: MedicineInput) -> StoreResult<Medicine> {
        let _timer = self.timer.start_timer(&[OP_INSERT]);
        self.inner.insert(input).await
    }

    async fn update(&self, id: i32, input: MedicineInput) -> StoreResult<Option<Medicine>> {
        let _timer = self.timer.start_timer(&[OP_UPDATE]);
        self.inner.update(id, input).await
    }

    async fn soft_delete(&self, id: i32) -> StoreResult<Option<Medicine>> {
        let _timer = self.timer.start_timer(&[OP_SOFT_DELETE]);
        self.inner.soft_delete(id).await
    }

    async fn complete_sale(&self, name: &str, quantity: i32) -> StoreResult<SaleOutcome> {
        let _timer = self.timer.start_timer(&[OP_COMPLETE_SALE]);
        self.inner.complete_sale(name, quantity).await
    }
}
