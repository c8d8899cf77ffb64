use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::{Medicine, MedicineInput, STATUS_ACTIVE, STATUS_DELETED};
use crate::store::{MedicineStore, SaleOutcome, StoreResult};

/// Process-local store used for demos and tests. Ids are assigned from 1.
pub struct InMemoryMedicineStore {
    state: Mutex<MemoryState>,
}

struct MemoryState {
    rows: BTreeMap<i32, Medicine>,
    next_id: i32,
}

impl InMemoryMedicineStore {
    pub fn new() -> Self {
        Self { state: Mutex::new(MemoryState { rows: BTreeMap::new(), next_id: 1 }) }
    }
}

impl Default for InMemoryMedicineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MedicineStore for InMemoryMedicineStore {
    async fn list(&self) -> StoreResult<Vec<Medicine>> {
        let state = self.state.lock().await;
        Ok(state.rows.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Medicine>> {
        let state = self.state.lock().await;
        Ok(state.rows.get(&id).cloned())
    }

    async fn insert(&self, input: MedicineInput) -> StoreResult<Medicine> {
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;
        let medicine = input.into_medicine(id, STATUS_ACTIVE);
        state.rows.insert(id, medicine.clone());
        Ok(medicine)
    }

    async fn update(&self, id: i32, input: MedicineInput) -> StoreResult<Option<Medicine>> {
        let mut state = self.state.lock().await;
        Ok(state.rows.get_mut(&id).map(|row| {
            *row = input.into_medicine(id, row.status);
            row.clone()
        }))
    }

    async fn soft_delete(&self, id: i32) -> StoreResult<Option<Medicine>> {
        let mut state = self.state.lock().await;
        Ok(state.rows.get_mut(&id).map(|row| {
            row.status = STATUS_DELETED;
            row.clone()
        }))
    }

    async fn complete_sale(&self, name: &str, quantity: i32) -> StoreResult<SaleOutcome> {
        let mut state = self.state.lock().await;
        let Some(row) = state.rows.values_mut().find(|row| row.name == name) else {
            return Ok(SaleOutcome::NotFound);
        };
        if row.quantity < quantity {
            return Ok(SaleOutcome::InsufficientStock { on_hand: row.quantity });
        }
        row.quantity -= quantity;
        Ok(SaleOutcome::Completed(row.clone()))
    }
}
