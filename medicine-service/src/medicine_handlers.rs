use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use common_http_errors::{ApiError, ApiResult};
use common_security::{ensure_capability, AuthHeader, Capability, SecurityCtxExtractor};
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::model::{Medicine, MedicineInput, MedicineResponse, SaleRequest};
use crate::store::{SaleOutcome, StoreError};

pub const UPDATED_MESSAGE: &str = "Medicine updated successfully.";
pub const DELETED_MESSAGE: &str = "Medicine deleted successfully.";
pub const SALE_COMPLETED_MESSAGE: &str = "Sale completed successfully.";

const MEDICINE_NOT_FOUND: &str = "medicine_not_found";

fn store_failure(err: StoreError) -> ApiError {
    error!(%err, "medicine store call failed");
    ApiError::internal(err)
}

/// Only requires a non-empty Authorization header; the token is not decoded.
pub async fn list_medicines(
    State(state): State<AppState>,
    AuthHeader(_): AuthHeader,
) -> ApiResult<Json<Vec<Medicine>>> {
    let medicines = state.store.list().await.map_err(store_failure)?;
    Ok(Json(medicines))
}

pub async fn create_medicine(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    payload: Result<Json<MedicineInput>, JsonRejection>,
) -> ApiResult<Json<Medicine>> {
    ensure_capability(&sec, Capability::MedicineWrite)?;
    let Json(input) = payload?;
    input.validate()?;
    let medicine = state.store.insert(input).await.map_err(store_failure)?;
    info!(medicine_id = medicine.id, name = %medicine.name, quantity = medicine.quantity, "medicine created");
    Ok(Json(medicine))
}

pub async fn update_medicine(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<MedicineInput>, JsonRejection>,
) -> ApiResult<Json<MedicineResponse>> {
    ensure_capability(&sec, Capability::MedicineWrite)?;
    let Path(id) = id?;
    let Json(input) = payload?;
    input.validate()?;
    let medicine = state
        .store
        .update(id, input)
        .await
        .map_err(store_failure)?
        .ok_or_else(|| ApiError::not_found(MEDICINE_NOT_FOUND))?;
    info!(medicine_id = id, name = %medicine.name, "medicine updated");
    Ok(Json(MedicineResponse { message: UPDATED_MESSAGE, medicine }))
}

pub async fn delete_medicine(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<MedicineResponse>> {
    ensure_capability(&sec, Capability::MedicineWrite)?;
    let Path(id) = id?;
    let medicine = state
        .store
        .soft_delete(id)
        .await
        .map_err(store_failure)?
        .ok_or_else(|| ApiError::not_found(MEDICINE_NOT_FOUND))?;
    info!(medicine_id = id, "medicine soft-deleted");
    Ok(Json(MedicineResponse { message: DELETED_MESSAGE, medicine }))
}

pub async fn complete_sale(
    State(state): State<AppState>,
    SecurityCtxExtractor(sec): SecurityCtxExtractor,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<Json<MedicineResponse>> {
    ensure_capability(&sec, Capability::SaleComplete)?;
    let Json(sale) = payload?;
    if sale.quantity < 1 {
        return Err(ApiError::bad_request("invalid_quantity", "Quantity must be at least 1."));
    }
    match state
        .store
        .complete_sale(&sale.name, sale.quantity)
        .await
        .map_err(store_failure)?
    {
        SaleOutcome::Completed(medicine) => {
            if !medicine.is_active() {
                warn!(medicine_id = medicine.id, "sale completed against a soft-deleted medicine");
            }
            state.metrics.medicine_sold(&medicine.name, sale.quantity);
            info!(
                medicine_id = medicine.id,
                name = %medicine.name,
                quantity = sale.quantity,
                remaining = medicine.quantity,
                "sale completed"
            );
            Ok(Json(MedicineResponse { message: SALE_COMPLETED_MESSAGE, medicine }))
        }
        SaleOutcome::NotFound => Err(ApiError::not_found(MEDICINE_NOT_FOUND)),
        SaleOutcome::InsufficientStock { on_hand } => {
            warn!(name = %sale.name, requested = sale.quantity, on_hand, "sale rejected: not enough stock");
            Err(ApiError::InsufficientStock { requested: sale.quantity, on_hand })
        }
    }
}
