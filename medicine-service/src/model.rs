use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use common_http_errors::ApiError;
use serde::{Deserialize, Serialize};

pub const STATUS_ACTIVE: i32 = 1;
pub const STATUS_DELETED: i32 = 0;

/// Amounts are stored as `NUMERIC(18, 2)`.
pub const AMOUNT_SCALE: i64 = 2;
const AMOUNT_INTEGER_DIGITS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: i32,
    pub name: String,
    pub manufacturer: String,
    pub unit_price: BigDecimal,
    pub discount: BigDecimal,
    pub quantity: i32,
    pub exp_date: NaiveDate,
    pub image_url: String,
    pub status: i32,
}

impl Medicine {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

/// Writable fields of a medicine. `id` and `status` sent by callers are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInput {
    pub name: String,
    #[serde(default)]
    pub manufacturer: String,
    pub unit_price: BigDecimal,
    #[serde(default)]
    pub discount: BigDecimal,
    #[serde(default)]
    pub quantity: i32,
    pub exp_date: NaiveDate,
    #[serde(default)]
    pub image_url: String,
}

impl MedicineInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::bad_request("invalid_medicine", "Medicine name is required."));
        }
        check_amount("Unit price", &self.unit_price)?;
        check_amount("Discount", &self.discount)
    }

    pub(crate) fn into_medicine(self, id: i32, status: i32) -> Medicine {
        Medicine {
            id,
            name: self.name,
            manufacturer: self.manufacturer,
            unit_price: self.unit_price,
            discount: self.discount,
            quantity: self.quantity,
            exp_date: self.exp_date,
            image_url: self.image_url,
            status,
        }
    }
}

fn check_amount(field: &str, amount: &BigDecimal) -> Result<(), ApiError> {
    if *amount < BigDecimal::from(0) {
        return Err(ApiError::bad_request("invalid_medicine", format!("{field} cannot be negative.")));
    }
    if amount.with_scale(AMOUNT_SCALE) != *amount {
        return Err(ApiError::bad_request(
            "invalid_medicine",
            format!("{field} cannot have more than {AMOUNT_SCALE} decimal places."),
        ));
    }
    if *amount >= BigDecimal::from(10i64.pow(AMOUNT_INTEGER_DIGITS)) {
        return Err(ApiError::bad_request("invalid_medicine", format!("{field} is too large.")));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct MedicineResponse {
    pub message: &'static str,
    pub medicine: Medicine,
}
