use async_trait::async_trait;
use sqlx::{query_as, PgPool};

use crate::model::{Medicine, MedicineInput, STATUS_ACTIVE, STATUS_DELETED};
use crate::store::{MedicineStore, SaleOutcome, StoreResult};

const LIST_MEDICINES_SQL: &str = "SELECT id, name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status \
     FROM medicines ORDER BY id";

const GET_MEDICINE_SQL: &str = "SELECT id, name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status \
     FROM medicines WHERE id = $1";

const INSERT_MEDICINE_SQL: &str = "INSERT INTO medicines (name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
     RETURNING id, name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status";

const UPDATE_MEDICINE_SQL: &str = "UPDATE medicines SET name = $1, manufacturer = $2, unit_price = $3, discount = $4, \
     quantity = $5, exp_date = $6, image_url = $7 WHERE id = $8 \
     RETURNING id, name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status";

const SOFT_DELETE_MEDICINE_SQL: &str = "UPDATE medicines SET status = $1 WHERE id = $2 \
     RETURNING id, name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status";

const LOCK_MEDICINE_BY_NAME_SQL: &str = "SELECT id, name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status \
     FROM medicines WHERE name = $1 ORDER BY id LIMIT 1 FOR UPDATE";

const DECREMENT_STOCK_SQL: &str = "UPDATE medicines SET quantity = quantity - $1 WHERE id = $2 \
     RETURNING id, name, manufacturer, unit_price, discount, quantity, exp_date, image_url, status";

#[derive(Clone)]
pub struct PgMedicineStore {
    db: PgPool,
}

impl PgMedicineStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MedicineStore for PgMedicineStore {
    async fn list(&self) -> StoreResult<Vec<Medicine>> {
        let rows = query_as::<_, Medicine>(LIST_MEDICINES_SQL).fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Medicine>> {
        let row = query_as::<_, Medicine>(GET_MEDICINE_SQL)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn insert(&self, input: MedicineInput) -> StoreResult<Medicine> {
        let row = query_as::<_, Medicine>(INSERT_MEDICINE_SQL)
            .bind(input.name)
            .bind(input.manufacturer)
            .bind(input.unit_price)
            .bind(input.discount)
            .bind(input.quantity)
            .bind(input.exp_date)
            .bind(input.image_url)
            .bind(STATUS_ACTIVE)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, input: MedicineInput) -> StoreResult<Option<Medicine>> {
        let row = query_as::<_, Medicine>(UPDATE_MEDICINE_SQL)
            .bind(input.name)
            .bind(input.manufacturer)
            .bind(input.unit_price)
            .bind(input.discount)
            .bind(input.quantity)
            .bind(input.exp_date)
            .bind(input.image_url)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn soft_delete(&self, id: i32) -> StoreResult<Option<Medicine>> {
        let row = query_as::<_, Medicine>(SOFT_DELETE_MEDICINE_SQL)
            .bind(STATUS_DELETED)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn complete_sale(&self, name: &str, quantity: i32) -> StoreResult<SaleOutcome> {
        let mut tx = self.db.begin().await?;
        // Row lock held until commit; dropping `tx` on an early return rolls back.
        let locked = query_as::<_, Medicine>(LOCK_MEDICINE_BY_NAME_SQL)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(medicine) = locked else {
            return Ok(SaleOutcome::NotFound);
        };
        if medicine.quantity < quantity {
            return Ok(SaleOutcome::InsufficientStock { on_hand: medicine.quantity });
        }
        let updated = query_as::<_, Medicine>(DECREMENT_STOCK_SQL)
            .bind(quantity)
            .bind(medicine.id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(SaleOutcome::Completed(updated))
    }
}
