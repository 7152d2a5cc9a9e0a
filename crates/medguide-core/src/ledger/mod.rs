//! Dispense ledger.
//!
//! Recording a dispense appends an immutable event and decrements the
//! medicine's stock in the same transaction: either both land or neither.

use tracing::{info, instrument, warn};

use crate::db::Database;
use crate::error::{InventoryError, InventoryResult};
use crate::models::{now_timestamp, DispenseEntry, DispenseEvent, MedicineRecord};

/// Result of a successful dispense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispenseReceipt {
    /// The appended event
    pub event: DispenseEvent,
    /// The medicine after its stock was adjusted
    pub medicine: MedicineRecord,
    /// Units that could not be covered by stock (stock was clamped at zero)
    pub shortfall: i64,
}

/// Ledger operations bound to one database handle.
pub struct DispenseLedger<'a> {
    db: &'a Database,
}

impl<'a> DispenseLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record that `doctor_id` handed out `quantity` units of `medicine_id`.
    pub fn record_dispense(
        &self,
        doctor_id: i64,
        medicine_id: i64,
        quantity: i64,
    ) -> InventoryResult<DispenseEvent> {
        self.dispense(doctor_id, medicine_id, quantity)
            .map(|receipt| receipt.event)
    }

    /// Like [`DispenseLedger::record_dispense`], also returning the adjusted medicine.
    #[instrument(skip(self))]
    pub fn dispense(
        &self,
        doctor_id: i64,
        medicine_id: i64,
        quantity: i64,
    ) -> InventoryResult<DispenseReceipt> {
        if quantity <= 0 {
            return Err(InventoryError::validation(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }

        let tx = self.db.begin_immediate()?;

        let medicine = self
            .db
            .get_medicine(medicine_id)?
            .ok_or_else(|| InventoryError::not_found(format!("medicine {}", medicine_id)))?;
        if self.db.get_profile(doctor_id)?.is_none() {
            return Err(InventoryError::not_found(format!("profile {}", doctor_id)));
        }

        let now = now_timestamp();
        let event = self
            .db
            .insert_dispense_event(Some(doctor_id), medicine_id, quantity, &now)?;
        let adjusted = self
            .db
            .adjust_stock(&medicine.article, -quantity, &now)?
            .ok_or_else(|| InventoryError::not_found(format!("medicine {}", medicine_id)))?;

        tx.commit()?;

        let shortfall = (quantity - medicine.stock).max(0);
        if shortfall > 0 {
            warn!(
                article = %adjusted.article,
                requested = quantity,
                available = medicine.stock,
                "dispensed more than in stock, stock clamped at zero"
            );
        }
        info!(
            event_id = event.id,
            article = %adjusted.article,
            stock = adjusted.stock,
            diff = adjusted.diff,
            "recorded dispense"
        );

        Ok(DispenseReceipt {
            event,
            medicine: adjusted,
            shortfall,
        })
    }

    /// A doctor's dispense history, newest first.
    pub fn list_by_doctor(&self, doctor_id: i64) -> InventoryResult<Vec<DispenseEntry>> {
        Ok(self.db.list_dispenses_for_doctor(doctor_id)?)
    }

    /// Get one event.
    pub fn get(&self, event_id: i64) -> InventoryResult<DispenseEvent> {
        self.db
            .get_dispense_event(event_id)?
            .ok_or_else(|| InventoryError::not_found(format!("dispense event {}", event_id)))
    }
}
