//! Dispense event database operations.
//!
//! Events are append-only: there is an insert and reads, nothing else.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{DispenseEntry, DispenseEvent, MedicineSummary};

impl Database {
    /// Append a dispense event.
    pub fn insert_dispense_event(
        &self,
        doctor_id: Option<i64>,
        medicine_id: i64,
        quantity: i64,
        issued_at: &str,
    ) -> DbResult<DispenseEvent> {
        self.conn.execute(
            r#"
            INSERT INTO dispense_events (doctor_id, medicine_id, quantity, issued_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![doctor_id, medicine_id, quantity, issued_at],
        )?;

        Ok(DispenseEvent {
            id: self.conn.last_insert_rowid(),
            doctor_id,
            medicine_id: Some(medicine_id),
            quantity,
            issued_at: issued_at.to_string(),
        })
    }

    /// Get a dispense event by ID.
    pub fn get_dispense_event(&self, id: i64) -> DbResult<Option<DispenseEvent>> {
        self.conn
            .query_row(
                r#"
                SELECT id, doctor_id, medicine_id, quantity, issued_at
                FROM dispense_events
                WHERE id = ?
                "#,
                [id],
                event_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a doctor's dispense events with their medicines, newest first.
    pub fn list_dispenses_for_doctor(&self, doctor_id: i64) -> DbResult<Vec<DispenseEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.id, e.doctor_id, e.medicine_id, e.quantity, e.issued_at,
                   m.id, m.name, m.mnn, m.form, m.dosage, m.article, m.qr_payload
            FROM dispense_events e
            LEFT JOIN medicines m ON m.id = e.medicine_id
            WHERE e.doctor_id = ?
            ORDER BY e.issued_at DESC, e.id DESC
            "#,
        )?;

        let rows = stmt.query_map([doctor_id], |row| {
            let event = event_from_row(row)?;
            let medicine_row_id: Option<i64> = row.get(5)?;
            let medicine = match medicine_row_id {
                Some(id) => Some(MedicineSummary {
                    id,
                    name: row.get(6)?,
                    mnn: row.get(7)?,
                    form: row.get(8)?,
                    dosage: row.get(9)?,
                    article: row.get(10)?,
                    qr_payload: row.get(11)?,
                }),
                None => None,
            };
            Ok(DispenseEntry { event, medicine })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Total quantity ever dispensed of a medicine.
    pub fn total_dispensed(&self, medicine_id: i64) -> DbResult<i64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM dispense_events WHERE medicine_id = ?",
            [medicine_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Number of events in the ledger.
    pub fn count_dispense_events(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dispense_events", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<DispenseEvent> {
    Ok(DispenseEvent {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        medicine_id: row.get(2)?,
        quantity: row.get(3)?,
        issued_at: row.get(4)?,
    })
}
