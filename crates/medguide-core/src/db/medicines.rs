//! Medicine catalogue database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{build_qr_payload, fold_case, MedicineFields, MedicineRecord};

const MEDICINE_COLUMNS: &str = "id, article, qr_payload, name, mnn, form, dosage, \
     min_stock, stock, stock_per_pack, diff, created_at, updated_at";

/// Whether an upsert inserted a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl Database {
    /// Insert or replace a medicine keyed by article. `diff` is always recomputed.
    pub fn upsert_medicine(
        &self,
        article: &str,
        fields: &MedicineFields,
        now: &str,
    ) -> DbResult<(MedicineRecord, UpsertOutcome)> {
        let existed = self.medicine_exists(article)?;

        let sql = format!(
            r#"
            INSERT INTO medicines (
                article, qr_payload, name, mnn, form, dosage,
                min_stock, stock, stock_per_pack, diff,
                name_folded, mnn_folded, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?7 - ?8, ?10, ?11, ?12, ?12)
            ON CONFLICT(article) DO UPDATE SET
                qr_payload = excluded.qr_payload,
                name = excluded.name,
                mnn = excluded.mnn,
                form = excluded.form,
                dosage = excluded.dosage,
                min_stock = excluded.min_stock,
                stock = excluded.stock,
                stock_per_pack = excluded.stock_per_pack,
                diff = excluded.diff,
                name_folded = excluded.name_folded,
                mnn_folded = excluded.mnn_folded,
                updated_at = excluded.updated_at
            RETURNING {MEDICINE_COLUMNS}
            "#
        );

        let record = self.conn.query_row(
            &sql,
            params![
                article,
                build_qr_payload(article),
                fields.name,
                fields.mnn,
                fields.form,
                fields.dosage,
                fields.min_stock,
                fields.stock,
                fields.stock_per_pack,
                fold_case(&fields.name),
                fold_case(&fields.mnn),
                now,
            ],
            medicine_from_row,
        )?;

        let outcome = if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        };
        Ok((record, outcome))
    }

    /// Check whether an article is present.
    pub fn medicine_exists(&self, article: &str) -> DbResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM medicines WHERE article = ?)",
            [article],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Get a medicine by row ID.
    pub fn get_medicine(&self, id: i64) -> DbResult<Option<MedicineRecord>> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?");
        self.conn
            .query_row(&sql, [id], medicine_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Get a medicine by exact article.
    pub fn get_medicine_by_article(&self, article: &str) -> DbResult<Option<MedicineRecord>> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE article = ?");
        self.conn
            .query_row(&sql, [article], medicine_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Get a medicine by exact QR payload.
    pub fn get_medicine_by_qr(&self, payload: &str) -> DbResult<Option<MedicineRecord>> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE qr_payload = ?");
        self.conn
            .query_row(&sql, [payload], medicine_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Substring search over name, article and MNN.
    ///
    /// `needle` must already be case-folded with [`fold_case`].
    pub fn search_medicines(&self, needle: &str) -> DbResult<Vec<MedicineRecord>> {
        let sql = format!(
            r#"
            SELECT {MEDICINE_COLUMNS}
            FROM medicines
            WHERE instr(name_folded, ?1) > 0
               OR instr(lower(article), ?1) > 0
               OR instr(mnn_folded, ?1) > 0
            ORDER BY name, article
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([needle], medicine_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List every medicine, ordered by name.
    pub fn list_medicines(&self) -> DbResult<Vec<MedicineRecord>> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines ORDER BY name, article");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], medicine_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List medicines whose stock is under `min_stock`, largest shortage first.
    pub fn list_short_medicines(&self) -> DbResult<Vec<MedicineRecord>> {
        let sql = format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE diff > 0 ORDER BY diff DESC, article"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], medicine_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Atomically apply `delta` to stock, clamped at zero, and recompute `diff`.
    ///
    /// The read-modify-write happens inside a single statement, so concurrent
    /// adjustments of the same row cannot lose updates. Returns `None` when the
    /// article does not exist or when `stock + delta` would exceed `i64::MAX`;
    /// SQLite would otherwise store the sum as a REAL.
    pub fn adjust_stock(
        &self,
        article: &str,
        delta: i64,
        now: &str,
    ) -> DbResult<Option<MedicineRecord>> {
        let sql = format!(
            r#"
            UPDATE medicines SET
                stock = MAX(0, stock + ?2),
                diff = min_stock - MAX(0, stock + ?2),
                updated_at = ?3
            WHERE article = ?1
              AND (?2 <= 0 OR stock <= 9223372036854775807 - ?2)
            RETURNING {MEDICINE_COLUMNS}
            "#
        );
        self.conn
            .query_row(&sql, params![article, delta, now], medicine_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Delete a medicine. Dispense history keeps the event with a null reference.
    pub fn delete_medicine(&self, article: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM medicines WHERE article = ?", [article])?;
        Ok(rows_affected > 0)
    }

    /// Delete every medicine. Returns the number of rows removed.
    pub fn clear_medicines(&self) -> DbResult<usize> {
        Ok(self.conn.execute("DELETE FROM medicines", [])?)
    }

    /// Number of medicines in the catalogue.
    pub fn count_medicines(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM medicines", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

pub(crate) fn medicine_from_row(row: &Row<'_>) -> rusqlite::Result<MedicineRecord> {
    Ok(MedicineRecord {
        id: row.get(0)?,
        article: row.get(1)?,
        qr_payload: row.get(2)?,
        name: row.get(3)?,
        mnn: row.get(4)?,
        form: row.get(5)?,
        dosage: row.get(6)?,
        min_stock: row.get(7)?,
        stock: row.get(8)?,
        stock_per_pack: row.get(9)?,
        diff: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
