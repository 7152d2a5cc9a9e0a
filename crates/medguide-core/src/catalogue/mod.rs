//! Medicine catalogue.
//!
//! Lookup, search, upsert and atomic stock adjustment on top of an injected
//! [`Database`] handle. Seeding lives in [`seed`].

mod seed;

pub use seed::*;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::db::{Database, UpsertOutcome};
use crate::error::{InventoryError, InventoryResult};
use crate::models::{
    adjusted_stock, build_article, code_from_scan, fold_case, is_valid_article, normalize_code,
    now_timestamp, MedicineFields, MedicineRecord,
};

/// Catalogue operations bound to one database handle.
pub struct Catalogue<'a> {
    db: &'a Database,
}

impl<'a> Catalogue<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create or replace the record keyed by `article`.
    ///
    /// The QR payload is derived from the article and `diff` is recomputed,
    /// so repeating the call with the same input converges on the same row.
    pub fn upsert(&self, article: &str, fields: &MedicineFields) -> InventoryResult<MedicineRecord> {
        self.upsert_with_outcome(article, fields).map(|(record, _)| record)
    }

    /// Like [`Catalogue::upsert`], also reporting whether the row was new.
    pub fn upsert_with_outcome(
        &self,
        article: &str,
        fields: &MedicineFields,
    ) -> InventoryResult<(MedicineRecord, UpsertOutcome)> {
        let article = normalize_code(article);
        validate_fields(&article, fields)?;

        let (record, outcome) = self.db.upsert_medicine(&article, fields, &now_timestamp())?;
        debug!(article = %record.article, ?outcome, stock = record.stock, diff = record.diff, "upserted medicine");
        Ok((record, outcome))
    }

    /// Find a medicine by article. Input is trimmed and upper-cased.
    pub fn find_by_article(&self, article: &str) -> InventoryResult<MedicineRecord> {
        let article = normalize_code(article);
        if article.is_empty() {
            return Err(InventoryError::validation("article must not be empty"));
        }
        self.db
            .get_medicine_by_article(&article)?
            .ok_or_else(|| InventoryError::not_found(format!("medicine with article {}", article)))
    }

    /// Find a medicine by its scanned QR payload.
    pub fn find_by_qr_payload(&self, payload: &str) -> InventoryResult<MedicineRecord> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(InventoryError::validation("QR payload must not be empty"));
        }
        self.db
            .get_medicine_by_qr(payload)?
            .ok_or_else(|| InventoryError::not_found(format!("medicine with QR payload {}", payload)))
    }

    /// Find a medicine by article, QR payload, medicine link, or its
    /// zero-based catalogue number.
    pub fn find_by_any_code(&self, code: &str) -> InventoryResult<MedicineRecord> {
        let normalized = code_from_scan(code);
        if normalized.is_empty() {
            return Err(InventoryError::validation("code must not be empty"));
        }

        if let Some(record) = self.db.get_medicine_by_article(&normalized)? {
            return Ok(record);
        }

        if let Ok(sequence) = normalized.parse::<u32>() {
            if let Some(record) = self.db.get_medicine_by_article(&build_article(sequence))? {
                return Ok(record);
            }
        }

        Err(InventoryError::not_found(format!("medicine with code {}", normalized)))
    }

    /// Get a medicine by row ID.
    pub fn get(&self, id: i64) -> InventoryResult<MedicineRecord> {
        self.db
            .get_medicine(id)?
            .ok_or_else(|| InventoryError::not_found(format!("medicine {}", id)))
    }

    /// All medicines, ordered by name.
    pub fn list(&self) -> InventoryResult<Vec<MedicineRecord>> {
        Ok(self.db.list_medicines()?)
    }

    /// Case-insensitive substring search over name, article and MNN.
    ///
    /// An empty (or whitespace-only) query is an input error, not an empty result.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> InventoryResult<Vec<MedicineRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(InventoryError::validation("search query must not be empty"));
        }
        let results = self.db.search_medicines(&fold_case(query))?;
        debug!(matches = results.len(), "catalogue search");
        Ok(results)
    }

    /// Apply `delta` to stock, clamped at zero, and recompute `diff` from the
    /// clamped value. Atomic per record.
    ///
    /// A delta that would push stock past `i64::MAX` is a validation error and
    /// leaves the record untouched.
    pub fn adjust_stock(&self, article: &str, delta: i64) -> InventoryResult<MedicineRecord> {
        let article = normalize_code(article);
        if let Some(record) = self.db.adjust_stock(&article, delta, &now_timestamp())? {
            return Ok(record);
        }

        match self.db.get_medicine_by_article(&article)? {
            None => Err(InventoryError::not_found(format!("medicine with article {}", article))),
            Some(current) if adjusted_stock(current.stock, delta).is_none() => {
                Err(InventoryError::validation(format!(
                    "adjusting stock of {} ({}) by {} overflows",
                    article, current.stock, delta
                )))
            }
            // The guard failed against a stock value that has since changed.
            Some(_) => Err(InventoryError::Conflict(format!(
                "stock of {} changed during adjustment",
                article
            ))),
        }
    }

    /// Remove a medicine. Dispense history is kept with a null reference.
    pub fn delete(&self, article: &str) -> InventoryResult<()> {
        let article = normalize_code(article);
        if self.db.delete_medicine(&article)? {
            Ok(())
        } else {
            Err(InventoryError::not_found(format!("medicine with article {}", article)))
        }
    }

    /// Medicines under their required buffer, largest shortage first.
    pub fn shortages(&self) -> InventoryResult<Vec<MedicineRecord>> {
        Ok(self.db.list_short_medicines()?)
    }

    /// SHA-256 over the canonical content of every record, ordered by article.
    ///
    /// Timestamps and row IDs are excluded: two catalogues with the same
    /// articles and values have the same fingerprint.
    pub fn fingerprint(&self) -> InventoryResult<String> {
        let mut records = self.db.list_medicines()?;
        records.sort_by(|a, b| a.article.cmp(&b.article));

        let canonical: Vec<CanonicalMedicine<'_>> = records.iter().map(CanonicalMedicine::from).collect();
        let json = serde_json::to_string(&canonical).map_err(crate::db::DbError::from)?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

fn validate_fields(article: &str, fields: &MedicineFields) -> InventoryResult<()> {
    if !is_valid_article(article) {
        return Err(InventoryError::validation(format!(
            "article {:?} does not match MG-NNNNN",
            article
        )));
    }
    if fields.name.trim().is_empty() {
        return Err(InventoryError::validation("name must not be empty"));
    }
    if fields.stock < 0 {
        return Err(InventoryError::validation("stock must not be negative"));
    }
    if fields.min_stock < 0 {
        return Err(InventoryError::validation("min_stock must not be negative"));
    }
    Ok(())
}

/// Field order here is the hashed order.
#[derive(Serialize)]
struct CanonicalMedicine<'r> {
    article: &'r str,
    qr_payload: &'r str,
    name: &'r str,
    mnn: &'r str,
    form: &'r str,
    dosage: &'r str,
    min_stock: i64,
    stock: i64,
    stock_per_pack: i64,
    diff: i64,
}

impl<'r> From<&'r MedicineRecord> for CanonicalMedicine<'r> {
    fn from(m: &'r MedicineRecord) -> Self {
        Self {
            article: &m.article,
            qr_payload: &m.qr_payload,
            name: &m.name,
            mnn: &m.mnn,
            form: &m.form,
            dosage: &m.dosage,
            min_stock: m.min_stock,
            stock: m.stock,
            stock_per_pack: m.stock_per_pack,
            diff: m.diff,
        }
    }
}
