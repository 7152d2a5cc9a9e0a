//! Bulk catalogue seeding.
//!
//! Input is a flat list keyed by a zero-based sequence number. Article and QR
//! payload are derived from that number, so loading the same list again
//! updates the same rows instead of adding new ones.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::Catalogue;
use crate::db::UpsertOutcome;
use crate::error::{InventoryError, InventoryResult};
use crate::models::{build_article, build_qr_payload, MedicineFields, MAX_SEQUENCE};

/// Catalogue shipped with the library.
pub const DEFAULT_CATALOGUE_JSON: &str = include_str!("../../data/medicines.json");

/// Seed file errors.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed data: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of a seed list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedRecord {
    /// Zero-based sequence number
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub mnn: String,
    #[serde(default)]
    pub form: String,
    #[serde(default)]
    pub dosage: String,
    pub min_stock: i64,
    pub stock: i64,
    #[serde(default)]
    pub stock_per_pack: i64,
}

/// Seeding options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOptions {
    /// Delete every existing medicine before loading
    pub clear: bool,
}

/// A record that could not be loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedFailure {
    pub id: u32,
    pub reason: String,
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<SeedFailure>,
}

impl SeedRecord {
    pub fn article(&self) -> String {
        build_article(self.id)
    }

    pub fn qr_payload(&self) -> String {
        build_qr_payload(&self.article())
    }

    pub fn fields(&self) -> MedicineFields {
        MedicineFields {
            name: self.name.clone(),
            mnn: self.mnn.clone(),
            form: self.form.clone(),
            dosage: self.dosage.clone(),
            min_stock: self.min_stock,
            stock: self.stock,
            stock_per_pack: self.stock_per_pack,
        }
    }
}

impl SeedReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn loaded(&self) -> usize {
        self.created + self.updated
    }
}

/// Parse a JSON seed list.
pub fn parse_seed_records(json: &str) -> Result<Vec<SeedRecord>, SeedError> {
    Ok(serde_json::from_str(json)?)
}

/// Read a JSON seed list from disk.
pub fn load_seed_file<P: AsRef<Path>>(path: P) -> Result<Vec<SeedRecord>, SeedError> {
    let json = std::fs::read_to_string(path)?;
    parse_seed_records(&json)
}

/// The catalogue shipped with the library.
pub fn default_catalogue() -> Result<Vec<SeedRecord>, SeedError> {
    parse_seed_records(DEFAULT_CATALOGUE_JSON)
}

impl Catalogue<'_> {
    /// Load a seed list.
    ///
    /// Runs in one transaction. A record that fails validation or storage is
    /// reported in [`SeedReport::failures`] and the rest still load.
    pub fn seed(&self, records: &[SeedRecord], options: SeedOptions) -> InventoryResult<SeedReport> {
        let tx = self.db.begin_immediate()?;
        let mut report = SeedReport::default();

        if options.clear {
            report.deleted = self.db.clear_medicines()?;
            warn!(deleted = report.deleted, "cleared catalogue before seeding");
        }

        for record in records {
            if record.id > MAX_SEQUENCE {
                report.failures.push(SeedFailure {
                    id: record.id,
                    reason: format!("sequence number exceeds {}", MAX_SEQUENCE),
                });
                continue;
            }

            match self.upsert_with_outcome(&record.article(), &record.fields()) {
                Ok((_, UpsertOutcome::Created)) => report.created += 1,
                Ok((_, UpsertOutcome::Updated)) => report.updated += 1,
                Err(e @ InventoryError::Conflict(_)) => return Err(e),
                Err(e) => {
                    warn!(id = record.id, error = %e, "failed to load medicine");
                    report.failures.push(SeedFailure {
                        id: record.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tx.commit()?;
        info!(
            created = report.created,
            updated = report.updated,
            failed = report.failed(),
            "catalogue seeded"
        );
        Ok(report)
    }

    /// Load the catalogue shipped with the library.
    pub fn seed_default(&self, options: SeedOptions) -> InventoryResult<SeedReport> {
        let records = default_catalogue()
            .map_err(|e| InventoryError::validation(format!("bundled catalogue is invalid: {}", e)))?;
        self.seed(&records, options)
    }
}
