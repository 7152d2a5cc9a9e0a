//! MedGuide Core Library
//!
//! Clinic medicine inventory: catalogue, stock and the dispense ledger.
//!
//! # Architecture
//!
//! ```text
//!   Seed list ──▶ Catalogue::seed ──┐
//!                                   ▼
//!   Scan / search ──▶ Catalogue ──▶ medicines (stock, min_stock, diff)
//!                                   ▲
//!                                   │ adjust_stock(-quantity)
//!                                   │
//!   Doctor ──▶ Profiles ──▶ DispenseLedger ──▶ dispense_events (append-only)
//!                                   │
//!                                   ▼
//!                            Shortage report
//! ```
//!
//! # Core Principle
//!
//! **A dispense and its stock decrement commit together or not at all.** Stock
//! never goes below zero and `diff` always equals `min_stock - stock`.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence layer
//! - [`models`]: Domain types (MedicineRecord, DispenseEvent, Profile)
//! - [`catalogue`]: Medicine lookup, search, stock adjustment and seeding
//! - [`ledger`]: Dispense recording and history
//! - [`profiles`]: Lazily created doctor profiles
//! - [`export`]: Shortage report export
//! - [`config`], [`telemetry`]: Process configuration and logging

pub mod catalogue;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ledger;
pub mod models;
pub mod profiles;
pub mod telemetry;

// Re-export commonly used types
pub use catalogue::{Catalogue, SeedOptions, SeedRecord, SeedReport};
pub use config::CoreConfig;
pub use db::Database;
pub use error::{InventoryError, InventoryResult};
pub use export::ShortageReport;
pub use ledger::{DispenseLedger, DispenseReceipt};
pub use models::{
    Account, DispenseEntry, DispenseEvent, MedicineFields, MedicineRecord, MedicineSummary,
    Profile, ProfileUpdate,
};
pub use profiles::Profiles;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedGuideError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflicting write, retry: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<InventoryError> for MedGuideError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::Validation(msg) => MedGuideError::ValidationError(msg),
            InventoryError::NotFound(msg) => MedGuideError::NotFound(msg),
            InventoryError::Conflict(msg) => MedGuideError::Conflict(msg),
            InventoryError::Database(e) => MedGuideError::DatabaseError(e.to_string()),
        }
    }
}

impl From<db::DbError> for MedGuideError {
    fn from(e: db::DbError) -> Self {
        InventoryError::from(e).into()
    }
}

impl From<serde_json::Error> for MedGuideError {
    fn from(e: serde_json::Error) -> Self {
        MedGuideError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedGuideError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedGuideError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MedGuideCore>, MedGuideError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(MedGuideCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MedGuideCore>, MedGuideError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(MedGuideCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MedGuideCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl MedGuideCore {
    // =========================================================================
    // Catalogue Operations
    // =========================================================================

    /// Create or update the medicine with the given article.
    pub fn upsert_medicine(
        &self,
        article: String,
        fields: FfiMedicineFields,
    ) -> Result<FfiMedicine, MedGuideError> {
        let db = self.db.lock()?;
        let medicine = Catalogue::new(&db).upsert(&article, &fields.into())?;
        Ok(medicine.into())
    }

    /// Look up a medicine by article.
    pub fn get_by_article(&self, article: String) -> Result<FfiMedicine, MedGuideError> {
        let db = self.db.lock()?;
        Ok(Catalogue::new(&db).find_by_article(&article)?.into())
    }

    /// Look up a medicine by scanned QR payload.
    pub fn get_by_qr(&self, payload: String) -> Result<FfiMedicine, MedGuideError> {
        let db = self.db.lock()?;
        Ok(Catalogue::new(&db).find_by_qr_payload(&payload)?.into())
    }

    /// Look up a medicine by article, QR payload or sequence number.
    pub fn find_by_any_code(&self, code: String) -> Result<FfiMedicine, MedGuideError> {
        let db = self.db.lock()?;
        Ok(Catalogue::new(&db).find_by_any_code(&code)?.into())
    }

    /// All medicines ordered by name.
    pub fn list_medicines(&self) -> Result<Vec<FfiMedicine>, MedGuideError> {
        let db = self.db.lock()?;
        let medicines = Catalogue::new(&db).list()?;
        Ok(medicines.into_iter().map(|m| m.into()).collect())
    }

    /// Case-insensitive substring search by name, article or MNN.
    pub fn search_medicines(&self, query: String) -> Result<Vec<FfiMedicine>, MedGuideError> {
        let db = self.db.lock()?;
        let medicines = Catalogue::new(&db).search(&query)?;
        Ok(medicines.into_iter().map(|m| m.into()).collect())
    }

    /// Load the bundled catalogue.
    pub fn seed_default_catalogue(&self, clear: bool) -> Result<FfiSeedReport, MedGuideError> {
        let db = self.db.lock()?;
        let report = Catalogue::new(&db).seed_default(SeedOptions { clear })?;
        Ok(report.into())
    }

    /// Content hash of the catalogue, ignoring row IDs and timestamps.
    pub fn catalogue_fingerprint(&self) -> Result<String, MedGuideError> {
        let db = self.db.lock()?;
        Ok(Catalogue::new(&db).fingerprint()?)
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// The account's profile, created on first access.
    pub fn get_or_create_profile(&self, account: FfiAccount) -> Result<FfiProfile, MedGuideError> {
        let db = self.db.lock()?;
        let profile = Profiles::new(&db).get_or_create_profile(&account.into())?;
        Ok(profile.into())
    }

    /// Update the account's profile.
    pub fn update_profile(
        &self,
        account: FfiAccount,
        update: FfiProfileUpdate,
    ) -> Result<FfiProfile, MedGuideError> {
        let db = self.db.lock()?;
        let profile = Profiles::new(&db).update_profile(&account.into(), &update.into())?;
        Ok(profile.into())
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Record a dispense and decrement stock.
    pub fn record_dispense(
        &self,
        doctor_id: i64,
        medicine_id: i64,
        quantity: i64,
    ) -> Result<FfiDispenseEntry, MedGuideError> {
        let db = self.db.lock()?;
        let receipt = DispenseLedger::new(&db).dispense(doctor_id, medicine_id, quantity)?;
        Ok(FfiDispenseEntry {
            id: receipt.event.id,
            doctor_id: receipt.event.doctor_id,
            medicine_id: receipt.event.medicine_id,
            quantity: receipt.event.quantity,
            issued_at: receipt.event.issued_at,
            article: Some(receipt.medicine.article),
            medicine_name: Some(receipt.medicine.name),
        })
    }

    /// The doctor's dispense history, newest first.
    pub fn list_my_dispenses(&self, doctor_id: i64) -> Result<Vec<FfiDispenseEntry>, MedGuideError> {
        let db = self.db.lock()?;
        let entries = DispenseLedger::new(&db).list_by_doctor(doctor_id)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the shortage report as JSON.
    pub fn shortage_report_json(&self) -> Result<String, MedGuideError> {
        let db = self.db.lock()?;
        let report = ShortageReport::build(&Catalogue::new(&db))?;
        Ok(report.to_json()?)
    }

    /// Export the shortage report as CSV.
    pub fn shortage_report_csv(&self) -> Result<String, MedGuideError> {
        let db = self.db.lock()?;
        let report = ShortageReport::build(&Catalogue::new(&db))?;
        Ok(report.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub id: i64,
    pub article: String,
    pub qr_payload: String,
    pub name: String,
    pub mnn: String,
    pub form: String,
    pub dosage: String,
    pub min_stock: i64,
    pub stock: i64,
    pub stock_per_pack: i64,
    pub diff: i64,
    pub updated_at: String,
}

impl From<MedicineRecord> for FfiMedicine {
    fn from(m: MedicineRecord) -> Self {
        Self {
            id: m.id,
            article: m.article,
            qr_payload: m.qr_payload,
            name: m.name,
            mnn: m.mnn,
            form: m.form,
            dosage: m.dosage,
            min_stock: m.min_stock,
            stock: m.stock,
            stock_per_pack: m.stock_per_pack,
            diff: m.diff,
            updated_at: m.updated_at,
        }
    }
}

/// FFI-safe medicine attributes for upsert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicineFields {
    pub name: String,
    pub mnn: String,
    pub form: String,
    pub dosage: String,
    pub min_stock: i64,
    pub stock: i64,
    pub stock_per_pack: i64,
}

impl From<FfiMedicineFields> for MedicineFields {
    fn from(f: FfiMedicineFields) -> Self {
        MedicineFields {
            name: f.name,
            mnn: f.mnn,
            form: f.form,
            dosage: f.dosage,
            min_stock: f.min_stock,
            stock: f.stock,
            stock_per_pack: f.stock_per_pack,
        }
    }
}

/// FFI-safe caller account.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAccount {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub is_staff: bool,
}

impl From<FfiAccount> for Account {
    fn from(a: FfiAccount) -> Self {
        Account {
            id: a.id,
            full_name: a.full_name,
            email: a.email,
            is_staff: a.is_staff,
        }
    }
}

/// FFI-safe profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProfile {
    pub id: i64,
    pub account_id: i64,
    pub full_name: String,
    pub is_staff: bool,
    pub is_doctor: bool,
    pub avatar_url: Option<String>,
    pub specialty: Option<String>,
    pub work_location: Option<String>,
    pub employee_id: String,
}

impl From<Profile> for FfiProfile {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            account_id: p.account_id,
            full_name: p.full_name,
            is_staff: p.is_staff,
            is_doctor: p.is_doctor,
            avatar_url: p.avatar_url,
            specialty: p.specialty,
            work_location: p.work_location,
            employee_id: p.employee_id,
        }
    }
}

/// FFI-safe partial profile update.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub specialty: Option<String>,
    pub work_location: Option<String>,
}

impl From<FfiProfileUpdate> for ProfileUpdate {
    fn from(u: FfiProfileUpdate) -> Self {
        ProfileUpdate {
            full_name: u.full_name,
            avatar_url: u.avatar_url,
            specialty: u.specialty,
            work_location: u.work_location,
        }
    }
}

/// FFI-safe dispense history entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDispenseEntry {
    pub id: i64,
    pub doctor_id: Option<i64>,
    pub medicine_id: Option<i64>,
    pub quantity: i64,
    pub issued_at: String,
    pub article: Option<String>,
    pub medicine_name: Option<String>,
}

impl From<DispenseEntry> for FfiDispenseEntry {
    fn from(entry: DispenseEntry) -> Self {
        let (article, medicine_name) = match entry.medicine {
            Some(m) => (Some(m.article), Some(m.name)),
            None => (None, None),
        };
        Self {
            id: entry.event.id,
            doctor_id: entry.event.doctor_id,
            medicine_id: entry.event.medicine_id,
            quantity: entry.event.quantity,
            issued_at: entry.event.issued_at,
            article,
            medicine_name,
        }
    }
}

/// FFI-safe seeding result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSeedReport {
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub failed: u64,
}

impl From<SeedReport> for FfiSeedReport {
    fn from(r: SeedReport) -> Self {
        let count = |n: usize| u64::try_from(n).unwrap_or(u64::MAX);
        Self {
            created: count(r.created),
            updated: count(r.updated),
            deleted: count(r.deleted),
            failed: count(r.failed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor_account(id: i64) -> FfiAccount {
        FfiAccount {
            id,
            full_name: Some("Dr. Ivanova".into()),
            email: None,
            is_staff: true,
        }
    }

    #[test]
    fn test_seed_lookup_and_dispense() {
        let core = open_database_in_memory().unwrap();
        let report = core.seed_default_catalogue(false).unwrap();
        assert_eq!(report.created, 39);

        let by_qr = core.get_by_qr("med:MG-00005".into()).unwrap();
        let by_article = core.get_by_article("mg-00005".into()).unwrap();
        assert_eq!(by_qr.id, by_article.id);
        assert_eq!(by_qr.stock, 453);

        let doctor = core.get_or_create_profile(doctor_account(1)).unwrap();
        let entry = core.record_dispense(doctor.id, by_qr.id, 10).unwrap();
        assert_eq!(entry.article.as_deref(), Some("MG-00005"));

        let after = core.get_by_article("MG-00005".into()).unwrap();
        assert_eq!(after.stock, 443);
        assert_eq!(after.diff, after.min_stock - 443);

        let history = core.list_my_dispenses(doctor.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, entry.id);
    }

    #[test]
    fn test_errors_cross_the_boundary() {
        let core = open_database_in_memory().unwrap();

        assert!(matches!(
            core.search_medicines("  ".into()),
            Err(MedGuideError::ValidationError(_))
        ));
        assert!(matches!(
            core.get_by_article("MG-00001".into()),
            Err(MedGuideError::NotFound(_))
        ));

        let doctor = core.get_or_create_profile(doctor_account(1)).unwrap();
        let medicine = core
            .upsert_medicine(
                "MG-00001".into(),
                FfiMedicineFields {
                    name: "Альбумин".into(),
                    mnn: "Альбумин".into(),
                    form: "раствор".into(),
                    dosage: "20%".into(),
                    min_stock: 90,
                    stock: 48,
                    stock_per_pack: 0,
                },
            )
            .unwrap();
        assert_eq!(medicine.diff, 42);
        assert!(matches!(
            core.record_dispense(doctor.id, medicine.id, 0),
            Err(MedGuideError::ValidationError(_))
        ));
    }

    #[test]
    fn test_search_matches_article() {
        let core = open_database_in_memory().unwrap();
        core.seed_default_catalogue(false).unwrap();

        let hits = core.search_medicines("mg-0000".into()).unwrap();
        assert_eq!(hits.len(), 9);
        assert!(hits.iter().all(|m| m.article.starts_with("MG-0000")));
    }

    #[test]
    fn test_seed_report_counts_convert() {
        let report = SeedReport {
            created: 70_000,
            updated: 3,
            deleted: 1,
            failures: vec![catalogue::SeedFailure {
                id: 100_000,
                reason: "sequence number exceeds 99998".into(),
            }],
        };
        let ffi = FfiSeedReport::from(report);
        assert_eq!(ffi.created, 70_000);
        assert_eq!(ffi.updated, 3);
        assert_eq!(ffi.deleted, 1);
        assert_eq!(ffi.failed, 1);
    }

    #[test]
    fn test_update_profile() {
        let core = open_database_in_memory().unwrap();
        let profile = core
            .update_profile(
                doctor_account(3),
                FfiProfileUpdate {
                    full_name: None,
                    avatar_url: None,
                    specialty: Some("Therapist".into()),
                    work_location: None,
                },
            )
            .unwrap();
        assert_eq!(profile.full_name, "Dr. Ivanova");
        assert_eq!(profile.specialty.as_deref(), Some("Therapist"));
    }

    #[test]
    fn test_shortage_exports() {
        let core = open_database_in_memory().unwrap();
        core.seed_default_catalogue(false).unwrap();

        let csv = core.shortage_report_csv().unwrap();
        assert!(csv.starts_with("article,name,mnn,form,dosage,min_stock,stock,diff\n"));

        let json = core.shortage_report_json().unwrap();
        assert!(json.contains("\"total_missing\""));

        let fingerprint = core.catalogue_fingerprint().unwrap();
        core.seed_default_catalogue(false).unwrap();
        assert_eq!(core.catalogue_fingerprint().unwrap(), fingerprint);
    }
}
