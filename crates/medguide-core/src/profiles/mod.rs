//! Doctor/staff profiles.

use tracing::info;

use crate::db::{Database, NewProfile};
use crate::error::{InventoryError, InventoryResult};
use crate::models::{generate_employee_id, now_timestamp, Account, Profile, ProfileUpdate};

/// Profile operations bound to one database handle.
pub struct Profiles<'a> {
    db: &'a Database,
}

impl<'a> Profiles<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Return the account's profile, creating it on first access.
    ///
    /// Idempotent: later calls return the stored profile unchanged, even if
    /// the account's name or flags have changed since.
    pub fn get_or_create_profile(&self, account: &Account) -> InventoryResult<Profile> {
        if let Some(profile) = self.db.get_profile_by_account(account.id)? {
            return Ok(profile);
        }

        let now = chrono::Utc::now();
        let full_name = account.default_profile_name();
        let employee_id = generate_employee_id(account.id, now);
        let created_at = crate::models::ledger_timestamp(now);

        let profile = self.db.insert_profile_if_absent(&NewProfile {
            account_id: account.id,
            full_name: &full_name,
            is_staff: account.is_staff,
            is_doctor: account.is_staff,
            employee_id: &employee_id,
            created_at: &created_at,
        })?;

        if profile.employee_id == employee_id {
            info!(account_id = account.id, employee_id = %profile.employee_id, "created profile");
        }
        Ok(profile)
    }

    /// Get a profile by row ID.
    pub fn get(&self, profile_id: i64) -> InventoryResult<Profile> {
        self.db
            .get_profile(profile_id)?
            .ok_or_else(|| InventoryError::not_found(format!("profile {}", profile_id)))
    }

    /// Get the profile owned by an account.
    pub fn find_by_account(&self, account_id: i64) -> InventoryResult<Profile> {
        self.db
            .get_profile_by_account(account_id)?
            .ok_or_else(|| InventoryError::not_found(format!("profile for account {}", account_id)))
    }

    /// Partially update the account's profile, creating it first if missing.
    pub fn update_profile(&self, account: &Account, update: &ProfileUpdate) -> InventoryResult<Profile> {
        let mut profile = self.get_or_create_profile(account)?;
        if update.is_empty() {
            return Ok(profile);
        }

        update.apply(&mut profile);
        profile.updated_at = now_timestamp();
        if !self.db.update_profile(&profile)? {
            return Err(InventoryError::not_found(format!("profile {}", profile.id)));
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: i64) -> Account {
        Account {
            id,
            full_name: None,
            email: Some(format!("doctor{}@clinic.example", id)),
            is_staff: true,
        }
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let profiles = Profiles::new(&db);

        let first = profiles.get_or_create_profile(&account(5)).unwrap();
        let second = profiles.get_or_create_profile(&account(5)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.full_name, "doctor5@clinic.example");
        assert!(first.is_staff);
        assert!(first.is_doctor);
        assert!(first.employee_id.starts_with("DOC-5-"));
    }

    #[test]
    fn test_non_staff_account_is_not_doctor() {
        let db = Database::open_in_memory().unwrap();
        let profiles = Profiles::new(&db);

        let mut acc = account(6);
        acc.is_staff = false;
        let profile = profiles.get_or_create_profile(&acc).unwrap();
        assert!(!profile.is_doctor);
    }

    #[test]
    fn test_lookups() {
        let db = Database::open_in_memory().unwrap();
        let profiles = Profiles::new(&db);
        let created = profiles.get_or_create_profile(&account(8)).unwrap();

        assert_eq!(profiles.get(created.id).unwrap(), created);
        assert_eq!(profiles.find_by_account(8).unwrap(), created);
        assert!(matches!(profiles.get(404), Err(InventoryError::NotFound(_))));
        assert!(matches!(profiles.find_by_account(404), Err(InventoryError::NotFound(_))));
    }

    #[test]
    fn test_update_creates_and_updates() {
        let db = Database::open_in_memory().unwrap();
        let profiles = Profiles::new(&db);

        let updated = profiles
            .update_profile(
                &account(9),
                &ProfileUpdate {
                    specialty: Some("Pediatrics".into()),
                    work_location: Some("Clinic 2".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = profiles.find_by_account(9).unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.specialty, Some("Pediatrics".into()));
        assert_eq!(stored.full_name, "doctor9@clinic.example");
    }
}
