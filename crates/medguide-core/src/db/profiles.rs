//! Profile database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Profile;

const PROFILE_COLUMNS: &str = "id, account_id, full_name, is_staff, is_doctor, avatar_url, \
     specialty, work_location, employee_id, created_at, updated_at";

/// Values for a profile row that doesn't exist yet.
#[derive(Debug, Clone)]
pub struct NewProfile<'a> {
    pub account_id: i64,
    pub full_name: &'a str,
    pub is_staff: bool,
    pub is_doctor: bool,
    pub employee_id: &'a str,
    pub created_at: &'a str,
}

impl Database {
    /// Insert a profile unless the account already has one.
    ///
    /// Returns the stored profile either way, so concurrent first accesses
    /// converge on a single row.
    pub fn insert_profile_if_absent(&self, profile: &NewProfile<'_>) -> DbResult<Profile> {
        self.conn.execute(
            r#"
            INSERT INTO profiles (
                account_id, full_name, is_staff, is_doctor, employee_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(account_id) DO NOTHING
            "#,
            params![
                profile.account_id,
                profile.full_name,
                profile.is_staff,
                profile.is_doctor,
                profile.employee_id,
                profile.created_at,
            ],
        )?;

        self.get_profile_by_account(profile.account_id)?
            .ok_or_else(|| super::DbError::NotFound(format!("profile for account {}", profile.account_id)))
    }

    /// Overwrite the editable fields of a profile.
    pub fn update_profile(&self, profile: &Profile) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE profiles SET
                full_name = ?2,
                avatar_url = ?3,
                specialty = ?4,
                work_location = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                profile.id,
                profile.full_name,
                profile.avatar_url,
                profile.specialty,
                profile.work_location,
                profile.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a profile by row ID.
    pub fn get_profile(&self, id: i64) -> DbResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?");
        self.conn
            .query_row(&sql, [id], profile_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Get the profile owned by an account.
    pub fn get_profile_by_account(&self, account_id: i64) -> DbResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE account_id = ?");
        self.conn
            .query_row(&sql, [account_id], profile_from_row)
            .optional()
            .map_err(Into::into)
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        account_id: row.get(1)?,
        full_name: row.get(2)?,
        is_staff: row.get(3)?,
        is_doctor: row.get(4)?,
        avatar_url: row.get(5)?,
        specialty: row.get(6)?,
        work_location: row.get(7)?,
        employee_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
