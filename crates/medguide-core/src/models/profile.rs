//! Profile models.

use serde::{Deserialize, Serialize};

/// Prefix of generated employee identifiers.
pub const EMPLOYEE_ID_PREFIX: &str = "DOC";

/// The authenticated account a profile belongs to, as supplied by the request layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Account identity
    pub id: i64,
    /// Display name, if the account has one
    pub full_name: Option<String>,
    /// Login email
    pub email: Option<String>,
    /// Staff flag from the account
    pub is_staff: bool,
}

/// A doctor/staff profile, one-to-one with an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Row ID
    pub id: i64,
    /// Owning account
    pub account_id: i64,
    pub full_name: String,
    pub is_staff: bool,
    pub is_doctor: bool,
    pub avatar_url: Option<String>,
    pub specialty: Option<String>,
    pub work_location: Option<String>,
    /// Unique, assigned on creation
    pub employee_id: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub specialty: Option<String>,
    pub work_location: Option<String>,
}

impl Account {
    /// Name used for a freshly created profile.
    pub fn default_profile_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.avatar_url.is_none()
            && self.specialty.is_none()
            && self.work_location.is_none()
    }

    /// Apply to a profile in place.
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.full_name {
            profile.full_name = name.clone();
        }
        if let Some(url) = &self.avatar_url {
            profile.avatar_url = Some(url.clone());
        }
        if let Some(specialty) = &self.specialty {
            profile.specialty = Some(specialty.clone());
        }
        if let Some(location) = &self.work_location {
            profile.work_location = Some(location.clone());
        }
    }
}

/// Generate an employee identifier: `DOC-{account}-{unix seconds}-{6 hex}`.
pub fn generate_employee_id(account_id: i64, now: chrono::DateTime<chrono::Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}-{}",
        EMPLOYEE_ID_PREFIX,
        account_id,
        now.timestamp(),
        &suffix[..6]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(full_name: Option<&str>, email: Option<&str>) -> Account {
        Account {
            id: 42,
            full_name: full_name.map(String::from),
            email: email.map(String::from),
            is_staff: true,
        }
    }

    #[test]
    fn test_default_profile_name() {
        assert_eq!(
            account(Some("Dr. Ivanova"), Some("a@b.c")).default_profile_name(),
            "Dr. Ivanova"
        );
        assert_eq!(account(Some("  "), Some("a@b.c")).default_profile_name(), "a@b.c");
        assert_eq!(account(None, None).default_profile_name(), "");
    }

    #[test]
    fn test_employee_id_format() {
        let now = chrono::Utc::now();
        let id = generate_employee_id(42, now);
        let parts: Vec<&str> = id.split('-').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "DOC");
        assert_eq!(parts[1], "42");
        assert_eq!(parts[2], now.timestamp().to_string());
        assert_eq!(parts[3].len(), 6);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_employee_ids_differ() {
        let now = chrono::Utc::now();
        assert_ne!(generate_employee_id(1, now), generate_employee_id(1, now));
    }

    #[test]
    fn test_update_apply() {
        let mut profile = Profile {
            id: 1,
            account_id: 42,
            full_name: "Old".into(),
            is_staff: false,
            is_doctor: false,
            avatar_url: None,
            specialty: Some("Surgery".into()),
            work_location: None,
            employee_id: "DOC-42-0-abcdef".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let update = ProfileUpdate {
            full_name: Some("New".into()),
            work_location: Some("Ward 3".into()),
            ..Default::default()
        };
        update.apply(&mut profile);

        assert_eq!(profile.full_name, "New");
        assert_eq!(profile.specialty, Some("Surgery".into()));
        assert_eq!(profile.work_location, Some("Ward 3".into()));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }
}
