//! Dispense ledger models.

use serde::{Deserialize, Serialize};

use super::medicine::MedicineSummary;

/// An immutable record of medicine handed out by a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispenseEvent {
    /// Row ID
    pub id: i64,
    /// Issuing profile, null once the profile is deleted
    pub doctor_id: Option<i64>,
    /// Dispensed medicine, null once the medicine is deleted
    pub medicine_id: Option<i64>,
    /// Units handed out, always positive
    pub quantity: i64,
    /// Creation timestamp (RFC 3339, UTC, microsecond precision)
    pub issued_at: String,
}

/// A dispense event together with the medicine it refers to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispenseEntry {
    #[serde(flatten)]
    pub event: DispenseEvent,
    /// Missing when the medicine was removed from the catalogue
    pub medicine: Option<MedicineSummary>,
}

/// Timestamp format used for `issued_at`.
///
/// Fixed width, so lexicographic order matches chronological order.
pub fn ledger_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ledger_timestamp_fixed_width() {
        let whole = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let fractional = whole + chrono::Duration::microseconds(1500);

        let a = ledger_timestamp(whole);
        let b = ledger_timestamp(fractional);
        assert_eq!(a, "2024-05-01T12:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_entry_serializes_flat() {
        let entry = DispenseEntry {
            event: DispenseEvent {
                id: 7,
                doctor_id: Some(1),
                medicine_id: None,
                quantity: 3,
                issued_at: "2024-05-01T12:00:00.000000Z".into(),
            },
            medicine: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["quantity"], 3);
        assert!(json["medicine"].is_null());
    }
}
