//! Domain models for the medguide system.

mod dispense;
mod medicine;
mod profile;

pub use dispense::*;
pub use medicine::*;
pub use profile::*;

/// Current time in the fixed-width format used for every stored timestamp.
pub fn now_timestamp() -> String {
    ledger_timestamp(chrono::Utc::now())
}
