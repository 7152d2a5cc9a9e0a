//! SQLite schema definition.

/// Complete database schema for medguide.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medicine Catalogue
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article TEXT NOT NULL UNIQUE,                 -- MG-NNNNN
    qr_payload TEXT NOT NULL UNIQUE,              -- med:MG-NNNNN
    name TEXT NOT NULL,
    mnn TEXT NOT NULL DEFAULT '',
    form TEXT NOT NULL DEFAULT '',
    dosage TEXT NOT NULL DEFAULT '',
    min_stock INTEGER NOT NULL,
    stock INTEGER NOT NULL CHECK (stock >= 0),
    stock_per_pack INTEGER NOT NULL DEFAULT 0,
    diff INTEGER NOT NULL,
    name_folded TEXT NOT NULL DEFAULT '',         -- lowercase copy for search
    mnn_folded TEXT NOT NULL DEFAULT '',          -- lowercase copy for search
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (diff = min_stock - stock)
);

CREATE INDEX IF NOT EXISTS idx_medicines_name ON medicines(name);

-- ============================================================================
-- Profiles
-- ============================================================================

CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL UNIQUE,
    full_name TEXT NOT NULL DEFAULT '',
    is_staff INTEGER NOT NULL DEFAULT 0,
    is_doctor INTEGER NOT NULL DEFAULT 0,
    avatar_url TEXT,
    specialty TEXT,
    work_location TEXT,
    employee_id TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- ============================================================================
-- Dispense Events (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS dispense_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doctor_id INTEGER REFERENCES profiles(id) ON DELETE SET NULL,
    medicine_id INTEGER REFERENCES medicines(id) ON DELETE SET NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    issued_at TEXT NOT NULL                       -- RFC 3339 UTC, fixed width
);

CREATE INDEX IF NOT EXISTS idx_dispense_doctor ON dispense_events(doctor_id, issued_at);
CREATE INDEX IF NOT EXISTS idx_dispense_medicine ON dispense_events(medicine_id);

-- Only the reference columns may change, and only through ON DELETE SET NULL.
CREATE TRIGGER IF NOT EXISTS dispense_events_no_update
BEFORE UPDATE OF quantity, issued_at ON dispense_events
BEGIN
    SELECT RAISE(ABORT, 'Dispense events are immutable');
END;

CREATE TRIGGER IF NOT EXISTS dispense_events_no_delete
BEFORE DELETE ON dispense_events
BEGIN
    SELECT RAISE(ABORT, 'Dispense events cannot be deleted');
END;
"#;
