//! Medicine catalogue models.

use serde::{Deserialize, Serialize};

/// Prefix of every catalogue article code.
pub const ARTICLE_PREFIX: &str = "MG-";

/// Prefix of every QR payload. Not a URL, so scanners don't open a browser.
pub const QR_PREFIX: &str = "med:";

/// Link form printed on older labels; the last path segment is the article.
pub const MEDICINE_LINK_PREFIX: &str = "https://medguide.app/medicine/";

/// Number of digits in the numeric part of an article.
pub const ARTICLE_DIGITS: usize = 5;

/// Highest zero-based sequence number that still yields a five-digit article.
pub const MAX_SEQUENCE: u32 = 99_998;

/// A medicine in the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineRecord {
    /// Row ID, stable across upserts
    pub id: i64,
    /// Catalogue code (e.g., "MG-00001")
    pub article: String,
    /// Scannable payload, always `med:` + article
    pub qr_payload: String,
    /// Display name (may list several brand names)
    pub name: String,
    /// International nonproprietary name
    pub mnn: String,
    /// Dosage form (e.g., "таблетки №20")
    pub form: String,
    /// Dosage strength (e.g., "400 мг")
    pub dosage: String,
    /// Required buffer quantity
    pub min_stock: i64,
    /// Current on-hand quantity, never negative
    pub stock: i64,
    /// Informational packaging multiplier
    pub stock_per_pack: i64,
    /// Shortage metric: `min_stock - stock`
    pub diff: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Caller-supplied attributes of a medicine, everything except identity and `diff`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MedicineFields {
    pub name: String,
    pub mnn: String,
    pub form: String,
    pub dosage: String,
    pub min_stock: i64,
    pub stock: i64,
    pub stock_per_pack: i64,
}

/// Reduced medicine view embedded in dispense history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineSummary {
    pub id: i64,
    pub name: String,
    pub mnn: String,
    pub form: String,
    pub dosage: String,
    pub article: String,
    pub qr_payload: String,
}

impl MedicineFields {
    /// Create fields with a name and stock levels; descriptive fields empty.
    pub fn new(name: impl Into<String>, min_stock: i64, stock: i64) -> Self {
        Self {
            name: name.into(),
            min_stock,
            stock,
            ..Default::default()
        }
    }

    /// Shortage implied by these fields.
    pub fn diff(&self) -> i64 {
        compute_diff(self.min_stock, self.stock)
    }
}

impl MedicineRecord {
    /// Check the `diff == min_stock - stock` and `stock >= 0` invariants.
    pub fn is_consistent(&self) -> bool {
        self.stock >= 0 && self.diff == compute_diff(self.min_stock, self.stock)
    }
}

/// Shortage metric. Positive means under target, negative means surplus.
pub fn compute_diff(min_stock: i64, stock: i64) -> i64 {
    min_stock.saturating_sub(stock)
}

/// Stock after applying `delta`, clamped at zero.
///
/// `None` when `stock + delta` does not fit in an `i64`; such an adjustment
/// is rejected rather than stored.
pub fn adjusted_stock(stock: i64, delta: i64) -> Option<i64> {
    stock.checked_add(delta).map(|s| s.max(0))
}

/// Article for a zero-based catalogue sequence number.
pub fn build_article(sequence: u32) -> String {
    format!(
        "{}{:0width$}",
        ARTICLE_PREFIX,
        u64::from(sequence) + 1,
        width = ARTICLE_DIGITS
    )
}

/// QR payload for an article.
pub fn build_qr_payload(article: &str) -> String {
    format!("{}{}", QR_PREFIX, article)
}

/// Normalize a user-entered code (trim, uppercase).
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Code carried by a scanned payload: `med:<code>`, a medicine link, or the
/// bare code. Normalized like [`normalize_code`].
pub fn code_from_scan(payload: &str) -> String {
    let code = normalize_code(payload);
    if let Some(rest) = code.strip_prefix(&QR_PREFIX.to_uppercase()) {
        return rest.trim().to_string();
    }
    if let Some(rest) = code.strip_prefix(&MEDICINE_LINK_PREFIX.to_uppercase()) {
        return rest.rsplit('/').next().unwrap_or_default().trim().to_string();
    }
    code
}

/// Check the `MG-NNNNN` article format.
pub fn is_valid_article(article: &str) -> bool {
    match article.strip_prefix(ARTICLE_PREFIX) {
        Some(digits) => digits.len() == ARTICLE_DIGITS && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Zero-based sequence number encoded in an article, if well-formed.
pub fn sequence_from_article(article: &str) -> Option<u32> {
    if !is_valid_article(article) {
        return None;
    }
    let number: u32 = article[ARTICLE_PREFIX.len()..].parse().ok()?;
    number.checked_sub(1)
}

/// Lowercase copy of a text field used for case-insensitive search.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}
