//! Export functionality for stock reports.

mod shortage;

pub use shortage::*;

/// Quote a CSV field when it contains a separator, quote or newline.
pub(crate) fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
