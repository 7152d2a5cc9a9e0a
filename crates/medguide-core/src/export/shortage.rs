//! Shortage report: medicines whose stock is under the required buffer.

use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::catalogue::Catalogue;
use crate::error::InventoryResult;
use crate::models::MedicineRecord;

/// One under-stocked medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortageLine {
    pub article: String,
    pub name: String,
    pub mnn: String,
    pub form: String,
    pub dosage: String,
    pub min_stock: i64,
    pub stock: i64,
    /// Units missing to reach `min_stock`
    pub diff: i64,
}

/// Shortage report over the whole catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortageReport {
    /// Report timestamp
    pub generated_at: String,
    /// Medicines checked
    pub catalogue_size: usize,
    /// Sum of all shortages
    pub total_missing: i64,
    /// Largest shortage first
    pub lines: Vec<ShortageLine>,
}

impl From<&MedicineRecord> for ShortageLine {
    fn from(m: &MedicineRecord) -> Self {
        Self {
            article: m.article.clone(),
            name: m.name.clone(),
            mnn: m.mnn.clone(),
            form: m.form.clone(),
            dosage: m.dosage.clone(),
            min_stock: m.min_stock,
            stock: m.stock,
            diff: m.diff,
        }
    }
}

impl ShortageReport {
    /// Build the report from the current catalogue.
    pub fn build(catalogue: &Catalogue<'_>) -> InventoryResult<Self> {
        let catalogue_size = catalogue.list()?.len();
        let lines: Vec<ShortageLine> = catalogue.shortages()?.iter().map(ShortageLine::from).collect();
        Ok(Self::from_lines(lines, catalogue_size))
    }

    fn from_lines(lines: Vec<ShortageLine>, catalogue_size: usize) -> Self {
        Self {
            generated_at: crate::models::now_timestamp(),
            catalogue_size,
            total_missing: lines.iter().map(|l| l.diff).sum(),
            lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("article,name,mnn,form,dosage,min_stock,stock,diff\n");

        for line in &self.lines {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                escape_csv(&line.article),
                escape_csv(&line.name),
                escape_csv(&line.mnn),
                escape_csv(&line.form),
                escape_csv(&line.dosage),
                line.min_stock,
                line.stock,
                line.diff,
            ));
        }

        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::MedicineFields;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        let catalogue = Catalogue::new(&db);
        catalogue
            .upsert("MG-00001", &MedicineFields::new("Альбумин", 90, 48))
            .unwrap();
        catalogue
            .upsert("MG-00002", &MedicineFields::new("Азитрокс, Сумамед, Хемомицин", 6, 2))
            .unwrap();
        catalogue
            .upsert("MG-00003", &MedicineFields::new("Уголь активированный", 200, 500))
            .unwrap();
        db
    }

    #[test]
    fn test_build_report() {
        let db = setup();
        let report = ShortageReport::build(&Catalogue::new(&db)).unwrap();

        assert_eq!(report.catalogue_size, 3);
        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.lines[0].article, "MG-00001");
        assert_eq!(report.lines[0].diff, 42);
        assert_eq!(report.lines[1].diff, 4);
        assert_eq!(report.total_missing, 46);
    }

    #[test]
    fn test_report_csv() {
        let db = setup();
        let report = ShortageReport::build(&Catalogue::new(&db)).unwrap();

        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3); // Header + 2 shortages
        assert!(lines[0].starts_with("article,"));
        assert!(lines[1].starts_with("MG-00001,Альбумин,"));
        assert!(lines[2].contains("\"Азитрокс, Сумамед, Хемомицин\""));
    }

    #[test]
    fn test_report_json() {
        let db = setup();
        let report = ShortageReport::build(&Catalogue::new(&db)).unwrap();

        let json = report.to_json().unwrap();
        assert!(json.contains("MG-00002"));
        assert!(!json.contains("Уголь"));
    }

    #[test]
    fn test_empty_catalogue() {
        let db = Database::open_in_memory().unwrap();
        let report = ShortageReport::build(&Catalogue::new(&db)).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_missing, 0);
    }
}
