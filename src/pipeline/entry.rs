use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ingestion::SourceFormat;

/// One (source file, target table) pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Source file.
    pub source: PathBuf,
    /// Target table, fully replaced on each successful load.
    pub table: String,
    /// Source format; inferred from the file extension when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
}

impl DatasetEntry {
    /// Create an entry whose format is inferred from the source extension.
    pub fn new(source: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            table: table.into(),
            format: None,
        }
    }

    /// Force the source format.
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// `true` only when the source is known not to exist.
    ///
    /// A path whose existence cannot be determined (e.g. unreadable parent directory) is not
    /// missing; reading it surfaces the real error.
    pub fn source_missing(&self) -> bool {
        matches!(self.source.try_exists(), Ok(false))
    }

    /// Resolve a relative source against `base_dir`. Absolute sources are left alone.
    pub fn resolved_against(mut self, base_dir: &Path) -> Self {
        if self.source.is_relative() {
            self.source = base_dir.join(&self.source);
        }
        self
    }
}

/// File-to-table mapping of the Olist e-commerce datasets, in load order.
pub const OLIST_DATASETS: [(&str, &str); 8] = [
    ("olist_customers_dataset.csv", "customers"),
    ("olist_order_items_dataset.csv", "order_items"),
    ("olist_orders_dataset.csv", "orders"),
    ("olist_products_dataset.csv", "products"),
    ("olist_geolocation_dataset.csv", "geolocation"),
    ("olist_order_payments_dataset.csv", "payments"),
    ("olist_sellers_dataset.csv", "sellers"),
    ("product_category_name_translation.csv", "category_translation"),
];

/// The reference entry set, with sources under `base_dir`.
pub fn olist_entries(base_dir: &Path) -> Vec<DatasetEntry> {
    OLIST_DATASETS
        .iter()
        .map(|(file, table)| DatasetEntry::new(base_dir.join(file), *table))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_set_has_eight_distinct_tables() {
        let entries = olist_entries(Path::new("/data"));
        assert_eq!(entries.len(), 8);
        assert_eq!(entries[0].source, PathBuf::from("/data/olist_customers_dataset.csv"));
        assert_eq!(entries[7].table, "category_translation");

        let mut tables: Vec<&str> = entries.iter().map(|e| e.table.as_str()).collect();
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), 8);
    }

    #[test]
    fn only_relative_sources_are_resolved() {
        let rel = DatasetEntry::new("orders.csv", "orders").resolved_against(Path::new("/data"));
        assert_eq!(rel.source, PathBuf::from("/data/orders.csv"));

        let abs = DatasetEntry::new("/elsewhere/orders.csv", "orders").resolved_against(Path::new("/data"));
        assert_eq!(abs.source, PathBuf::from("/elsewhere/orders.csv"));
    }

    #[test]
    fn directories_are_not_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!DatasetEntry::new(dir.path(), "orders").source_missing());
        assert!(DatasetEntry::new(dir.path().join("orders.csv"), "orders").source_missing());
    }
}
