use std::path::Path;

use supply_chain_ingest::config::PipelineConfig;
use supply_chain_ingest::pipeline::{olist_entries, IngestionCoordinator};

#[test]
fn reference_config_matches_builtin_olist_set() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/pipeline.toml");
    let config = PipelineConfig::from_figment(PipelineConfig::figment(Some(&path))).unwrap();

    assert_eq!(config.entries(), olist_entries(Path::new("Dataset")));
    assert_eq!(config.transform, PipelineConfig::default().transform);

    let coordinator = IngestionCoordinator::new(config.plan()).unwrap();
    let tables: Vec<&str> = coordinator.entries().iter().map(|e| e.table.as_str()).collect();
    assert_eq!(
        tables,
        vec![
            "customers",
            "order_items",
            "orders",
            "products",
            "geolocation",
            "payments",
            "sellers",
            "category_translation",
        ]
    );
}
