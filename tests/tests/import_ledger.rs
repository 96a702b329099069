//! Import progress ledger integration tests.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use tessera_import::{ImportProgress, OnError};
use tessera_mutation::ServiceConfig;
use tessera_tests::prelude::*;

fn rows(skus: &[&str]) -> Vec<BTreeMap<String, String>> {
    skus.iter()
        .map(|sku| BTreeMap::from([("SKU".to_string(), sku.to_string())]))
        .collect()
}

#[test]
fn test_failed_rows_round_trip_as_ranges() {
    // GIVEN
    let w = World::new();
    let mut session = w
        .service
        .new_import_session(w.namespace.id, w.inventory.id)
        .map("SKU", "sku");
    let input = rows(&["A", "", "", "B", "A", "C", ""]);

    // WHEN
    let progress = w.service.import_rows(&w.ctx(), &mut session, &input).unwrap();

    // THEN
    assert_eq!((progress.completed, progress.failed), (3, 4));
    let encoded = serde_json::to_value(&progress).unwrap();
    assert_eq!(encoded["failLog"]["records"], json!([[1, 2], [4, 4], [6, 6]]));

    let decoded: ImportProgress = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded.fail_log.records.indexes(), vec![1, 2, 4, 6]);
    assert_eq!(decoded.fail_log.errors.total(), 4);
}

#[test]
fn test_index_cap_from_configuration() {
    // GIVEN
    let config = ServiceConfig::from_kv(&std::collections::HashMap::from([
        ("TESSERA_IMPORT_MAX_INDEX_COUNT".to_string(), "2".to_string()),
        ("TESSERA_IMPORT_ON_ERROR".to_string(), "skip".to_string()),
    ]))
    .unwrap();
    let w = World::with_config(config);
    let mut session = w
        .service
        .new_import_session(w.namespace.id, w.inventory.id)
        .map("SKU", "sku");

    // WHEN
    let progress = w
        .service
        .import_rows(&w.ctx(), &mut session, &rows(&["", "", "", "", "ok"]))
        .unwrap();

    // THEN
    assert_eq!(progress.failed, 4);
    assert_eq!(progress.completed, 1);
    assert!(progress.fail_log.records_truncated);
    assert_eq!(progress.fail_log.records.len(), 2);
    assert_eq!(progress.fail_log.errors.total(), 4);
}

#[test]
fn test_fail_policy_records_reason() {
    // GIVEN
    let w = World::new();
    let mut session = w
        .service
        .new_import_session(w.namespace.id, w.inventory.id)
        .map("SKU", "sku")
        .on_error(OnError::Fail);

    // WHEN
    let progress = w
        .service
        .import_rows(&w.ctx(), &mut session, &rows(&["A", "A", "B"]))
        .unwrap();

    // THEN
    assert_eq!(progress.processed(), 2);
    assert!(progress.fail_reason.unwrap().contains("duplicateValue"));
    assert!(w.journal.of_action(RecordAction::Import)[0].error.is_none());
}
