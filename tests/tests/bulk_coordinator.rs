//! Bulk coordinator integration tests.

use pretty_assertions::assert_eq;
use serde_json::json;
use tessera_mutation::{BulkOperation, BulkOutcome};
use tessera_tests::prelude::*;

fn run(w: &World, ops: Vec<BulkOperation>) -> BulkOutcome {
    match w.service.bulk(&w.ctx(), ops) {
        Ok(outcome) => outcome,
        Err(e) => panic!("bulk failed: {}", e),
    }
}

#[test]
fn test_kit_with_parts_links_to_first_record() {
    // GIVEN
    let w = World::new();
    let ops = vec![
        BulkOperation::create(w.record(values! { "sku" => "KIT" })).with_id("kit"),
        BulkOperation::create(w.record(values! { "sku" => "P1" }))
            .linked_by("kit")
            .with_id("p1"),
        BulkOperation::create(w.record(values! { "sku" => "P2" }))
            .linked_by("kit")
            .with_id("p2"),
    ];

    // WHEN
    let outcome = run(&w, ops);

    // THEN
    assert!(outcome.is_valid());
    let kit = outcome.records[0].id.raw().to_string();
    assert_eq!(outcome.records[1].value("kit"), Some(kit.as_str()));
    assert_eq!(outcome.records[2].value("kit"), Some(kit.as_str()));
}

#[test]
fn test_failed_primary_leaves_link_empty_and_tags_errors() {
    // GIVEN
    let w = World::new();
    let ops = vec![
        BulkOperation::create(w.record(values! { "qty" => "-5" })).with_id("A"),
        BulkOperation::create(w.record(values! { "sku" => "B" }))
            .linked_by("kit")
            .with_id("B"),
    ];

    // WHEN
    let outcome = run(&w, ops);

    // THEN
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].value("sku"), Some("B"));
    assert_eq!(outcome.records[0].value("kit"), None);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors.iter().all(|e| e.meta.get("id") == Some(&json!("A"))));

    let summary = &w.journal.of_action(RecordAction::Bulk)[0];
    assert!(summary.is_error());
    assert_eq!(summary.props.bulk_size, Some(2));
}

#[test]
fn test_update_and_delete_in_one_batch() {
    // GIVEN
    let w = World::new();
    let keep = w.seed(values! { "sku" => "KEEP", "qty" => "1" });
    let gone = w.seed(values! { "sku" => "GONE" });

    // WHEN
    let outcome = run(
        &w,
        vec![
            BulkOperation::update(w.record(values! { "sku" => "KEEP", "qty" => "9" }).with_id(keep.id)),
            BulkOperation::delete(w.record(values! {}).with_id(gone.id)),
        ],
    );

    // THEN
    assert!(outcome.is_valid());
    assert_eq!(w.stored(&keep).value("qty"), Some("9"));
    assert!(w.stored(&gone).is_deleted());
    assert_eq!(
        w.journal.actions()[2..].to_vec(),
        vec![RecordAction::Update, RecordAction::Delete, RecordAction::Bulk]
    );
}

#[test]
fn test_unknown_operation_does_nothing() {
    // GIVEN
    let w = World::new();
    let ops = vec![
        BulkOperation::create(w.record(values! { "sku" => "A" })),
        BulkOperation::new("merge", w.record(values! { "sku" => "B" })),
    ];

    // WHEN
    let result = w.service.bulk(&w.ctx(), ops);

    // THEN
    assert!(matches!(result, Err(RecordError::UnknownBulkOperation(_))));
    assert!(w.store.records(w.inventory.id).is_empty());
}

#[test]
fn test_permission_failure_rolls_back_whole_batch() {
    // GIVEN
    let w = World::new();
    let locked = w.seed(values! { "sku" => "LOCKED" });
    w.access.deny(Operation::Update, Resource::Record(locked.id));
    let ops = vec![
        BulkOperation::create(w.record(values! { "sku" => "FIRST" })),
        BulkOperation::update(w.record(values! { "sku" => "LOCKED", "qty" => "2" }).with_id(locked.id)),
        BulkOperation::create(w.record(values! { "sku" => "NEVER" })),
    ];

    // WHEN
    let result = w.service.bulk(&w.ctx(), ops);

    // THEN
    assert!(matches!(result, Err(RecordError::NotAllowedToUpdate(_))));
    let skus: Vec<String> = w
        .store
        .records(w.inventory.id)
        .iter()
        .filter_map(|r| r.value("sku").map(str::to_string))
        .collect();
    assert_eq!(skus, vec!["LOCKED".to_string()]);
}
