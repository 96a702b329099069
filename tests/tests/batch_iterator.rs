//! Batch iterator integration tests.

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use tessera_mutation::{IterationSummary, IteratorAction};
use tessera_tests::prelude::*;

#[test]
fn test_restock_updates_matching_records() {
    // GIVEN
    let w = World::new();
    let low = w.seed(values! { "sku" => "LOW", "qty" => "1", "price" => "2" });
    let full = w.seed(values! { "sku" => "FULL", "qty" => "50", "price" => "2" });

    // WHEN
    let summary = w
        .service
        .iterate(
            &w.ctx(),
            w.filter().with_query(Filter::cmp("qty", tessera_store::CmpOp::Lt, "10")),
            IteratorAction::Update,
            |_, p| {
                p.record.values.set(RecordValue::new("qty", "10"));
                HookOutcome::proceed()
            },
        )
        .unwrap();

    // THEN
    assert_eq!(summary, IterationSummary { visited: 1, skipped: 0, mutated: 1 });
    assert_eq!(w.stored(&low).value("qty"), Some("10"));
    assert_eq!(w.stored(&low).value("total"), Some("20.00"));
    assert_eq!(w.stored(&full).value("qty"), Some("50"));
}

#[test]
fn test_hook_sees_every_record_in_sort_order() {
    // GIVEN
    let w = World::new();
    for (sku, position) in [("C", "3"), ("A", "1"), ("B", "2")] {
        w.seed(values! { "sku" => sku, "position" => position });
    }
    let seen = parking_lot::Mutex::new(Vec::new());

    // WHEN
    w.service
        .iterate(
            &w.ctx(),
            w.filter().sorted_by(SortExpr::asc("position")),
            IteratorAction::None,
            |_, p| {
                seen.lock().push(p.record.value("sku").unwrap_or_default().to_string());
                HookOutcome::proceed()
            },
        )
        .unwrap();

    // THEN
    assert_eq!(*seen.lock(), vec!["A", "B", "C"]);
}

#[test]
fn test_clone_with_new_sku() {
    // GIVEN
    let w = World::new();
    w.seed(values! { "sku" => "TEMPLATE", "qty" => "3" });
    let counter = AtomicUsize::new(0);

    // WHEN
    w.service
        .iterate(&w.ctx(), w.filter(), IteratorAction::Clone, |_, p| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            p.record.values.set(RecordValue::new("sku", format!("COPY-{n}")));
            HookOutcome::proceed()
        })
        .unwrap();

    // THEN
    let all = w.store.records(w.inventory.id);
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|r| r.value("sku") == Some("COPY-0") && r.value("qty") == Some("3")));
    assert_eq!(w.journal.of_action(RecordAction::IteratorClone).len(), 1);
}

#[test]
fn test_duplicate_clone_stops_iteration() {
    // GIVEN
    let w = World::new();
    w.seed(values! { "sku" => "A" });

    // WHEN
    let result = w
        .service
        .iterate(&w.ctx(), w.filter(), IteratorAction::Clone, |_, _| HookOutcome::proceed());

    // THEN
    let err = result.unwrap_err();
    assert_eq!(
        err.value_errors().unwrap().count_kind(&ValueErrorKind::DuplicateValue),
        1
    );
    assert_eq!(w.store.records(w.inventory.id).len(), 1);
    assert!(w.journal.of_action(RecordAction::IteratorInvoked)[0].is_error());
}

#[test]
fn test_soft_abort_skips_without_writing() {
    // GIVEN
    let w = World::new();
    let a = w.seed(values! { "sku" => "A" });
    let b = w.seed(values! { "sku" => "B" });

    // WHEN
    let summary = w
        .service
        .iterate(&w.ctx(), w.filter(), IteratorAction::Delete, |_, p| {
            if p.record.value("sku") == Some("A") {
                HookOutcome::SoftAbort
            } else {
                HookOutcome::proceed()
            }
        })
        .unwrap();

    // THEN
    assert_eq!(summary.skipped, 1);
    assert!(!w.stored(&a).is_deleted());
    assert!(w.stored(&b).is_deleted());
}
