//! Mutation orchestrator integration tests.
//!
//! Covers the write paths end to end: identity assignment, hooks and their
//! re-checks, optimistic concurrency and the audit trail.

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tessera_tests::prelude::*;

mod identity {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_concurrent_creates_get_distinct_ids_and_stamps() {
        // GIVEN
        let w = Arc::new(World::new());

        // WHEN
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let w = Arc::clone(&w);
                thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            let sku = format!("T{t}-{i}");
                            w.seed(values! { "sku" => sku })
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let created: Vec<Record> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        // THEN
        let ids: HashSet<RecordId> = created.iter().map(|r| r.id).collect();
        let stamps: HashSet<_> = created.iter().map(|r| r.created_at).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(stamps.len(), 200);
        assert_eq!(w.store.records(w.inventory.id).len(), 200);
    }

    #[test]
    fn test_update_keeps_creation_fields() {
        // GIVEN
        let w = World::new();
        let stored = w.seed(values! { "sku" => "A" });

        // WHEN
        let mut upd = w.record(values! { "sku" => "A", "name" => "n" }).with_id(stored.id);
        upd.created_by = UserId::new(1);
        let updated = w.service.update(&w.ctx(), upd).unwrap();

        // THEN
        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(updated.created_by, stored.created_by);
        assert!(updated.updated_at.unwrap() > stored.created_at);
    }
}

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stale_update_writes_nothing() {
        // GIVEN
        let w = World::new();
        let stored = w.seed(values! { "sku" => "A", "qty" => "1" });
        let read = w
            .service
            .find_by_id(&w.ctx(), w.namespace.id, w.inventory.id, stored.id)
            .unwrap();
        w.service
            .update(
                &w.ctx(),
                w.record(values! { "sku" => "A", "qty" => "2" }).with_id(stored.id),
            )
            .unwrap();
        let writes = w.store.write_count();

        // WHEN
        let mut stale = w.record(values! { "sku" => "A", "qty" => "3" }).with_id(stored.id);
        stale.updated_at = Some(read.concurrency_stamp());
        let result = w.service.update(&w.ctx(), stale);

        // THEN
        expect(&result, |a| a.error("^Stale data"));
        assert_eq!(w.store.write_count(), writes);
        assert_eq!(w.stored(&stored).value("qty"), Some("2"));
    }

    #[test]
    fn test_fresh_stamp_is_accepted() {
        // GIVEN
        let w = World::new();
        let stored = w.seed(values! { "sku" => "A", "qty" => "1" });

        // WHEN
        let mut upd = w.record(values! { "sku" => "A", "qty" => "5" }).with_id(stored.id);
        upd.updated_at = Some(stored.concurrency_stamp());
        let result = w.service.update(&w.ctx(), upd);

        // THEN
        expect(&result, |a| a.value("qty", "5"));
    }
}

mod hooks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hook_edits_are_sanitized_and_formatted() {
        // GIVEN
        let w = World::new();
        w.hooks.on(HookEvent::BeforeCreate, |_, p| {
            p.record.values.set(RecordValue::new("name", " <i>hooked</i> "));
            p.record.values.set(RecordValue::new("price", "3"));
            HookOutcome::proceed()
        });

        // WHEN
        let result = w.service.create(&w.ctx(), w.record(values! { "sku" => "A", "qty" => "2" }));

        // THEN
        expect(&result, |a| {
            a.value("name", "hooked")
                .value("price", "3.00")
                .value("total", "6.00")
        });
    }

    #[test]
    fn test_hooks_see_prepared_values() {
        // GIVEN
        let w = World::new();
        w.hooks.on(HookEvent::BeforeUpdate, |_, p| {
            if p.record.value("qty") != Some("7") || p.old.and_then(|o| o.value("qty")) != Some("1") {
                return HookOutcome::fail("unexpected payload");
            }
            HookOutcome::proceed()
        });
        let stored = w.seed(values! { "sku" => "A", "qty" => "1" });

        // WHEN
        let result = w.service.update(
            &w.ctx(),
            w.record(values! { "sku" => "A", "qty" => "+7" }).with_id(stored.id),
        );

        // THEN
        expect(&result, |a| a.value("qty", "7"));
    }

    #[test]
    fn test_hook_findings_stop_the_write() {
        // GIVEN
        let w = World::new();
        w.hooks.on(HookEvent::BeforeCreate, |_, p| {
            let mut errors = tessera_core::ValueErrorSet::new();
            if p.record.value("name").is_none() {
                errors.push(tessera_core::ValueError::for_field(
                    ValueErrorKind::Other("nameRequired".into()),
                    "name",
                    "",
                ));
            }
            HookOutcome::Continue { errors }
        });

        // WHEN
        let result = w.service.create(&w.ctx(), w.record(values! { "sku" => "A" }));

        // THEN
        expect(&result, |a| a.value_errors(1));
        assert_eq!(w.store.write_count(), 0);
    }

    #[test]
    fn test_after_hook_sees_stored_record() {
        // GIVEN
        let w = World::new();
        w.hooks.on(HookEvent::AfterDelete, |_, p| {
            if p.record.is_deleted() {
                HookOutcome::proceed()
            } else {
                HookOutcome::fail("record not deleted yet")
            }
        });
        let stored = w.seed(values! { "sku" => "A" });

        // WHEN
        let result = w.service.delete(&w.ctx(), w.namespace.id, w.inventory.id, stored.id);

        // THEN
        expect(&result, |a| a.deleted(true));
        assert!(!w.journal.of_action(RecordAction::Delete)[0].is_error());
    }
}

mod audit {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_operation_is_audited_once() {
        // GIVEN
        let w = World::new();

        // WHEN
        let stored = w.seed(values! { "sku" => "A" });
        let _ = w.service.update(&w.ctx(), w.record(values! { "sku" => "B" }).with_id(stored.id));
        let _ = w.service.find_by_id(&w.ctx(), w.namespace.id, w.inventory.id, stored.id);
        let _ = w.service.find(&w.ctx(), w.filter());
        let _ = w.service.delete(&w.ctx(), w.namespace.id, w.inventory.id, stored.id);
        let _ = w.service.delete(&w.ctx(), w.namespace.id, w.inventory.id, RecordId::new(404));

        // THEN
        assert_eq!(
            w.journal.actions(),
            vec![
                RecordAction::Create,
                RecordAction::Update,
                RecordAction::Lookup,
                RecordAction::Search,
                RecordAction::Delete,
                RecordAction::Delete,
            ]
        );
        let entries = w.journal.entries();
        assert!(entries.iter().take(5).all(|e| !e.is_error()));
        assert!(entries[5].is_error());
        assert!(entries.iter().all(|e| e.invoker == w.ctx().invoker));
    }
}
