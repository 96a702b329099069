//! Value pipeline integration tests.
//!
//! Submitted values pass sanitization, defaults, derived fields, validation
//! and formatting on every write; the prepared output is a fixed point.

use pretty_assertions::assert_eq;
use tessera_tests::prelude::*;
use tessera_values::Pipeline;

mod prepare {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_canonicalizes_submitted_values() {
        // GIVEN
        let w = World::new();
        let new = w.record(values! {
            "sku" => "  <b>BOLT-1</b> ",
            "qty" => "+3",
            "price" => "2.5",
            "notes" => "<p>zinc</p><script>alert(1)</script>",
        });

        // WHEN
        let result = w.service.create(&w.ctx(), new);

        // THEN
        expect(&result, |a| {
            a.value("sku", "BOLT-1")
                .value("qty", "3")
                .value("price", "2.50")
                .value("total", "7.50")
                .value("status", "open")
                .value("notes", "<p>zinc</p>")
        });
    }

    #[test]
    fn test_prepared_output_is_a_fixed_point() {
        // GIVEN
        let w = World::new();
        let pipeline = Pipeline::new(w.store.as_ref());
        let submitted = values! {
            "sku" => " A-7 ",
            "qty" => "+4",
            "price" => "0.25",
            "tags" => ["x", "y"],
        };

        // WHEN
        let first = pipeline
            .prepare(&w.inventory, RecordId::default(), &submitted)
            .unwrap();
        let second = pipeline
            .prepare(&w.inventory, RecordId::default(), &first.values)
            .unwrap();

        // THEN
        assert!(first.is_valid());
        assert!(second.is_valid());
        assert_eq!(second.values, first.values);
    }

    #[test]
    fn test_update_output_is_stored_verbatim() {
        // GIVEN
        let w = World::new();
        let stored = w.seed(values! { "sku" => "S-1", "qty" => "2", "price" => "1" });

        // WHEN
        let updated = w
            .service
            .update(
                &w.ctx(),
                w.record(values! { "sku" => "S-1", "qty" => "5", "price" => "1" })
                    .with_id(stored.id),
            )
            .unwrap();

        // THEN
        assert_eq!(updated.value("total"), Some("5.00"));
        assert_eq!(w.stored(&updated).values, updated.values);
    }
}

mod validation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_finding_is_reported() {
        // GIVEN
        let w = World::new();
        let new = w.record(values! {
            "qty" => "-1",
            "status" => "lost",
            "tags" => ["a", "a"],
        });

        // WHEN
        let result = w.service.create(&w.ctx(), new);

        // THEN
        expect(&result, |a| {
            a.value_errors(4)
                .value_error(ValueErrorKind::Empty, 1)
                .value_error(ValueErrorKind::OutOfRange, 1)
                .value_error(ValueErrorKind::InvalidOption, 1)
                .value_error(ValueErrorKind::DuplicateValueInSet, 1)
        });
        assert_eq!(w.store.write_count(), 0);
    }

    #[test]
    fn test_unique_value_is_checked_against_other_records() {
        // GIVEN
        let w = World::new();
        let first = w.seed(values! { "sku" => "DUP" });

        // WHEN
        let second = w.service.create(&w.ctx(), w.record(values! { "sku" => "DUP" }));
        let resubmit = w.service.update(
            &w.ctx(),
            w.record(values! { "sku" => "DUP", "name" => "same" }).with_id(first.id),
        );

        // THEN
        expect(&second, |a| a.value_error(ValueErrorKind::DuplicateValue, 1));
        expect(&resubmit, |a| a.value("name", "same"));
    }

    #[test]
    fn test_references_must_resolve() {
        // GIVEN
        let w = World::new();
        let kit = w.seed(values! { "sku" => "KIT" });
        let kit_id = kit.id.raw().to_string();

        // WHEN
        let good = w.service.create(
            &w.ctx(),
            w.record(values! { "sku" => "PART-1", "kit" => kit_id, "assignee" => "200" }),
        );
        let bad = w.service.create(
            &w.ctx(),
            w.record(values! { "sku" => "PART-2", "kit" => "9999", "assignee" => "999" }),
        );

        // THEN
        expect(&good, |a| a.value("assignee", "200"));
        expect(&bad, |a| {
            a.value_error(ValueErrorKind::InvalidRecordReference, 1)
                .value_error(ValueErrorKind::InvalidUserReference, 1)
        });
    }

    #[test]
    fn test_malformed_reference_is_a_hard_error() {
        let w = World::new();

        let result = w
            .service
            .create(&w.ctx(), w.record(values! { "sku" => "X", "kit" => "abc" }));

        expect(&result, |a| a.error("kit"));
        assert!(matches!(result, Err(RecordError::InvalidReferenceFormat { .. })));
    }

    #[test]
    fn test_validate_does_not_write() {
        let w = World::new();

        let errors = w
            .service
            .validate(&w.ctx(), &w.record(values! { "qty" => "many" }))
            .unwrap();

        assert_eq!(errors.len(), 2);
        assert_eq!(w.store.write_count(), 0);
    }
}
