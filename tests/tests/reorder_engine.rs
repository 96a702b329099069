//! Reorder engine integration tests.

use pretty_assertions::assert_eq;
use tessera_mutation::OrganizeRequest;
use tessera_tests::prelude::*;

fn shelf(w: &World, lane: &str, count: u64) -> Vec<Record> {
    (1..=count)
        .map(|i| {
            let sku = format!("{lane}-{i}");
            let position = i.to_string();
            let lane = lane.to_string();
            w.seed(values! { "sku" => sku, "position" => position, "lane" => lane })
        })
        .collect()
}

fn positions(w: &World, records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| w.stored(r).value("position").unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_moving_last_to_second_shifts_the_tail() {
    // GIVEN
    let w = World::new();
    let shelf = shelf(&w, "north", 5);

    // WHEN
    let req = OrganizeRequest::new(w.namespace.id, w.inventory.id, shelf[4].id, "position", "2");
    let shifted = w.service.organize(&w.ctx(), req).unwrap();

    // THEN
    assert_eq!(positions(&w, &shelf), vec!["1", "3", "4", "5", "2"]);
    assert_eq!(shifted, 3);
}

#[test]
fn test_positions_stay_unique_after_moves() {
    // GIVEN
    let w = World::new();
    let shelf = shelf(&w, "north", 4);

    // WHEN
    for (record, target) in [(0, "4"), (3, "1"), (2, "2")] {
        let req = OrganizeRequest::new(w.namespace.id, w.inventory.id, shelf[record].id, "position", target);
        w.service.organize(&w.ctx(), req).unwrap();
    }

    // THEN
    let mut seen = positions(&w, &shelf);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 4);
}

#[test]
fn test_move_into_another_lane() {
    // GIVEN
    let w = World::new();
    let north = shelf(&w, "north", 3);
    let south = shelf(&w, "south", 2);

    // WHEN
    let req = OrganizeRequest::new(w.namespace.id, w.inventory.id, south[1].id, "position", "1")
        .in_group("lane", "north")
        .within(Filter::eq("lane", "north"));
    w.service.organize(&w.ctx(), req).unwrap();

    // THEN
    assert_eq!(w.stored(&south[1]).value("lane"), Some("north"));
    assert_eq!(positions(&w, &north), vec!["2", "3", "4"]);
    assert_eq!(positions(&w, &south), vec!["1", "1"]);
}

#[test]
fn test_organize_is_audited_with_fields() {
    // GIVEN
    let w = World::new();
    let shelf = shelf(&w, "north", 2);

    // WHEN
    let req = OrganizeRequest::new(w.namespace.id, w.inventory.id, shelf[1].id, "position", "1")
        .in_group("lane", "north");
    w.service.organize(&w.ctx(), req).unwrap();

    // THEN
    let entry = &w.journal.of_action(RecordAction::Organize)[0];
    assert_eq!(entry.props.fields, vec!["position".to_string(), "lane".to_string()]);
    assert_eq!(entry.props.record_id, Some(shelf[1].id));
}

#[test]
fn test_invalid_position_changes_nothing() {
    // GIVEN
    let w = World::new();
    let shelf = shelf(&w, "north", 3);
    let writes = w.store.write_count();

    // WHEN
    let req = OrganizeRequest::new(w.namespace.id, w.inventory.id, shelf[2].id, "position", "1.5");
    let result = w.service.organize(&w.ctx(), req);

    // THEN
    assert!(matches!(result, Err(RecordError::InvalidOrganize { .. })));
    assert_eq!(w.store.write_count(), writes);
}

#[test]
fn test_store_failure_rolls_back_every_position() {
    // GIVEN
    let w = World::new();
    let shelf = shelf(&w, "north", 4);
    w.store.fail_after_writes(1);

    // WHEN
    let req = OrganizeRequest::new(w.namespace.id, w.inventory.id, shelf[3].id, "position", "1");
    let result = w.service.organize(&w.ctx(), req);

    // THEN
    assert!(result.is_err());
    assert_eq!(positions(&w, &shelf), vec!["1", "2", "3", "4"]);
}
