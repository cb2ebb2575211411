mod common;

use common::{memory_store, sample_snapshot, stored_counts, with_session};
use tagfix_core::store::Partition;

#[test]
fn customname_outside_functions_increments_the_globals_index_once() {
    let db = sample_snapshot().with_custom_name(0x2000);
    let mut store = memory_store();
    let (result, _) = with_session(&db, &mut store, |session| session.everything());
    result.unwrap();
    let before = stored_counts(&store, Partition::Globals);

    let (added, _) = with_session(&db, &mut store, |session| session.customnames());

    assert_eq!(added.unwrap(), 1);
    let after = stored_counts(&store, Partition::Globals);
    assert_eq!(after.names["__name__"], before.names["__name__"] + 1);
    assert_eq!(after.addresses[&0x2000], before.addresses[&0x2000] + 1);

    let mut untouched = after.clone();
    untouched.names.insert("__name__".to_string(), before.names["__name__"]);
    untouched.addresses.insert(0x2000, before.addresses[&0x2000]);
    assert_eq!(untouched, before);
}

#[test]
fn customnames_route_by_function_ownership() {
    let db = sample_snapshot().with_custom_name(0x1000).with_custom_name(0x1004);
    let mut store = memory_store();

    let (added, _) = with_session(&db, &mut store, |session| session.customnames());

    assert_eq!(added.unwrap(), 2);
    let contents = stored_counts(&store, Partition::Contents(0x1000));
    assert_eq!(contents.addresses.get(&0x1004), Some(&1));
    assert_eq!(contents.addresses.get(&0x1000), None);
    assert_eq!(contents.names.get("__name__"), Some(&1));

    let globals = stored_counts(&store, Partition::Globals);
    assert_eq!(globals.addresses.get(&0x1000), Some(&1));
    assert_eq!(globals.names.get("__name__"), Some(&1));
}

#[test]
fn extracomments_add_one_reference_per_line() {
    let db = sample_snapshot().with_extra_comments(0x2008, 2, 1).with_extra_comments(0x1004, 1, 0);
    let mut store = memory_store();

    let (added, _) = with_session(&db, &mut store, |session| session.extracomments());

    assert_eq!(added.unwrap(), 4);
    let globals = stored_counts(&store, Partition::Globals);
    assert_eq!(globals.names.get("__extra_prefix__"), Some(&2));
    assert_eq!(globals.names.get("__extra_suffix__"), Some(&1));
    assert_eq!(globals.addresses.get(&0x2008), Some(&3));

    let contents = stored_counts(&store, Partition::Contents(0x1000));
    assert_eq!(contents.names.get("__extra_prefix__"), Some(&1));
    assert_eq!(contents.addresses.get(&0x1004), Some(&1));
    assert_eq!(contents.address_total(), contents.name_total());
}

#[test]
fn without_implicit_items_nothing_is_written() {
    let db = sample_snapshot();
    let mut store = memory_store();

    let (counts, _) = with_session(&db, &mut store, |session| {
        (session.customnames().unwrap(), session.extracomments().unwrap())
    });

    assert_eq!(counts, (0, 0));
    assert!(stored_counts(&store, Partition::Globals).is_empty());
}
