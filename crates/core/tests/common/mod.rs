#![allow(dead_code)]

use serde_json::json;
use tagfix_core::db::SqliteCacheStore;
use tagfix_core::model::RefCounts;
use tagfix_core::source::DatabaseSnapshot;
use tagfix_core::store::{CacheStore, Partition};
use tagfix_core::Session;

/// Two functions plus some global data.
///
/// - F `0x1000..0x1010`: `0x1000 {comment, __name__}`, `0x1004` untagged,
///   `0x1008 {comment}`; function-level tags `{__name__, synopsis}`.
/// - G `0x1100..0x1120`: `0x1100 {__typeinfo__}`, `0x1110 {note}`.
/// - data: `0x2000 {comment}`, `0x2008` untagged, `0x2010 {__name__, type}`.
pub fn sample_snapshot() -> DatabaseSnapshot {
    DatabaseSnapshot::new(0x1000, 0x3000)
        .with_function(0x1000, 0x1000, 0x1010)
        .with_function(0x1100, 0x1100, 0x1120)
        .with_function_tag(0x1000, "__name__", json!("main"))
        .with_function_tag(0x1000, "synopsis", json!("entry point"))
        .with_tag(0x1000, "comment", json!("start"))
        .with_tag(0x1000, "__name__", json!("main"))
        .with_head(0x1004)
        .with_tag(0x1008, "comment", json!("loop"))
        .with_tag(0x1100, "__typeinfo__", json!("int(void)"))
        .with_tag(0x1110, "note", json!("tail call"))
        .with_tag(0x2000, "comment", json!("table"))
        .with_head(0x2008)
        .with_tag(0x2010, "__name__", json!("g_table"))
        .with_tag(0x2010, "type", json!("int[4]"))
}

pub fn memory_store() -> SqliteCacheStore {
    SqliteCacheStore::open_in_memory().expect("in-memory cache")
}

/// Run `f` on a fresh session and return its result with the captured output.
pub fn with_session<T>(
    source: &DatabaseSnapshot,
    store: &mut SqliteCacheStore,
    f: impl FnOnce(&mut Session<'_>) -> T,
) -> (T, String) {
    let mut out: Vec<u8> = Vec::new();
    let value = {
        let mut session = Session::new(source, store, &mut out);
        f(&mut session)
    };
    (value, String::from_utf8(out).expect("utf8 output"))
}

/// Decoded counts of one partition, empty when nothing is stored.
pub fn stored_counts(store: &SqliteCacheStore, partition: Partition) -> RefCounts {
    store
        .read(partition)
        .expect("read partition")
        .map(|entry| entry.counts().expect("decode counts"))
        .unwrap_or_default()
}

/// Every persisted partition with its counts.
pub fn dump(store: &SqliteCacheStore) -> Vec<(Partition, RefCounts)> {
    let mut out = Vec::new();
    for function in store.contents_keys().expect("contents keys") {
        let partition = Partition::Contents(function);
        out.push((partition, stored_counts(store, partition)));
    }
    out.push((Partition::Globals, stored_counts(store, Partition::Globals)));
    out
}
