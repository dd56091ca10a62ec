#![no_main]

use chrono::FixedOffset;
use libfuzzer_sys::fuzz_target;
use presenca::normalize::Normalizer;
use presenca::store::snapshot::{Snapshot, SnapshotStore};
use presenca::store::{RecordStore, StreamRequest};

fuzz_target!(|data: &[u8]| {
    // Decoding and normalizing arbitrary snapshots must never panic
    let Ok(snapshot) = Snapshot::from_slice(data) else {
        return;
    };
    let names: Vec<String> = snapshot.collections.keys().cloned().collect();
    let store = SnapshotStore::from_snapshot(snapshot);
    let Some(zone) = FixedOffset::west_opt(4 * 3600) else {
        return;
    };
    let normalizer = Normalizer::new(zone);
    for name in names {
        if let Ok(docs) = store.stream(&StreamRequest::new(name)) {
            let _ = normalizer.normalize_all(&docs);
        }
    }
});
