#![no_main]
use karma_core::{codec, AliasStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let report = codec::decode(data);
    let mut store = AliasStore::new();
    for record in report.records {
        store.insert(record);
    }
    store.resort();

    // Whatever loaded must encode and load back to the same records.
    let mut out = Vec::new();
    let written = codec::encode(store.ranked(), &mut out).unwrap_or(0);
    let again = codec::decode(out.as_slice());
    assert!(again.stopped.is_none());
    assert_eq!(again.records.len(), written);
});
