#![no_main]

use bitplane_counter::BitPlaneCounter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut counter) = serde_json::from_slice::<BitPlaneCounter<5>>(data) {
        counter.increment(1);
        assert!(!counter.is_empty());
        for (_, count) in counter.snapshot() {
            assert!(count <= counter.threshold());
        }
    }
});
