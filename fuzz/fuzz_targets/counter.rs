#![no_main]

use std::collections::HashMap;

use bitplane_counter::{BitPlaneCounter, Count};
use libfuzzer_sys::fuzz_target;
use roaring::RoaringTreemap;

const THRESHOLD: u64 = 16;

fn model_add(model: &mut HashMap<u64, u64>, key: u64, n: u64) {
    if n > 0 {
        let count = model.entry(key).or_insert(0);
        *count = (*count + n).min(THRESHOLD);
    }
}

fuzz_target!(|data: &[u8]| {
    let mut counter = BitPlaneCounter::<5>::new();
    let mut other = BitPlaneCounter::<5>::new();
    let mut model: HashMap<u64, u64> = HashMap::new();
    let mut other_model: HashMap<u64, u64> = HashMap::new();

    for op in data.chunks_exact(3) {
        let key = u64::from(op[1] % 32);
        let arg = u64::from(op[2]);
        match op[0] % 8 {
            0 => {
                counter.increment(key);
                model_add(&mut model, key, 1);
            }
            1 => {
                counter.increment_by(key, arg % 20);
                model_add(&mut model, key, arg % 20);
            }
            2 => {
                let keys: RoaringTreemap = (key..key + arg % 8).collect();
                counter.increment_many(&keys);
                for k in keys.iter() {
                    model_add(&mut model, k, 1);
                }
            }
            3 => {
                other.increment_by(key, arg % 20);
                model_add(&mut other_model, key, arg % 20);
            }
            4 => {
                counter.merge(&other);
                for (&k, &n) in &other_model {
                    model_add(&mut model, k, n);
                }
            }
            5 => {
                let n = (arg % 5) as usize;
                counter.scale_by_pow2(n);
                for count in model.values_mut() {
                    *count = (*count << n).min(THRESHOLD);
                }
            }
            6 => {
                counter.remove(key);
                model.remove(&key);
            }
            _ => {
                counter.remove_keys_below(key);
                model.retain(|&k, _| k >= key);
            }
        }
    }

    assert_eq!(counter.snapshot(), model);
    for (&key, &count) in &model {
        let expected = if count >= THRESHOLD {
            Count::Saturated
        } else {
            Count::Exact(count)
        };
        assert_eq!(counter.count(key), expected);
    }
});
