#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::collections::HashMap;

use bitplane_counter::BitPlaneCounter;
use tabled::{
    settings::{Settings, Style},
    Table, Tabled,
};

#[derive(Tabled)]
struct Record {
    keys: u64,
    bitplane_counter: String,
    hash_map: String,
}

/// Keys cluster into dense runs separated by gaps, the way object identifiers usually do.
fn clustered_key(i: u64) -> u64 {
    (i / 64) * 1024 + (i % 64)
}

fn measure_memory_usage<T>(
    keys: u64,
    create: impl Fn() -> T,
    increment: impl Fn(&mut T, u64, u64),
) -> String
where
    T: Sized,
{
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut counter = create();
    for i in 0..keys {
        increment(&mut counter, clustered_key(i), i % 7 + 1);
    }
    let stats = dhat::HeapStats::get();
    format!(
        "{} / {} / {}",
        std::mem::size_of::<T>(),
        stats.curr_bytes,
        stats.curr_blocks
    )
}

#[test]
fn test_allocations() {
    let results: Vec<Record> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= 1 << 16)
        .map(|keys| Record {
            keys,
            bitplane_counter: measure_memory_usage(
                keys,
                BitPlaneCounter::<4>::new,
                |counter, key, n| counter.increment_by(key, n),
            ),
            hash_map: measure_memory_usage(
                keys,
                HashMap::<u64, u64>::new,
                |map, key, n| *map.entry(key).or_insert(0) += n,
            ),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    let markdown = Table::new(results).with(table_config).to_string();
    println!("{}", markdown);
}

