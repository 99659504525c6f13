use geocell::{IntervalCellSet, SpatialCell};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::ops::ControlFlow;

const UNIVERSE: u32 = 1 << 16;

fn check_invariants(set: &IntervalCellSet, naive: &HashSet<u32>) {
    assert_eq!(set.len(), naive.len() as u64);
    let runs: Vec<(u32, u32)> = set.runs().map(|(s, e)| (s.code(), e.code())).collect();
    for &(s, e) in &runs {
        assert!(s <= e);
    }
    for w in runs.windows(2) {
        // Runs are disjoint and never adjacent.
        assert!(w[0].1 as u64 + 1 < w[1].0 as u64, "{:?} then {:?}", w[0], w[1]);
    }
}

#[test]
fn test_interval_set_matches_hash_set() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut set = IntervalCellSet::new();
    let mut naive: HashSet<u32> = HashSet::new();

    for step in 0..150_000u32 {
        match rng.gen_range(0..10) {
            0..=4 => {
                let code = rng.gen_range(0..UNIVERSE);
                let added = set.insert(SpatialCell::from_code(code));
                assert_eq!(added, naive.insert(code));
            }
            5 | 6 => {
                let lo = rng.gen_range(0..UNIVERSE - 1);
                let hi = (lo + rng.gen_range(1..64)).min(UNIVERSE - 1);
                let was = naive.len();
                naive.extend(lo..=hi);
                let changed = set
                    .insert_range(SpatialCell::from_code(lo), SpatialCell::from_code(hi))
                    .unwrap();
                assert_eq!(changed, naive.len() != was);
            }
            7 if step % 50 == 0 => {
                let block = rng.gen_range(0..UNIVERSE >> 8) << 8;
                let cell = SpatialCell::from_code(block).with_depth(3).unwrap();
                set.insert(cell);
                naive.extend(cell.lower().code()..=cell.upper().code());
            }
            _ => {
                let code = rng.gen_range(0..UNIVERSE);
                assert_eq!(set.contains(&SpatialCell::from_code(code)), naive.contains(&code));
            }
        }
        if step % 5_000 == 0 {
            check_invariants(&set, &naive);
        }
    }
    check_invariants(&set, &naive);

    let mut expected: Vec<u32> = naive.iter().copied().collect();
    expected.sort_unstable();
    let mut visited = Vec::with_capacity(expected.len());
    let flow = set.for_each(|cell| {
        visited.push(cell.code());
        ControlFlow::Continue(())
    });
    assert!(flow.is_continue());
    assert_eq!(visited, expected);
}

#[test]
fn test_merged_traversal_tiles_the_set() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut set = IntervalCellSet::new();
    for _ in 0..2_000 {
        let lo = rng.gen_range(0..1u32 << 20);
        let hi = lo + rng.gen_range(1..5_000);
        set.insert_range(SpatialCell::from_code(lo), SpatialCell::from_code(hi))
            .unwrap();
    }

    let mut rebuilt = IntervalCellSet::new();
    let mut total = 0u64;
    let mut last: Option<SpatialCell> = None;
    let _ = set.for_each_merged(|cell| {
        // Each cell is aligned to its own span.
        assert_eq!(cell.code() as u64 % SpatialCell::leaf_span(cell.depth()), 0);
        if let Some(prev) = last {
            assert!(prev.upper() < cell.lower());
        }
        last = Some(cell);
        total += SpatialCell::leaf_span(cell.depth());
        rebuilt.insert(cell);
        ControlFlow::Continue(())
    });
    assert_eq!(total, set.len());
    assert_eq!(rebuilt, set);
}

#[test]
fn test_reinsertion_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(3);
    let cells: Vec<SpatialCell> = (0..10_000)
        .map(|_| SpatialCell::from_code(rng.gen_range(0..UNIVERSE)))
        .collect();
    let once: IntervalCellSet = cells.iter().copied().collect();
    let mut twice = once.clone();
    for cell in &cells {
        assert!(!twice.insert(*cell));
    }
    assert_eq!(once, twice);
}
