//! Property-based tests for the STR packer and the bulk search

use proptest::prelude::*;
use strtree::envelope::EnvelopeVect;
use strtree::packing::sort_tile_recurse;
use strtree::query::Predicate;

prop_compose! {
    fn arb_rect()(
        minx in -100.0..100.0,
        miny in -100.0..100.0,
        width in 0.5..20.0,
        height in 0.5..20.0,
    ) -> (f64, f64, f64, f64) {
        (minx, miny, minx + width, miny + height)
    }
}

proptest! {
    #[test]
    fn test_leaves_are_partitioned_exactly_once(
        bounds in prop::collection::vec(arb_rect(), 1..120),
        page_size in 2usize..20,
    ) {
        let n = bounds.len();
        let tree = sort_tile_recurse(EnvelopeVect::from_bounds(bounds), page_size, 1).unwrap();
        prop_assert_eq!(tree.len(), n);
        for level in 0..tree.depth() {
            let target = if level + 1 < tree.depth() {
                tree.envelopes()[level + 1].len()
            } else {
                n
            };
            let mut seen: Vec<usize> = tree.children()[level].values().to_vec();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..target).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_parents_contain_children(
        bounds in prop::collection::vec(arb_rect(), 2..100),
        page_size in 2usize..12,
    ) {
        let tree = sort_tile_recurse(EnvelopeVect::from_bounds(bounds), page_size, 1).unwrap();
        for level in 0..tree.depth().saturating_sub(1) {
            let parents = &tree.envelopes()[level];
            let kids = &tree.envelopes()[level + 1];
            let table = &tree.children()[level];
            for node in 0..parents.len() {
                for &child in table.row(node) {
                    for d in 0..2 {
                        prop_assert!(parents.min_at(node, d) <= kids.min_at(child, d));
                        prop_assert!(parents.max_at(node, d) >= kids.max_at(child, d));
                    }
                }
            }
        }
    }

    #[test]
    fn test_build_and_query_are_deterministic(
        bounds in prop::collection::vec(arb_rect(), 1..60),
        queries in prop::collection::vec(arb_rect(), 1..20),
    ) {
        let leaves = EnvelopeVect::from_bounds(bounds);
        let query_env = EnvelopeVect::from_bounds(queries);
        let first = sort_tile_recurse(leaves.clone(), 4, 1).unwrap();
        let second = sort_tile_recurse(leaves, 4, 1).unwrap();
        prop_assert_eq!(&first, &second);
        let r1 = first.query(&query_env, Predicate::Intersects).unwrap();
        let r2 = second.query(&query_env, Predicate::Intersects).unwrap();
        prop_assert_eq!(r1, r2);
    }

    #[test]
    fn test_query_agrees_with_brute_force(
        bounds in prop::collection::vec(arb_rect(), 1..80),
        queries in prop::collection::vec(arb_rect(), 1..20),
        page_size in 2usize..10,
    ) {
        let tree =
            sort_tile_recurse(EnvelopeVect::from_bounds(bounds.clone()), page_size, 1).unwrap();
        let result = tree
            .query(&EnvelopeVect::from_bounds(queries.clone()), Predicate::Intersects)
            .unwrap();
        for (q, matches) in result.iter().enumerate() {
            let mut sorted = matches.clone();
            sorted.sort_unstable();
            let brute: Vec<usize> = bounds
                .iter()
                .enumerate()
                .filter(|(_, b)| {
                    queries[q].0 < b.2 && queries[q].2 > b.0 && queries[q].1 < b.3 && queries[q].3 > b.1
                })
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(sorted, brute);
        }
    }

    #[test]
    fn test_every_leaf_queries_itself(
        bounds in prop::collection::vec(arb_rect(), 1..60),
    ) {
        let leaves = EnvelopeVect::from_bounds(bounds);
        let tree = sort_tile_recurse(leaves.clone(), 4, 1).unwrap();
        let result = tree.query(&leaves, Predicate::Intersects).unwrap();
        for (i, matches) in result.iter().enumerate() {
            prop_assert!(matches.contains(&i));
        }
    }

    #[test]
    fn test_single_nearest_is_never_pruned(
        bounds in prop::collection::vec(arb_rect(), 1..60),
        queries in prop::collection::vec(arb_rect(), 1..10),
    ) {
        let leaves = EnvelopeVect::from_bounds(bounds.clone());
        let query_env = EnvelopeVect::from_bounds(queries);
        let tree = sort_tile_recurse(leaves.clone(), 4, 1).unwrap();
        let candidates = tree.nearest(&query_env, 1).unwrap();
        let dist = query_env.distance(&leaves).unwrap();
        for (q, cands) in candidates.iter().enumerate() {
            let best_all = (0..bounds.len())
                .map(|j| dist.get(q, j))
                .fold(f64::INFINITY, f64::min);
            let best_cand = cands
                .iter()
                .map(|&j| dist.get(q, j))
                .fold(f64::INFINITY, f64::min);
            prop_assert!(!cands.is_empty());
            prop_assert!((best_cand - best_all).abs() < 1e-9);
        }
    }
}
