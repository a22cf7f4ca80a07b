//! Bincode round-trips for the serde feature

use shared::*;

use strtree::bvh::Bvh;
use strtree::envelope::EnvelopeVect;
use strtree::geometry::Geom;
use strtree::packing::sort_tile_recurse;
use strtree::query::Predicate;

#[test]
fn test_bvh_roundtrip() {
    let leaves = EnvelopeVect::from_bounds(pseudo_random_bounds(80, 7));
    let tree = sort_tile_recurse(leaves, PAGE_SIZE, 1).unwrap();

    let encoded: Vec<u8> = bincode::serialize(&tree).unwrap();
    let decoded: Bvh = bincode::deserialize(&encoded[..]).unwrap();
    assert_eq!(tree, decoded);
}

#[test]
fn test_decoded_tree_answers_queries() {
    let bounds = pseudo_random_bounds(60, 19);
    let queries = EnvelopeVect::from_bounds(pseudo_random_bounds(10, 3));
    let tree = sort_tile_recurse(EnvelopeVect::from_bounds(bounds), PAGE_SIZE, 1).unwrap();

    let encoded: Vec<u8> = bincode::serialize(&tree).unwrap();
    let decoded: Bvh = bincode::deserialize(&encoded[..]).unwrap();
    assert_eq!(
        tree.query(&queries, Predicate::Intersects).unwrap(),
        decoded.query(&queries, Predicate::Intersects).unwrap()
    );
}

#[test]
fn test_geometry_roundtrip() {
    let geoms = vec![
        Geom::point(1.0, 2.0),
        Geom::line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]),
        Geom::polygon(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]),
    ];
    let encoded: Vec<u8> = bincode::serialize(&geoms).unwrap();
    let decoded: Vec<Geom> = bincode::deserialize(&encoded[..]).unwrap();
    assert_eq!(geoms, decoded);
}
