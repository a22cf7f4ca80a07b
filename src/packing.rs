//! ## Sort-Tile-Recurse Bulk Packing
//!
//! Builds a balanced bounding-volume hierarchy over a frozen batch of
//! envelopes in one pass. Each round sorts the current level's centers along
//! the first axis, splits them into `ceil((n / page_size)^(1/d))` contiguous
//! tiles, recurses on the remaining axes inside every tile, and merges each
//! resulting group into a parent envelope. Rounds repeat until the top level
//! fits `max_top_size` nodes.
//!
//! The output is the level-indexed [`Bvh`]: per-level envelope batches plus
//! per-level parent-to-children index tables, top level first.

use crate::bvh::Bvh;
use crate::envelope::{EnvelopeVect, IndexGroups};
use crate::exceptions::StrtreeError;
use ordered_float::OrderedFloat;
use tracing::{debug, info};

/// Default fan-out of internal nodes.
pub const PAGE_SIZE: usize = 16;

/// Default maximum width of the top level.
pub const MAX_TOP_SIZE: usize = 1;

/// Packs `leaves` into a balanced hierarchy.
///
/// # Arguments
///
/// * `leaves` - One envelope per indexed object; positions become the leaf
///   indices reported by queries.
/// * `page_size` - Fan-out of internal nodes. Must be at least two.
/// * `max_top_size` - Maximum number of nodes at the top level. Must be at
///   least one.
///
/// An empty batch yields an empty tree of depth zero.
pub fn sort_tile_recurse(
    leaves: EnvelopeVect,
    page_size: usize,
    max_top_size: usize,
) -> Result<Bvh, StrtreeError> {
    if page_size < 2 {
        return Err(StrtreeError::InvalidCapacity {
            capacity: page_size,
        });
    }
    if max_top_size == 0 {
        return Err(StrtreeError::InvalidCapacity { capacity: 0 });
    }
    if leaves.is_empty() {
        return Ok(Bvh::empty());
    }
    info!(
        "Packing {} envelopes with page_size {} and max_top_size {}",
        leaves.len(),
        page_size,
        max_top_size
    );

    let ndims = leaves.ndims();
    let mut children = vec![IndexGroups::identity(leaves.len())];
    let mut envelopes = vec![leaves];
    loop {
        let (table, merged) = {
            let level = envelopes.last().expect("at least the leaf level");
            if level.len() <= max_top_size {
                break;
            }
            let centers = level.centers();
            let mut groups = Vec::new();
            sort_tile(
                (0..level.len()).collect(),
                &centers,
                ndims,
                0,
                page_size,
                &mut groups,
            );
            let table = IndexGroups::from_rows(groups);
            let merged = level.mergeby(&table);
            debug!("Grouped {} nodes into {} parents", level.len(), merged.len());
            (table, merged)
        };
        children.push(table);
        envelopes.push(merged);
    }
    envelopes.reverse();
    children.reverse();
    Ok(Bvh::new(envelopes, children))
}

/// Number of tiles along the current axis for `nobs` observations with
/// `ndims_left` axes still to split on.
fn tile_count(nobs: usize, ndims_left: usize, page_size: usize) -> usize {
    let ratio = nobs as f64 / page_size as f64;
    let tiles = ratio.powf(1.0 / ndims_left as f64).ceil() as usize;
    tiles.max(1)
}

/// Sorts `indices` by the center coordinate of axis `dim`, splits them into
/// contiguous tiles and recurses on the remaining axes within every tile.
/// Final groups are appended to `out` in tile order.
///
/// With `r = n mod nb_tiles`, the first `r` tiles get one extra member, so
/// tile sizes differ by at most one. Equal sort keys fall back to the
/// original index, which keeps the packing deterministic.
fn sort_tile(
    mut indices: Vec<usize>,
    centers: &[f64],
    ndims: usize,
    dim: usize,
    page_size: usize,
    out: &mut Vec<Vec<usize>>,
) {
    let n = indices.len();
    let nb_tiles = tile_count(n, ndims - dim, page_size);
    indices.sort_by_key(|&i| (OrderedFloat(centers[i * ndims + dim]), i));

    let quotient = n / nb_tiles;
    let remainder = n % nb_tiles;
    let mut start = 0;
    for tile in 0..nb_tiles {
        let size = if tile < remainder {
            quotient + 1
        } else {
            quotient
        };
        if size == 0 {
            continue;
        }
        let group = indices[start..start + size].to_vec();
        start += size;
        if dim + 1 == ndims {
            out.push(group);
        } else {
            sort_tile(group, centers, ndims, dim + 1, page_size, out);
        }
    }
}
