//! ## Level-Indexed Bounding-Volume Hierarchy
//!
//! The tree is not a linked structure: each level is one [`EnvelopeVect`]
//! plus one [`IndexGroups`] table mapping every node to its children in the
//! next level. The bottom table is the identity into the original objects.
//! Built once by [`crate::packing::sort_tile_recurse`] and immutable after,
//! so it can be shared read-only across query workers.
//!
//! Search walks the levels synchronously for a whole batch of queries at
//! once. The frontier is a list of [`QueryPath`]s; at every level the
//! pluggable [`SearchFilter`] scores queries against node envelopes, queries
//! with identical score rows are merged into a single continuation, and the
//! surviving nodes are replaced by their children.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::envelope::{EnvelopeVect, IndexGroups, Matrix};
use crate::exceptions::StrtreeError;
use crate::query::{EnvelopeFilter, KnnFilter, Predicate};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An active frontier item: the queries in `query` are jointly being tested
/// against the level-local node indices in `target`. After the last level,
/// `target` holds indices of the original objects; an empty `target` records
/// queries that matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPath {
    pub query: Vec<usize>,
    pub target: Vec<usize>,
}

/// Per-level test driving the branch-and-bound search.
///
/// `evaluate` receives the global indices of the path's queries, their
/// envelopes (rows) and the envelopes of the path's nodes (columns), and
/// returns a boolean matrix where entry `(i, j)` is true iff query `i`
/// cannot be excluded from matching through node `j`. Implementations may
/// carry state across levels (the nearest-neighbour filter does).
pub trait SearchFilter {
    fn evaluate(
        &mut self,
        queries: &[usize],
        query_env: &EnvelopeVect,
        nodes: &EnvelopeVect,
    ) -> Result<Matrix<bool>, StrtreeError>;
}

/// Bounding-volume hierarchy over a frozen collection of envelopes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Bvh {
    envelopes: Vec<EnvelopeVect>,
    children: Vec<IndexGroups>,
}

impl Bvh {
    /// Assembles a hierarchy from per-level arrays, top level first.
    ///
    /// # Panics
    ///
    /// Panics if the two sequences differ in length or a level's children
    /// table does not have one row per node.
    pub fn new(envelopes: Vec<EnvelopeVect>, children: Vec<IndexGroups>) -> Self {
        assert_eq!(envelopes.len(), children.len());
        for (env, table) in envelopes.iter().zip(children.iter()) {
            assert_eq!(env.len(), table.len());
        }
        Bvh {
            envelopes,
            children,
        }
    }

    pub fn empty() -> Self {
        Bvh {
            envelopes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.envelopes.len()
    }

    /// Number of nodes at the top level, zero for an empty tree.
    pub fn width(&self) -> usize {
        self.envelopes.first().map_or(0, EnvelopeVect::len)
    }

    /// Number of leaves, i.e. of indexed objects.
    pub fn len(&self) -> usize {
        self.envelopes.last().map_or(0, EnvelopeVect::len)
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Per-level envelope batches, top level first.
    pub fn envelopes(&self) -> &[EnvelopeVect] {
        &self.envelopes
    }

    /// Per-level children tables, parallel to [`Bvh::envelopes`].
    pub fn children(&self) -> &[IndexGroups] {
        &self.children
    }

    /// Generic level-synchronous branch-and-bound over a batch of query
    /// envelopes, returning the sparse form: a list of paths whose targets
    /// are indices of the original objects. Every input query appears in
    /// exactly one path; queries whose frontier emptied at some level come
    /// back in a path with an empty target.
    pub fn search<F: SearchFilter>(
        &self,
        obj: &EnvelopeVect,
        filter: &mut F,
    ) -> Result<Vec<QueryPath>, StrtreeError> {
        if obj.is_empty() {
            return Ok(Vec::new());
        }
        if self.is_empty() {
            return Ok(vec![QueryPath {
                query: (0..obj.len()).collect(),
                target: Vec::new(),
            }]);
        }

        let mut paths = vec![QueryPath {
            query: (0..obj.len()).collect(),
            target: (0..self.width()).collect(),
        }];
        let mut finished: Vec<QueryPath> = Vec::new();

        for (level, (env, table)) in self.envelopes.iter().zip(self.children.iter()).enumerate() {
            let mut next = Vec::with_capacity(paths.len());
            for path in &paths {
                let query_env = obj.select(&path.query);
                let node_env = env.select(&path.target);
                let pred = filter.evaluate(&path.query, &query_env, &node_env)?;

                let mut dead = Vec::new();
                let mut live = Vec::new();
                for row in 0..pred.rows() {
                    if pred.row(row).iter().any(|&hit| hit) {
                        live.push(row);
                    } else {
                        dead.push(path.query[row]);
                    }
                }
                if !dead.is_empty() {
                    finished.push(QueryPath {
                        query: dead,
                        target: Vec::new(),
                    });
                }

                // Queries with identical rows descend into the same children;
                // merging them keeps the frontier small on dense data.
                for group in group_rows(&pred, &live) {
                    let mask = pred.row(group[0]);
                    let mut target = Vec::new();
                    for (col, &node) in path.target.iter().enumerate() {
                        if mask[col] {
                            target.extend_from_slice(table.row(node));
                        }
                    }
                    let query = group.iter().map(|&row| path.query[row]).collect();
                    next.push(QueryPath { query, target });
                }
            }
            paths = next;
            debug!("Level {}: {} active paths", level, paths.len());
            if paths.is_empty() {
                break;
            }
        }

        paths.extend(finished);
        Ok(paths)
    }

    /// Like [`Bvh::search`] but materialized in input order: entry `q` holds
    /// the matching object indices of query `q`, empty if none.
    pub fn search_full<F: SearchFilter>(
        &self,
        obj: &EnvelopeVect,
        filter: &mut F,
    ) -> Result<Vec<Vec<usize>>, StrtreeError> {
        let paths = self.search(obj, filter)?;
        let mut result = vec![Vec::new(); obj.len()];
        for path in paths {
            for &q in &path.query {
                result[q] = path.target.clone();
            }
        }
        Ok(result)
    }

    /// Bulk predicate query: for every query envelope, the objects whose
    /// envelopes intersect it. The envelope test is conservative for every
    /// predicate, so the result may contain candidates the exact predicate
    /// rejects; refinement against the real geometries is the caller's job
    /// (see [`crate::joins::sjoin`]).
    pub fn query(
        &self,
        obj: &EnvelopeVect,
        predicate: Predicate,
    ) -> Result<Vec<Vec<usize>>, StrtreeError> {
        debug!("Bulk {} query over {} envelopes", predicate, obj.len());
        let mut filter = EnvelopeFilter::new(predicate);
        self.search_full(obj, &mut filter)
    }

    /// Sparse form of [`Bvh::query`], for block-style downstream joins.
    pub fn query_sparse(
        &self,
        obj: &EnvelopeVect,
        predicate: Predicate,
    ) -> Result<Vec<QueryPath>, StrtreeError> {
        debug!("Sparse {} query over {} envelopes", predicate, obj.len());
        let mut filter = EnvelopeFilter::new(predicate);
        self.search(obj, &mut filter)
    }

    /// Bulk k-nearest-neighbour candidate search. The returned candidate
    /// sets are guaranteed to contain the k true nearest objects of every
    /// query; exact distances and the final top-k cut are the caller's job
    /// (see [`crate::joins::knn_join`]).
    pub fn nearest(&self, obj: &EnvelopeVect, k: usize) -> Result<Vec<Vec<usize>>, StrtreeError> {
        if k == 0 {
            return Ok(vec![Vec::new(); obj.len()]);
        }
        debug!("Bulk {}-nn search over {} envelopes", k, obj.len());
        let mut filter = KnnFilter::new(obj.len(), k);
        self.search_full(obj, &mut filter)
    }
}

/// Groups the live rows of `pred` by identical boolean patterns, preserving
/// first-seen order. Rows are packed into 64-bit words and grouped through a
/// hash map, so grouping stays linear in the matrix size.
fn group_rows(pred: &Matrix<bool>, live: &[usize]) -> Vec<Vec<usize>> {
    let words = (pred.cols().div_ceil(64)).max(1);
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut seen: HashMap<Vec<u64>, usize> = HashMap::new();
    for &row in live {
        let mut key = vec![0u64; words];
        for (col, &hit) in pred.row(row).iter().enumerate() {
            if hit {
                key[col / 64] |= 1 << (col % 64);
            }
        }
        match seen.entry(key) {
            Entry::Occupied(entry) => groups[*entry.get()].push(row),
            Entry::Vacant(entry) => {
                entry.insert(groups.len());
                groups.push(vec![row]);
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_rows_merges_identical_patterns() {
        let pred = Matrix::from_vec(
            vec![
                true, false, true, //
                false, true, true, //
                true, false, true, //
            ],
            3,
            3,
        );
        let groups = group_rows(&pred, &[0, 1, 2]);
        assert_eq!(groups, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_group_rows_wide_patterns() {
        // 70 columns forces two signature words per row.
        let mut a = vec![false; 70];
        a[0] = true;
        a[69] = true;
        let mut b = vec![false; 70];
        b[69] = true;
        let mut data = a.clone();
        data.extend_from_slice(&b);
        data.extend_from_slice(&a);
        let pred = Matrix::from_vec(data, 3, 70);
        let groups = group_rows(&pred, &[0, 1, 2]);
        assert_eq!(groups, vec![vec![0, 2], vec![1]]);
    }
}
