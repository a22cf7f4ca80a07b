//! ## Concrete Search Filters
//!
//! The two [`SearchFilter`] bindings the public API uses: the conservative
//! envelope-intersection filter behind predicate queries, and the
//! nearest-neighbour filter that prunes on distance bounds while carrying
//! per-query state across levels.

use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use crate::bvh::SearchFilter;
use crate::envelope::{EnvelopeVect, Matrix};
use crate::exceptions::StrtreeError;
use ordered_float::OrderedFloat;

/// A spatial relationship between two geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    Intersects,
    Contains,
    Within,
    Overlaps,
    Crosses,
    Touches,
}

impl Predicate {
    pub const ALL: [Predicate; 6] = [
        Predicate::Intersects,
        Predicate::Contains,
        Predicate::Within,
        Predicate::Overlaps,
        Predicate::Crosses,
        Predicate::Touches,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::Intersects => "intersects",
            Predicate::Contains => "contains",
            Predicate::Within => "within",
            Predicate::Overlaps => "overlaps",
            Predicate::Crosses => "crosses",
            Predicate::Touches => "touches",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Predicate {
    type Err = StrtreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predicate::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| StrtreeError::InvalidPredicate {
                predicate: s.to_string(),
            })
    }
}

/// Envelope-level filter for predicate queries.
///
/// Every supported predicate implies envelope intersection, so the batched
/// strict intersection test is a sound pruning test for all of them. The
/// candidates it lets through still need exact refinement.
#[derive(Debug)]
pub struct EnvelopeFilter {
    pub predicate: Predicate,
}

impl EnvelopeFilter {
    pub fn new(predicate: Predicate) -> Self {
        EnvelopeFilter { predicate }
    }
}

impl SearchFilter for EnvelopeFilter {
    fn evaluate(
        &mut self,
        _queries: &[usize],
        query_env: &EnvelopeVect,
        nodes: &EnvelopeVect,
    ) -> Result<Matrix<bool>, StrtreeError> {
        query_env.intersects(nodes)
    }
}

/// Branch-and-bound filter for bulk k-nearest-neighbour search.
///
/// For every query it keeps the k smallest MAXMINDIST values ever seen
/// across any node in a capped max-heap. A node stays alive for a query iff
/// its MINDIST does not exceed the k-th smallest upper bound, so the true
/// k nearest objects can never be pruned.
#[derive(Debug)]
pub struct KnnFilter {
    k: usize,
    seen: Vec<BinaryHeap<OrderedFloat<f64>>>,
}

impl KnnFilter {
    /// # Panics
    ///
    /// Panics if `k` is zero; the search entry point short-circuits that case.
    pub fn new(n_queries: usize, k: usize) -> Self {
        assert!(k > 0);
        KnnFilter {
            k,
            seen: vec![BinaryHeap::new(); n_queries],
        }
    }

    fn push_bound(&mut self, query: usize, value: f64) {
        let heap = &mut self.seen[query];
        heap.push(OrderedFloat(value));
        if heap.len() > self.k {
            heap.pop();
        }
    }

    /// Upper bound on the query's k-th nearest distance, infinite until k
    /// values have been observed.
    fn kth_bound(&self, query: usize) -> f64 {
        let heap = &self.seen[query];
        if heap.len() < self.k {
            f64::INFINITY
        } else {
            heap.peek().map_or(f64::INFINITY, |v| v.0)
        }
    }
}

impl SearchFilter for KnnFilter {
    fn evaluate(
        &mut self,
        queries: &[usize],
        query_env: &EnvelopeVect,
        nodes: &EnvelopeVect,
    ) -> Result<Matrix<bool>, StrtreeError> {
        let (lower, upper) = query_env.bound_dist(nodes)?;
        let (rows, cols) = (lower.rows(), lower.cols());
        let mut data = Vec::with_capacity(rows * cols);
        for (row, &query) in queries.iter().enumerate() {
            for col in 0..cols {
                self.push_bound(query, upper.get(row, col));
            }
            let bound = self.kth_bound(query);
            for col in 0..cols {
                data.push(lower.get(row, col) <= bound);
            }
        }
        Ok(Matrix::from_vec(data, rows, cols))
    }
}
