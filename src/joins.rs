//! ## Spatial Joins
//!
//! The refinement layer on top of the index: every join builds (or reuses) a
//! hierarchy over the right-hand collection, collects envelope-level
//! candidates in bulk, and settles them against the exact geometries. Three
//! joins are provided: predicate joins, true nearest-neighbour joins and
//! maximum-intersection-measure joins.

use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use crate::bvh::Bvh;
use crate::exceptions::StrtreeError;
use crate::geometry::{envelopes_of, GeomType, SpatialGeometry};
use crate::packing::{sort_tile_recurse, MAX_TOP_SIZE, PAGE_SIZE};
use crate::query::Predicate;
use ordered_float::OrderedFloat;
use tracing::{debug, info};

/// Relative tolerance when comparing intersection measures for ties.
const MEASURE_RTOL: f64 = 1e-5;
/// Absolute tolerance when comparing intersection measures for ties.
const MEASURE_ATOL: f64 = 1e-8;

/// Index-construction parameters shared by all joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinParams {
    /// Fan-out of internal index nodes.
    pub page_size: usize,
    /// Maximum width of the index top level.
    pub max_top_size: usize,
}

impl Default for JoinParams {
    fn default() -> Self {
        JoinParams {
            page_size: PAGE_SIZE,
            max_top_size: MAX_TOP_SIZE,
        }
    }
}

/// The measure maximized by [`max_measure_join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Length,
    Area,
}

impl Measure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Length => "length",
            Measure::Area => "area",
        }
    }

    /// True iff the measure can be computed with `geom_type` on the left.
    fn supports(&self, geom_type: GeomType) -> bool {
        match self {
            Measure::Length => {
                matches!(geom_type, GeomType::LineString | GeomType::MultiLineString)
            }
            Measure::Area => matches!(geom_type, GeomType::Polygon | GeomType::MultiPolygon),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Measure {
    type Err = StrtreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(Measure::Length),
            "area" => Ok(Measure::Area),
            other => Err(StrtreeError::InvalidMeasure {
                measure: other.to_string(),
            }),
        }
    }
}

/// Builds the hierarchy over a geometry collection.
pub fn build_index<G: SpatialGeometry>(
    geoms: &[G],
    params: &JoinParams,
) -> Result<Bvh, StrtreeError> {
    sort_tile_recurse(envelopes_of(geoms), params.page_size, params.max_top_size)
}

/// Predicate join: all pairs `(left_i, right_j)` whose geometries satisfy
/// `predicate` exactly. Pairs come out ordered by left index, then by right
/// index within each left element's candidate order.
pub fn sjoin<G: SpatialGeometry>(
    left: &[G],
    right: &[G],
    predicate: Predicate,
    params: &JoinParams,
) -> Result<Vec<(usize, usize)>, StrtreeError> {
    let index = build_index(right, params)?;
    sjoin_with_index(&index, left, right, predicate)
}

/// [`sjoin`] against a prebuilt index over `right`.
pub fn sjoin_with_index<G: SpatialGeometry>(
    index: &Bvh,
    left: &[G],
    right: &[G],
    predicate: Predicate,
) -> Result<Vec<(usize, usize)>, StrtreeError> {
    info!("{} join of {} x {} geometries", predicate, left.len(), right.len());
    let candidates = index.query(&envelopes_of(left), predicate)?;
    let mut pairs = Vec::new();
    for (i, cands) in candidates.iter().enumerate() {
        for &j in cands {
            if left[i].relate(&right[j], predicate) {
                pairs.push((i, j));
            }
        }
    }
    debug!("{} candidate lists refined into {} pairs", candidates.len(), pairs.len());
    Ok(pairs)
}

/// True k-nearest-neighbour join: for every left geometry, up to `k`
/// `(right_index, distance)` pairs sorted ascending by distance (ties by
/// index). `k == 0` yields empty rows.
pub fn knn_join<G: SpatialGeometry>(
    left: &[G],
    right: &[G],
    k: usize,
    params: &JoinParams,
) -> Result<Vec<Vec<(usize, f64)>>, StrtreeError> {
    let index = build_index(right, params)?;
    knn_join_with_index(&index, left, right, k)
}

/// [`knn_join`] against a prebuilt index over `right`.
pub fn knn_join_with_index<G: SpatialGeometry>(
    index: &Bvh,
    left: &[G],
    right: &[G],
    k: usize,
) -> Result<Vec<Vec<(usize, f64)>>, StrtreeError> {
    info!("{}-nn join of {} x {} geometries", k, left.len(), right.len());
    let candidates = index.nearest(&envelopes_of(left), k)?;
    Ok(candidates
        .iter()
        .enumerate()
        .map(|(i, cands)| true_nearest(&left[i], right, cands, k))
        .collect())
}

/// Settles envelope-level candidates into the k true nearest neighbours.
/// A capped max-heap keeps the k smallest exact distances seen so far; the
/// survivors are sorted ascending at the end.
fn true_nearest<G: SpatialGeometry>(
    geom: &G,
    right: &[G],
    candidates: &[usize],
    k: usize,
) -> Vec<(usize, f64)> {
    let mut heap: BinaryHeap<(OrderedFloat<f64>, usize)> = BinaryHeap::new();
    for &j in candidates {
        let dist = geom.distance(&right[j]);
        heap.push((OrderedFloat(dist), j));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut best: Vec<(usize, f64)> = heap.into_iter().map(|(d, j)| (j, d.0)).collect();
    best.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    best
}

/// Maximum-measure join: for every left geometry, the right geometries whose
/// intersection measure with it is maximal (all of them when measures tie
/// within floating-point closeness), as `(left_i, Some(right_j), measure)`
/// rows ordered by left index. Left elements with no intersecting candidate,
/// or whose measures are all zero, yield a single `(left_i, None, NaN)` row.
///
/// The measure must match the left geometry types: `length` requires line
/// geometries, `area` requires polygons. A mismatch fails the whole call
/// before any index work.
pub fn max_measure_join<G: SpatialGeometry>(
    left: &[G],
    right: &[G],
    measure: Measure,
    params: &JoinParams,
) -> Result<Vec<(usize, Option<usize>, f64)>, StrtreeError> {
    let index = build_index(right, params)?;
    max_measure_join_with_index(&index, left, right, measure)
}

/// [`max_measure_join`] against a prebuilt index over `right`.
pub fn max_measure_join_with_index<G: SpatialGeometry>(
    index: &Bvh,
    left: &[G],
    right: &[G],
    measure: Measure,
) -> Result<Vec<(usize, Option<usize>, f64)>, StrtreeError> {
    for geom in left {
        if !measure.supports(geom.geom_type()) {
            return Err(StrtreeError::UnsupportedGeometry {
                geom_type: geom.geom_type().to_string(),
            });
        }
    }
    info!(
        "max-{} join of {} x {} geometries",
        measure,
        left.len(),
        right.len()
    );

    let candidates = index.query(&envelopes_of(left), Predicate::Intersects)?;
    let mut rows = Vec::new();
    for (i, cands) in candidates.iter().enumerate() {
        if cands.is_empty() {
            rows.push((i, None, f64::NAN));
            continue;
        }
        let measures: Vec<f64> = cands
            .iter()
            .map(|&j| match measure {
                Measure::Length => left[i].intersection_length(&right[j]),
                Measure::Area => left[i].intersection_area(&right[j]),
            })
            .collect();
        let best = measures.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(best > 0.0) {
            rows.push((i, None, f64::NAN));
            continue;
        }
        for (c, &j) in cands.iter().enumerate() {
            if measure_close(measures[c], best) {
                rows.push((i, Some(j), measures[c]));
            }
        }
    }
    Ok(rows)
}

fn measure_close(value: f64, best: f64) -> bool {
    (best - value).abs() <= MEASURE_ATOL + MEASURE_RTOL * best.abs()
}
