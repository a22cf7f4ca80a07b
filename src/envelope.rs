//! ## Columnar Envelope Batches
//!
//! This module implements batches of axis-aligned minimum bounding rectangles
//! (AAMBRs) stored as two flat coordinate arrays, together with the pairwise
//! operations used by the packed tree: intersection tests, lower/upper
//! distance bounds and group-wise merging. Storing `mins`/`maxs` arrays
//! instead of a list of rectangle objects keeps the per-level search loops
//! tight and allocation-free.
//!
//! The layout is dimension-generic; the crate is exercised in 2D.

use crate::exceptions::StrtreeError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A dense rows x cols table holding the result of a pairwise envelope
/// operation. Row `r` corresponds to the r-th envelope of the left batch,
/// column `c` to the c-th envelope of the right batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Matrix<T> {
    /// Wraps a flat row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols);
        Matrix { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Returns row `row` as a slice of length `cols`.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
}

/// A ragged table of index groups stored CSR-style: `row(i)` is the dense
/// list of indices belonging to group `i`. This is the children table of a
/// tree level (group = parent node) and the argument of
/// [`EnvelopeVect::mergeby`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGroups {
    offsets: Vec<usize>,
    values: Vec<usize>,
}

impl IndexGroups {
    pub fn from_rows(rows: Vec<Vec<usize>>) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        offsets.push(0);
        let mut values = Vec::new();
        for row in rows {
            values.extend_from_slice(&row);
            offsets.push(values.len());
        }
        IndexGroups { offsets, values }
    }

    /// The identity table: `n` single-element groups `[0], [1], ..., [n-1]`.
    pub fn identity(n: usize) -> Self {
        IndexGroups {
            offsets: (0..=n).collect(),
            values: (0..n).collect(),
        }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, i: usize) -> &[usize] {
        &self.values[self.offsets[i]..self.offsets[i + 1]]
    }

    /// All indices of all groups, concatenated in group order.
    pub fn values(&self) -> &[usize] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        (0..self.len()).map(move |i| self.row(i))
    }
}

/// An ordered batch of `len` axis-aligned envelopes in `ndims` dimensions.
///
/// The coordinates are stored in two flat arrays of `len * ndims` values,
/// envelope-major: dimension `d` of envelope `i` lives at `i * ndims + d`.
/// Envelopes are identified by their position in the batch.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeVect {
    mins: Vec<f64>,
    maxs: Vec<f64>,
    ndims: usize,
}

impl EnvelopeVect {
    /// Builds a batch from flat coordinate buffers.
    ///
    /// # Panics
    ///
    /// Panics if the buffers disagree in length, `ndims` is zero, or the
    /// buffer length is not a multiple of `ndims`.
    pub fn from_columns(mins: Vec<f64>, maxs: Vec<f64>, ndims: usize) -> Self {
        assert_eq!(mins.len(), maxs.len());
        assert!(ndims > 0);
        assert_eq!(mins.len() % ndims, 0);
        debug_assert!(mins.iter().zip(maxs.iter()).all(|(lo, hi)| lo <= hi));
        EnvelopeVect { mins, maxs, ndims }
    }

    /// Builds a 2D batch from `(minx, miny, maxx, maxy)` tuples.
    pub fn from_bounds(bounds: impl IntoIterator<Item = (f64, f64, f64, f64)>) -> Self {
        let mut mins = Vec::new();
        let mut maxs = Vec::new();
        for (minx, miny, maxx, maxy) in bounds {
            mins.push(minx);
            mins.push(miny);
            maxs.push(maxx);
            maxs.push(maxy);
        }
        EnvelopeVect { mins, maxs, ndims: 2 }
    }

    /// Expands every envelope by `buffer` on each side. Useful to guard
    /// degenerate (point or line) envelopes against the strict intersection
    /// test; no buffer is applied by default.
    pub fn with_buffer(mut self, buffer: f64) -> Self {
        for v in &mut self.mins {
            *v -= buffer;
        }
        for v in &mut self.maxs {
            *v += buffer;
        }
        self
    }

    /// Number of envelopes in the batch.
    pub fn len(&self) -> usize {
        self.mins.len() / self.ndims
    }

    pub fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }

    pub fn ndims(&self) -> usize {
        self.ndims
    }

    pub fn min_at(&self, i: usize, dim: usize) -> f64 {
        self.mins[i * self.ndims + dim]
    }

    pub fn max_at(&self, i: usize, dim: usize) -> f64 {
        self.maxs[i * self.ndims + dim]
    }

    /// Envelope centers as a flat `len * ndims` array, envelope-major. The
    /// packer sorts and tiles on these.
    pub fn centers(&self) -> Vec<f64> {
        self.mins
            .iter()
            .zip(self.maxs.iter())
            .map(|(lo, hi)| 0.5 * (lo + hi))
            .collect()
    }

    /// Gathers the envelopes at `indices` into a new batch, in order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut mins = Vec::with_capacity(indices.len() * self.ndims);
        let mut maxs = Vec::with_capacity(indices.len() * self.ndims);
        for &i in indices {
            mins.extend_from_slice(&self.mins[i * self.ndims..(i + 1) * self.ndims]);
            maxs.extend_from_slice(&self.maxs[i * self.ndims..(i + 1) * self.ndims]);
        }
        EnvelopeVect {
            mins,
            maxs,
            ndims: self.ndims,
        }
    }

    /// Merges the envelopes of each group into one: componentwise min of
    /// `mins` and max of `maxs` over the group members. The result has one
    /// envelope per group and is the parent level of the tree.
    pub fn mergeby(&self, groups: &IndexGroups) -> Self {
        let mut mins = Vec::with_capacity(groups.len() * self.ndims);
        let mut maxs = Vec::with_capacity(groups.len() * self.ndims);
        for group in groups.iter() {
            debug_assert!(!group.is_empty());
            for d in 0..self.ndims {
                let mut lo = f64::INFINITY;
                let mut hi = f64::NEG_INFINITY;
                for &i in group {
                    lo = lo.min(self.min_at(i, d));
                    hi = hi.max(self.max_at(i, d));
                }
                mins.push(lo);
                maxs.push(hi);
            }
        }
        EnvelopeVect {
            mins,
            maxs,
            ndims: self.ndims,
        }
    }

    fn check_compatible(&self, other: &Self) -> Result<(), StrtreeError> {
        if self.ndims != other.ndims {
            return Err(StrtreeError::DimensionMismatch {
                left: self.ndims,
                right: other.ndims,
            });
        }
        Ok(())
    }

    /// Pairwise intersection test: entry `(i, j)` is true iff envelope `i` of
    /// `self` and envelope `j` of `other` overlap in every dimension.
    ///
    /// The inequalities are strict: rectangles that merely touch along an
    /// edge or corner do not intersect at the envelope level.
    pub fn intersects(&self, other: &Self) -> Result<Matrix<bool>, StrtreeError> {
        self.check_compatible(other)?;
        let (rows, cols) = (self.len(), other.len());
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let mut hit = true;
                for d in 0..self.ndims {
                    if !(self.min_at(i, d) < other.max_at(j, d)
                        && self.max_at(i, d) > other.min_at(j, d))
                    {
                        hit = false;
                        break;
                    }
                }
                data.push(hit);
            }
        }
        Ok(Matrix::from_vec(data, rows, cols))
    }

    /// Pairwise MINDIST: the smallest possible distance between a point of
    /// envelope `i` and a point of envelope `j`. Zero wherever the envelopes
    /// overlap.
    pub fn distance(&self, other: &Self) -> Result<Matrix<f64>, StrtreeError> {
        self.check_compatible(other)?;
        let (rows, cols) = (self.len(), other.len());
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let mut acc = 0.0;
                for d in 0..self.ndims {
                    let gap = (self.min_at(i, d) - other.max_at(j, d))
                        .max(other.min_at(j, d) - self.max_at(i, d))
                        .max(0.0);
                    acc += gap * gap;
                }
                data.push(acc.sqrt());
            }
        }
        Ok(Matrix::from_vec(data, rows, cols))
    }

    /// Pairwise MAXMINDIST: per dimension the larger of the two outer gaps
    /// `|mins - maxs|` and `|maxs - mins|`, combined across dimensions. An
    /// upper bound on the distance between a point of `i` and the far side of
    /// `j`; the nearest-neighbour search prunes on it.
    pub fn maxmindist(&self, other: &Self) -> Result<Matrix<f64>, StrtreeError> {
        self.check_compatible(other)?;
        let (rows, cols) = (self.len(), other.len());
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let mut acc = 0.0;
                for d in 0..self.ndims {
                    let gap = (self.min_at(i, d) - other.max_at(j, d))
                        .abs()
                        .max((self.max_at(i, d) - other.min_at(j, d)).abs());
                    acc += gap * gap;
                }
                data.push(acc.sqrt());
            }
        }
        Ok(Matrix::from_vec(data, rows, cols))
    }

    /// MINDIST and MAXMINDIST in a single pass over the per-dimension gaps,
    /// saving one materialization when both bounds are needed.
    pub fn bound_dist(&self, other: &Self) -> Result<(Matrix<f64>, Matrix<f64>), StrtreeError> {
        self.check_compatible(other)?;
        let (rows, cols) = (self.len(), other.len());
        let mut lower = Vec::with_capacity(rows * cols);
        let mut upper = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let mut lo = 0.0;
                let mut hi = 0.0;
                for d in 0..self.ndims {
                    let below = self.min_at(i, d) - other.max_at(j, d);
                    let above = other.min_at(j, d) - self.max_at(i, d);
                    let gap = below.max(above).max(0.0);
                    lo += gap * gap;
                    let outer = below.abs().max(above.abs());
                    hi += outer * outer;
                }
                lower.push(lo.sqrt());
                upper.push(hi.sqrt());
            }
        }
        Ok((
            Matrix::from_vec(lower, rows, cols),
            Matrix::from_vec(upper, rows, cols),
        ))
    }
}
