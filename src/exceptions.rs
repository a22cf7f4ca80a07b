//! ## Custom Errors for Strtree
//!
//! This module defines custom errors and exceptions that are used internally by Strtree.

use std::error::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents errors specific to invalid operations or parameters in Strtree.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug)]
pub enum StrtreeError {
    /// Occurs when a query names a predicate the index does not know.
    InvalidPredicate {
        /// The predicate name that was requested.
        predicate: String,
    },
    /// Occurs when two envelope batches with different dimensionality are combined.
    DimensionMismatch {
        /// Number of dimensions on the left-hand side.
        left: usize,
        /// Number of dimensions on the right-hand side.
        right: usize,
    },
    /// Occurs when an invalid page size or top size is provided.
    InvalidCapacity {
        /// The capacity value that was provided.
        capacity: usize,
    },
    /// Occurs when a geometry type cannot be handled by the requested measure.
    UnsupportedGeometry {
        /// The offending geometry type.
        geom_type: String,
    },
    /// Occurs when a join names a measure other than length or area.
    InvalidMeasure {
        /// The measure name that was requested.
        measure: String,
    },
}

impl fmt::Display for StrtreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrtreeError::InvalidPredicate { predicate } => {
                write!(
                    f,
                    "Invalid predicate: {predicate}. Must be one of intersects, contains, \
                     within, overlaps, crosses, touches."
                )
            }
            StrtreeError::DimensionMismatch { left, right } => {
                write!(
                    f,
                    "Dimension mismatch: {left} and {right} dimensions cannot be combined"
                )
            }
            StrtreeError::InvalidCapacity { capacity } => {
                write!(
                    f,
                    "Invalid capacity: {capacity}. Page size must be at least two and top size \
                     at least one."
                )
            }
            StrtreeError::UnsupportedGeometry { geom_type } => {
                write!(f, "Unsupported geometry type: {geom_type}")
            }
            StrtreeError::InvalidMeasure { measure } => {
                write!(f, "Invalid measure: {measure}. Must be length or area.")
            }
        }
    }
}

impl Error for StrtreeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_predicate_display() {
        let err = StrtreeError::InvalidPredicate {
            predicate: "covers".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Invalid predicate: covers. Must be one of intersects, contains, within, \
             overlaps, crosses, touches."
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = StrtreeError::DimensionMismatch { left: 2, right: 3 };
        assert_eq!(
            format!("{}", err),
            "Dimension mismatch: 2 and 3 dimensions cannot be combined"
        );
    }

    #[test]
    fn test_invalid_capacity_display() {
        let err = StrtreeError::InvalidCapacity { capacity: 0 };
        assert_eq!(
            format!("{}", err),
            "Invalid capacity: 0. Page size must be at least two and top size at least one."
        );
    }

    #[test]
    fn test_invalid_measure_display() {
        let err = StrtreeError::InvalidMeasure {
            measure: "volume".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Invalid measure: volume. Must be length or area."
        );
    }

    #[test]
    fn test_unsupported_geometry_display() {
        let err = StrtreeError::UnsupportedGeometry {
            geom_type: "Point".to_string(),
        };
        assert_eq!(format!("{}", err), "Unsupported geometry type: Point");
    }
}
