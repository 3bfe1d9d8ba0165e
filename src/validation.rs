// src/validation.rs
//
// Shape and size preconditions for both engines. Validators never log; the
// caller decides what to do with the returned error.

use crate::error::{ProjectionError, Result};
use float_cmp::{ApproxEq, F64Margin};
use ndarray::{ArrayView2, Axis};

/// Minimum number of samples either engine accepts.
pub const MIN_SAMPLES: usize = 3;

/// Minimum number of control points LAMP accepts.
pub const MIN_CONTROL_POINTS: usize = 2;

/// Checks the LAMP preconditions.
///
/// * `x` - original points, shape (n_samples, n_features).
/// * `control_indices` - rows of `x` acting as control points.
/// * `ys` - known projections of the control points, shape (n_control, k).
///
/// # Errors
///
/// In order of precedence: `TooFewSamples` if `x` has fewer than 3 rows,
/// `TooFewControlPoints` with fewer than 2 indices, `ControlCountMismatch` if
/// `ys` does not have one row per index, `DimensionMismatch` if `ys` has more
/// columns than `x`. Out-of-range and repeated indices are reported after
/// those.
pub fn validate_lamp(
    x: ArrayView2<f64>,
    control_indices: &[usize],
    ys: ArrayView2<f64>,
) -> Result<()> {
    let n_samples = x.nrows();
    if n_samples < MIN_SAMPLES {
        return Err(ProjectionError::TooFewSamples {
            samples: n_samples,
            minimum: MIN_SAMPLES,
        });
    }

    validate_control_set(control_indices.len(), x.ncols(), ys)?;

    let mut seen = vec![false; n_samples];
    for &index in control_indices {
        if index >= n_samples {
            return Err(ProjectionError::ControlIndexOutOfRange {
                index,
                samples: n_samples,
            });
        }
        if seen[index] {
            return Err(ProjectionError::DuplicateControlIndex { index });
        }
        seen[index] = true;
    }
    Ok(())
}

/// Count and dimensionality checks shared by `validate_lamp` and
/// `LampModel::from_control_points`.
pub(crate) fn validate_control_set(
    n_control: usize,
    n_features: usize,
    ys: ArrayView2<f64>,
) -> Result<()> {
    if n_control < MIN_CONTROL_POINTS {
        return Err(ProjectionError::TooFewControlPoints { count: n_control });
    }
    if ys.nrows() != n_control {
        return Err(ProjectionError::ControlCountMismatch {
            indices: n_control,
            projections: ys.nrows(),
        });
    }
    if n_features < ys.ncols() {
        return Err(ProjectionError::DimensionMismatch {
            original: n_features,
            projected: ys.ncols(),
        });
    }
    Ok(())
}

/// Checks the MDS preconditions using exact equality for symmetry.
///
/// # Errors
///
/// `NotSquare`, then `TooFewSamples` (fewer than 3 rows), then
/// `NotSymmetric` naming the first offending `(row, col)` pair.
pub fn validate_mds(dist: ArrayView2<f64>) -> Result<()> {
    validate_mds_with_tolerance(dist, 0.0)
}

/// Like [`validate_mds`], but entries within `tolerance` of their transpose
/// counterpart count as symmetric. A tolerance of `0.0` is exact equality.
///
/// # Errors
///
/// As [`validate_mds`], plus `InvalidTolerance` if `tolerance` is negative or
/// not finite. The tolerance is checked after the shape.
pub fn validate_mds_with_tolerance(dist: ArrayView2<f64>, tolerance: f64) -> Result<()> {
    let (rows, cols) = dist.dim();
    if rows != cols {
        return Err(ProjectionError::NotSquare { rows, cols });
    }
    if rows < MIN_SAMPLES {
        return Err(ProjectionError::TooFewSamples {
            samples: rows,
            minimum: MIN_SAMPLES,
        });
    }

    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ProjectionError::InvalidTolerance(tolerance));
    }

    let margin = F64Margin {
        epsilon: tolerance,
        ulps: 0,
    };
    for (row, values) in dist.axis_iter(Axis(0)).enumerate() {
        for col in (row + 1)..cols {
            let upper = values[col];
            let lower = dist[[col, row]];
            let symmetric = if tolerance > 0.0 {
                upper.approx_eq(lower, margin)
            } else {
                upper == lower
            };
            if !symmetric {
                return Err(ProjectionError::NotSymmetric { row, col });
            }
        }
    }
    Ok(())
}
