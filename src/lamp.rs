// Local Affine Multidimensional Projection (LAMP)

use crate::error::{ProjectionError, Result};
use crate::linalg_backends::{canonicalize_svd_signs, BackendSVD, LinAlgBackendProvider};
use crate::validation::{validate_control_set, validate_lamp};
use log::{debug, info, trace};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

/// Lower bound on the distance between a point and a control point when
/// computing weights.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Configuration for the LAMP engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LampConfig {
    /// Distances below this are clamped before inversion, so a point sitting
    /// on a control point gets a large but finite weight.
    pub tolerance: f64,
    /// Project points on the rayon thread pool. Output is identical either way.
    pub parallel: bool,
}

impl Default for LampConfig {
    fn default() -> Self {
        LampConfig {
            tolerance: DEFAULT_TOLERANCE,
            parallel: true,
        }
    }
}

impl LampConfig {
    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ProjectionError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Projects every row of `x` using the control points `x[control_indices]`
/// whose projections are the rows of `ys`, with the default configuration.
///
/// * `x` - original points, shape (n_samples, n_features).
/// * `control_indices` - rows of `x` used as control points; order matches `ys`.
/// * `ys` - control point projections, shape (n_control, k) with k <= n_features.
///
/// The returned matrix has shape (n_samples, k). Row `control_indices[i]` is
/// a copy of `ys.row(i)`.
///
/// # Errors
///
/// Returns an error if the inputs fail [`validate_lamp`] or if a local SVD
/// fails.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use multidim_projection::lamp;
///
/// let x = array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5, 0.5]];
/// let ys = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
/// let y = lamp(&x, &[0, 1, 2], &ys).unwrap();
/// assert_eq!(y.dim(), (4, 2));
/// assert_eq!(y.row(1), ys.row(1));
/// ```
pub fn lamp(x: &Array2<f64>, control_indices: &[usize], ys: &Array2<f64>) -> Result<Array2<f64>> {
    lamp_with_config(x, control_indices, ys, &LampConfig::default())
}

/// LAMP with an explicit configuration; see [`lamp`].
pub fn lamp_with_config(
    x: &Array2<f64>,
    control_indices: &[usize],
    ys: &Array2<f64>,
    config: &LampConfig,
) -> Result<Array2<f64>> {
    validate_lamp(x.view(), control_indices, ys.view())?;
    config.validate()?;

    let (n_samples, n_features) = x.dim();
    let n_dims = ys.ncols();
    debug!(
        "lamp: {} samples, {} control points, {} -> {} dimensions",
        n_samples,
        control_indices.len(),
        n_features,
        n_dims
    );

    let xs = x.select(Axis(0), control_indices);
    let mut y = Array2::<f64>::zeros((n_samples, n_dims));
    let mut is_control = vec![false; n_samples];
    for (row, &index) in control_indices.iter().enumerate() {
        y.row_mut(index).assign(&ys.row(row));
        is_control[index] = true;
    }

    let start = Instant::now();
    project_rows(x.view(), xs.view(), ys.view(), config, Some(is_control.as_slice()), &mut y)?;
    info!(
        "lamp: projected {} points in {:?}",
        n_samples - control_indices.len(),
        start.elapsed()
    );
    Ok(y)
}

/// Fills the rows of `out` with the projections of the rows of `points`.
/// Rows flagged in `skip` are left untouched.
fn project_rows(
    points: ArrayView2<f64>,
    xs: ArrayView2<f64>,
    ys: ArrayView2<f64>,
    config: &LampConfig,
    skip: Option<&[bool]>,
    out: &mut Array2<f64>,
) -> Result<()> {
    if ys.ncols() == 0 {
        return Ok(());
    }
    let backend = LinAlgBackendProvider::<f64>::new();
    let tolerance = config.tolerance;

    let project_row = |(i, mut row): (usize, ArrayViewMut1<f64>)| -> Result<()> {
        if skip.map_or(false, |mask| mask[i]) {
            return Ok(());
        }
        let projected = project_point(&backend, points.row(i), xs, ys, tolerance).map_err(|e| {
            trace!("lamp: point {} failed: {}", i, e);
            e
        })?;
        row.assign(&projected);
        Ok(())
    };

    if config.parallel {
        out.axis_iter_mut(Axis(0)).into_par_iter().enumerate().try_for_each(project_row)
    } else {
        out.axis_iter_mut(Axis(0)).enumerate().try_for_each(project_row)
    }
}

/// Projects one point through the orthogonal affine map fitted to the
/// control points, weighted by inverse distance to `point`.
fn project_point<B: BackendSVD<f64>>(
    backend: &B,
    point: ArrayView1<f64>,
    xs: ArrayView2<f64>,
    ys: ArrayView2<f64>,
    tolerance: f64,
) -> Result<Array1<f64>> {
    let alpha: Array1<f64> = xs
        .rows()
        .into_iter()
        .map(|control| {
            let diff = &control - &point;
            1.0 / diff.dot(&diff).sqrt().max(tolerance)
        })
        .collect();
    let sum_alpha = alpha.sum();

    // Weighted centroids.
    let x_tilde = alpha.dot(&xs) / sum_alpha;
    let y_tilde = alpha.dot(&ys) / sum_alpha;

    let sqrt_alpha = alpha.mapv(f64::sqrt).insert_axis(Axis(1));
    let a = (&xs - &x_tilde) * &sqrt_alpha;
    let b = (&ys - &y_tilde) * &sqrt_alpha;

    let m = local_map(backend, a.view(), b.view())?;
    Ok((&point - &x_tilde).dot(&m) + &y_tilde)
}

/// Orthogonal Procrustes: the d×k matrix `M = U·Vᵗ` from the SVD of `Aᵗ·B`,
/// with orthonormal columns.
fn local_map<B: BackendSVD<f64>>(
    backend: &B,
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
) -> Result<Array2<f64>> {
    let n_dims = b.ncols();
    let svd = backend.svd_into(a.t().dot(&b), true, true)?;
    let (mut u, mut vt) = match (svd.u, svd.vt) {
        (Some(u), Some(vt)) => (u, vt),
        _ => {
            return Err(ProjectionError::NumericalFailure(
                "SVD did not return singular vectors".to_string(),
            ))
        }
    };
    canonicalize_svd_signs(&mut u, &mut vt, n_dims);
    Ok(u.slice(s![.., ..n_dims]).dot(&vt.slice(s![..n_dims, ..])))
}

/// A fitted set of control points that projects arbitrary new points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LampModel {
    /// Control points in the original space, shape (n_control, n_features).
    control_points: Array2<f64>,
    /// Projections of the control points, shape (n_control, k).
    control_projections: Array2<f64>,
    config: LampConfig,
}

impl LampModel {
    /// Gathers the control points `x[control_indices]` and pairs them with `ys`.
    ///
    /// # Errors
    /// Same conditions as [`lamp`], plus an invalid tolerance in `config`.
    pub fn fit(
        x: &Array2<f64>,
        control_indices: &[usize],
        ys: &Array2<f64>,
        config: LampConfig,
    ) -> Result<Self> {
        validate_lamp(x.view(), control_indices, ys.view())?;
        config.validate()?;
        Ok(LampModel {
            control_points: x.select(Axis(0), control_indices),
            control_projections: ys.clone(),
            config,
        })
    }

    /// Builds a model from control points and their projections directly.
    ///
    /// # Errors
    /// `TooFewControlPoints`, `ControlCountMismatch` or `DimensionMismatch`
    /// when the two matrices do not pair up, `InvalidTolerance` for a bad config.
    pub fn from_control_points(
        control_points: Array2<f64>,
        control_projections: Array2<f64>,
        config: LampConfig,
    ) -> Result<Self> {
        validate_control_set(
            control_points.nrows(),
            control_points.ncols(),
            control_projections.view(),
        )?;
        config.validate()?;
        Ok(LampModel {
            control_points,
            control_projections,
            config,
        })
    }

    pub fn control_points(&self) -> &Array2<f64> {
        &self.control_points
    }

    pub fn control_projections(&self) -> &Array2<f64> {
        &self.control_projections
    }

    pub fn config(&self) -> &LampConfig {
        &self.config
    }

    /// Projects every row of `points`, shape (n, n_features), to (n, k).
    ///
    /// Rows equal to a control point are not snapped to its projection; they
    /// land within the tolerance-weighted fit.
    ///
    /// # Errors
    /// `DimensionMismatch` if `points` has the wrong number of columns, or
    /// `NumericalFailure` if a local SVD fails.
    pub fn transform(&self, points: &Array2<f64>) -> Result<Array2<f64>> {
        let n_features = self.control_points.ncols();
        if points.ncols() != n_features {
            return Err(ProjectionError::DimensionMismatch {
                original: n_features,
                projected: points.ncols(),
            });
        }
        let mut out = Array2::<f64>::zeros((points.nrows(), self.control_projections.ncols()));
        if points.nrows() == 0 {
            return Ok(out);
        }
        let start = Instant::now();
        project_rows(
            points.view(),
            self.control_points.view(),
            self.control_projections.view(),
            &self.config,
            None,
            &mut out,
        )?;
        debug!("lamp model: transformed {} points in {:?}", points.nrows(), start.elapsed());
        Ok(out)
    }

    /// Saves the model to a file using bincode.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or encoding fails.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| ProjectionError::Serialization(format!("Failed to serialize LAMP model: {}", e)))?;
        Ok(())
    }

    /// Loads a model previously written by [`LampModel::save_model`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, decoding fails, or the
    /// decoded matrices do not form a valid control set.
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let model: LampModel = bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
            .map_err(|e| ProjectionError::Serialization(format!("Failed to deserialize LAMP model: {}", e)))?;

        validate_control_set(
            model.control_points.nrows(),
            model.control_points.ncols(),
            model.control_projections.view(),
        )?;
        model.config.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
#[path = "lamp_tests.rs"]
mod lamp_tests;
