// Classical multidimensional scaling (MDS)

use crate::error::{ProjectionError, Result};
use crate::linalg_backends::{canonicalize_column_signs, BackendEigh, LinAlgBackendProvider};
use crate::validation::validate_mds_with_tolerance;
use log::{debug, trace, warn};
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Options for [`cmdscale_with_options`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdsOptions {
    /// Number of output dimensions (k). Must satisfy `1 <= k <= n`.
    pub n_components: usize,
    /// Largest accepted `|d[i][j] - d[j][i]|`. `0.0` requires exact symmetry;
    /// negative or non-finite values are rejected.
    pub symmetry_tolerance: f64,
    /// Keep the full eigendecomposition of the centered matrix in the output.
    pub return_eigendecomposition: bool,
}

impl Default for MdsOptions {
    fn default() -> Self {
        MdsOptions {
            n_components: 2,
            symmetry_tolerance: 0.0,
            return_eigendecomposition: false,
        }
    }
}

impl MdsOptions {
    /// Default options with `n_components` output dimensions.
    pub fn new(n_components: usize) -> Self {
        MdsOptions {
            n_components,
            ..Default::default()
        }
    }
}

/// Result of a classical MDS run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdsOutput {
    /// Point configuration, shape (n_samples, n_components). Column 0 belongs
    /// to the dominant eigenpair.
    pub embedding: Array2<f64>,
    /// All eigenvalues of the centered matrix, ascending. Present only when
    /// `return_eigendecomposition` was set.
    pub eigenvalues: Option<Array1<f64>>,
    /// Eigenvectors as columns, paired with `eigenvalues`, sign-normalized.
    pub eigenvectors: Option<Array2<f64>>,
}

/// Computes a `k`-dimensional classical MDS embedding of `dist`.
///
/// * `dist` - symmetric distance matrix, shape (n, n), zero diagonal.
/// * `k` - number of output dimensions.
///
/// # Errors
///
/// Returns an error if the matrix is not square, has fewer than 3 rows, is
/// not exactly symmetric, if `k` is 0 or larger than `n`, or if the
/// eigendecomposition fails.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use multidim_projection::cmdscale;
///
/// let dist = array![
///     [0.0, 3.0, 4.0],
///     [3.0, 0.0, 5.0],
///     [4.0, 5.0, 0.0]
/// ];
/// let points = cmdscale(&dist, 2).unwrap();
/// assert_eq!(points.dim(), (3, 2));
/// ```
pub fn cmdscale(dist: &Array2<f64>, k: usize) -> Result<Array2<f64>> {
    cmdscale_with_options(dist, &MdsOptions::new(k)).map(|output| output.embedding)
}

/// Classical MDS with explicit options; see [`cmdscale`].
pub fn cmdscale_with_options(dist: &Array2<f64>, options: &MdsOptions) -> Result<MdsOutput> {
    validate_mds_with_tolerance(dist.view(), options.symmetry_tolerance)?;

    let n = dist.nrows();
    let k = options.n_components;
    if k == 0 || k > n {
        return Err(ProjectionError::InvalidComponentCount {
            requested: k,
            samples: n,
        });
    }
    debug!("cmdscale: {} samples, {} components", n, k);

    let centered = double_center(dist);

    let backend = LinAlgBackendProvider::<f64>::new();
    let eig = backend.eigh_upper(&centered)?;
    let eigenvalues = eig.eigenvalues;
    let mut eigenvectors = eig.eigenvectors;
    canonicalize_column_signs(&mut eigenvectors);

    // The centered matrix is +0.5·J·D²·J, the negated Gram matrix, so the
    // dominant directions sit at the most negative eigenvalues: the first k
    // in ascending order, dominant first.
    let selected = eigenvalues.slice(s![..k]);
    trace!("cmdscale: selected eigenvalues {:?}", selected);
    let magnitude = eigenvalues.iter().fold(0.0_f64, |acc, &lambda| acc.max(lambda.abs()));
    if let Some(&positive) = selected.iter().find(|&&lambda| lambda > 1e-9 * magnitude) {
        warn!(
            "cmdscale: selected eigenvalue {} has the non-Euclidean sign; its magnitude is used",
            positive
        );
    }

    let sqrt_evals = selected.mapv(|lambda| lambda.abs().sqrt());
    let mut embedding = eigenvectors.slice(s![.., ..k]).to_owned();
    for (mut column, &scale) in embedding.axis_iter_mut(Axis(1)).zip(sqrt_evals.iter()) {
        column.mapv_inplace(|v| v * scale);
    }

    let (eigenvalues, eigenvectors) = if options.return_eigendecomposition {
        (Some(eigenvalues), Some(eigenvectors))
    } else {
        (None, None)
    };
    Ok(MdsOutput {
        embedding,
        eigenvalues,
        eigenvectors,
    })
}

/// Builds `0.5 · J · D² · J` with `J = I - (1/n)·ones(n, n)`.
fn double_center(dist: &Array2<f64>) -> Array2<f64> {
    let n = dist.nrows();
    let squared = dist.mapv(|d| d * d);
    let centering = Array2::<f64>::eye(n) - Array2::<f64>::from_elem((n, n), 1.0 / n as f64);
    centering.dot(&squared).dot(&centering) * 0.5
}

#[cfg(test)]
#[path = "mds_tests.rs"]
mod mds_tests;
