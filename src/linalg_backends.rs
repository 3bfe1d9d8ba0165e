// src/linalg_backends.rs

use ndarray::{s, Array1, Array2, ArrayViewMut1, Axis};
use ndarray_linalg::{Eigh as NdLinalgEigh, SVDInto as NdLinalgSVDInto, UPLO};
use std::error::Error;
use std::marker::PhantomData;

/// Dispatches decompositions to the linear algebra backend selected at
/// compile time (OpenBLAS or MKL through ndarray-linalg).
#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<F: 'static + Copy + Send + Sync> {
    _phantom: PhantomData<F>,
}

impl<F: 'static + Copy + Send + Sync> LinAlgBackendProvider<F> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

/// Output of a symmetric eigendecomposition.
#[derive(Debug)]
pub struct EighOutput<F: 'static> {
    /// Eigenvalues in ascending order.
    pub eigenvalues: Array1<F>,
    /// Eigenvectors as columns of the matrix.
    /// eigenvectors.column(i) corresponds to eigenvalues[i].
    pub eigenvectors: Array2<F>,
}

/// Symmetric eigendecomposition (LAPACK DSYEVD through ndarray-linalg).
/// Implementers expect `matrix` to be symmetric and read its upper triangle.
pub trait BackendEigh<F: 'static + Copy + Send + Sync> {
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>, Box<dyn Error + Send + Sync>>;
}

/// Output of a Singular Value Decomposition.
#[derive(Debug)]
pub struct SVDOutput<F: 'static> {
    pub u: Option<Array2<F>>,
    pub s: Array1<F>,
    pub vt: Option<Array2<F>>,
}

/// Singular Value Decomposition. `u` and `vt` are full (square) when requested.
pub trait BackendSVD<F: 'static + Copy + Send + Sync> {
    fn svd_into(&self, matrix: Array2<F>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<F>, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

fn to_dyn_error<E: Error + Send + Sync + 'static>(e: E) -> Box<dyn Error + Send + Sync> {
    Box::new(e)
}

impl BackendEigh<f64> for NdarrayLinAlgBackend {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>, Box<dyn Error + Send + Sync>> {
        if matrix.nrows() != matrix.ncols() {
            return Err(format!(
                "Matrix must be square for eigendecomposition, got {}x{}.",
                matrix.nrows(),
                matrix.ncols()
            )
            .into());
        }
        let (eigenvalues, eigenvectors) = matrix.eigh(UPLO::Upper).map_err(to_dyn_error)?;
        Ok(EighOutput { eigenvalues, eigenvectors })
    }
}

impl BackendSVD<f64> for NdarrayLinAlgBackend {
    fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<f64>, Box<dyn Error + Send + Sync>> {
        let (u, s, vt) = matrix.svd_into(compute_u, compute_v).map_err(to_dyn_error)?;
        Ok(SVDOutput { u, s, vt })
    }
}

impl<F> BackendEigh<F> for LinAlgBackendProvider<F>
where
    F: 'static + Copy + Send + Sync,
    NdarrayLinAlgBackend: BackendEigh<F>,
{
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>, Box<dyn Error + Send + Sync>> {
        NdarrayLinAlgBackend.eigh_upper(matrix)
    }
}

impl<F> BackendSVD<F> for LinAlgBackendProvider<F>
where
    F: 'static + Copy + Send + Sync,
    NdarrayLinAlgBackend: BackendSVD<F>,
{
    fn svd_into(&self, matrix: Array2<F>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<F>, Box<dyn Error + Send + Sync>> {
        NdarrayLinAlgBackend.svd_into(matrix, compute_u, compute_v)
    }
}

// --- Deterministic sign convention ---
//
// Eigenvectors and singular vectors are only defined up to sign. LAPACK
// builds may disagree, so every vector is flipped until its largest-magnitude
// entry is positive (ties resolved by the lowest index).

/// Returns true when `v` should be negated to satisfy the sign convention.
fn needs_flip(v: &ArrayViewMut1<f64>) -> bool {
    let mut pivot = 0.0_f64;
    let mut pivot_abs = 0.0_f64;
    for &value in v.iter() {
        if value.abs() > pivot_abs {
            pivot_abs = value.abs();
            pivot = value;
        }
    }
    pivot < 0.0
}

/// Applies the sign convention to every column of `vectors` in place.
/// Returns the per-column flags of the columns that were negated.
pub fn canonicalize_column_signs(vectors: &mut Array2<f64>) -> Vec<bool> {
    vectors
        .axis_iter_mut(Axis(1))
        .map(|mut column| {
            let flip = needs_flip(&column);
            if flip {
                column.mapv_inplace(|x| -x);
            }
            flip
        })
        .collect()
}

/// Canonicalizes the first `rank` columns of `u` and negates the matching
/// rows of `vt`, so `u · diag(s) · vt` is unchanged.
pub fn canonicalize_svd_signs(u: &mut Array2<f64>, vt: &mut Array2<f64>, rank: usize) {
    let rank = rank.min(u.ncols()).min(vt.nrows());
    let mut leading = u.slice_mut(s![.., ..rank]);
    for (i, mut column) in leading.axis_iter_mut(Axis(1)).enumerate() {
        if needs_flip(&column) {
            column.mapv_inplace(|x| -x);
            vt.row_mut(i).mapv_inplace(|x| -x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn eigh_is_ascending_with_column_vectors() {
        let m = array![[2.0, 1.0], [1.0, 2.0]];
        let out = LinAlgBackendProvider::<f64>::new().eigh_upper(&m).unwrap();
        assert_abs_diff_eq!(out.eigenvalues[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.eigenvalues[1], 3.0, epsilon = 1e-12);
        let v = out.eigenvectors.column(1);
        let mv = m.dot(&v);
        for i in 0..2 {
            assert_abs_diff_eq!(mv[i], 3.0 * v[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn eigh_rejects_non_square() {
        let m = Array2::<f64>::zeros((2, 3));
        assert!(NdarrayLinAlgBackend.eigh_upper(&m).is_err());
    }

    #[test]
    fn column_signs_follow_largest_entry() {
        let mut v = array![[0.1, -0.2], [-0.9, 0.1], [0.3, 0.05]];
        let flipped = canonicalize_column_signs(&mut v);
        assert_eq!(flipped, vec![true, false]);
        assert_abs_diff_eq!(v[[1, 0]], 0.9);
        assert_abs_diff_eq!(v[[0, 1]], -0.2);
    }

    #[test]
    fn svd_sign_fix_preserves_product() {
        let a = array![[1.0, -2.0], [3.0, 0.5], [-1.5, 2.0]];
        let out = LinAlgBackendProvider::<f64>::new().svd_into(a.clone(), true, true).unwrap();
        let mut u = out.u.unwrap();
        let mut vt = out.vt.unwrap();
        let k = out.s.len();
        canonicalize_svd_signs(&mut u, &mut vt, k);

        let rebuilt = u.slice(s![.., ..k]).dot(&Array2::from_diag(&out.s)).dot(&vt);
        for (x, y) in rebuilt.iter().zip(a.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-10);
        }
        for column in u.slice(s![.., ..k]).columns() {
            let pivot = column.iter().cloned().fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
            assert!(pivot > 0.0);
        }
    }
}
