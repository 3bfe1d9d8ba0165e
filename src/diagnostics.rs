// src/diagnostics.rs

use ndarray::{Array2, ArrayView2};

// --- Utility Functions for Embedding Quality ---

/// Euclidean distances between all pairs of rows of `points`.
pub fn pairwise_distances(points: &ArrayView2<f64>) -> Array2<f64> {
    let n = points.nrows();
    let mut distances = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = &points.row(i) - &points.row(j);
            let d = diff.dot(&diff).sqrt();
            distances[[i, j]] = d;
            distances[[j, i]] = d;
        }
    }
    distances
}

/// Kruskal's stress-1 between a target distance matrix and the distances of
/// an embedding: sqrt(sum (d_ij - t_ij)^2 / sum t_ij^2) over i < j.
///
/// Returns `None` if shapes disagree or the target has no non-zero distance.
pub fn kruskal_stress(target_distances: &ArrayView2<f64>, embedding: &ArrayView2<f64>) -> Option<f64> {
    let n = embedding.nrows();
    if target_distances.dim() != (n, n) || n == 0 {
        return None;
    }
    let embedded = pairwise_distances(embedding);
    let mut residual = 0.0;
    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let t = target_distances[[i, j]];
            residual += (embedded[[i, j]] - t).powi(2);
            total += t * t;
        }
    }
    if total < 1e-12 {
        return None;
    }
    Some((residual / total).sqrt())
}

/// Largest absolute difference between target distances and embedding
/// distances. `None` on shape mismatch or empty input.
pub fn max_abs_distance_error(target_distances: &ArrayView2<f64>, embedding: &ArrayView2<f64>) -> Option<f64> {
    let n = embedding.nrows();
    if target_distances.dim() != (n, n) || n == 0 {
        return None;
    }
    let embedded = pairwise_distances(embedding);
    Some(
        embedded
            .iter()
            .zip(target_distances.iter())
            .fold(0.0_f64, |acc, (e, t)| acc.max((e - t).abs())),
    )
}

/// Computes the Frobenius norm of a matrix.
pub fn compute_frob_norm(matrix: &ArrayView2<f64>) -> f64 {
    if matrix.is_empty() {
        return 0.0;
    }
    matrix.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Computes orthogonality error ||I - Q^T Q||_F. For the d×k affine maps
/// LAMP fits (d >= k) this is zero up to rounding.
pub fn compute_orthogonality_error(q_matrix: &ArrayView2<f64>) -> Option<f64> {
    if q_matrix.nrows() == 0 || q_matrix.ncols() == 0 {
        return None;
    }
    let qtq = q_matrix.t().dot(q_matrix);
    let identity = Array2::<f64>::eye(qtq.nrows());
    let diff = identity - qtq;
    Some(compute_frob_norm(&diff.view()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn distances_of_right_triangle() {
        let p = array![[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]];
        let d = pairwise_distances(&p.view());
        assert_abs_diff_eq!(d[[1, 2]], 5.0);
        assert_abs_diff_eq!(d[[2, 1]], 5.0);
        assert_abs_diff_eq!(d[[0, 0]], 0.0);
    }

    #[test]
    fn stress_is_zero_for_exact_embedding() {
        let p = array![[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]];
        let d = pairwise_distances(&p.view());
        assert_abs_diff_eq!(kruskal_stress(&d.view(), &p.view()).unwrap(), 0.0);
        assert_abs_diff_eq!(max_abs_distance_error(&d.view(), &p.view()).unwrap(), 0.0);
    }

    #[test]
    fn stress_rejects_bad_shapes() {
        let p = array![[0.0, 0.0], [3.0, 0.0]];
        let d = Array2::<f64>::zeros((3, 3));
        assert!(kruskal_stress(&d.view(), &p.view()).is_none());
        let zero = Array2::<f64>::zeros((2, 2));
        assert!(kruskal_stress(&zero.view(), &p.view()).is_none());
    }

    #[test]
    fn orthogonality_of_rotation() {
        let theta = 0.3_f64;
        let q = array![[theta.cos(), -theta.sin()], [theta.sin(), theta.cos()], [0.0, 0.0]];
        assert!(compute_orthogonality_error(&q.view()).unwrap() < 1e-12);
        assert!(compute_orthogonality_error(&Array2::<f64>::zeros((0, 2)).view()).is_none());
    }
}
