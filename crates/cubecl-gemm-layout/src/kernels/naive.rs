use crate::components::GemmProblem;

/// Solves `D = alpha * A * B + beta * C` on row-major `f32` matrices.
///
/// This is a naive CPU implementation, very slow on large payloads,
/// not designed to be used for other purposes than testing.
pub fn gemm_reference(
    problem: &GemmProblem,
    alpha: f32,
    lhs: &[f32],
    rhs: &[f32],
    beta: f32,
    acc: &[f32],
) -> Vec<f32> {
    let GemmProblem { m, n, k } = *problem;
    assert_eq!(lhs.len(), m * k);
    assert_eq!(rhs.len(), k * n);
    assert_eq!(acc.len(), m * n);

    let mut out = vec![0.; m * n];

    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.;
            for k_ in 0..k {
                sum += lhs[i * k + k_] * rhs[k_ * n + j];
            }
            out[i * n + j] = alpha * sum + beta * acc[i * n + j];
        }
    }

    out
}

/// Expands a diagonal into the dense, row-major square matrix it represents.
pub fn expand_diagonal(diagonal: &[f32]) -> Vec<f32> {
    let size = diagonal.len();
    let mut dense = vec![0.; size * size];

    for (i, value) in diagonal.iter().enumerate() {
        dense[i * size + i] = *value;
    }

    dense
}
