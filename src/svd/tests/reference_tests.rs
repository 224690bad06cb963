//! Known-answer tests against precomputed decompositions.

use ndarray::{Array2, array};

use crate::data::ChannelMatrix;
use crate::svd::engine::{NalgebraSvd, SvdEngine};
use crate::svd::reconstruct::reconstruct_matrix;
use crate::svd::truncate::truncate_singular_values;

/// `H · diag(4, 3, 2, 1) · H` with `H` the symmetric orthogonal 4×4
/// Hadamard matrix scaled by 1/2.
fn hadamard_matrix() -> Array2<f64> {
    array![
        [2.5, 0.5, 1.0, 0.0],
        [0.5, 2.5, 0.0, 1.0],
        [1.0, 0.0, 2.5, 0.5],
        [0.0, 1.0, 0.5, 2.5],
    ]
}

/// `H · diag(4, 3, 0, 0) · H`
fn hadamard_rank_two() -> Array2<f64> {
    array![
        [1.75, 0.25, 1.75, 0.25],
        [0.25, 1.75, 0.25, 1.75],
        [1.75, 0.25, 1.75, 0.25],
        [0.25, 1.75, 0.25, 1.75],
    ]
}

#[test]
fn test_hadamard_singular_values() {
    let m = ChannelMatrix::from_array(hadamard_matrix());
    let f = NalgebraSvd.decompose(&m).expect("svd");
    let expected = [4.0, 3.0, 2.0, 1.0];
    for (s, e) in f.sigma.iter().zip(expected) {
        assert!((s - e).abs() < 1e-9, "sigma {:?} != {:?}", f.sigma, expected);
    }
}

#[test]
fn test_hadamard_rank_two_reconstruction() {
    let m = ChannelMatrix::from_array(hadamard_matrix());
    let f = NalgebraSvd.decompose(&m).expect("svd");
    let sigma = truncate_singular_values(&f.sigma, 2).expect("truncate");
    let approx = reconstruct_matrix(&f, &sigma).expect("reconstruct");

    let expected = ChannelMatrix::from_array(hadamard_rank_two());
    let diff = approx.max_abs_diff(&expected).expect("same shape");
    assert!(diff < 1e-6, "max difference {} exceeds tolerance", diff);
}

#[test]
fn test_identity_rank_two() {
    // Repeated singular values: any rank-2 truncation keeps a 2-dimensional
    // projection with unit norm per kept mode.
    let m = ChannelMatrix::from_array(Array2::eye(4));
    let f = NalgebraSvd.decompose(&m).expect("svd");
    assert!(f.sigma.iter().all(|s| (s - 1.0).abs() < 1e-12));

    let sigma = truncate_singular_values(&f.sigma, 2).expect("truncate");
    let approx = reconstruct_matrix(&f, &sigma).expect("reconstruct");
    let trace: f64 = approx.as_array().diag().sum();
    assert!((trace - 2.0).abs() < 1e-9);

    // Projection matrix: P·P = P
    let p = approx.as_array();
    let pp = p.dot(p);
    let diff = ChannelMatrix::from_array(pp)
        .max_abs_diff(&approx)
        .expect("same shape");
    assert!(diff < 1e-9);
}
