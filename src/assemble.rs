//! Stiffness assembly:  D = Cᵀ Q C,  Di = Ciᵀ Q Ci,  Df = Ciᵀ Q Cf.

use crate::connectivity::Connectivity;
use sprs::{CsMat, TriMat};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Stiffness {
    /// Full stiffness (nn × nn); only used for residuals.
    pub full: CsMat<f64>,
    /// Free-free block (nn_free × nn_free); the SPD system matrix.
    pub free: CsMat<f64>,
    /// Free-fixed coupling (nn_free × nn_fixed).
    pub coupling: CsMat<f64>,
}

impl Stiffness {
    pub fn assemble(conn: &Connectivity, q: &[f64]) -> Self {
        let q_diag = force_density_matrix(q);

        let ct = conn.full.transpose_view().to_csc();
        let cit = conn.free.transpose_view().to_csc();
        let cit_q = &cit * &q_diag;

        let full = (&(&ct * &q_diag) * &conn.full).to_csc();
        let free = (&cit_q * &conn.free).to_csc();
        let coupling = (&cit_q * &conn.fixed).to_csc();

        trace!(
            full_nnz = full.nnz(),
            free_nnz = free.nnz(),
            coupling_nnz = coupling.nnz(),
            "assembled stiffness"
        );
        Self { full, free, coupling }
    }
}

/// Diagonal matrix Q (ne × ne) holding the force densities.
pub fn force_density_matrix(q: &[f64]) -> CsMat<f64> {
    let ne = q.len();
    let mut tri = TriMat::with_capacity((ne, ne), ne);
    for (k, &qk) in q.iter().enumerate() {
        tri.add_triplet(k, k, qk);
    }
    tri.to_csc()
}
