//! SPD solve backends and sparse × dense helpers.
//!
//! The equilibrium pipeline only talks to [`SpdSolve`]; the factorisation
//! behind it can be swapped without touching assembly.

use crate::types::{FdmError, Ordering};
use ndarray::Array2;
use sprs::{CsMat, CsMatView, FillInReduction, SymmetryCheck};
use sprs_ldl::Ldl;
use tracing::debug;

/// A pivot at or below this fraction of its own diagonal entry has lost all
/// significant digits to cancellation and is treated as zero.
pub const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-12;

/// Capability: factorise a symmetric positive definite matrix and solve
/// `A X = B` for every column of `B`.
pub trait SpdSolve {
    /// Fails with [`FdmError::SingularStiffness`] when `a` is not SPD.
    fn solve_spd(&self, a: CsMatView<'_, f64>, b: &Array2<f64>) -> Result<Array2<f64>, FdmError>;
}

// ─────────────────────────────────────────────────────────────
//  Sparse LDLᵀ  (sprs-ldl)
// ─────────────────────────────────────────────────────────────

/// Sparse LDLᵀ with every entry of D required to be positive, i.e. a
/// square-root-free Cholesky.
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseLdl {
    pub ordering: Ordering,
}

impl SpdSolve for SparseLdl {
    fn solve_spd(&self, a: CsMatView<'_, f64>, b: &Array2<f64>) -> Result<Array2<f64>, FdmError> {
        let diag = check_diagonal(a.view())?;

        let fill_in = match self.ordering {
            Ordering::Natural => FillInReduction::NoReduction,
            Ordering::ReverseCuthillMcKee => FillInReduction::ReverseCuthillMcKee,
        };
        let builder = Ldl::new()
            .fill_in_reduction(fill_in)
            .check_symmetry(SymmetryCheck::DontCheckSymmetry);
        // pivot k of the factorisation belongs to row perm.at(k) of `a`
        let perm = builder.perm(a.view());
        let ldl = builder.numeric(a).map_err(|e| match FdmError::from(e) {
            FdmError::SingularStiffness {
                pivot: Some(k),
                reason,
            } => FdmError::SingularStiffness {
                pivot: Some(perm.at(k)),
                reason,
            },
            other => other,
        })?;

        // Validate positive-definiteness: every D entry > 0 relative to its row
        for (k, &dk) in ldl.d().iter().enumerate() {
            let row = perm.at(k);
            if !(dk > RELATIVE_PIVOT_TOLERANCE * diag[row]) {
                debug!(pivot = row, value = dk, "non-positive pivot in LDL factorisation");
                return Err(FdmError::SingularStiffness {
                    pivot: Some(row),
                    reason: "non-positive pivot in LDL factorisation (not SPD)".into(),
                });
            }
        }

        let mut x = Array2::zeros(b.raw_dim());
        for d in 0..b.ncols() {
            let rhs: Vec<f64> = b.column(d).to_vec();
            let sol = ldl.solve(&rhs[..]);
            for (i, v) in sol.into_iter().enumerate() {
                x[[i, d]] = v;
            }
        }
        ensure_finite(&x)?;
        Ok(x)
    }
}

// ─────────────────────────────────────────────────────────────
//  Dense Cholesky  (reference backend)
// ─────────────────────────────────────────────────────────────

/// Dense LLᵀ on a copy of A.  O(n³); meant for small systems and for
/// cross-checking the sparse path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseCholesky;

impl SpdSolve for DenseCholesky {
    fn solve_spd(&self, a: CsMatView<'_, f64>, b: &Array2<f64>) -> Result<Array2<f64>, FdmError> {
        let diag = check_diagonal(a.view())?;
        let n = a.rows();

        // Reconstruct dense A
        let mut l = Array2::<f64>::zeros((n, n));
        for (&v, (row, col)) in a.iter() {
            l[[row, col]] += v;
        }

        // In-place factorisation, lower triangle holds L
        for j in 0..n {
            let mut pivot = l[[j, j]];
            for k in 0..j {
                pivot -= l[[j, k]] * l[[j, k]];
            }
            if !(pivot > RELATIVE_PIVOT_TOLERANCE * diag[j]) {
                debug!(pivot = j, value = pivot, "non-positive pivot in dense Cholesky");
                return Err(FdmError::SingularStiffness {
                    pivot: Some(j),
                    reason: "non-positive pivot in Cholesky factorisation (not SPD)".into(),
                });
            }
            let ljj = pivot.sqrt();
            l[[j, j]] = ljj;
            for i in (j + 1)..n {
                let mut s = l[[i, j]];
                for k in 0..j {
                    s -= l[[i, k]] * l[[j, k]];
                }
                l[[i, j]] = s / ljj;
            }
        }

        let mut x = b.to_owned();
        for d in 0..b.ncols() {
            // Forward: L y = b
            for i in 0..n {
                let mut s = x[[i, d]];
                for k in 0..i {
                    s -= l[[i, k]] * x[[k, d]];
                }
                x[[i, d]] = s / l[[i, i]];
            }
            // Backward: Lᵀ x = y
            for i in (0..n).rev() {
                let mut s = x[[i, d]];
                for k in (i + 1)..n {
                    s -= l[[k, i]] * x[[k, d]];
                }
                x[[i, d]] = s / l[[i, i]];
            }
        }
        ensure_finite(&x)?;
        Ok(x)
    }
}

/// Structural SPD precondition: every diagonal entry present and positive.
/// Returns the diagonal.
///
/// Catches free vertices without incident edges before the factorisation
/// sees an empty column.
pub fn check_diagonal(a: CsMatView<'_, f64>) -> Result<Vec<f64>, FdmError> {
    let n = a.rows();
    let mut diag = vec![0.0; n];
    for (&v, (row, col)) in a.iter() {
        if row == col {
            diag[row] += v;
        }
    }
    if let Some(i) = diag.iter().position(|&d| !(d > 0.0)) {
        return Err(FdmError::SingularStiffness {
            pivot: Some(i),
            reason: "zero or negative diagonal entry in stiffness matrix".into(),
        });
    }
    Ok(diag)
}

fn ensure_finite(x: &Array2<f64>) -> Result<(), FdmError> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(FdmError::SingularStiffness {
            pivot: None,
            reason: "non-finite solution".into(),
        })
    }
}

// ─────────────────────────────────────────────────────────────
//  Sparse × dense helpers
// ─────────────────────────────────────────────────────────────

/// A * B   where A is sparse (m × k), B is dense (k × 3).
pub fn spmm(a: &CsMat<f64>, b: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros((a.rows(), b.ncols()));
    spmm_add_into(a, b, &mut out, 1.0);
    out
}

/// out += alpha * A * B   (A in any storage, accumulated column by column).
pub fn spmm_add_into(a: &CsMat<f64>, b: &Array2<f64>, out: &mut Array2<f64>, alpha: f64) {
    let a_csc = a.to_csc();
    let indptr = a_csc.indptr();
    let indptr = indptr.raw_storage();
    for col in 0..a_csc.cols() {
        for nz in indptr[col]..indptr[col + 1] {
            let row = a_csc.indices()[nz];
            let val = alpha * a_csc.data()[nz];
            for d in 0..b.ncols() {
                out[[row, d]] += val * b[[col, d]];
            }
        }
    }
}

/// Euclidean norm of every row.
pub fn row_norms(m: &Array2<f64>) -> Vec<f64> {
    m.rows()
        .into_iter()
        .map(|r| r.iter().map(|v| v * v).sum::<f64>().sqrt())
        .collect()
}
