//! Signed edge–vertex incidence matrices.
//!
//! `C` is ne × nn with `+1` at the start vertex and `−1` at the end vertex of
//! each edge.  `Ci` / `Cf` are its columns restricted to the free / fixed
//! vertices, in partition order.

use crate::partition::VertexPartition;
use crate::types::ColumnSelection;
use sprs::{CsMat, TriMat};
use tracing::trace;

/// `C`, `Ci` and `Cf` for one network, all stored as CSC.
#[derive(Debug, Clone)]
pub struct Connectivity {
    /// Full incidence matrix  (ne × nn)
    pub full: CsMat<f64>,
    /// Free-vertex columns    (ne × nn_free)
    pub free: CsMat<f64>,
    /// Fixed-vertex columns   (ne × nn_fixed)
    pub fixed: CsMat<f64>,
}

impl Connectivity {
    pub fn build(
        edges: &[[usize; 2]],
        num_vertices: usize,
        partition: &VertexPartition,
        selection: ColumnSelection,
    ) -> Self {
        let full = incidence_matrix(edges, num_vertices);
        let (free, fixed) = match selection {
            ColumnSelection::Gather => (
                select_columns(&full, partition.free()),
                select_columns(&full, partition.fixed()),
            ),
            ColumnSelection::SelectionMatrix => (
                (&full * &selection_matrix(num_vertices, partition.free())).to_csc(),
                (&full * &selection_matrix(num_vertices, partition.fixed())).to_csc(),
            ),
        };
        trace!(
            nnz = full.nnz(),
            free_cols = free.cols(),
            fixed_cols = fixed.cols(),
            ?selection,
            "built connectivity matrices"
        );
        Self { full, free, fixed }
    }

    pub fn num_edges(&self) -> usize {
        self.full.rows()
    }
}

/// Build the signed incidence matrix C (ne × nn) from the edge list in one pass.
pub fn incidence_matrix(edges: &[[usize; 2]], num_vertices: usize) -> CsMat<f64> {
    let mut tri = TriMat::with_capacity((edges.len(), num_vertices), 2 * edges.len());
    for (e, &[s, t]) in edges.iter().enumerate() {
        tri.add_triplet(e, s, 1.0);
        tri.add_triplet(e, t, -1.0);
    }
    tri.to_csc()
}

/// 0/1 matrix (nn × cols.len()) mapping vertex `cols[i]` to output column `i`.
pub fn selection_matrix(num_vertices: usize, cols: &[usize]) -> CsMat<f64> {
    let mut tri = TriMat::with_capacity((num_vertices, cols.len()), cols.len());
    for (new_col, &vertex) in cols.iter().enumerate() {
        tri.add_triplet(vertex, new_col, 1.0);
    }
    tri.to_csc()
}

/// Extract columns from a CSC matrix by index, in the order given.
pub fn select_columns(mat: &CsMat<f64>, cols: &[usize]) -> CsMat<f64> {
    let mat_csc = mat.to_csc();
    let nnz: usize = cols
        .iter()
        .filter_map(|&c| mat_csc.outer_view(c))
        .map(|col| col.nnz())
        .sum();

    let mut tri = TriMat::with_capacity((mat_csc.rows(), cols.len()), nnz);
    for (new_col, &old_col) in cols.iter().enumerate() {
        let Some(col) = mat_csc.outer_view(old_col) else {
            continue;
        };
        for (row, &v) in col.iter() {
            tri.add_triplet(row, new_col, v);
        }
    }
    tri.to_csc()
}
