use ndarray::{Array2, Axis};
use thiserror::Error;

use crate::partition::{check_fixed_vertices, VertexPartition};

// ─────────────────────────────────────────────────────────────
//  Error types
// ─────────────────────────────────────────────────────────────

/// Unified error type for all fallible operations in the crate.
///
/// Every function in the public Rust API returns `Result<T, FdmError>`
/// instead of panicking.  The FFI layer translates these into integer
/// return codes + a thread-local error message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FdmError {
    /// Input arrays violate a precondition; detected before any matrix is built.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    /// The free-free stiffness block is not symmetric positive definite.
    #[error("singular stiffness matrix{}: {reason}", pivot_suffix(.pivot))]
    SingularStiffness {
        pivot: Option<usize>,
        reason: String,
    },
}

fn pivot_suffix(pivot: &Option<usize>) -> String {
    pivot.map(|p| format!(" at pivot {p}")).unwrap_or_default()
}

impl From<sprs::errors::LinalgError> for FdmError {
    fn from(e: sprs::errors::LinalgError) -> Self {
        match e {
            sprs::errors::LinalgError::SingularMatrix(info) => Self::SingularStiffness {
                pivot: Some(info.index),
                reason: info.reason.to_string(),
            },
            other => Self::SingularStiffness {
                pivot: None,
                reason: other.to_string(),
            },
        }
    }
}

/// Boundary precondition violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("fixed vertex list is not ascending at position {position}")]
    FixedNotSorted { position: usize },
    #[error("fixed vertex {vertex} is listed more than once")]
    FixedDuplicate { vertex: usize },
    #[error("fixed vertex {vertex} is out of range for {vertex_count} vertices")]
    FixedOutOfRange { vertex: usize, vertex_count: usize },
    #[error("edge {edge} references vertex {vertex}, out of range for {vertex_count} vertices")]
    EdgeOutOfRange {
        edge: usize,
        vertex: usize,
        vertex_count: usize,
    },
    #[error("{what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("non-finite {what} at index {index}")]
    NonFinite { what: &'static str, index: usize },
}

// ─────────────────────────────────────────────────────────────
//  Solver options
// ─────────────────────────────────────────────────────────────

/// Which SPD factorisation backend solves the free-free system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Sparse LDLᵀ via `sprs-ldl`, every pivot validated > 0.
    #[default]
    SparseLdl,
    /// Dense Cholesky.  Only sensible for small networks or cross-checks.
    DenseCholesky,
}

/// Fill-in reducing permutation applied before sparse factorisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ordering {
    Natural,
    #[default]
    ReverseCuthillMcKee,
}

/// How `Ci` / `Cf` are cut out of the full incidence matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnSelection {
    /// Copy the selected columns directly.
    #[default]
    Gather,
    /// Right-multiply `C` by a 0/1 selection matrix.
    SelectionMatrix,
}

#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    pub backend: Backend,
    pub ordering: Ordering,
    pub column_selection: ColumnSelection,
}

// ─────────────────────────────────────────────────────────────
//  Network input
// ─────────────────────────────────────────────────────────────

/// Everything a single equilibrium solve needs.
#[derive(Debug, Clone)]
pub struct Network {
    /// Initial vertex positions (nn × 3).  Fixed rows are kept as supports.
    pub vertices: Array2<f64>,
    /// Sorted, unique indices of the supported vertices.
    pub fixed: Vec<usize>,
    /// `[start, end]` pairs.  +1 at start, −1 at end in the incidence matrix.
    pub edges: Vec<[usize; 2]>,
    /// One force density per edge.
    pub force_densities: Vec<f64>,
    /// External loads (nn × 3).  `None` means unloaded.
    pub loads: Option<Array2<f64>>,
}

impl Network {
    pub fn new(
        vertices: Array2<f64>,
        fixed: Vec<usize>,
        edges: Vec<[usize; 2]>,
        force_densities: Vec<f64>,
    ) -> Self {
        Self {
            vertices,
            fixed,
            edges,
            force_densities,
            loads: None,
        }
    }

    pub fn with_loads(mut self, loads: Array2<f64>) -> Self {
        self.loads = Some(loads);
        self
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.nrows()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Load matrix, zero-filled when the network is unloaded.
    pub fn load_matrix(&self) -> Array2<f64> {
        match &self.loads {
            Some(p) => p.clone(),
            None => Array2::zeros(self.vertices.raw_dim()),
        }
    }

    /// Check every boundary precondition; returns the first violation.
    pub fn validate(&self) -> Result<(), InputError> {
        let nn = self.num_vertices();

        if self.vertices.ncols() != 3 {
            return Err(InputError::ShapeMismatch {
                what: "vertex coordinate columns",
                expected: 3,
                found: self.vertices.ncols(),
            });
        }
        if let Some(p) = &self.loads {
            if p.nrows() != nn {
                return Err(InputError::ShapeMismatch {
                    what: "load rows",
                    expected: nn,
                    found: p.nrows(),
                });
            }
            if p.ncols() != 3 {
                return Err(InputError::ShapeMismatch {
                    what: "load columns",
                    expected: 3,
                    found: p.ncols(),
                });
            }
        }
        if self.force_densities.len() != self.edges.len() {
            return Err(InputError::ShapeMismatch {
                what: "force densities",
                expected: self.edges.len(),
                found: self.force_densities.len(),
            });
        }

        check_fixed_vertices(nn, &self.fixed)?;

        for (edge, pair) in self.edges.iter().enumerate() {
            for &vertex in pair {
                if vertex >= nn {
                    return Err(InputError::EdgeOutOfRange {
                        edge,
                        vertex,
                        vertex_count: nn,
                    });
                }
            }
        }

        first_non_finite_row(&self.vertices, "vertex coordinate")?;
        if let Some(p) = &self.loads {
            first_non_finite_row(p, "load")?;
        }
        if let Some(index) = self.force_densities.iter().position(|q| !q.is_finite()) {
            return Err(InputError::NonFinite {
                what: "force density",
                index,
            });
        }

        Ok(())
    }
}

fn first_non_finite_row(m: &Array2<f64>, what: &'static str) -> Result<(), InputError> {
    match m.rows().into_iter().position(|row| row.iter().any(|v| !v.is_finite())) {
        Some(index) => Err(InputError::NonFinite { what, index }),
        None => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────
//  Solver result
// ─────────────────────────────────────────────────────────────

/// Output bundle of one forward solve.
#[derive(Debug, Clone, PartialEq)]
pub struct FdmResult {
    /// Equilibrium positions (nn × 3); fixed rows equal the input.
    pub vertices: Array2<f64>,
    /// `P − D X` (nn × 3): ≈ 0 at free vertices, support reactions at fixed ones.
    pub residuals: Array2<f64>,
    /// Edge forces `q ⊙ L`.
    pub forces: Vec<f64>,
    /// Edge lengths.
    pub lengths: Vec<f64>,
}

impl FdmResult {
    /// Largest residual norm over the free vertices.  Zero (to round-off)
    /// for a converged solve.
    pub fn free_residual_norm(&self, partition: &VertexPartition) -> f64 {
        partition
            .free()
            .iter()
            .map(|&v| row_norm(&self.residuals, v))
            .fold(0.0, f64::max)
    }

    /// Support reactions (n_fixed × 3) in fixed-list order.
    pub fn reactions(&self, partition: &VertexPartition) -> Array2<f64> {
        self.residuals.select(Axis(0), partition.fixed())
    }
}

fn row_norm(m: &Array2<f64>, row: usize) -> f64 {
    m.row(row).iter().map(|v| v * v).sum::<f64>().sqrt()
}
