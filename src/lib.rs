//! **forcedensity**: Force Density Method equilibrium of pin-jointed networks.
//!
//! Given fixed supports, an edge topology, a force density per edge and
//! vertex loads, a single linear solve yields the equilibrium positions of
//! all free vertices:
//!
//! 1. **Partition** (`partition`): split `0..N` into free / fixed vertices.
//! 2. **Connectivity** (`connectivity`): signed incidence C and its restrictions Ci, Cf.
//! 3. **Assembly** (`assemble`): D = CᵀQC, Di = CiᵀQCi, Df = CiᵀQCf.
//! 4. **Solve** (`linalg`, `fdm`): SPD factorisation of Di, Di X = P − Df Xf.
//! 5. **Results** (`fdm`): residuals, edge lengths and edge forces.
//! 6. **FFI** (`ffi`): C-compatible entry point over flat arrays.

pub mod types;
pub mod partition;
pub mod connectivity;
pub mod assemble;
pub mod linalg;
pub mod fdm;
pub mod convert;
pub mod ffi;

pub use fdm::{solve, solve_with, FdmSystem};
pub use linalg::{DenseCholesky, SparseLdl, SpdSolve};
pub use partition::VertexPartition;
pub use types::{
    Backend, ColumnSelection, FdmError, FdmResult, InputError, Network, Ordering, SolverOptions,
};
