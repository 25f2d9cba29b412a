//! Forward FDM solve: partition, assemble Di / Df, factorise, solve, derive
//! residuals, lengths and forces.

use crate::assemble::Stiffness;
use crate::connectivity::Connectivity;
use crate::linalg::{row_norms, spmm, spmm_add_into, DenseCholesky, SparseLdl, SpdSolve};
use crate::partition::VertexPartition;
use crate::types::{Backend, FdmError, FdmResult, Network, SolverOptions};
use ndarray::{Array2, Axis};
use tracing::{debug, debug_span, warn};

// ─────────────────────────────────────────────────────────────
//  Top-level entry points
// ─────────────────────────────────────────────────────────────

/// One-shot equilibrium solve with the backend selected in `options`.
pub fn solve(network: &Network, options: &SolverOptions) -> Result<FdmResult, FdmError> {
    match options.backend {
        Backend::SparseLdl => solve_with(
            network,
            options,
            &SparseLdl {
                ordering: options.ordering,
            },
        ),
        Backend::DenseCholesky => solve_with(network, options, &DenseCholesky),
    }
}

/// One-shot equilibrium solve with an explicit SPD backend.
pub fn solve_with(
    network: &Network,
    options: &SolverOptions,
    solver: &impl SpdSolve,
) -> Result<FdmResult, FdmError> {
    FdmSystem::new(network, options)?.solve(solver)
}

// ─────────────────────────────────────────────────────────────
//  Assembled system
// ─────────────────────────────────────────────────────────────

/// Validated input plus every matrix derived from it.  Building the system
/// does all the sparse assembly; [`FdmSystem::solve`] only factorises.
#[derive(Debug, Clone)]
pub struct FdmSystem {
    partition: VertexPartition,
    connectivity: Connectivity,
    stiffness: Stiffness,
    vertices: Array2<f64>,
    loads: Array2<f64>,
    force_densities: Vec<f64>,
}

impl FdmSystem {
    pub fn new(network: &Network, options: &SolverOptions) -> Result<Self, FdmError> {
        // 0. Reject malformed input before touching any matrix
        network.validate()?;

        let nn = network.num_vertices();
        let partition = VertexPartition::new(nn, &network.fixed)?;

        let _span = debug_span!(
            "fdm_assemble",
            vertices = nn,
            edges = network.num_edges(),
            free = partition.num_free(),
            fixed = partition.num_fixed(),
        )
        .entered();

        if let Some(k) = network.force_densities.iter().position(|&q| q <= 0.0) {
            warn!(
                edge = k,
                q = network.force_densities[k],
                "non-positive force density; stiffness may not be SPD"
            );
        }

        // 1. C, Ci, Cf
        let connectivity =
            Connectivity::build(&network.edges, nn, &partition, options.column_selection);

        // 2. D, Di, Df
        let stiffness = Stiffness::assemble(&connectivity, &network.force_densities);

        Ok(Self {
            partition,
            connectivity,
            stiffness,
            vertices: network.vertices.clone(),
            loads: network.load_matrix(),
            force_densities: network.force_densities.clone(),
        })
    }

    pub fn partition(&self) -> &VertexPartition {
        &self.partition
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn stiffness(&self) -> &Stiffness {
        &self.stiffness
    }

    /// Solve for the free coordinates and compile the full result.
    pub fn solve(&self, solver: &impl SpdSolve) -> Result<FdmResult, FdmError> {
        let _span = debug_span!("fdm_solve", free = self.partition.num_free()).entered();

        let x_free = solve_free_coordinates(
            &self.stiffness,
            &self.partition,
            &self.vertices,
            &self.loads,
            solver,
        )?;

        Ok(compile_result(
            &self.connectivity,
            &self.stiffness,
            &self.partition,
            &self.force_densities,
            &self.vertices,
            &self.loads,
            &x_free,
        ))
    }
}

// ─────────────────────────────────────────────────────────────
//  Linear solve:  Di X_free = P_free − Df X_fixed
// ─────────────────────────────────────────────────────────────

/// Free-vertex coordinates (nn_free × 3), rows in partition order.
pub fn solve_free_coordinates(
    stiffness: &Stiffness,
    partition: &VertexPartition,
    vertices: &Array2<f64>,
    loads: &Array2<f64>,
    solver: &impl SpdSolve,
) -> Result<Array2<f64>, FdmError> {
    if partition.num_free() == 0 {
        return Ok(Array2::zeros((0, 3)));
    }

    // rhs = P_free − Df X_fixed
    let x_fixed = vertices.select(Axis(0), partition.fixed());
    let mut rhs = loads.select(Axis(0), partition.free());
    spmm_add_into(&stiffness.coupling, &x_fixed, &mut rhs, -1.0);

    let x_free = solver.solve_spd(stiffness.free.view(), &rhs).inspect_err(|e| {
        debug!(error = %e, "factorisation failed");
    })?;
    debug!(rows = x_free.nrows(), "solved free coordinates");
    Ok(x_free)
}

// ─────────────────────────────────────────────────────────────
//  Derived quantities
// ─────────────────────────────────────────────────────────────

/// Scatter `x_free` into the full coordinates and compute R, F, L.
///
///   X[free] = x_free
///   R = P − D X
///   L = ‖C X‖ row-wise
///   F = q ⊙ L
pub fn compile_result(
    connectivity: &Connectivity,
    stiffness: &Stiffness,
    partition: &VertexPartition,
    force_densities: &[f64],
    vertices: &Array2<f64>,
    loads: &Array2<f64>,
    x_free: &Array2<f64>,
) -> FdmResult {
    let mut xyz = vertices.clone();
    for (i, &v) in partition.free().iter().enumerate() {
        xyz.row_mut(v).assign(&x_free.row(i));
    }

    let mut residuals = loads.clone();
    spmm_add_into(&stiffness.full, &xyz, &mut residuals, -1.0);

    let lengths = row_norms(&spmm(&connectivity.full, &xyz));
    let forces = force_densities
        .iter()
        .zip(&lengths)
        .map(|(q, l)| q * l)
        .collect();

    FdmResult {
        vertices: xyz,
        residuals,
        forces,
        lengths,
    }
}
