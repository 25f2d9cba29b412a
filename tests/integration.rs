//! Integration tests: end-to-end forward solves.
//!
//! These tests verify that the full pipeline (validation → partition →
//! assembly → SPD solve → result compilation) satisfies the equilibrium,
//! residual and length/force laws on small networks with known answers.

mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use common::{arch_network, init_tracing, two_bar_network};
use forcedensity::linalg::spmm;
use forcedensity::{
    fdm, Backend, ColumnSelection, DenseCholesky, FdmSystem, Network, Ordering, SolverOptions,
    SparseLdl,
};
use ndarray::{Array2, Axis};

// ─────────────────────────────────────────────────────────────
//  Test: two bars pulling one free vertex onto the support line
// ─────────────────────────────────────────────────────────────

#[test]
fn two_bar_settles_between_supports() {
    init_tracing();
    let network = two_bar_network();
    let result = fdm::solve(&network, &SolverOptions::default()).unwrap();

    // free vertex at the midpoint
    assert_abs_diff_eq!(result.vertices[[2, 0]], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(result.vertices[[2, 1]], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(result.vertices[[2, 2]], 0.0, epsilon = 1e-12);

    // supports untouched
    assert_eq!(result.vertices.row(0), network.vertices.row(0));
    assert_eq!(result.vertices.row(1), network.vertices.row(1));

    for e in 0..2 {
        assert_relative_eq!(result.lengths[e], 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.forces[e], 0.5, epsilon = 1e-12);
    }

    // supports are pulled inward, free vertex is balanced
    assert_abs_diff_eq!(result.residuals[[0, 0]], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(result.residuals[[1, 0]], -0.5, epsilon = 1e-12);
    for d in 0..3 {
        assert_abs_diff_eq!(result.residuals[[2, d]], 0.0, epsilon = 1e-12);
    }
}

// ─────────────────────────────────────────────────────────────
//  Test: equilibrium and residual laws on the arch
// ─────────────────────────────────────────────────────────────

/// Di · X_free must reproduce P_free − Df · X_fixed.
#[test]
fn arch_satisfies_equilibrium_law() {
    let network = arch_network();
    let options = SolverOptions::default();
    let system = FdmSystem::new(&network, &options).unwrap();
    let result = system.solve(&SparseLdl::default()).unwrap();

    let p = system.partition();
    let x_free = result.vertices.select(Axis(0), p.free());
    let x_fixed = result.vertices.select(Axis(0), p.fixed());
    let lhs = spmm(&system.stiffness().free, &x_free);
    let rhs = &network.load_matrix().select(Axis(0), p.free())
        - &spmm(&system.stiffness().coupling, &x_fixed);

    for (a, b) in lhs.iter().zip(rhs.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-10, max_relative = 1e-9);
    }
}

#[test]
fn arch_residuals_vanish_at_free_vertices() {
    let network = arch_network();
    let system = FdmSystem::new(&network, &SolverOptions::default()).unwrap();
    let result = system.solve(&SparseLdl::default()).unwrap();

    assert!(
        result.free_residual_norm(system.partition()) < 1e-10,
        "free residual = {:e}",
        result.free_residual_norm(system.partition()),
    );

    // Σ R = Σ P because every column of D sums to zero
    let total_residual = result.residuals.sum_axis(Axis(0));
    let total_load = network.load_matrix().sum_axis(Axis(0));
    for d in 0..3 {
        assert_abs_diff_eq!(total_residual[d], total_load[d], epsilon = 1e-10);
    }

    // symmetric arch: each support carries half the load
    let reactions = result.reactions(system.partition());
    assert_eq!(reactions.nrows(), 2);
    assert_abs_diff_eq!(reactions[[0, 2]], -3.0, epsilon = 1e-10);
    assert_abs_diff_eq!(reactions[[1, 2]], -3.0, epsilon = 1e-10);
    assert_abs_diff_eq!(reactions[[0, 0]], -reactions[[1, 0]], epsilon = 1e-10);
}

#[test]
fn arch_hangs_symmetrically() {
    let result = fdm::solve(&arch_network(), &SolverOptions::default()).unwrap();
    let xyz = &result.vertices;

    assert_abs_diff_eq!(xyz[[3, 0]], 3.0, epsilon = 1e-10);
    assert_abs_diff_eq!(xyz[[1, 0]] + xyz[[5, 0]], 6.0, epsilon = 1e-10);
    assert_abs_diff_eq!(xyz[[2, 0]] + xyz[[4, 0]], 6.0, epsilon = 1e-10);
    assert_abs_diff_eq!(xyz[[1, 2]], xyz[[5, 2]], epsilon = 1e-10);
    for v in 1..6 {
        assert_abs_diff_eq!(xyz[[v, 1]], 0.0, epsilon = 1e-12);
        assert!(xyz[[v, 2]] < 0.0, "vertex {v} should hang below the supports");
    }
    // crown is the lowest point
    assert!(xyz[[3, 2]] < xyz[[2, 2]]);
}

/// A stiff and a slack bar hanging off separate supports: the free block is
/// diag(1e7, 1e-6), badly scaled but positive definite.
#[test]
fn widely_mixed_force_densities_still_solve() {
    let vertices = Array2::from_shape_vec(
        (4, 3),
        vec![
            0.0, 0.0, 0.0,
            1.0, 0.0, 0.0,
            0.3, 0.3, 0.0,
            0.6, 0.6, 0.0,
        ],
    )
    .unwrap();
    let loads = Array2::from_shape_fn((4, 3), |(i, d)| if i >= 2 && d == 2 { -1.0 } else { 0.0 });
    let network = Network::new(vertices, vec![0, 1], vec![[2, 0], [3, 1]], vec![1e7, 1e-6])
        .with_loads(loads);

    for backend in [Backend::SparseLdl, Backend::DenseCholesky] {
        let options = SolverOptions {
            backend,
            ..SolverOptions::default()
        };
        let result = fdm::solve(&network, &options).unwrap();
        let xyz = &result.vertices;

        // each free vertex sits below its support by p / q
        assert_abs_diff_eq!(xyz[[2, 0]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(xyz[[2, 2]], -1e-7, max_relative = 1e-9);
        assert_abs_diff_eq!(xyz[[3, 0]], 1.0, epsilon = 1e-9);
        assert_relative_eq!(xyz[[3, 2]], -1e6, max_relative = 1e-9);

        assert_relative_eq!(result.forces[0], 1.0, max_relative = 1e-9);
        assert_relative_eq!(result.forces[1], 1.0, max_relative = 1e-9);
    }
}

// ─────────────────────────────────────────────────────────────
//  Test: derived quantities
// ─────────────────────────────────────────────────────────────

#[test]
fn lengths_and_forces_match_edge_geometry() {
    let mut network = arch_network();
    network.force_densities = vec![1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 0.5, 0.25];
    let result = fdm::solve(&network, &SolverOptions::default()).unwrap();

    for (i, &[s, t]) in network.edges.iter().enumerate() {
        let d = &result.vertices.row(t) - &result.vertices.row(s);
        let len = d.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert_relative_eq!(result.lengths[i], len, max_relative = 1e-12);
        assert_relative_eq!(
            result.forces[i],
            network.force_densities[i] * result.lengths[i],
            max_relative = 1e-12
        );
    }
}

#[test]
fn unloaded_network_defaults_to_zero_loads() {
    let mut network = arch_network();
    network.loads = None;
    let result = fdm::solve(&network, &SolverOptions::default()).unwrap();

    // with no load every free vertex lands on the chord between the supports
    for v in 1..6 {
        assert_abs_diff_eq!(result.vertices[[v, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.vertices[[v, 2]], 0.0, epsilon = 1e-12);
    }
}

#[test]
fn fully_fixed_network_only_derives_quantities() {
    let mut network = two_bar_network();
    network.fixed = vec![0, 1, 2];
    let result = fdm::solve(&network, &SolverOptions::default()).unwrap();

    assert_eq!(result.vertices, network.vertices);
    let expected = (0.5f64 * 0.5 + 0.5 * 0.5).sqrt();
    assert_relative_eq!(result.lengths[0], expected, max_relative = 1e-12);
    assert_relative_eq!(result.lengths[1], expected, max_relative = 1e-12);
}

// ─────────────────────────────────────────────────────────────
//  Test: determinism and backend agreement
// ─────────────────────────────────────────────────────────────

#[test]
fn repeated_solves_are_identical() {
    let network = arch_network();
    let options = SolverOptions::default();
    let a = fdm::solve(&network, &options).unwrap();
    let b = fdm::solve(&network, &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn backends_and_orderings_agree() {
    let network = arch_network();
    let reference = fdm::solve_with(&network, &SolverOptions::default(), &DenseCholesky).unwrap();

    let variants = [
        SolverOptions::default(),
        SolverOptions {
            ordering: Ordering::Natural,
            ..SolverOptions::default()
        },
        SolverOptions {
            column_selection: ColumnSelection::SelectionMatrix,
            ..SolverOptions::default()
        },
        SolverOptions {
            backend: Backend::DenseCholesky,
            column_selection: ColumnSelection::SelectionMatrix,
            ..SolverOptions::default()
        },
    ];

    for options in &variants {
        let result = fdm::solve(&network, options).unwrap();
        for (a, b) in result.vertices.iter().zip(reference.vertices.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
        for (a, b) in result.forces.iter().zip(&reference.forces) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
    }
}
