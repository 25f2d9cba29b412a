//! Shared networks for the integration tests.

#![allow(dead_code)]

use forcedensity::Network;
use ndarray::Array2;

/// 8 arch edges (chain along the arch + two cross-braces).
pub const ARCH_EDGES: [[usize; 2]; 8] = [
    [0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 6],
    [1, 5], [2, 4],
];

/// A 7-vertex arch with two pinned supports.
///
/// Initial positions trace an arch in the xz-plane; the downward loads make
/// the equilibrium shape hang below the supports instead.
///
///              (3)              ← crown, double load
///             /   \
///          (2)─────(4)
///         /           \
///      (1)─────────────(5)
///      /                 \
///   (0)                   (6)   ← fixed at (0,0,0) and (6,0,0)
pub fn arch_network() -> Network {
    let vertices = Array2::from_shape_vec(
        (7, 3),
        vec![
            0.0, 0.0, 0.0,
            1.0, 0.0, 1.0,
            2.0, 0.0, 2.0,
            3.0, 0.0, 2.5,
            4.0, 0.0, 2.0,
            5.0, 0.0, 1.0,
            6.0, 0.0, 0.0,
        ],
    )
    .unwrap();

    let loads = Array2::from_shape_vec(
        (7, 3),
        vec![
            0.0, 0.0, 0.0,
            0.0, 0.0, -1.0,
            0.0, 0.0, -1.0,
            0.0, 0.0, -2.0,
            0.0, 0.0, -1.0,
            0.0, 0.0, -1.0,
            0.0, 0.0, 0.0,
        ],
    )
    .unwrap();

    Network::new(vertices, vec![0, 6], ARCH_EDGES.to_vec(), vec![1.0; 8]).with_loads(loads)
}

/// Two supports at (0,0,0) and (1,0,0); one free vertex at (0.5,0.5,0)
/// tied to both by unit force densities, unloaded.
pub fn two_bar_network() -> Network {
    let vertices = Array2::from_shape_vec(
        (3, 3),
        vec![
            0.0, 0.0, 0.0,
            1.0, 0.0, 0.0,
            0.5, 0.5, 0.0,
        ],
    )
    .unwrap();
    Network::new(vertices, vec![0, 1], vec![[2, 0], [2, 1]], vec![1.0, 1.0])
}

/// `n` × `n` grid, corners fixed, unit downward load on every vertex.
pub fn grid_network(n: usize) -> Network {
    let num_vertices = n * n;
    let mut edges = Vec::new();
    for row in 0..n {
        for col in 0..(n - 1) {
            edges.push([row * n + col, row * n + col + 1]);
        }
    }
    for row in 0..(n - 1) {
        for col in 0..n {
            edges.push([row * n + col, (row + 1) * n + col]);
        }
    }
    let num_edges = edges.len();

    let vertices = Array2::from_shape_fn((num_vertices, 3), |(i, d)| match d {
        0 => (i % n) as f64,
        1 => (i / n) as f64,
        _ => 0.0,
    });
    let loads = Array2::from_shape_fn((num_vertices, 3), |(_, d)| if d == 2 { -1.0 } else { 0.0 });
    let fixed = vec![0, n - 1, n * (n - 1), n * n - 1];

    Network::new(vertices, fixed, edges, vec![1.0; num_edges]).with_loads(loads)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
