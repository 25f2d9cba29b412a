//! C-compatible FFI.
//!
//! All functions are `#[no_mangle] extern "C"`.
//!
//! Memory convention:
//!   - Caller allocates flat row-major arrays and passes pointers + lengths.
//!   - Output buffers are written only when the call succeeds.
//!   - The message of the last failure on the calling thread is read back
//!     with [`fdm_last_error`].

use crate::convert::{edges_from_flat, matrix_x3_from_flat, matrix_x3_to_flat};
use crate::fdm;
use crate::types::{FdmError, Network, SolverOptions};
use std::cell::RefCell;
use std::slice;

pub const FDM_OK: i32 = 0;
pub const FDM_INVALID_INPUT: i32 = 1;
pub const FDM_SINGULAR: i32 = 2;
pub const FDM_NULL_POINTER: i32 = -1;

thread_local! {
    static LAST_ERROR: RefCell<String> = const { RefCell::new(String::new()) };
}

fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| *e.borrow_mut() = msg);
}

fn error_code(e: &FdmError) -> i32 {
    match e {
        FdmError::InvalidInput(_) => FDM_INVALID_INPUT,
        FdmError::SingularStiffness { .. } => FDM_SINGULAR,
    }
}

/// `&[]` for an empty request, `None` for a null pointer with non-zero length.
unsafe fn input_slice<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        Some(Default::default())
    } else if ptr.is_null() {
        None
    } else {
        Some(slice::from_raw_parts(ptr, len))
    }
}

unsafe fn output_slice<'a, T>(ptr: *mut T, len: usize) -> Option<&'a mut [T]> {
    if len == 0 {
        Some(Default::default())
    } else if ptr.is_null() {
        None
    } else {
        Some(slice::from_raw_parts_mut(ptr, len))
    }
}

// ─────────────────────────────────────────────────────────────
//  Forward solve
// ─────────────────────────────────────────────────────────────

/// Single FDM equilibrium solve with default solver options.
///
/// Returns `FDM_OK` on success, `FDM_INVALID_INPUT` (including lengths whose
/// buffer size overflows `usize`), `FDM_SINGULAR` or `FDM_NULL_POINTER`
/// otherwise.  `loads` may be null (no external load).
///
/// # Safety
/// Every non-null pointer must be valid for its documented length:
/// `vertex_xyz`, `loads`, `out_xyz`, `out_residuals`: `num_vertices × 3`;
/// `fixed_vertices`: `num_fixed`; `edges`: `num_edges × 2`;
/// `force_densities`, `out_forces`, `out_lengths`: `num_edges`.
#[no_mangle]
pub unsafe extern "C" fn fdm_solve(
    // ── Geometry & topology ──
    num_vertices: usize,
    vertex_xyz: *const f64,
    num_fixed: usize,
    fixed_vertices: *const usize,
    num_edges: usize,
    edges: *const usize,
    force_densities: *const f64,
    loads: *const f64,
    // ── Outputs ──
    out_xyz: *mut f64,
    out_residuals: *mut f64,
    out_forces: *mut f64,
    out_lengths: *mut f64,
) -> i32 {
    let (Some(coord_len), Some(edge_len)) =
        (num_vertices.checked_mul(3), num_edges.checked_mul(2))
    else {
        set_last_error(format!(
            "invalid input: buffer length overflows for {num_vertices} vertices and {num_edges} edges"
        ));
        return FDM_INVALID_INPUT;
    };

    let inputs = (
        input_slice(vertex_xyz, coord_len),
        input_slice(fixed_vertices, num_fixed),
        input_slice(edges, edge_len),
        input_slice(force_densities, num_edges),
    );
    let (Some(xyz), Some(fixed), Some(edge_pairs), Some(q)) = inputs else {
        set_last_error("null input pointer".into());
        return FDM_NULL_POINTER;
    };
    let load_values = if loads.is_null() {
        None
    } else {
        input_slice(loads, coord_len)
    };

    let outputs = (
        output_slice(out_xyz, coord_len),
        output_slice(out_residuals, coord_len),
        output_slice(out_forces, num_edges),
        output_slice(out_lengths, num_edges),
    );
    let (Some(xyz_out), Some(r_out), Some(f_out), Some(l_out)) = outputs else {
        set_last_error("null output pointer".into());
        return FDM_NULL_POINTER;
    };

    let result = build_network(xyz, fixed, edge_pairs, q, load_values)
        .and_then(|network| fdm::solve(&network, &SolverOptions::default()));

    match result {
        Ok(result) => {
            xyz_out.copy_from_slice(&matrix_x3_to_flat(&result.vertices));
            r_out.copy_from_slice(&matrix_x3_to_flat(&result.residuals));
            f_out.copy_from_slice(&result.forces);
            l_out.copy_from_slice(&result.lengths);
            set_last_error(String::new());
            FDM_OK
        }
        Err(e) => {
            let code = error_code(&e);
            set_last_error(e.to_string());
            code
        }
    }
}

fn build_network(
    xyz: &[f64],
    fixed: &[usize],
    edges: &[usize],
    q: &[f64],
    loads: Option<&[f64]>,
) -> Result<Network, FdmError> {
    let mut network = Network::new(
        matrix_x3_from_flat(xyz)?,
        fixed.to_vec(),
        edges_from_flat(edges)?,
        q.to_vec(),
    );
    if let Some(p) = loads {
        network = network.with_loads(matrix_x3_from_flat(p)?);
    }
    Ok(network)
}

// ─────────────────────────────────────────────────────────────
//  Error reporting
// ─────────────────────────────────────────────────────────────

/// Copy the last error message (UTF-8, not NUL-terminated) into `buf`.
///
/// Returns the number of bytes written, `0` when there is no error and
/// `-1` if `buf` is null.
///
/// # Safety
/// `buf` must be valid for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn fdm_last_error(buf: *mut u8, len: usize) -> i32 {
    if buf.is_null() {
        return FDM_NULL_POINTER;
    }
    LAST_ERROR.with(|e| {
        let msg = e.borrow();
        let n = msg.len().min(len).min(i32::MAX as usize);
        slice::from_raw_parts_mut(buf, n).copy_from_slice(&msg.as_bytes()[..n]);
        n as i32
    })
}
