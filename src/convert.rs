//! Conversions between plain row data and the solver's `N × 3` matrices.
//!
//! Only one numeric layout exists in this crate: `f64` rows of width 3,
//! row-major when flattened.

use crate::types::InputError;
use ndarray::Array2;

pub fn matrix_x3_from_rows(rows: &[[f64; 3]]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), 3), |(i, d)| rows[i][d])
}

/// Row-major flat buffer → n × 3 matrix.
pub fn matrix_x3_from_flat(data: &[f64]) -> Result<Array2<f64>, InputError> {
    if data.len() % 3 != 0 {
        return Err(InputError::ShapeMismatch {
            what: "flat coordinate buffer length (multiple of 3)",
            expected: data.len() - data.len() % 3,
            found: data.len(),
        });
    }
    Ok(Array2::from_shape_fn((data.len() / 3, 3), |(i, d)| data[i * 3 + d]))
}

pub fn matrix_x3_to_rows(m: &Array2<f64>) -> Vec<[f64; 3]> {
    m.rows().into_iter().map(|r| [r[0], r[1], r[2]]).collect()
}

/// n × 3 matrix → row-major flat buffer.
pub fn matrix_x3_to_flat(m: &Array2<f64>) -> Vec<f64> {
    m.iter().copied().collect()
}

/// Flat `[s0, e0, s1, e1, …]` → edge pairs.
pub fn edges_from_flat(data: &[usize]) -> Result<Vec<[usize; 2]>, InputError> {
    if data.len() % 2 != 0 {
        return Err(InputError::ShapeMismatch {
            what: "flat edge buffer length (multiple of 2)",
            expected: data.len() - 1,
            found: data.len(),
        });
    }
    Ok(data.chunks_exact(2).map(|e| [e[0], e[1]]).collect())
}
