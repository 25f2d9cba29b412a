//! Free / fixed split of the vertex index range.

use crate::types::InputError;

/// Disjoint, total split of `0..num_vertices` into free and fixed indices.
///
/// The free list is always strictly ascending; its order is the row order of
/// every free-vertex block downstream (`Ci` columns, solved coordinates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexPartition {
    num_vertices: usize,
    free: Vec<usize>,
    fixed: Vec<usize>,
}

impl VertexPartition {
    pub fn new(num_vertices: usize, fixed: &[usize]) -> Result<Self, InputError> {
        let free = free_vertices(num_vertices, fixed)?;
        Ok(Self {
            num_vertices,
            free,
            fixed: fixed.to_vec(),
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn free(&self) -> &[usize] {
        &self.free
    }

    pub fn fixed(&self) -> &[usize] {
        &self.fixed
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    pub fn num_fixed(&self) -> usize {
        self.fixed.len()
    }
}

/// Ascending set difference `0..num_vertices ∖ fixed`.
pub fn free_vertices(num_vertices: usize, fixed: &[usize]) -> Result<Vec<usize>, InputError> {
    check_fixed_vertices(num_vertices, fixed)?;

    let mut free = Vec::with_capacity(num_vertices - fixed.len());
    let mut supports = fixed.iter().peekable();
    for v in 0..num_vertices {
        if supports.next_if_eq(&&v).is_none() {
            free.push(v);
        }
    }
    Ok(free)
}

/// Fixed indices must be strictly ascending and below `num_vertices`.
pub fn check_fixed_vertices(num_vertices: usize, fixed: &[usize]) -> Result<(), InputError> {
    for (position, pair) in fixed.windows(2).enumerate() {
        if pair[0] == pair[1] {
            return Err(InputError::FixedDuplicate { vertex: pair[0] });
        }
        if pair[0] > pair[1] {
            return Err(InputError::FixedNotSorted {
                position: position + 1,
            });
        }
    }
    if let Some(&vertex) = fixed.iter().find(|&&v| v >= num_vertices) {
        return Err(InputError::FixedOutOfRange {
            vertex,
            vertex_count: num_vertices,
        });
    }
    Ok(())
}
