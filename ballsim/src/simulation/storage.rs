//! Grow-only storage shared by parallel per-body columns
//!
//! Every column of a batch is grown together to the same length, rounded up
//! to a multiple of [`LANES`]. Growth happens in two passes: all columns
//! reserve first and only then change length, so a failed reservation leaves
//! every column exactly as it was. Columns never shrink and keep their
//! contents.

use std::collections::TryReserveError;

use super::error::{SimError, SimResult};

/// Vector width the per-body columns are padded to.
pub const LANES: usize = 4;

/// Round `len` up to a whole number of lanes.
pub fn aligned_len(len: usize) -> usize {
    len.div_ceil(LANES) * LANES
}

/// A column that can take part in a batch growth.
pub trait Column {
    fn len(&self) -> usize;
    fn try_reserve_len(&mut self, len: usize) -> Result<(), TryReserveError>;
    fn extend_to(&mut self, len: usize);
}

impl<T: Clone + Default> Column for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn try_reserve_len(&mut self, len: usize) -> Result<(), TryReserveError> {
        let current = Vec::len(self);
        if len > current {
            self.try_reserve_exact(len - current)?;
        }
        Ok(())
    }

    fn extend_to(&mut self, len: usize) {
        if len > Vec::len(self) {
            self.resize(len, T::default());
        }
    }
}

/// Grow all `columns` to hold at least `len` elements.
///
/// Returns the common padded length. Columns already long enough are left
/// alone; the batch never shrinks.
pub fn grow_columns(columns: &mut [&mut dyn Column], len: usize) -> SimResult<usize> {
    let current = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    let target = aligned_len(len).max(current);

    for column in columns.iter_mut() {
        column
            .try_reserve_len(target)
            .map_err(|source| SimError::Allocation { requested: target, source })?;
    }
    for column in columns.iter_mut() {
        column.extend_to(target);
    }
    Ok(target)
}
