//! Confirmation matrix: proposal x member booleans.
//!
//! Rows are appended alongside proposals and never removed. Columns follow
//! the committee's creation order.

use serde::{Deserialize, Serialize};

/// Per-proposal, per-member approval flags. Default false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationMatrix {
    width: usize,
    rows: Vec<Vec<bool>>,
}

impl ConfirmationMatrix {
    /// Create an empty matrix with one column per committee member.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
        }
    }

    /// Rebuild from stored rows. Every row must have `width` columns.
    pub fn from_rows(width: usize, rows: Vec<Vec<bool>>) -> Option<Self> {
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self { width, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append an all-false row for a new proposal.
    pub fn push_row(&mut self) {
        self.rows.push(vec![false; self.width]);
    }

    /// Flag for (proposal, member column). Out-of-range reads are false.
    pub fn get(&self, row: usize, column: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(false)
    }

    /// Set a flag, returning the previous value.
    ///
    /// Callers index only rows and columns they have already validated.
    pub(crate) fn set(&mut self, row: usize, column: usize, value: bool) -> bool {
        std::mem::replace(&mut self.rows[row][column], value)
    }

    /// Recount the true entries in a row by scanning every member column.
    pub fn count(&self, row: usize) -> u32 {
        self.rows
            .get(row)
            .map(|r| r.iter().filter(|flag| **flag).count() as u32)
            .unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }
}
