//! Size measurements reported for each build and compression stage.

use serde::Serialize;
use std::fmt;

/// `(label, unique_term_count, non_positional_posting_count)` for one index value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub label: String,
    pub unique_terms: usize,
    pub non_positional_postings: usize,
}

/// A sequence of stats rows rendered as a fixed-width table.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    rows: Vec<IndexStats>,
}

impl StatsTable {
    pub fn new(rows: Vec<IndexStats>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: IndexStats) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[IndexStats] {
        &self.rows
    }
}

impl fmt::Display for StatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<28} | {:>15} | {:>23}",
            "Index", "Term dictionary", "Non-positional postings"
        )?;
        writeln!(f, "{}", "-".repeat(72))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<28} | {:>15} | {:>23}",
                row.label, row.unique_terms, row.non_positional_postings
            )?;
        }
        Ok(())
    }
}
