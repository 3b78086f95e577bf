/// Viewer filter settings
///
/// This struct stores the keyword/rank filter the user is editing.
/// It is transient: it lives only as long as the viewer window, and every
/// change is re-applied to the full record set.

use super::data::{ImageRecord, DEFAULT_RANK};
use crate::extract::keywords::split_list;
use std::collections::HashSet;

/// Lowest value of the minimum-rank slider
pub const MIN_RANK: u32 = 1;

/// Highest value of the minimum-rank slider
pub const MAX_RANK: u32 = 10;

/// All filter parameters for the image list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Raw text of the keyword box, comma-separated terms
    pub keywords: String,

    /// Substring matching instead of whole-keyword matching
    pub partial: bool,

    /// Records ranked below this are hidden (1 to 10)
    pub min_rank: u32,
}

impl Default for FilterState {
    /// Create a filter that lets everything through
    fn default() -> Self {
        Self {
            keywords: String::new(),
            partial: false,
            min_rank: DEFAULT_RANK,
        }
    }
}

/// The records that survived a filter pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Indices into the full record list, in original order
    pub indices: Vec<usize>,
    /// Matching records dropped because an earlier one had the same hash
    pub duplicates: usize,
}

impl FilterState {
    /// Create new default filter settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Individual terms typed in the keyword box
    pub fn terms(&self) -> Vec<&str> {
        split_list(&self.keywords).collect()
    }

    /// Set the minimum rank, kept inside the slider range
    pub fn set_min_rank(&mut self, rank: u32) {
        self.min_rank = rank.clamp(MIN_RANK, MAX_RANK);
    }

    /// Check if this filter hides nothing (all values at default)
    pub fn is_cleared(&self) -> bool {
        self.terms().is_empty() && self.min_rank <= DEFAULT_RANK
    }

    /// Reset all settings to default
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Run the filter over every record
    ///
    /// A linear scan: records failing the keyword or rank test are skipped,
    /// and of those passing, only the first with each hash is kept.
    pub fn apply(&self, records: &[ImageRecord]) -> FilterOutcome {
        let terms = self.terms();
        let mut seen = HashSet::new();
        let mut outcome = FilterOutcome::default();

        for (index, record) in records.iter().enumerate() {
            if !record.matches_keywords(&terms, self.partial) || !record.matches_rank(self.min_rank)
            {
                continue;
            }
            if seen.insert(record.hash.as_str()) {
                outcome.indices.push(index);
            } else {
                outcome.duplicates += 1;
            }
        }

        outcome
    }
}
