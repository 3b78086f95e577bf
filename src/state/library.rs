use super::data::ImageRecord;
use super::filter::{FilterOutcome, FilterState};

/// The Library holds every record loaded from the CSV files.
/// It keeps the filtered view (indices into `records`) and the current
/// position within that view.
pub struct Library {
    records: Vec<ImageRecord>,
    visible: Vec<usize>,
    duplicates: usize,
    current: usize,
}

impl Library {
    /// Create a new Library showing every record, duplicates collapsed.
    pub fn new(records: Vec<ImageRecord>) -> Self {
        let mut library = Library {
            records,
            visible: Vec::new(),
            duplicates: 0,
            current: 0,
        };
        library.apply_filter(&FilterState::new());
        library
    }

    /// Recompute the filtered view and jump back to the first image
    pub fn apply_filter(&mut self, filter: &FilterState) {
        let FilterOutcome {
            indices,
            duplicates,
        } = filter.apply(&self.records);

        self.visible = indices;
        self.duplicates = duplicates;
        self.current = 0;
    }

    /// Number of records loaded, including filtered-out ones
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Number of records passing the current filter
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Duplicates hidden by the last filter pass
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Position in the filtered view (0-based)
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The record currently on screen, if anything passes the filter
    pub fn current_record(&self) -> Option<&ImageRecord> {
        self.visible
            .get(self.current)
            .and_then(|&index| self.records.get(index))
    }

    /// Iterate over the filtered records in display order
    pub fn visible_records(&self) -> impl Iterator<Item = (usize, &ImageRecord)> + '_ {
        self.visible
            .iter()
            .enumerate()
            .map(move |(position, &index)| (position, &self.records[index]))
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.visible.len()
    }

    /// Step back one image. Returns false at the start of the list.
    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one image. Returns false at the end of the list.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Jump to a position in the filtered view. Out-of-range positions are ignored.
    pub fn goto(&mut self, position: usize) -> bool {
        if position < self.visible.len() && position != self.current {
            self.current = position;
            true
        } else {
            false
        }
    }

    /// "i / n" label for the navigation panel, "0 / 0" when empty
    pub fn position_label(&self) -> String {
        if self.visible.is_empty() {
            "0 / 0".to_string()
        } else {
            format!("{} / {}", self.current + 1, self.visible.len())
        }
    }
}

// Implement Debug without dumping every record
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("total", &self.records.len())
            .field("visible", &self.visible.len())
            .field("duplicates", &self.duplicates)
            .field("current", &self.current)
            .finish()
    }
}
