/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the CSV loader and the UI layer.
use std::path::{Path, PathBuf};

/// Default rank for rows that carry no `RANK n` token
pub const DEFAULT_RANK: u32 = 1;

/// Represents a single keyworded image loaded from a CSV row
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// Path exactly as written in the first CSV field
    pub filename: String,
    /// Keywords in row order, rank and hash tokens removed
    pub keywords: Vec<String>,
    /// Model-reported quality score, nominally 1-10
    pub rank: u32,
    /// Lowercase SHA-256 hex, used to spot duplicate files
    pub hash: String,
    /// Absolute path of the image if it was found when the CSV was loaded
    pub full_path: Option<PathBuf>,
}

impl ImageRecord {
    /// Check the record against keyword filter terms
    ///
    /// Passes when there are no terms, or when at least one term matches one
    /// keyword ignoring case: as a substring in partial mode, or as the whole
    /// keyword otherwise.
    pub fn matches_keywords<S: AsRef<str>>(&self, terms: &[S], partial: bool) -> bool {
        if terms.is_empty() {
            return true;
        }

        let lowered: Vec<String> = self.keywords.iter().map(|kw| kw.to_lowercase()).collect();
        terms.iter().any(|term| {
            let term = term.as_ref().to_lowercase();
            if partial {
                lowered.iter().any(|kw| kw.contains(&term))
            } else {
                lowered.iter().any(|kw| *kw == term)
            }
        })
    }

    /// Check the record against a minimum rank
    pub fn matches_rank(&self, min_rank: u32) -> bool {
        self.rank >= min_rank
    }

    /// Keywords joined for display and copying
    pub fn keywords_text(&self) -> String {
        self.keywords.join(", ")
    }

    /// Locate the image on disk
    ///
    /// Prefers the path found at load time, then the filename as given, then
    /// the filename relative to the working directory.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(full) = &self.full_path {
            if full.exists() {
                return Some(full.clone());
            }
        }

        let as_given = Path::new(&self.filename);
        if as_given.exists() {
            return Some(as_given.to_path_buf());
        }

        std::env::current_dir()
            .ok()
            .map(|cwd| cwd.join(&self.filename))
            .filter(|candidate| candidate.exists())
    }
}
