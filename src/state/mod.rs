/// Viewer state module
///
/// This module holds everything the viewer knows, independent of widgets:
/// - Image records and their matching rules (data.rs)
/// - Loading records from keyword CSV files (catalog.rs)
/// - Filter settings and the filter pass (filter.rs)
/// - The filtered list and the current position (library.rs)
/// - Zoom, pan and fit math for the main image (view.rs)

pub mod catalog;
pub mod data;
pub mod filter;
pub mod library;
pub mod view;
