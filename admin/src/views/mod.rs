//! Derived views computed from slice state
//!
//! Pure functions; safe to re-run on every state read.

pub mod chart;
pub mod table;

pub use chart::{ChartSegment, project_segments, project_segments_for, venue_label};
pub use table::{
    SortDirection, SortKind, SortState, TableFilter, TablePage, TableQuery, paginate, total_pages,
};
