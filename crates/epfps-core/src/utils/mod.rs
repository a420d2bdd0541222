//! Utility functions for formatting and comparison.

pub mod format;

pub use format::{cmp_ignore_case, format_age, truncate};
