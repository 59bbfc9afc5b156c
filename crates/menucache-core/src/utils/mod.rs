//! Utility functions for string formatting and name collation.

pub mod format;
pub mod text;

// Re-export commonly used functions at module level
pub use format::{format_age, single_line, truncate};
pub use text::{cmp_names, contains_ignore_case, CollationKey};
