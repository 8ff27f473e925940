//! Small shared helpers.

pub mod format;

pub use format::{format_count, format_date, format_optional, truncate_string};
