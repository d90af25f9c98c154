//! Output formatting module
//!
//! Renders run results, phase plans and strategy listings.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
