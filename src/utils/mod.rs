//! Utility functions.

pub mod labels;

pub use labels::read_label_table;
