//! Transformation module.
//!
//! The pipeline stages that operate on the in-memory table:
//! - Dates: description date extraction/reinsertion and due-date shifting
//! - Text: column replacements and conditional appendages
//! - Sort: multi-key stable sort
//! - Pipeline: fixed stage order and file-to-file runs

pub mod dates;
pub mod pipeline;
pub mod sort;
pub mod text;

pub use dates::{
    extract_description_dates, local_midnight_timestamp, reinsert_description_dates,
    shift_date, shift_due_dates,
};
pub use pipeline::*;
pub use sort::{sort_by_key, sort_rows};
pub use text::{append_matching, apply_appendages, apply_replacements, replace_all};
