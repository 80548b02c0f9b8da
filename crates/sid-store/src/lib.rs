//! Text persistence for speakerid: sequence files, store directory layouts
//! and evaluation reports.

pub mod layout;
pub mod report_file;
pub mod sequence_file;

pub use layout::{enroll, export_store, load_batch_store, load_single_store, validate_label};
pub use report_file::{write_json_report, write_text_report};
pub use sequence_file::{format_sequence, parse_sequence, read_sequence, write_sequence};
