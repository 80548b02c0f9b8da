// Dynamic time warping engine for speakerid: local distance, alignment
// strategies and the two-row cost buffer.

pub mod distance;
pub mod engine;
pub mod strategy;

pub use distance::local_cost;
pub use engine::{Aligner, align};
pub use strategy::{AlignmentStrategy, ColumnWindow};
