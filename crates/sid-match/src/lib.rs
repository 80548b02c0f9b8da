/// Nearest-template classification and batch evaluation for speakerid.
///
/// Parallelism is data-parallel over rayon: per-worker `Aligner` scratch
/// buffers, results merged in store order.

pub mod classifier;
pub mod evaluator;
pub mod report;
pub mod timing;

pub use classifier::{Classifier, MatchResult, identify};
pub use evaluator::{EvaluationOptions, evaluate};
pub use report::{EvaluationReport, SampleFailure, SampleOutcome};
pub use timing::StrategyTimings;
