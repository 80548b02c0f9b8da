use std::time::Instant;

use rayon::prelude::*;
use sid_core::cancel::CancelToken;
use sid_core::config::{FailurePolicy, MatchConfig};
use sid_core::error::{SidError, SidResult};
use sid_core::store::{TemplateRef, TemplateStore};
use sid_dtw::{Aligner, AlignmentStrategy};

use crate::classifier::{Classifier, MatchResult};
use crate::report::{EvaluationReport, SampleFailure, SampleOutcome};
use crate::timing::StrategyTimings;

/// Options d'exécution d'une évaluation par lots.
#[derive(Clone, Debug)]
pub struct EvaluationOptions {
    /// Classify test samples on the rayon pool.
    pub parallel: bool,
    /// Also reduce over training templates in parallel for each sample.
    pub parallel_templates: bool,
    /// What to do when one sample fails.
    pub failure_policy: FailurePolicy,
    /// Checked before each sample and between templates.
    pub cancel: Option<CancelToken>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_templates: false,
            failure_policy: FailurePolicy::default(),
            cancel: None,
        }
    }
}

impl EvaluationOptions {
    /// Options taken from the `[evaluation]` and `[matching]` sections.
    #[must_use]
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            parallel: config.parallel_samples,
            parallel_templates: config.parallel_templates,
            failure_policy: config.failure_policy,
            cancel: None,
        }
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Classify every sample of `test` against `train` and score the run.
///
/// Outcomes are reported in test store order whatever the parallelism.
/// A test store with no sample yields a report whose accuracy is `None`.
///
/// # Errors
/// `Cancelled` when the token fires. Under `AbortOnFirstError`, the error of
/// the first failing sample in store order.
///
/// # Example
/// ```
/// use sid_core::frame::FeatureSequence;
/// use sid_core::store::TemplateStore;
/// use sid_dtw::AlignmentStrategy;
/// use sid_match::{EvaluationOptions, evaluate};
///
/// let mut train = TemplateStore::new();
/// train.push_sample("alice", FeatureSequence::from_first_coefficients(&[0.0, 1.0, 2.0]).unwrap());
/// train.push_sample("bob", FeatureSequence::from_first_coefficients(&[8.0, 9.0]).unwrap());
/// let mut test = TemplateStore::new();
/// test.push_sample("alice", FeatureSequence::from_first_coefficients(&[0.0, 1.0, 3.0]).unwrap());
///
/// let report = evaluate(&test, &train, AlignmentStrategy::Exact, &EvaluationOptions::default()).unwrap();
/// assert_eq!(report.correct_matches, 1);
/// assert_eq!(report.accuracy, Some(100.0));
/// assert_eq!(report.outcomes[0].distance, 1.0);
/// ```
pub fn evaluate(
    test: &TemplateStore,
    train: &TemplateStore,
    strategy: AlignmentStrategy,
    options: &EvaluationOptions,
) -> SidResult<EvaluationReport> {
    let start = Instant::now();
    let samples = test.flatten();
    log::info!(
        "Evaluating {} test samples against {} templates ({} speakers) with {strategy}",
        samples.len(),
        train.sample_count(),
        train.len()
    );
    for label in test.labels().filter(|l| !train.contains(l)) {
        log::warn!("Test speaker '{label}' has no training template, its samples cannot match");
    }

    let mut classifier = Classifier::new(strategy).parallel(options.parallel_templates);
    if let Some(token) = &options.cancel {
        classifier = classifier.with_cancel(token.clone());
    }

    let classify = |aligner: &mut Aligner, sample: &TemplateRef<'_>| -> SidResult<MatchResult> {
        if let Some(token) = &options.cancel {
            token.check()?;
        }
        classifier.identify_with(aligner, sample.sequence, train)
    };

    let results: Vec<SidResult<MatchResult>> = if options.parallel {
        samples.par_iter().map_init(Aligner::new, classify).collect()
    } else {
        let mut aligner = Aligner::new();
        samples.iter().map(|s| classify(&mut aligner, s)).collect()
    };

    if results.iter().any(|r| matches!(r, Err(SidError::Cancelled))) {
        log::warn!("Evaluation cancelled");
        return Err(SidError::Cancelled);
    }

    let mut outcomes = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    let mut timings = StrategyTimings::default();
    for (sample, result) in samples.iter().zip(results) {
        match result {
            Ok(found) => {
                timings = timings.merged(found.timings);
                let outcome = SampleOutcome {
                    index: sample.index,
                    expected: sample.label.to_string(),
                    identified: found.label,
                    distance: found.distance,
                };
                log::debug!("{outcome}");
                outcomes.push(outcome);
            }
            Err(err) => match options.failure_policy {
                FailurePolicy::AbortOnFirstError => {
                    log::error!("Sample {} ({}) failed: {err}", sample.index, sample.label);
                    return Err(err);
                }
                FailurePolicy::SkipAndRecord => {
                    log::warn!("Skipping sample {} ({}): {err}", sample.index, sample.label);
                    failures.push(SampleFailure {
                        index: sample.index,
                        expected: sample.label.to_string(),
                        error: err.to_string(),
                    });
                }
            },
        }
    }

    let report = EvaluationReport::from_outcomes(
        strategy.to_string(),
        outcomes,
        failures,
        timings,
        start.elapsed(),
    );
    match report.accuracy {
        Some(acc) => log::info!(
            "{}/{} correct ({acc:.2}%) in {:.3} s",
            report.correct_matches,
            report.total_samples,
            report.elapsed.as_secs_f64()
        ),
        None => log::info!("No test sample classified, accuracy undefined"),
    }
    Ok(report)
}
