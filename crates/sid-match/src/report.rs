use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::timing::StrategyTimings;

/// Outcome of one classified test sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleOutcome {
    /// Flat index of the sample in the test store.
    pub index: usize,
    /// Label the sample was filed under.
    pub expected: String,
    /// Label the classifier chose, `None` for no match.
    pub identified: Option<String>,
    /// Winning distance (`+∞` for no match).
    #[serde(serialize_with = "serialize_distance")]
    pub distance: f64,
}

/// Distances non finies écrites en chaîne (`"inf"`) : en JSON, `null` se
/// confondrait avec un champ absent.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn serialize_distance<S: Serializer>(distance: &f64, s: S) -> Result<S::Ok, S::Error> {
    if distance.is_finite() {
        s.serialize_f64(*distance)
    } else {
        s.collect_str(distance)
    }
}

impl SampleOutcome {
    /// `true` when the identified label equals the expected one.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.identified.as_deref() == Some(self.expected.as_str())
    }
}

/// Ligne de rapport : `Expected: <label>, Identified: <label>, Distance: <number>`.
///
/// # Example
/// ```
/// use sid_match::report::SampleOutcome;
/// let outcome = SampleOutcome {
///     index: 0,
///     expected: "alice".into(),
///     identified: None,
///     distance: f64::INFINITY,
/// };
/// assert_eq!(outcome.to_string(), "Expected: alice, Identified: none, Distance: inf");
/// ```
impl fmt::Display for SampleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected: {}, Identified: {}, Distance: {}",
            self.expected,
            self.identified.as_deref().unwrap_or("none"),
            self.distance
        )
    }
}

/// A sample that could not be classified (skip policy).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SampleFailure {
    /// Flat index of the sample in the test store.
    pub index: usize,
    /// Label the sample was filed under.
    pub expected: String,
    /// Rendered error.
    pub error: String,
}

/// Rapport d'évaluation par lots.
///
/// `accuracy` vaut `None` quand aucun échantillon n'a été classé : la
/// division n'est jamais effectuée.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Strategy description, e.g. `banded(w=20)`.
    pub strategy: String,
    /// Samples that produced an outcome.
    pub total_samples: usize,
    /// Outcomes whose identified label equals the expected one.
    pub correct_matches: usize,
    /// `correct / total × 100`, `None` when `total == 0`.
    pub accuracy: Option<f64>,
    /// Per-sample outcomes in test store order.
    pub outcomes: Vec<SampleOutcome>,
    /// Samples skipped under the skip-and-record policy.
    pub failures: Vec<SampleFailure>,
    /// Alignment time summed over every classification.
    pub timings: StrategyTimings,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

impl EvaluationReport {
    /// Build a report from ordered outcomes, deriving the counters.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use sid_match::report::EvaluationReport;
    /// use sid_match::timing::StrategyTimings;
    /// let report = EvaluationReport::from_outcomes(
    ///     "exact".into(), vec![], vec![], StrategyTimings::default(), Duration::ZERO,
    /// );
    /// assert_eq!(report.total_samples, 0);
    /// assert!(report.accuracy.is_none());
    /// ```
    #[must_use]
    pub fn from_outcomes(
        strategy: String,
        outcomes: Vec<SampleOutcome>,
        failures: Vec<SampleFailure>,
        timings: StrategyTimings,
        elapsed: Duration,
    ) -> Self {
        let total_samples = outcomes.len();
        let correct_matches = outcomes.iter().filter(|o| o.is_correct()).count();
        let accuracy = (total_samples > 0)
            .then(|| correct_matches as f64 / total_samples as f64 * 100.0);
        Self {
            strategy,
            total_samples,
            correct_matches,
            accuracy,
            outcomes,
            failures,
            timings,
            elapsed,
        }
    }

    /// Report lines, one per outcome.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.outcomes.iter().map(ToString::to_string)
    }

    /// Multi-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let accuracy = self
            .accuracy
            .map_or_else(|| "undefined".to_string(), |a| format!("{a:.2}%"));
        let mut out = format!(
            "Strategy: {}\nTotal time: {:.3} s\nTotal test samples: {}\nCorrect matches: {}\nAccuracy: {}",
            self.strategy,
            self.elapsed.as_secs_f64(),
            self.total_samples,
            self.correct_matches,
            accuracy
        );
        out.push_str(&format!(
            "\nAlignment time: {:.3} s over {} alignments",
            self.timings.total().as_secs_f64(),
            self.timings.alignments()
        ));
        if !self.failures.is_empty() {
            out.push_str(&format!("\nSkipped samples: {}", self.failures.len()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, expected: &str, identified: Option<&str>, distance: f64) -> SampleOutcome {
        SampleOutcome {
            index,
            expected: expected.into(),
            identified: identified.map(Into::into),
            distance,
        }
    }

    #[test]
    fn accuracy_from_counts() {
        let report = EvaluationReport::from_outcomes(
            "exact".into(),
            vec![
                outcome(0, "a", Some("a"), 1.0),
                outcome(1, "a", Some("b"), 2.0),
                outcome(2, "b", Some("b"), 0.5),
                outcome(3, "b", None, f64::INFINITY),
            ],
            vec![],
            StrategyTimings::default(),
            Duration::from_millis(10),
        );
        assert_eq!(report.total_samples, 4);
        assert_eq!(report.correct_matches, 2);
        assert_eq!(report.accuracy, Some(50.0));
        assert!(report.summary().contains("Accuracy: 50.00%"));
    }

    #[test]
    fn zero_samples_leave_accuracy_undefined() {
        let report = EvaluationReport::from_outcomes(
            "beam(w=4)".into(),
            vec![],
            vec![SampleFailure {
                index: 0,
                expected: "a".into(),
                error: "boom".into(),
            }],
            StrategyTimings::default(),
            Duration::ZERO,
        );
        assert!(report.accuracy.is_none());
        let summary = report.summary();
        assert!(summary.contains("Accuracy: undefined"), "{summary}");
        assert!(summary.contains("Skipped samples: 1"), "{summary}");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["accuracy"].is_null());
        assert_eq!(json["failures"][0]["error"], "boom");
    }

    #[test]
    fn report_line_format() {
        let line = outcome(0, "alice", Some("bob"), 12.5).to_string();
        assert_eq!(line, "Expected: alice, Identified: bob, Distance: 12.5");
    }

    #[test]
    fn json_keeps_no_match_distance() {
        let matched = serde_json::to_value(outcome(0, "a", Some("a"), 2.5)).unwrap();
        assert_eq!(matched["distance"], 2.5);
        let unmatched = serde_json::to_value(outcome(1, "a", None, f64::INFINITY)).unwrap();
        assert_eq!(unmatched["distance"], "inf");
        assert!(unmatched["identified"].is_null());
    }
}
