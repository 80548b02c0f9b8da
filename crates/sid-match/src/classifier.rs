use rayon::prelude::*;
use serde::Serialize;
use sid_core::cancel::CancelToken;
use sid_core::error::{SidError, SidResult};
use sid_core::frame::FeatureSequence;
use sid_core::store::{TemplateRef, TemplateStore};
use sid_dtw::{Aligner, AlignmentStrategy};

use crate::timing::StrategyTimings;

/// Résultat d'une identification.
///
/// `label == None` est la sentinelle « aucun match » (store vide, ou aucun
/// template atteignable) ; `distance` vaut alors `+∞`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    /// Identified speaker, `None` when nothing matched.
    pub label: Option<String>,
    /// Winning alignment cost.
    #[serde(serialize_with = "crate::report::serialize_distance")]
    pub distance: f64,
    /// Flat store index of the winning sequence.
    pub template_index: Option<usize>,
    /// Alignment time spent during the call.
    pub timings: StrategyTimings,
}

impl MatchResult {
    /// The "no match" sentinel.
    #[must_use]
    pub fn no_match() -> Self {
        Self {
            label: None,
            distance: f64::INFINITY,
            template_index: None,
            timings: StrategyTimings::default(),
        }
    }

    /// `true` when a label was identified.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.label.is_some()
    }

    /// Identified label or `"none"`.
    #[must_use]
    pub fn label_or_none(&self) -> &str {
        self.label.as_deref().unwrap_or("none")
    }
}

/// Partial arg-min over a slice of templates.
///
/// `merge` is associative and commutative: ties go to the smallest flat
/// index, which is the first-seen candidate of a sequential scan.
#[derive(Clone, Copy, Debug, Default)]
struct Scan {
    best: Option<(usize, f64)>,
    timings: StrategyTimings,
}

impl Scan {
    fn offer(&mut self, index: usize, distance: f64) {
        // +inf never beats the initial +inf bound
        if !distance.is_finite() {
            return;
        }
        match self.best {
            Some((_, d)) if distance >= d => {}
            _ => self.best = Some((index, distance)),
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.timings = self.timings.merged(other.timings);
        self.best = match (self.best, other.best) {
            (None, b) | (b, None) => b,
            (Some(a), Some(b)) => {
                if b.1 < a.1 || (b.1 == a.1 && b.0 < a.0) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
        };
        self
    }
}

/// Classifieur au plus proche template.
///
/// # Example
/// ```
/// use sid_core::frame::FeatureSequence;
/// use sid_core::store::TemplateStore;
/// use sid_dtw::AlignmentStrategy;
/// use sid_match::classifier::Classifier;
///
/// let mut store = TemplateStore::new();
/// let alice = FeatureSequence::from_first_coefficients(&[0.0, 1.0, 2.0]).unwrap();
/// let bob = FeatureSequence::from_first_coefficients(&[5.0, 6.0, 7.0]).unwrap();
/// store.insert("alice", vec![alice.clone()]).unwrap();
/// store.insert("bob", vec![bob]).unwrap();
///
/// let classifier = Classifier::new(AlignmentStrategy::Exact);
/// let result = classifier.identify(&alice, &store).unwrap();
/// assert_eq!(result.label.as_deref(), Some("alice"));
/// assert_eq!(result.distance, 0.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    strategy: AlignmentStrategy,
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl Classifier {
    /// Sequential classifier for `strategy`.
    #[must_use]
    pub fn new(strategy: AlignmentStrategy) -> Self {
        Self {
            strategy,
            parallel: false,
            cancel: None,
        }
    }

    /// Reduce over templates on the rayon pool.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check `token` between templates.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Strategy used for every alignment.
    #[must_use]
    pub fn strategy(&self) -> AlignmentStrategy {
        self.strategy
    }

    /// Identify `probe` against every sequence of `store`.
    ///
    /// # Errors
    /// `EmptySequence` if the probe has no frame and the store is not empty,
    /// `Cancelled` if the token fires mid-scan.
    pub fn identify(
        &self,
        probe: &FeatureSequence,
        store: &TemplateStore,
    ) -> SidResult<MatchResult> {
        let mut aligner = Aligner::new();
        self.identify_with(&mut aligner, probe, store)
    }

    /// Same as [`Classifier::identify`], reusing the caller's scratch buffer
    /// on the sequential path.
    ///
    /// # Errors
    /// See [`Classifier::identify`].
    pub fn identify_with(
        &self,
        aligner: &mut Aligner,
        probe: &FeatureSequence,
        store: &TemplateStore,
    ) -> SidResult<MatchResult> {
        if store.is_empty() {
            return Ok(MatchResult::no_match());
        }
        if probe.is_empty() {
            return Err(SidError::empty_sequence("probe"));
        }

        let templates = store.flatten();
        let scan = if self.parallel {
            self.scan_parallel(probe, &templates)?
        } else {
            self.scan_sequential(aligner, probe, &templates)?
        };

        let result = match scan.best {
            Some((index, distance)) => MatchResult {
                label: Some(templates[index].label.to_string()),
                distance,
                template_index: Some(index),
                timings: scan.timings,
            },
            None => MatchResult {
                timings: scan.timings,
                ..MatchResult::no_match()
            },
        };
        log::trace!(
            "identify [{}]: {} (distance {}) over {} templates",
            self.strategy,
            result.label_or_none(),
            result.distance,
            templates.len()
        );
        Ok(result)
    }

    fn check_cancel(&self) -> SidResult<()> {
        self.cancel.as_ref().map_or(Ok(()), CancelToken::check)
    }

    fn scan_sequential(
        &self,
        aligner: &mut Aligner,
        probe: &FeatureSequence,
        templates: &[TemplateRef<'_>],
    ) -> SidResult<Scan> {
        let kind = self.strategy.kind();
        let mut scan = Scan::default();
        for t in templates {
            self.check_cancel()?;
            let distance = scan
                .timings
                .measure(kind, || aligner.align(probe, t.sequence, self.strategy));
            scan.offer(t.index, distance);
        }
        Ok(scan)
    }

    fn scan_parallel(
        &self,
        probe: &FeatureSequence,
        templates: &[TemplateRef<'_>],
    ) -> SidResult<Scan> {
        let kind = self.strategy.kind();
        templates
            .par_iter()
            .map_init(Aligner::new, |aligner, t| -> SidResult<Scan> {
                self.check_cancel()?;
                let mut scan = Scan::default();
                let distance = scan
                    .timings
                    .measure(kind, || aligner.align(probe, t.sequence, self.strategy));
                scan.offer(t.index, distance);
                Ok(scan)
            })
            .try_reduce(Scan::default, |a, b| Ok(a.merge(b)))
    }
}

/// Identify `probe` against `store` with a sequential [`Classifier`].
///
/// # Errors
/// See [`Classifier::identify`].
///
/// # Example
/// ```
/// use sid_core::frame::FeatureSequence;
/// use sid_core::store::TemplateStore;
/// use sid_dtw::AlignmentStrategy;
/// use sid_match::identify;
///
/// let probe = FeatureSequence::from_first_coefficients(&[1.0]).unwrap();
/// let result = identify(&probe, &TemplateStore::new(), AlignmentStrategy::Exact).unwrap();
/// assert!(!result.is_match());
/// ```
pub fn identify(
    probe: &FeatureSequence,
    store: &TemplateStore,
    strategy: AlignmentStrategy,
) -> SidResult<MatchResult> {
    Classifier::new(strategy).identify(probe, store)
}
