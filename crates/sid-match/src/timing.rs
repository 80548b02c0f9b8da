use std::time::{Duration, Instant};

use serde::Serialize;
use sid_core::config::StrategyKind;

/// Temps d'alignement cumulé par stratégie. Diagnostic uniquement.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use sid_core::config::StrategyKind;
/// use sid_match::timing::StrategyTimings;
/// let mut t = StrategyTimings::default();
/// t.record(StrategyKind::Beam, Duration::from_millis(3));
/// t.record(StrategyKind::Beam, Duration::from_millis(2));
/// assert_eq!(t.get(StrategyKind::Beam), Duration::from_millis(5));
/// assert_eq!(t.alignments(), 2);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StrategyTimings {
    exact: Duration,
    banded: Duration,
    beam: Duration,
    alignments: u64,
}

impl StrategyTimings {
    /// Add one alignment's elapsed time.
    #[inline]
    pub fn record(&mut self, kind: StrategyKind, elapsed: Duration) {
        *self.slot_mut(kind) += elapsed;
        self.alignments += 1;
    }

    /// Time one alignment closure and record it.
    #[inline]
    pub fn measure<T>(&mut self, kind: StrategyKind, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(kind, start.elapsed());
        out
    }

    /// Cumulated time for `kind`.
    #[must_use]
    pub fn get(&self, kind: StrategyKind) -> Duration {
        match kind {
            StrategyKind::Exact => self.exact,
            StrategyKind::Banded => self.banded,
            StrategyKind::Beam => self.beam,
        }
    }

    /// Number of alignments recorded.
    #[must_use]
    pub fn alignments(&self) -> u64 {
        self.alignments
    }

    /// Sum over every strategy.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.exact + self.banded + self.beam
    }

    /// Fold `other` into `self`.
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        self.exact += other.exact;
        self.banded += other.banded;
        self.beam += other.beam;
        self.alignments += other.alignments;
        self
    }

    fn slot_mut(&mut self, kind: StrategyKind) -> &mut Duration {
        match kind {
            StrategyKind::Exact => &mut self.exact,
            StrategyKind::Banded => &mut self.banded,
            StrategyKind::Beam => &mut self.beam,
        }
    }
}
