use std::fmt;
use std::num::NonZeroUsize;

use sid_core::config::StrategyKind;
use sid_core::error::{SidError, SidResult};

/// Une stratégie d'alignement : même récurrence, fenêtre de colonnes différente.
///
/// Les largeurs sont validées à la construction ([`AlignmentStrategy::from_params`]),
/// le moteur n'a donc jamais à traiter une largeur absente ou nulle.
///
/// # Example
/// ```
/// use sid_core::config::StrategyKind;
/// use sid_dtw::strategy::AlignmentStrategy;
/// let banded = AlignmentStrategy::from_params(StrategyKind::Banded, Some(20)).unwrap();
/// assert_eq!(banded.width(), Some(20));
/// assert!(AlignmentStrategy::from_params(StrategyKind::Beam, None).is_err());
/// assert!(AlignmentStrategy::from_params(StrategyKind::Banded, Some(0)).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlignmentStrategy {
    /// Every column of every row.
    #[default]
    Exact,
    /// Sakoe-Chiba band widened to at least twice the length gap.
    Banded {
        /// Requested band width.
        width: NonZeroUsize,
    },
    /// Band of half-width `max(width / 2, |N−M|)`.
    ///
    /// Historically called "beam search" but it keeps no frontier of best
    /// candidates: it is a second, independently parameterized band.
    Beam {
        /// Requested beam width.
        width: NonZeroUsize,
    },
}

impl AlignmentStrategy {
    /// Build a strategy from caller-facing parameters.
    ///
    /// `width` is ignored for `Exact`.
    ///
    /// # Errors
    /// Returns `MissingPruningParameter` when a banded or beam strategy is
    /// requested without a strictly positive width.
    pub fn from_params(kind: StrategyKind, width: Option<i64>) -> SidResult<Self> {
        let require_width = || {
            width
                .and_then(|w| usize::try_from(w).ok())
                .and_then(NonZeroUsize::new)
                .ok_or(SidError::MissingPruningParameter {
                    strategy: kind.name(),
                    width,
                })
        };
        match kind {
            StrategyKind::Exact => Ok(Self::Exact),
            StrategyKind::Banded => Ok(Self::Banded {
                width: require_width()?,
            }),
            StrategyKind::Beam => Ok(Self::Beam {
                width: require_width()?,
            }),
        }
    }

    /// Selector this strategy was built from.
    #[must_use]
    pub fn kind(self) -> StrategyKind {
        match self {
            Self::Exact => StrategyKind::Exact,
            Self::Banded { .. } => StrategyKind::Banded,
            Self::Beam { .. } => StrategyKind::Beam,
        }
    }

    /// Requested width, `None` for `Exact`.
    #[must_use]
    pub fn width(self) -> Option<usize> {
        match self {
            Self::Exact => None,
            Self::Banded { width } | Self::Beam { width } => Some(width.get()),
        }
    }

    /// Column window for an `n × m` alignment.
    #[must_use]
    pub fn window(self, n: usize, m: usize) -> ColumnWindow {
        let gap = n.abs_diff(m);
        let half = match self {
            Self::Exact => None,
            Self::Banded { width } => Some(width.get().max(2 * gap) / 2),
            Self::Beam { width } => Some((width.get() / 2).max(gap)),
        };
        ColumnWindow { half, m }
    }
}

impl fmt::Display for AlignmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.width() {
            Some(w) => write!(f, "{}(w={w})", self.kind()),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Inclusive range of columns visited in each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnWindow {
    half: Option<usize>,
    m: usize,
}

impl ColumnWindow {
    /// Effective half-width, `None` when the whole row is visited.
    #[must_use]
    pub fn half_width(&self) -> Option<usize> {
        self.half
    }

    /// Columns `[lo, hi]` (1-based) of row `i`.
    #[inline(always)]
    #[must_use]
    pub fn columns(&self, i: usize) -> (usize, usize) {
        match self.half {
            None => (1, self.m),
            Some(h) => (i.saturating_sub(h).max(1), (i + h).min(self.m)),
        }
    }
}
