use sid_core::frame::FeatureSequence;

use crate::distance::local_cost;
use crate::strategy::AlignmentStrategy;

/// Moteur DTW à deux lignes, réutilisable d'un appel à l'autre.
///
/// Le tampon `2 × (M+1)` est indexé par la parité de `i` et réinitialisé à
/// `+∞` en entier au début de chaque ligne : une cellule hors fenêtre ne peut
/// jamais hériter de la valeur calculée deux lignes plus tôt.
///
/// Récurrence (asymétrique : un frame de `b` peut être sauté, jamais un frame de `a`) :
///
/// ```text
/// cost[0][0] = 0, cost[0][j] = +inf
/// cost[i][j] = d(a[i], b[j]) + min(cost[i-1][j], cost[i-1][j-1], cost[i-1][j-2])
/// ```
///
/// # Example
/// ```
/// use sid_core::frame::FeatureSequence;
/// use sid_dtw::engine::Aligner;
/// use sid_dtw::strategy::AlignmentStrategy;
///
/// let a = FeatureSequence::from_first_coefficients(&[0.0, 1.0, 2.0]).unwrap();
/// let b = FeatureSequence::from_first_coefficients(&[0.0, 1.0, 3.0]).unwrap();
/// let mut aligner = Aligner::new();
/// let cost = aligner.align(&a, &b, AlignmentStrategy::Exact);
/// assert!((cost - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Default)]
pub struct Aligner {
    rows: Vec<f64>,
    cells_visited: u64,
}

impl Aligner {
    /// Create an aligner with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aligner whose buffer already fits templates of `max_len` frames.
    #[must_use]
    pub fn with_capacity(max_len: usize) -> Self {
        Self {
            rows: Vec::with_capacity(2 * (max_len + 1)),
            cells_visited: 0,
        }
    }

    /// Number of `(i, j)` cells computed by the last call to [`Aligner::align`].
    #[must_use]
    pub fn cells_visited(&self) -> u64 {
        self.cells_visited
    }

    /// Global alignment cost of `a` against `b`, `+∞` if either is empty.
    #[must_use]
    pub fn align(
        &mut self,
        a: &FeatureSequence,
        b: &FeatureSequence,
        strategy: AlignmentStrategy,
    ) -> f64 {
        self.cells_visited = 0;
        let n = a.len();
        let m = b.len();
        if n == 0 || m == 0 {
            return f64::INFINITY;
        }

        let a = a.frames();
        let b = b.frames();
        let window = strategy.window(n, m);
        let stride = m + 1;

        self.rows.clear();
        self.rows.resize(2 * stride, f64::INFINITY);
        self.rows[0] = 0.0;

        let mut visited = 0u64;
        for i in 1..=n {
            let (row0, row1) = self.rows.split_at_mut(stride);
            let (prev, curr) = if i % 2 == 0 {
                (&*row1, row0)
            } else {
                (&*row0, row1)
            };
            curr.fill(f64::INFINITY);

            let frame_a = &a[i - 1];
            let (lo, hi) = window.columns(i);
            for j in lo..=hi {
                let stretch = prev[j];
                let exact = prev[j - 1];
                let shrink = if j >= 2 { prev[j - 2] } else { f64::INFINITY };
                let best = stretch.min(exact).min(shrink);
                // cost + inf stays inf, skip the distance
                if best.is_finite() {
                    curr[j] = local_cost(frame_a, &b[j - 1]) + best;
                }
            }
            visited += (hi + 1).saturating_sub(lo) as u64;
        }
        self.cells_visited = visited;

        self.rows[(n % 2) * stride + m]
    }
}

/// One-shot alignment with a fresh scratch buffer.
///
/// Prefer [`Aligner`] inside loops.
///
/// # Example
/// ```
/// use sid_core::frame::FeatureSequence;
/// use sid_dtw::{align, AlignmentStrategy};
/// let a = FeatureSequence::from_first_coefficients(&[1.0, 2.0]).unwrap();
/// assert_eq!(align(&a, &a, AlignmentStrategy::Exact), 0.0);
/// assert!(align(&a, &FeatureSequence::empty(), AlignmentStrategy::Exact).is_infinite());
/// ```
#[must_use]
pub fn align(a: &FeatureSequence, b: &FeatureSequence, strategy: AlignmentStrategy) -> f64 {
    Aligner::with_capacity(b.len()).align(a, b, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sid_core::frame::{FRAME_DIM, FeatureFrame};
    use std::num::NonZeroUsize;

    fn seq(values: &[f64]) -> FeatureSequence {
        FeatureSequence::from_first_coefficients(values).unwrap()
    }

    fn banded(w: usize) -> AlignmentStrategy {
        AlignmentStrategy::Banded {
            width: NonZeroUsize::new(w).unwrap(),
        }
    }

    fn beam(w: usize) -> AlignmentStrategy {
        AlignmentStrategy::Beam {
            width: NonZeroUsize::new(w).unwrap(),
        }
    }

    /// Full-matrix reference without row reuse. Cells outside the strategy's
    /// window stay at `+inf`.
    fn reference(a: &FeatureSequence, b: &FeatureSequence, strategy: AlignmentStrategy) -> f64 {
        let (n, m) = (a.len(), b.len());
        if n == 0 || m == 0 {
            return f64::INFINITY;
        }
        let window = strategy.window(n, m);
        let mut cost = vec![vec![f64::INFINITY; m + 1]; n + 1];
        cost[0][0] = 0.0;
        for i in 1..=n {
            let (lo, hi) = window.columns(i);
            for j in lo..=hi {
                let shrink = if j >= 2 { cost[i - 1][j - 2] } else { f64::INFINITY };
                let best = cost[i - 1][j].min(cost[i - 1][j - 1]).min(shrink);
                cost[i][j] = local_cost(&a.frames()[i - 1], &b.frames()[j - 1]) + best;
            }
        }
        cost[n][m]
    }

    /// Deterministic pseudo-random sequences (LCG), full 13 coefficients.
    fn pseudo_random(seed: u64, len: usize) -> FeatureSequence {
        let mut state = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        (0..len)
            .map(|_| {
                let mut coeffs = [0.0; FRAME_DIM];
                for c in &mut coeffs {
                    state = state
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    *c = ((state >> 33) % 2000) as f64 / 100.0 - 10.0;
                }
                FeatureFrame::new(coeffs).unwrap()
            })
            .collect()
    }

    #[test]
    fn golden_three_frame_scenario() {
        let a = seq(&[0.0, 1.0, 2.0]);
        let b = seq(&[0.0, 1.0, 3.0]);
        let exact = align(&a, &b, AlignmentStrategy::Exact);
        assert!((exact - 1.0).abs() < 1e-12, "exact = {exact}");
        assert!((align(&a, &b, banded(6)) - exact).abs() < 1e-12);
        assert!((align(&a, &b, beam(6)) - exact).abs() < 1e-12);
        // narrow band still contains the optimal diagonal path
        assert!((align(&a, &b, banded(2)) - exact).abs() < 1e-12);
    }

    #[test]
    fn self_alignment_is_zero() {
        for len in [1, 2, 7, 31] {
            let a = pseudo_random(len as u64, len);
            assert_eq!(align(&a, &a, AlignmentStrategy::Exact), 0.0);
            assert_eq!(align(&a, &a, banded(1)), 0.0);
            assert_eq!(align(&a, &a, beam(1)), 0.0);
        }
    }

    #[test]
    fn alignment_is_not_symmetric() {
        let a = seq(&[0.0, 1.0]);
        let b = seq(&[0.0, 5.0, 1.0]);
        let ab = align(&a, &b, AlignmentStrategy::Exact);
        let ba = align(&b, &a, AlignmentStrategy::Exact);
        // a→b may skip b's outlier frame, b→a must absorb it
        assert!(ab.abs() < 1e-12, "ab = {ab}");
        assert!((ba - 4.0).abs() < 1e-12, "ba = {ba}");
        assert!((ab - ba).abs() > 1.0);
    }

    #[test]
    fn empty_sequence_is_unmatchable() {
        let a = seq(&[1.0]);
        let empty = FeatureSequence::empty();
        let mut aligner = Aligner::new();
        for strategy in [AlignmentStrategy::Exact, banded(4), beam(4)] {
            assert!(aligner.align(&a, &empty, strategy).is_infinite());
            assert!(aligner.align(&empty, &a, strategy).is_infinite());
            assert_eq!(aligner.cells_visited(), 0);
        }
    }

    #[test]
    fn unreachable_when_b_is_more_than_twice_as_long() {
        // each row advances at most two columns of b
        let a = seq(&[0.0]);
        let b = seq(&[0.0, 0.0, 0.0]);
        assert!(align(&a, &b, AlignmentStrategy::Exact).is_infinite());
        let b = seq(&[0.0, 0.0]);
        assert!(align(&a, &b, AlignmentStrategy::Exact).is_finite());
    }

    #[test]
    fn two_row_engine_matches_full_matrix() {
        let mut aligner = Aligner::new();
        let shapes = [(3, 4), (9, 9), (17, 12), (5, 23), (40, 33)];
        for (seed, (n, m)) in shapes.into_iter().enumerate() {
            let a = pseudo_random(seed as u64 * 2 + 1, n);
            let b = pseudo_random(seed as u64 * 2 + 2, m);
            let expected = reference(&a, &b, AlignmentStrategy::Exact);
            let got = aligner.align(&a, &b, AlignmentStrategy::Exact);
            assert!(
                (got - expected).abs() < 1e-9 || (got.is_infinite() && expected.is_infinite()),
                "{n}x{m}: {got} != {expected}"
            );
            assert_eq!(aligner.cells_visited(), (n * m) as u64);
        }
    }

    #[test]
    fn wide_band_equals_exact() {
        for (n, m) in [(10, 14), (20, 11), (16, 16)] {
            let a = pseudo_random(n as u64, n);
            let b = pseudo_random(m as u64 + 100, m);
            let w = 2 * n.max(m);
            let exact = align(&a, &b, AlignmentStrategy::Exact);
            assert!((align(&a, &b, banded(w)) - exact).abs() < 1e-9);
            assert!((align(&a, &b, beam(w)) - exact).abs() < 1e-9);
        }
    }

    #[test]
    fn pruning_never_undercuts_exact() {
        let mut aligner = Aligner::new();
        for seed in 0..12u64 {
            let a = pseudo_random(seed, 20 + seed as usize);
            let b = pseudo_random(seed + 50, 25);
            let exact = aligner.align(&a, &b, AlignmentStrategy::Exact);
            let full_cells = aligner.cells_visited();
            for w in [1, 2, 4, 8] {
                let banded_cost = aligner.align(&a, &b, banded(w));
                assert!(banded_cost + 1e-9 >= exact, "banded w={w} undercut exact");
                assert!(aligner.cells_visited() <= full_cells);
                let beam_cost = aligner.align(&a, &b, beam(w));
                assert!(beam_cost + 1e-9 >= exact, "beam w={w} undercut exact");
            }
        }
    }

    #[test]
    fn stale_cells_do_not_leak_between_rows() {
        // With half-width >= 1, row i reads column i-half-2 of row i-1, just
        // left of that row's window. The slot was last written by row i-3, so
        // only the per-row reset keeps it at +inf.
        let mut aligner = Aligner::new();
        let shapes = [(12, 10), (15, 15), (9, 14), (20, 17)];
        for (seed, (n, m)) in shapes.into_iter().enumerate() {
            let a = pseudo_random(seed as u64 + 300, n);
            let b = pseudo_random(seed as u64 + 400, m);
            for strategy in [banded(2), banded(3), banded(5), beam(2), beam(4)] {
                let half = strategy.window(n, m).half_width().unwrap();
                assert!(half >= 1, "{strategy} on {n}x{m}");
                let expected = reference(&a, &b, strategy);
                let got = aligner.align(&a, &b, strategy);
                assert!(
                    (got - expected).abs() < 1e-9 || (got.is_infinite() && expected.is_infinite()),
                    "{strategy} on {n}x{m}: {got} != {expected}"
                );
            }
        }
    }

    #[test]
    fn aligner_reuse_across_lengths() {
        let mut aligner = Aligner::with_capacity(4);
        let long = pseudo_random(1, 30);
        let mid = pseudo_random(3, 7);
        let short = pseudo_random(2, 4);
        let first = aligner.align(&long, &long, AlignmentStrategy::Exact);
        let second = aligner.align(&short, &short, AlignmentStrategy::Exact);
        assert_eq!(first, 0.0);
        assert_eq!(second, 0.0);
        let cross = aligner.align(&short, &mid, beam(4));
        assert!(cross.is_finite());
        assert_eq!(cross, align(&short, &mid, beam(4)));
    }
}
