use sid_core::frame::FeatureFrame;

/// Distance euclidienne entre deux frames sur les 13 coefficients.
///
/// Les frames sont validés (finis, dimension fixe) à la construction :
/// aucune vérification ici, c'est le cœur de la boucle DTW.
///
/// # Example
/// ```
/// use sid_core::frame::FeatureFrame;
/// use sid_dtw::distance::local_cost;
/// let a = FeatureFrame::with_first(0.0).unwrap();
/// let b = FeatureFrame::with_first(3.0).unwrap();
/// assert!((local_cost(&a, &b) - 3.0).abs() < 1e-12);
/// ```
#[inline(always)]
#[must_use]
pub fn local_cost(a: &FeatureFrame, b: &FeatureFrame) -> f64 {
    a.coeffs()
        .iter()
        .zip(b.coeffs())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
