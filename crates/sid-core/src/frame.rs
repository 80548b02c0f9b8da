use crate::error::{SidError, SidResult};

/// Nombre de coefficients cepstraux par frame.
pub const FRAME_DIM: usize = 13;

/// Un instantané spectral court (13 coefficients MFCC).
///
/// Invariant : tous les coefficients sont finis. Un frame ne peut être
/// construit qu'à travers [`FeatureFrame::new`] ou [`FeatureFrame::from_slice`],
/// qui rejettent NaN et ±∞.
///
/// # Example
/// ```
/// use sid_core::frame::{FeatureFrame, FRAME_DIM};
/// let frame = FeatureFrame::new([0.5; FRAME_DIM]).unwrap();
/// assert_eq!(frame.coeffs()[0], 0.5);
/// assert!(FeatureFrame::new([f64::NAN; FRAME_DIM]).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureFrame {
    coeffs: [f64; FRAME_DIM],
}

impl FeatureFrame {
    /// Validate and wrap a coefficient array.
    ///
    /// # Errors
    /// Returns `InvalidFeatureValue` for the first non-finite coefficient.
    pub fn new(coeffs: [f64; FRAME_DIM]) -> SidResult<Self> {
        if let Some((coefficient, &value)) = coeffs.iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(SidError::InvalidFeatureValue {
                coefficient,
                value,
                origin: None,
            });
        }
        Ok(Self { coeffs })
    }

    /// Build a frame from a slice that must hold exactly [`FRAME_DIM`] values.
    ///
    /// # Errors
    /// Returns `InvalidDimension` on a length mismatch, `InvalidFeatureValue`
    /// on a non-finite value.
    ///
    /// # Example
    /// ```
    /// use sid_core::frame::FeatureFrame;
    /// assert!(FeatureFrame::from_slice(&[1.0; 12]).is_err());
    /// assert!(FeatureFrame::from_slice(&[1.0; 13]).is_ok());
    /// ```
    pub fn from_slice(values: &[f64]) -> SidResult<Self> {
        let coeffs: [f64; FRAME_DIM] = values.try_into().map_err(|_| SidError::InvalidDimension {
            expected: FRAME_DIM,
            actual: values.len(),
        })?;
        Self::new(coeffs)
    }

    /// Frame whose first coefficient is `first` and all others zero.
    ///
    /// Handy for hand-computed alignments.
    ///
    /// # Errors
    /// Returns `InvalidFeatureValue` if `first` is not finite.
    pub fn with_first(first: f64) -> SidResult<Self> {
        let mut coeffs = [0.0; FRAME_DIM];
        coeffs[0] = first;
        Self::new(coeffs)
    }

    /// Coefficients du frame.
    #[inline(always)]
    #[must_use]
    pub fn coeffs(&self) -> &[f64; FRAME_DIM] {
        &self.coeffs
    }
}

/// Séquence ordonnée de frames pour un énoncé.
///
/// Une séquence vide est la sentinelle « impossible à aligner » : toute
/// distance calculée contre elle vaut `+∞`.
///
/// # Example
/// ```
/// use sid_core::frame::{FeatureFrame, FeatureSequence};
/// let seq: FeatureSequence = [0.0, 1.0, 2.0]
///     .iter()
///     .map(|&v| FeatureFrame::with_first(v).unwrap())
///     .collect();
/// assert_eq!(seq.len(), 3);
/// assert!(!seq.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSequence {
    frames: Vec<FeatureFrame>,
}

impl FeatureSequence {
    /// Wrap already validated frames.
    #[must_use]
    pub fn new(frames: Vec<FeatureFrame>) -> Self {
        Self { frames }
    }

    /// The unmatchable sentinel.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a sequence from raw rows, validating every coefficient.
    ///
    /// # Errors
    /// Propagates the first frame construction error.
    ///
    /// # Example
    /// ```
    /// use sid_core::frame::FeatureSequence;
    /// let rows = vec![vec![0.0; 13], vec![1.0; 13]];
    /// let seq = FeatureSequence::from_rows(&rows).unwrap();
    /// assert_eq!(seq.len(), 2);
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> SidResult<Self> {
        let frames = rows
            .iter()
            .map(|r| FeatureFrame::from_slice(r.as_ref()))
            .collect::<SidResult<Vec<_>>>()?;
        Ok(Self { frames })
    }

    /// Convenience constructor: one frame per value, stored in coefficient 0.
    ///
    /// # Errors
    /// Returns `InvalidFeatureValue` if a value is not finite.
    pub fn from_first_coefficients(values: &[f64]) -> SidResult<Self> {
        values
            .iter()
            .map(|&v| FeatureFrame::with_first(v))
            .collect::<SidResult<Vec<_>>>()
            .map(Self::new)
    }

    /// Nombre de frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` pour la sentinelle vide.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in utterance order.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[FeatureFrame] {
        &self.frames
    }

    /// Per-coefficient mean over the sequence, `None` when empty.
    #[must_use]
    pub fn mean(&self) -> Option<[f64; FRAME_DIM]> {
        if self.frames.is_empty() {
            return None;
        }
        let mut acc = [0.0; FRAME_DIM];
        for frame in &self.frames {
            for (a, c) in acc.iter_mut().zip(frame.coeffs()) {
                *a += c;
            }
        }
        let n = self.frames.len() as f64;
        for a in &mut acc {
            *a /= n;
        }
        Some(acc)
    }
}

impl FromIterator<FeatureFrame> for FeatureSequence {
    fn from_iter<T: IntoIterator<Item = FeatureFrame>>(iter: T) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<FeatureFrame>> for FeatureSequence {
    fn from(frames: Vec<FeatureFrame>) -> Self {
        Self { frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_infinite_coefficient() {
        let mut coeffs = [0.0; FRAME_DIM];
        coeffs[7] = f64::INFINITY;
        match FeatureFrame::new(coeffs) {
            Err(SidError::InvalidFeatureValue { coefficient, .. }) => assert_eq!(coefficient, 7),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let err = FeatureFrame::from_slice(&[0.0; 14]).unwrap_err();
        assert!(matches!(
            err,
            SidError::InvalidDimension {
                expected: 13,
                actual: 14
            }
        ));
    }

    #[test]
    fn from_rows_stops_on_poisoned_row() {
        let mut bad = vec![0.0; FRAME_DIM];
        bad[0] = f64::NAN;
        let rows = vec![vec![0.0; FRAME_DIM], bad];
        assert!(FeatureSequence::from_rows(&rows).is_err());
    }

    #[test]
    fn mean_of_sequence() {
        let seq = FeatureSequence::from_first_coefficients(&[1.0, 2.0, 3.0]).unwrap();
        let mean = seq.mean().unwrap();
        assert!((mean[0] - 2.0).abs() < f64::EPSILON);
        assert!(mean[1].abs() < f64::EPSILON);
        assert!(FeatureSequence::empty().mean().is_none());
    }
}
