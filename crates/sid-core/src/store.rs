use std::collections::HashMap;

use crate::error::{SidError, SidResult};
use crate::frame::FeatureSequence;

/// One enrolled speaker: a unique label and its reference sequences.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeakerTemplate {
    label: String,
    sequences: Vec<FeatureSequence>,
}

impl SpeakerTemplate {
    /// Speaker label (unique inside a store).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enrolled sequences, in insertion order.
    #[must_use]
    pub fn sequences(&self) -> &[FeatureSequence] {
        &self.sequences
    }
}

/// A borrowed (label, sequence) pair with its position in store order.
#[derive(Clone, Copy, Debug)]
pub struct TemplateRef<'a> {
    /// Flat index over every sequence of the store, in iteration order.
    pub index: usize,
    /// Owning speaker label.
    pub label: &'a str,
    /// The reference sequence.
    pub sequence: &'a FeatureSequence,
}

/// Registre label → séquences de référence.
///
/// L'ordre d'itération est l'ordre d'insertion : le classifieur s'en sert
/// comme départage implicite, il doit donc être reproductible.
///
/// # Example
/// ```
/// use sid_core::frame::FeatureSequence;
/// use sid_core::store::TemplateStore;
///
/// let mut store = TemplateStore::new();
/// store.push_sample("zoe", FeatureSequence::from_first_coefficients(&[1.0]).unwrap());
/// store.push_sample("adam", FeatureSequence::from_first_coefficients(&[2.0]).unwrap());
/// store.push_sample("zoe", FeatureSequence::from_first_coefficients(&[3.0]).unwrap());
/// let labels: Vec<&str> = store.labels().collect();
/// assert_eq!(labels, ["zoe", "adam"]);
/// assert_eq!(store.sample_count(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    speakers: Vec<SpeakerTemplate>,
    index: HashMap<String, usize>,
}

impl TemplateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new speaker with its sequences.
    ///
    /// # Errors
    /// Returns `DuplicateLabel` if `label` is already present.
    pub fn insert(
        &mut self,
        label: impl Into<String>,
        sequences: Vec<FeatureSequence>,
    ) -> SidResult<()> {
        let label = label.into();
        if self.index.contains_key(&label) {
            return Err(SidError::DuplicateLabel(label));
        }
        self.index.insert(label.clone(), self.speakers.len());
        self.speakers.push(SpeakerTemplate { label, sequences });
        Ok(())
    }

    /// Append one sequence to `label`, creating the speaker on first use.
    pub fn push_sample(&mut self, label: &str, sequence: FeatureSequence) {
        if let Some(&idx) = self.index.get(label) {
            self.speakers[idx].sequences.push(sequence);
        } else {
            self.index.insert(label.to_string(), self.speakers.len());
            self.speakers.push(SpeakerTemplate {
                label: label.to_string(),
                sequences: vec![sequence],
            });
        }
    }

    /// Look up a speaker by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&SpeakerTemplate> {
        self.index.get(label).map(|&idx| &self.speakers[idx])
    }

    /// `true` if `label` is enrolled.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Speakers in insertion order.
    pub fn speakers(&self) -> impl Iterator<Item = &SpeakerTemplate> {
        self.speakers.iter()
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.speakers.iter().map(|s| s.label.as_str())
    }

    /// Every (label, sequence) pair, flattened in store order.
    pub fn iter_samples(&self) -> impl Iterator<Item = TemplateRef<'_>> {
        self.speakers
            .iter()
            .flat_map(|s| s.sequences.iter().map(move |seq| (s.label.as_str(), seq)))
            .enumerate()
            .map(|(index, (label, sequence))| TemplateRef {
                index,
                label,
                sequence,
            })
    }

    /// Flattened samples collected into a vector (for parallel iteration).
    #[must_use]
    pub fn flatten(&self) -> Vec<TemplateRef<'_>> {
        self.iter_samples().collect()
    }

    /// Number of speakers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    /// `true` when no speaker is enrolled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Total number of sequences across every speaker.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.speakers.iter().map(|s| s.sequences.len()).sum()
    }
}
