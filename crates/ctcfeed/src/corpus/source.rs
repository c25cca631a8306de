//! # Corpus Sources

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::{
    corpus::FrameCountIndex,
    errors::{CFResult, CtcFeedError},
    types::{FeatureValue, LabelId, LabelKind, Split},
};

/// Access to a corpus: features and two label sets, addressed by example name.
pub trait CorpusSource {
    /// The frame-count index of a split.
    fn frame_counts(
        &self,
        split: Split,
    ) -> CFResult<FrameCountIndex>;

    /// The names of every example which has labels of `kind` in `split`.
    fn label_names(
        &self,
        split: Split,
        kind: LabelKind,
    ) -> CFResult<Vec<String>>;

    /// Load the `(frames, input_size)` feature matrix of an example.
    fn load_features(
        &self,
        split: Split,
        name: &str,
    ) -> CFResult<Array2<FeatureValue>>;

    /// Load the label sequence of an example.
    fn load_labels(
        &self,
        split: Split,
        kind: LabelKind,
        name: &str,
    ) -> CFResult<Vec<LabelId>>;
}

#[derive(Debug, Clone, Default)]
struct MemorySplit {
    index: FrameCountIndex,
    features: BTreeMap<String, Array2<FeatureValue>>,
    char_labels: BTreeMap<String, Vec<LabelId>>,
    phone_labels: BTreeMap<String, Vec<LabelId>>,
}

impl MemorySplit {
    fn labels(
        &self,
        kind: LabelKind,
    ) -> &BTreeMap<String, Vec<LabelId>> {
        match kind {
            LabelKind::Character => &self.char_labels,
            LabelKind::Phone(_) => &self.phone_labels,
        }
    }

    fn labels_mut(
        &mut self,
        kind: LabelKind,
    ) -> &mut BTreeMap<String, Vec<LabelId>> {
        match kind {
            LabelKind::Character => &mut self.char_labels,
            LabelKind::Phone(_) => &mut self.phone_labels,
        }
    }
}

/// An in-memory [`CorpusSource`].
///
/// Holds a single phone label set, served for every [`crate::types::PhoneVocab`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    splits: BTreeMap<Split, MemorySplit>,
}

impl MemoryCorpus {
    /// An empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an example to a split.
    ///
    /// The frame-count index entry is taken from `features.nrows()`.
    pub fn insert<S: Into<String>>(
        &mut self,
        split: Split,
        name: S,
        features: Array2<FeatureValue>,
        char_labels: Vec<LabelId>,
        phone_labels: Vec<LabelId>,
    ) -> &mut Self {
        let name = name.into();
        let entry = self.splits.entry(split).or_default();
        entry.index.push(name.clone(), features.nrows());
        entry.features.insert(name.clone(), features);
        entry.char_labels.insert(name.clone(), char_labels);
        entry.phone_labels.insert(name, phone_labels);
        self
    }

    /// Remove one label sequence of an example.
    pub fn remove_labels(
        &mut self,
        split: Split,
        kind: LabelKind,
        name: &str,
    ) -> Option<Vec<LabelId>> {
        self.splits
            .get_mut(&split)
            .and_then(|s| s.labels_mut(kind).remove(name))
    }

    fn split(
        &self,
        split: Split,
    ) -> CFResult<&MemorySplit> {
        self.splits
            .get(&split)
            .ok_or_else(|| CtcFeedError::DataIntegrity(format!("no \"{split}\" split in corpus")))
    }
}

impl CorpusSource for MemoryCorpus {
    fn frame_counts(
        &self,
        split: Split,
    ) -> CFResult<FrameCountIndex> {
        Ok(self.split(split)?.index.clone())
    }

    fn label_names(
        &self,
        split: Split,
        kind: LabelKind,
    ) -> CFResult<Vec<String>> {
        Ok(self.split(split)?.labels(kind).keys().cloned().collect())
    }

    fn load_features(
        &self,
        split: Split,
        name: &str,
    ) -> CFResult<Array2<FeatureValue>> {
        self.split(split)?
            .features
            .get(name)
            .cloned()
            .ok_or_else(|| CtcFeedError::DataIntegrity(format!("no input features for {name:?}")))
    }

    fn load_labels(
        &self,
        split: Split,
        kind: LabelKind,
        name: &str,
    ) -> CFResult<Vec<LabelId>> {
        self.split(split)?
            .labels(kind)
            .get(name)
            .cloned()
            .ok_or_else(|| CtcFeedError::DataIntegrity(format!("no {kind} labels for {name:?}")))
    }
}
