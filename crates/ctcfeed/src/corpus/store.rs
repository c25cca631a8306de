//! # Sequence Store

use std::collections::BTreeSet;

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;

use crate::{
    config::DataSetOptions,
    corpus::{CorpusSource, FrameCountIndex},
    errors::{CFResult, CtcFeedError},
    stacking::{FrameStacker, FrameStacking},
    types::{FeatureValue, LabelId, LabelKind, Split},
};

/// One utterance: features plus character and phone labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    name: String,
    features: Array2<FeatureValue>,
    char_labels: Vec<LabelId>,
    phone_labels: Vec<LabelId>,
}

impl Example {
    /// Create a new example.
    pub fn new<S: Into<String>>(
        name: S,
        features: Array2<FeatureValue>,
        char_labels: Vec<LabelId>,
        phone_labels: Vec<LabelId>,
    ) -> Self {
        Self {
            name: name.into(),
            features,
            char_labels,
            phone_labels,
        }
    }

    /// The example name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `(frames, feature_dim)` feature matrix.
    pub fn features(&self) -> &Array2<FeatureValue> {
        &self.features
    }

    /// The number of feature frames.
    pub fn frame_count(&self) -> usize {
        self.features.nrows()
    }

    /// The character labels.
    pub fn char_labels(&self) -> &[LabelId] {
        &self.char_labels
    }

    /// The phone labels.
    pub fn phone_labels(&self) -> &[LabelId] {
        &self.phone_labels
    }
}

/// A corpus split, fully loaded into memory.
///
/// Frozen after load; share it with `Arc<SequenceStore>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStore {
    split: Split,
    examples: Vec<Example>,
    feature_dim: usize,
    sorted: bool,
}

impl SequenceStore {
    /// Build a store from already loaded examples.
    ///
    /// ## Errors
    /// [`CtcFeedError::DataIntegrity`] if an example is not `feature_dim` wide,
    /// or has a negative label.
    pub fn from_examples(
        split: Split,
        examples: Vec<Example>,
        feature_dim: usize,
        sorted: bool,
    ) -> CFResult<Self> {
        for example in &examples {
            check_width(example, feature_dim)?;
            check_labels(example)?;
        }
        Ok(Self {
            split,
            examples,
            feature_dim,
            sorted,
        })
    }

    /// Load a split from a [`CorpusSource`].
    ///
    /// ## Arguments
    /// * `source` - the corpus.
    /// * `options` - split, phone vocabulary, ordering, stacking and input width.
    /// * `stacker` - the stacker used when `options.stacking` is set.
    ///
    /// ## Errors
    /// * [`CtcFeedError::DataIntegrity`] if the two label sets disagree,
    ///   or an example is missing data, has the wrong width, or has a negative
    ///   label.
    /// * Any error from `source`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(source, options, stacker), fields(split = %options.split))
    )]
    pub fn load<S: CorpusSource + ?Sized>(
        source: &S,
        options: &DataSetOptions,
        stacker: &dyn FrameStacker,
    ) -> CFResult<Self> {
        let split = options.split;
        let phone = LabelKind::Phone(options.phone_vocab);

        let index = source.frame_counts(split)?;

        check_label_sources(
            &index,
            &source.label_names(split, LabelKind::Character)?,
            &source.label_names(split, phone)?,
        )?;

        log::info!("Loading {split} dataset ({})...", options.phone_vocab);

        let progress = if options.show_progress {
            let bar = ProgressBar::new(index.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed}]") {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut examples = Vec::with_capacity(index.len());
        for (name, frames) in index.iter() {
            let features = source.load_features(split, name)?;
            if features.nrows() != frames {
                log::warn!(
                    "{name}: frame index says {frames} frames; features have {}",
                    features.nrows()
                );
            }
            let example = Example::new(
                name,
                features,
                source.load_labels(split, LabelKind::Character, name)?,
                source.load_labels(split, phone, name)?,
            );
            check_width(&example, options.input_size)?;
            examples.push(example);
            progress.inc(1);
        }
        progress.finish_and_clear();

        // Ordered by the loaded frame counts; ties keep index order.
        if options.sorted {
            examples.sort_by_key(Example::frame_count);
        }

        let mut feature_dim = options.input_size;
        if let Some(stacking) = options.stacking {
            log::info!("Stacking frames...");
            stack_examples(&mut examples, stacker, stacking);
            feature_dim = stacking.stacked_width(feature_dim);
        }

        log::info!(
            "Loaded {} {split} examples; feature_dim={feature_dim}",
            examples.len()
        );

        Self::from_examples(split, examples, feature_dim, options.sorted)
    }

    /// The split this store holds.
    pub fn split(&self) -> Split {
        self.split
    }

    /// The per-frame feature width.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Are the examples in ascending frame-count order?
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// The number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Is the store empty?
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Get an example by index.
    pub fn get(
        &self,
        index: usize,
    ) -> Option<&Example> {
        self.examples.get(index)
    }

    /// All examples, in store order.
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }
}

fn check_width(
    example: &Example,
    feature_dim: usize,
) -> CFResult<()> {
    if example.features.ncols() != feature_dim {
        return Err(CtcFeedError::DataIntegrity(format!(
            "{}: feature width {} != expected {feature_dim}",
            example.name,
            example.features.ncols()
        )));
    }
    Ok(())
}

/// Labels must be vocabulary indices; a negative label would collide with
/// [`crate::types::LABEL_PAD`] once padded.
fn check_labels(example: &Example) -> CFResult<()> {
    for (kind, labels) in [
        ("character", &example.char_labels),
        ("phone", &example.phone_labels),
    ] {
        if let Some(&label) = labels.iter().find(|&&l| l < 0) {
            return Err(CtcFeedError::DataIntegrity(format!(
                "{}: {kind} label {label} is negative",
                example.name
            )));
        }
    }
    Ok(())
}

/// Check that both label sets cover the same examples, and cover the index.
fn check_label_sources(
    index: &FrameCountIndex,
    char_names: &[String],
    phone_names: &[String],
) -> CFResult<()> {
    if char_names.len() != phone_names.len() {
        return Err(CtcFeedError::DataIntegrity(format!(
            "the numbers of labels between character ({}) and phone ({}) are not same",
            char_names.len(),
            phone_names.len()
        )));
    }

    let char_set: BTreeSet<&str> = char_names.iter().map(String::as_str).collect();
    let phone_set: BTreeSet<&str> = phone_names.iter().map(String::as_str).collect();
    if let Some(name) = char_set.symmetric_difference(&phone_set).next() {
        return Err(CtcFeedError::DataIntegrity(format!(
            "{name:?} is not labeled in both character and phone label sets"
        )));
    }

    if let Some((name, _)) = index.iter().find(|(name, _)| !char_set.contains(name)) {
        return Err(CtcFeedError::DataIntegrity(format!(
            "{name:?} is in the frame index but has no labels"
        )));
    }

    Ok(())
}

fn stack_examples(
    examples: &mut [Example],
    stacker: &dyn FrameStacker,
    stacking: FrameStacking,
) {
    let stack_one = |example: &mut Example| {
        example.features = stacker.stack(example.features.view(), stacking);
    };

    for_each_example(examples, stack_one);
}

#[cfg(feature = "rayon")]
fn for_each_example<F>(
    examples: &mut [Example],
    f: F,
) where
    F: Fn(&mut Example) + Send + Sync,
{
    use rayon::prelude::*;
    examples.par_iter_mut().for_each(f);
}

#[cfg(not(feature = "rayon"))]
fn for_each_example<F>(
    examples: &mut [Example],
    f: F,
) where
    F: Fn(&mut Example) + Send + Sync,
{
    examples.iter_mut().for_each(f);
}

#[cfg(test)]
mod tests {
    use ndarray::Array;

    use super::*;
    use crate::{corpus::MemoryCorpus, stacking::SkipStacker, types::PhoneVocab};

    fn features(
        frames: usize,
        seed: usize,
    ) -> Array2<FeatureValue> {
        Array::from_shape_fn((frames, 4), |(t, d)| (seed * 1000 + t * 4 + d) as FeatureValue)
    }

    fn corpus(frame_counts: &[usize]) -> MemoryCorpus {
        let mut corpus = MemoryCorpus::new();
        for (i, &frames) in frame_counts.iter().enumerate() {
            corpus.insert(
                Split::Train,
                format!("utt{i}"),
                features(frames, i),
                vec![i as LabelId; i + 1],
                vec![i as LabelId; 2 * i + 1],
            );
        }
        corpus
    }

    fn options() -> DataSetOptions {
        DataSetOptions::new(Split::Train, PhoneVocab::Phone61, 2).with_input_size(4)
    }

    #[test]
    fn test_load_sorted() {
        let corpus = corpus(&[10, 20, 15, 5, 25]);
        let store = SequenceStore::load(&corpus, &options(), &SkipStacker).unwrap();

        assert_eq!(store.len(), 5);
        assert!(store.is_sorted());
        assert_eq!(store.feature_dim(), 4);

        let frames: Vec<usize> = store.examples().iter().map(Example::frame_count).collect();
        assert_eq!(frames, vec![5, 10, 15, 20, 25]);

        let ex = store.get(0).unwrap();
        assert_eq!(ex.name(), "utt3");
        assert_eq!(ex.char_labels(), &[3, 3, 3, 3]);
        assert_eq!(ex.phone_labels().len(), 7);
        assert_eq!(ex.features(), &features(5, 3));
    }

    #[test]
    fn test_load_unsorted_keeps_index_order() {
        let corpus = corpus(&[10, 20, 15]);
        let store =
            SequenceStore::load(&corpus, &options().with_sorted(false), &SkipStacker).unwrap();

        let names: Vec<&str> = store.examples().iter().map(Example::name).collect();
        assert_eq!(names, vec!["utt0", "utt1", "utt2"]);
        assert!(!store.is_sorted());
    }

    #[test]
    fn test_load_is_idempotent() {
        let corpus = corpus(&[7, 3, 7, 1, 9]);
        for sorted in [true, false] {
            let options = options().with_sorted(sorted);
            let a = SequenceStore::load(&corpus, &options, &SkipStacker).unwrap();
            let b = SequenceStore::load(&corpus, &options, &SkipStacker).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_load_stacked() {
        let corpus = corpus(&[10, 7]);
        let options = options().with_stacking(Some(FrameStacking::new(3, 2)));
        let store = SequenceStore::load(&corpus, &options, &SkipStacker).unwrap();

        assert_eq!(store.feature_dim(), 12);
        let frames: Vec<usize> = store.examples().iter().map(Example::frame_count).collect();
        assert_eq!(frames, vec![4, 5]);
        for ex in store.examples() {
            assert_eq!(ex.features().ncols(), 12);
        }
    }

    #[test]
    fn test_label_count_mismatch() {
        let mut corpus = corpus(&[3, 4, 5]);
        corpus.remove_labels(Split::Train, LabelKind::Phone(PhoneVocab::Phone61), "utt1");

        let err = SequenceStore::load(&corpus, &options(), &SkipStacker).unwrap_err();
        assert!(matches!(err, CtcFeedError::DataIntegrity(_)), "{err}");
    }

    #[test]
    fn test_label_name_mismatch() {
        let index: FrameCountIndex = [("a", 1), ("b", 2)].into_iter().collect();
        let chars = vec!["a".to_string(), "b".to_string()];
        let phones = vec!["a".to_string(), "c".to_string()];

        assert!(check_label_sources(&index, &chars, &chars).is_ok());
        assert!(matches!(
            check_label_sources(&index, &chars, &phones),
            Err(CtcFeedError::DataIntegrity(_))
        ));

        let partial = vec!["a".to_string()];
        assert!(matches!(
            check_label_sources(&index, &partial, &partial),
            Err(CtcFeedError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_negative_labels() {
        let mut corpus = corpus(&[3, 4]);
        corpus.insert(Split::Train, "bad", features(5, 9), vec![3, -1, 5], vec![1]);

        let err = SequenceStore::load(&corpus, &options(), &SkipStacker).unwrap_err();
        assert!(matches!(err, CtcFeedError::DataIntegrity(_)), "{err}");
        assert!(err.to_string().contains("bad: character label -1"), "{err}");

        let example = Example::new("x", features(2, 0), vec![1], vec![2, -4]);
        assert!(matches!(
            SequenceStore::from_examples(Split::Dev, vec![example], 4, false),
            Err(CtcFeedError::DataIntegrity(_))
        ));
    }

    /// A [`MemoryCorpus`] whose frame index disagrees with its features.
    struct StaleIndex {
        corpus: MemoryCorpus,
        index: FrameCountIndex,
    }

    impl CorpusSource for StaleIndex {
        fn frame_counts(
            &self,
            _split: Split,
        ) -> CFResult<FrameCountIndex> {
            Ok(self.index.clone())
        }

        fn label_names(
            &self,
            split: Split,
            kind: LabelKind,
        ) -> CFResult<Vec<String>> {
            self.corpus.label_names(split, kind)
        }

        fn load_features(
            &self,
            split: Split,
            name: &str,
        ) -> CFResult<Array2<FeatureValue>> {
            self.corpus.load_features(split, name)
        }

        fn load_labels(
            &self,
            split: Split,
            kind: LabelKind,
            name: &str,
        ) -> CFResult<Vec<LabelId>> {
            self.corpus.load_labels(split, kind, name)
        }
    }

    #[test]
    fn test_sorted_by_loaded_frames() {
        // utt0..utt3 have 10, 20, 15, 10 frames; the index claims otherwise.
        let source = StaleIndex {
            corpus: corpus(&[10, 20, 15, 10]),
            index: [("utt0", 40), ("utt1", 1), ("utt2", 2), ("utt3", 3)]
                .into_iter()
                .collect(),
        };
        let store = SequenceStore::load(&source, &options(), &SkipStacker).unwrap();

        let names: Vec<&str> = store.examples().iter().map(Example::name).collect();
        assert_eq!(names, vec!["utt0", "utt3", "utt2", "utt1"]);
    }

    #[test]
    fn test_wrong_width() {
        let corpus = corpus(&[3]);
        let err = SequenceStore::load(&corpus, &options().with_input_size(5), &SkipStacker)
            .unwrap_err();
        assert!(matches!(err, CtcFeedError::DataIntegrity(_)));
    }
}
