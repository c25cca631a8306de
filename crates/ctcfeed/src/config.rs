//! # Data Set Options

use serde::{Deserialize, Serialize};

use crate::{
    corpus::CorpusSource,
    dataset::DataSet,
    errors::{CFResult, CtcFeedError},
    sampling::{SamplingMode, ShufflePolicy},
    stacking::FrameStacking,
    types::{PhoneVocab, Split, TIMIT_INPUT_SIZE},
};

/// Options for [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSetOptions {
    /// The corpus split.
    pub split: Split,

    /// The phone-label granularity.
    pub phone_vocab: PhoneVocab,

    /// The default mini-batch size; must be divisible by `num_workers`.
    pub batch_size: usize,

    /// Optional frame stacking.
    pub stacking: Option<FrameStacking>,

    /// Sort the store by frame count, and draw batches in that order.
    pub sorted: bool,

    /// Show a progress bar while loading.
    pub show_progress: bool,

    /// The number of workers each batch is split across.
    pub num_workers: usize,

    /// The within-batch shuffle policy.
    pub shuffle_policy: ShufflePolicy,

    /// Optional RNG seed; batches are deterministic when set.
    pub seed: Option<u64>,

    /// The per-frame width of the input features, before stacking.
    pub input_size: usize,
}

impl DataSetOptions {
    /// Create new options.
    ///
    /// ## Arguments
    /// * `split` - the corpus split.
    /// * `phone_vocab` - the phone-label granularity.
    /// * `batch_size` - the default mini-batch size.
    ///
    /// ## Returns
    /// Sorted, single-worker options without stacking.
    pub fn new(
        split: Split,
        phone_vocab: PhoneVocab,
        batch_size: usize,
    ) -> Self {
        Self {
            split,
            phone_vocab,
            batch_size,
            stacking: None,
            sorted: true,
            show_progress: false,
            num_workers: 1,
            shuffle_policy: ShufflePolicy::default(),
            seed: None,
            input_size: TIMIT_INPUT_SIZE,
        }
    }

    /// Sets the batch size.
    pub fn with_batch_size(
        self,
        batch_size: usize,
    ) -> Self {
        Self { batch_size, ..self }
    }

    /// Sets frame stacking.
    pub fn with_stacking(
        self,
        stacking: Option<FrameStacking>,
    ) -> Self {
        Self { stacking, ..self }
    }

    /// Sets sorted mode.
    pub fn with_sorted(
        self,
        sorted: bool,
    ) -> Self {
        Self { sorted, ..self }
    }

    /// Sets progress display.
    pub fn with_show_progress(
        self,
        show_progress: bool,
    ) -> Self {
        Self {
            show_progress,
            ..self
        }
    }

    /// Sets the worker count.
    pub fn with_num_workers(
        self,
        num_workers: usize,
    ) -> Self {
        Self {
            num_workers,
            ..self
        }
    }

    /// Sets the within-batch shuffle policy.
    pub fn with_shuffle_policy(
        self,
        shuffle_policy: ShufflePolicy,
    ) -> Self {
        Self {
            shuffle_policy,
            ..self
        }
    }

    /// Sets the RNG seed.
    pub fn with_seed(
        self,
        seed: Option<u64>,
    ) -> Self {
        Self { seed, ..self }
    }

    /// Sets the input feature width.
    pub fn with_input_size(
        self,
        input_size: usize,
    ) -> Self {
        Self { input_size, ..self }
    }

    /// The sampling mode implied by `sorted`.
    pub fn sampling_mode(&self) -> SamplingMode {
        if self.sorted {
            SamplingMode::Sorted
        } else {
            SamplingMode::Random
        }
    }

    /// The per-frame feature width after stacking.
    pub fn feature_dim(&self) -> usize {
        match self.stacking {
            Some(stacking) => stacking.stacked_width(self.input_size),
            None => self.input_size,
        }
    }

    /// Check a batch size against the worker count.
    pub fn check_batch_size(
        &self,
        batch_size: usize,
    ) -> CFResult<()> {
        if batch_size == 0 {
            return Err(CtcFeedError::Configuration(
                "batch_size must be > 0".to_string(),
            ));
        }
        if !batch_size.is_multiple_of(self.num_workers) {
            return Err(CtcFeedError::Configuration(format!(
                "batch_size ({batch_size}) should be divisible by num_workers ({})",
                self.num_workers
            )));
        }
        Ok(())
    }

    /// Validate the options.
    ///
    /// ## Errors
    /// [`CtcFeedError::Configuration`] on a zero batch size, worker count or input
    /// width; a batch size not divisible by the worker count; or bad stacking.
    pub fn validate(&self) -> CFResult<()> {
        if self.num_workers == 0 {
            return Err(CtcFeedError::Configuration(
                "num_workers must be >= 1".to_string(),
            ));
        }
        if self.input_size == 0 {
            return Err(CtcFeedError::Configuration(
                "input_size must be > 0".to_string(),
            ));
        }
        self.check_batch_size(self.batch_size)?;
        if let Some(stacking) = &self.stacking {
            stacking.validate()?;
        }
        Ok(())
    }

    /// Load a [`DataSet`] from these options.
    pub fn init<S: CorpusSource + ?Sized>(
        self,
        source: &S,
    ) -> CFResult<DataSet> {
        DataSet::load(self, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let options = DataSetOptions::new(Split::Train, PhoneVocab::Phone39, 32);

        assert_eq!(options.batch_size, 32);
        assert!(options.sorted);
        assert_eq!(options.num_workers, 1);
        assert_eq!(options.input_size, TIMIT_INPUT_SIZE);
        assert_eq!(options.feature_dim(), 123);
        assert_eq!(options.sampling_mode(), SamplingMode::Sorted);
        assert!(options.validate().is_ok());

        let options = options
            .with_batch_size(8)
            .with_num_workers(4)
            .with_sorted(false)
            .with_stacking(Some(FrameStacking::new(3, 2)))
            .with_seed(Some(1));

        assert_eq!(options.feature_dim(), 369);
        assert_eq!(options.sampling_mode(), SamplingMode::Random);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let base = DataSetOptions::new(Split::Dev, PhoneVocab::Phone61, 6);

        for bad in [
            base.clone().with_batch_size(0),
            base.clone().with_num_workers(0),
            base.clone().with_num_workers(4),
            base.clone().with_input_size(0),
            base.clone().with_stacking(Some(FrameStacking::new(0, 1))),
        ] {
            assert!(
                matches!(bad.validate(), Err(CtcFeedError::Configuration(_))),
                "{bad:?}"
            );
        }

        assert!(base.with_num_workers(3).validate().is_ok());
    }

    #[test]
    fn test_serde() {
        let options = DataSetOptions::new(Split::Test, PhoneVocab::Phone48, 16)
            .with_stacking(Some(FrameStacking::new(2, 2)));

        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"split\":\"test\""));
        assert!(json.contains("\"phone_vocab\":\"phone48\""));

        let parsed: DataSetOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }
}
