//! # Data Set
//!
//! Ties the pieces together: a loaded [`SequenceStore`], a [`Sampler`] with its
//! [`EpochState`], and the assembly / distribution / encoding pipeline.
//!
//! ```rust,no_run
//! use ctcfeed::{
//!     DataSetOptions,
//!     corpus::NpyCorpus,
//!     types::{PhoneVocab, Split},
//! };
//!
//! fn example() -> ctcfeed::CFResult<()> {
//!     let corpus = NpyCorpus::new("/data/timit/ctc");
//!     let mut train = DataSetOptions::new(Split::Train, PhoneVocab::Phone61, 32).init(&corpus)?;
//!
//!     for batch in train.epoch_batches(None) {
//!         if let Some(batch) = batch?.into_single() {
//!             // batch.features: (32, max_frames, 123)
//!             // batch.char_labels / batch.phone_labels: sparse labels.
//!             let _ = batch;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use ndarray::Array3;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    assembly::{Batch, BatchAssembler},
    config::DataSetOptions,
    corpus::{CorpusSource, SequenceStore},
    distribute::Distributor,
    errors::{CFResult, CtcFeedError},
    sampling::{EpochState, Sampler, sampler_for},
    sparse::SparseLabels,
    stacking::{FrameStacker, SkipStacker},
    types::{FeatureValue, Split},
};

/// A [`Batch`] (or one worker's chunk of it) with sparse-encoded labels.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    /// `(batch, max_frames, feature_dim)` zero-padded features.
    pub features: Array3<FeatureValue>,

    /// Sparse character labels.
    pub char_labels: SparseLabels,

    /// Sparse phone labels.
    pub phone_labels: SparseLabels,

    /// The true frame count of each example.
    pub lengths: Vec<usize>,

    /// The name of each example.
    pub names: Vec<String>,
}

impl EncodedBatch {
    /// The number of examples.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Is the batch empty?
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

impl From<Batch> for EncodedBatch {
    fn from(batch: Batch) -> Self {
        Self {
            char_labels: SparseLabels::encode(batch.char_labels.view()),
            phone_labels: SparseLabels::encode(batch.phone_labels.view()),
            features: batch.features,
            lengths: batch.lengths,
            names: batch.names,
        }
    }
}

/// The result of one [`DataSet::next_batch`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct MiniBatch {
    /// One entry per worker; exactly one when `num_workers == 1`.
    pub chunks: Vec<EncodedBatch>,

    /// Did this batch complete an epoch?
    pub rolled_over: bool,
}

impl MiniBatch {
    /// The total number of examples across chunks.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(EncodedBatch::len).sum()
    }

    /// Is the mini-batch empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of worker chunks.
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// The batch, if it was not split.
    pub fn into_single(self) -> Option<EncodedBatch> {
        let mut chunks = self.chunks;
        if chunks.len() == 1 { chunks.pop() } else { None }
    }
}

/// Logged when a training epoch rolls over.
pub const NEXT_EPOCH_NOTICE: &str = "---Next epoch---";

/// The epoch-boundary notice for a batch; only training rollovers have one.
pub fn epoch_notice(
    split: Split,
    rolled_over: bool,
) -> Option<&'static str> {
    (rolled_over && split == Split::Train).then_some(NEXT_EPOCH_NOTICE)
}

/// A loaded corpus split that produces mini-batches.
#[derive(Debug)]
pub struct DataSet {
    options: DataSetOptions,
    store: Arc<SequenceStore>,
    sampler: Box<dyn Sampler>,
    state: EpochState,
    rng: StdRng,
}

impl DataSet {
    /// Load a data set, stacking with [`SkipStacker`].
    ///
    /// ## Errors
    /// * [`CtcFeedError::Configuration`] for invalid `options`.
    /// * Any load error; see [`SequenceStore::load`].
    pub fn load<S: CorpusSource + ?Sized>(
        options: DataSetOptions,
        source: &S,
    ) -> CFResult<Self> {
        Self::load_with_stacker(options, source, &SkipStacker)
    }

    /// Load a data set with a custom [`FrameStacker`].
    pub fn load_with_stacker<S: CorpusSource + ?Sized>(
        options: DataSetOptions,
        source: &S,
        stacker: &dyn FrameStacker,
    ) -> CFResult<Self> {
        options.validate()?;
        let store = SequenceStore::load(source, &options, stacker)?;
        Self::from_store(options, Arc::new(store))
    }

    /// Build a data set over an already loaded store.
    ///
    /// Several data sets may share one store; each has its own epoch state.
    pub fn from_store(
        options: DataSetOptions,
        store: Arc<SequenceStore>,
    ) -> CFResult<Self> {
        options.validate()?;
        if options.sorted && !store.is_sorted() {
            log::warn!("sorted sampling over an unsorted store; batches follow store order");
        }

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            sampler: sampler_for(options.sampling_mode()),
            state: EpochState::new(store.len()),
            options,
            store,
            rng,
        })
    }

    /// The options.
    pub fn options(&self) -> &DataSetOptions {
        &self.options
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<SequenceStore> {
        &self.store
    }

    /// The current epoch state.
    pub fn epoch_state(&self) -> &EpochState {
        &self.state
    }

    /// The number of completed epochs.
    pub fn epoch(&self) -> usize {
        self.state.epoch()
    }

    /// The number of examples.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Is the data set empty?
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The per-frame feature width, after stacking.
    pub fn feature_dim(&self) -> usize {
        self.store.feature_dim()
    }

    /// Restart the current epoch.
    pub fn reset_epoch(&mut self) {
        self.state.reset();
    }

    /// Make the next mini-batch.
    ///
    /// ## Arguments
    /// * `batch_size` - optional override of `options.batch_size`.
    /// * `distributor` - required when `options.num_workers > 1`.
    ///
    /// ## Errors
    /// * [`CtcFeedError::Configuration`] if a distributor is required but missing,
    ///   or the batch size is zero or not divisible by the worker count.
    /// * [`CtcFeedError::InvalidBatch`] if the data set is empty.
    pub fn next_batch(
        &mut self,
        batch_size: Option<usize>,
        distributor: Option<&dyn Distributor>,
    ) -> CFResult<MiniBatch> {
        let num_workers = self.options.num_workers;
        if num_workers > 1 && distributor.is_none() {
            return Err(CtcFeedError::Configuration(
                "a distributor is required when num_workers > 1".to_string(),
            ));
        }

        let batch_size = batch_size.unwrap_or(self.options.batch_size);
        self.options.check_batch_size(batch_size)?;

        if self.store.is_empty() {
            return Err(CtcFeedError::InvalidBatch(format!(
                "the {} data set is empty",
                self.options.split
            )));
        }

        let draw = self.sampler.draw(
            &mut self.state,
            batch_size,
            self.options.shuffle_policy,
            &mut self.rng,
        );
        if let Some(notice) = epoch_notice(self.options.split, draw.rolled_over) {
            log::info!("{notice}");
        }

        let batch = BatchAssembler::new(&self.store).assemble(&draw.indices)?;

        let chunks = match distributor {
            Some(distributor) if num_workers > 1 => distributor
                .distribute(batch, num_workers)?
                .into_iter()
                .map(EncodedBatch::from)
                .collect(),
            _ => vec![EncodedBatch::from(batch)],
        };

        Ok(MiniBatch {
            chunks,
            rolled_over: draw.rolled_over,
        })
    }

    /// Iterate over the rest of the current epoch.
    ///
    /// The iterator ends after the batch which rolls the epoch over, or after the
    /// first error.
    pub fn epoch_batches<'a>(
        &'a mut self,
        distributor: Option<&'a dyn Distributor>,
    ) -> EpochBatches<'a> {
        EpochBatches {
            dataset: self,
            distributor,
            done: false,
        }
    }
}

/// Iterator over one epoch of mini-batches; see [`DataSet::epoch_batches`].
pub struct EpochBatches<'a> {
    dataset: &'a mut DataSet,
    distributor: Option<&'a dyn Distributor>,
    done: bool,
}

impl Iterator for EpochBatches<'_> {
    type Item = CFResult<MiniBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.dataset.next_batch(None, self.distributor);
        self.done = match &result {
            Ok(batch) => batch.rolled_over,
            Err(_) => true,
        };
        Some(result)
    }
}
