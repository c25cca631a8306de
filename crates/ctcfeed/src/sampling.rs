//! # Epoch Sampling
//!
//! An [`EpochState`] holds the example indices not yet drawn in the current
//! epoch. A [`Sampler`] removes batches of indices from it; when no more than
//! one batch remains, the rest is drawn as a final (possibly undersized) batch
//! and the state rolls over to the full index set.
//!
//! * [`SortedSampler`] draws the lowest remaining indices; over a length-sorted
//!   store these are the shortest remaining examples.
//! * [`RandomSampler`] draws a uniform sample without replacement.

use std::collections::BTreeSet;

use rand::{RngCore, seq::SliceRandom, seq::index};
use serde::{Deserialize, Serialize};

/// Indices not yet drawn in the current epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochState {
    remaining: BTreeSet<usize>,
    total: usize,
    epoch: usize,
}

impl EpochState {
    /// A fresh state over `[0, total)`.
    pub fn new(total: usize) -> Self {
        Self {
            remaining: (0..total).collect(),
            total,
            epoch: 0,
        }
    }

    /// The size of the full index set.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The number of completed epochs.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// The number of indices not yet drawn.
    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// The undrawn indices, ascending.
    pub fn remaining(&self) -> impl Iterator<Item = usize> + '_ {
        self.remaining.iter().copied()
    }

    /// Restart the current epoch without counting it as completed.
    pub fn reset(&mut self) {
        self.remaining = (0..self.total).collect();
    }

    /// Take everything left, and roll over to the next epoch.
    fn drain_and_roll_over(&mut self) -> Vec<usize> {
        let rest = core::mem::replace(&mut self.remaining, (0..self.total).collect());
        self.epoch += 1;
        rest.into_iter().collect()
    }
}

/// Sampling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingMode {
    /// Ascending index order.
    Sorted,

    /// Uniform random sampling without replacement.
    Random,
}

/// When to shuffle the order of indices within a drawn batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShufflePolicy {
    /// Sorted mode shuffles every batch; random mode only shuffles the final
    /// batch of an epoch, as its other batches are already in sampled order.
    #[default]
    Inherited,

    /// Shuffle every batch.
    Always,

    /// Keep the selection order.
    Never,
}

impl ShufflePolicy {
    /// Should a batch drawn in `mode` be shuffled?
    pub fn shuffles(
        &self,
        mode: SamplingMode,
        rolled_over: bool,
    ) -> bool {
        match self {
            ShufflePolicy::Inherited => match mode {
                SamplingMode::Sorted => true,
                SamplingMode::Random => rolled_over,
            },
            ShufflePolicy::Always => true,
            ShufflePolicy::Never => false,
        }
    }
}

/// The result of [`Sampler::draw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    /// The drawn indices, in batch order.
    pub indices: Vec<usize>,

    /// Did this draw exhaust the epoch?
    pub rolled_over: bool,
}

/// Batch index selection over an [`EpochState`].
pub trait Sampler: core::fmt::Debug + Send + Sync {
    /// The sampling mode.
    fn mode(&self) -> SamplingMode;

    /// Remove exactly `batch_size` indices from `state`.
    ///
    /// Only called when `state.remaining_len() > batch_size`.
    fn take(
        &self,
        state: &mut EpochState,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<usize>;

    /// Draw the next batch of indices.
    ///
    /// ## Arguments
    /// * `state` - the epoch state to draw from.
    /// * `batch_size` - the requested batch size.
    /// * `policy` - the within-batch shuffle policy.
    /// * `rng` - the random source.
    ///
    /// ## Returns
    /// The drawn indices; and whether the epoch rolled over.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, state, rng)))]
    fn draw(
        &self,
        state: &mut EpochState,
        batch_size: usize,
        policy: ShufflePolicy,
        rng: &mut dyn RngCore,
    ) -> Draw {
        let (mut indices, rolled_over) = if state.remaining_len() > batch_size {
            (self.take(state, batch_size, rng), false)
        } else {
            (state.drain_and_roll_over(), true)
        };

        if policy.shuffles(self.mode(), rolled_over) {
            indices.shuffle(rng);
        }

        log::trace!(
            "drew {} indices ({:?}); {} remaining",
            indices.len(),
            self.mode(),
            state.remaining_len()
        );

        Draw {
            indices,
            rolled_over,
        }
    }
}

/// Draws the lowest remaining indices.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortedSampler;

impl Sampler for SortedSampler {
    fn mode(&self) -> SamplingMode {
        SamplingMode::Sorted
    }

    fn take(
        &self,
        state: &mut EpochState,
        batch_size: usize,
        _rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        (0..batch_size)
            .filter_map(|_| state.remaining.pop_first())
            .collect()
    }
}

/// Draws a uniform random sample of the remaining indices.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn mode(&self) -> SamplingMode {
        SamplingMode::Random
    }

    fn take(
        &self,
        state: &mut EpochState,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        let pool: Vec<usize> = state.remaining().collect();
        let picked: Vec<usize> = index::sample(rng, pool.len(), batch_size)
            .into_iter()
            .map(|i| pool[i])
            .collect();

        for idx in &picked {
            state.remaining.remove(idx);
        }
        picked
    }
}

/// Build the [`Sampler`] for a mode.
pub fn sampler_for(mode: SamplingMode) -> Box<dyn Sampler> {
    match mode {
        SamplingMode::Sorted => Box::new(SortedSampler),
        SamplingMode::Random => Box::new(RandomSampler),
    }
}
