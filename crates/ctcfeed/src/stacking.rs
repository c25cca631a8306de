//! # Frame Stacking
//!
//! Stacking concatenates `num_stack` consecutive frames into one wider frame;
//! skipping advances the window by `num_skip` frames between output frames.
//!
//! A `(T, D)` feature matrix becomes `(ceil(T / num_skip), D * num_stack)`.
//! Windows which run off the end of the input are zero-filled.

use ndarray::{Array2, ArrayView2, s};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{CFResult, CtcFeedError},
    types::FeatureValue,
};

/// Stack/skip parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameStacking {
    /// The number of frames to stack.
    pub num_stack: usize,

    /// The number of frames to skip.
    pub num_skip: usize,
}

impl FrameStacking {
    /// Create new stacking parameters.
    ///
    /// ## Arguments
    /// * `num_stack` - frames concatenated into each output frame.
    /// * `num_skip` - input frames advanced per output frame.
    pub fn new(
        num_stack: usize,
        num_skip: usize,
    ) -> Self {
        Self {
            num_stack,
            num_skip,
        }
    }

    /// Check that both counts are positive.
    pub fn validate(&self) -> CFResult<()> {
        if self.num_stack == 0 || self.num_skip == 0 {
            return Err(CtcFeedError::Configuration(format!(
                "num_stack and num_skip must be >= 1; got {self:?}"
            )));
        }
        Ok(())
    }

    /// The number of output frames for `frames` input frames.
    pub fn stacked_len(
        &self,
        frames: usize,
    ) -> usize {
        frames.div_ceil(self.num_skip)
    }

    /// The output feature width for `input_size` wide input frames.
    pub fn stacked_width(
        &self,
        input_size: usize,
    ) -> usize {
        input_size * self.num_stack
    }
}

/// A frame stacking implementation.
///
/// Implementations must produce [`FrameStacking::stacked_width`] columns.
pub trait FrameStacker: Send + Sync {
    /// Stack the frames of one feature matrix.
    fn stack(
        &self,
        features: ArrayView2<FeatureValue>,
        stacking: FrameStacking,
    ) -> Array2<FeatureValue>;
}

/// The default [`FrameStacker`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipStacker;

impl FrameStacker for SkipStacker {
    fn stack(
        &self,
        features: ArrayView2<FeatureValue>,
        stacking: FrameStacking,
    ) -> Array2<FeatureValue> {
        let (frames, width) = features.dim();
        let mut stacked = Array2::zeros((
            stacking.stacked_len(frames),
            stacking.stacked_width(width),
        ));

        for (row, mut out) in stacked.outer_iter_mut().enumerate() {
            let start = row * stacking.num_skip;
            let end = (start + stacking.num_stack).min(frames);
            for (slot, t) in (start..end).enumerate() {
                out.slice_mut(s![slot * width..(slot + 1) * width])
                    .assign(&features.row(t));
            }
        }

        stacked
    }
}
