//! # Batch Assembly
//!
//! Pads a selection of examples into rectangular tensors.
//!
//! * features are zero-padded to the longest example in the batch;
//! * labels are [`LABEL_PAD`]-padded to the longest label sequence in the batch,
//!   per label type.
//!
//! All widths are batch-local; nothing is ever truncated.

use std::path::Path;

use ndarray::{Array2, Array3, ArrayView1, Axis, concatenate, s};

use crate::{
    corpus::{Example, SequenceStore},
    errors::{CFResult, CtcFeedError},
    types::{FeatureValue, LABEL_PAD, LabelId},
};

/// A padded mini-batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `(batch, max_frames, feature_dim)` zero-padded features.
    pub features: Array3<FeatureValue>,

    /// `(batch, max_char_len)` [`LABEL_PAD`]-padded character labels.
    pub char_labels: Array2<LabelId>,

    /// `(batch, max_phone_len)` [`LABEL_PAD`]-padded phone labels.
    pub phone_labels: Array2<LabelId>,

    /// The true frame count of each example.
    pub lengths: Vec<usize>,

    /// The name of each example.
    pub names: Vec<String>,
}

impl Batch {
    /// The number of examples.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Is the batch empty?
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// The padded frame count.
    pub fn max_frames(&self) -> usize {
        self.features.len_of(Axis(1))
    }

    /// The per-frame feature width.
    pub fn feature_dim(&self) -> usize {
        self.features.len_of(Axis(2))
    }

    /// Copy out the examples `start..end` along the batch axis.
    ///
    /// Padded widths are kept.
    pub fn slice_rows(
        &self,
        start: usize,
        end: usize,
    ) -> Batch {
        Batch {
            features: self.features.slice(s![start..end, .., ..]).to_owned(),
            char_labels: self.char_labels.slice(s![start..end, ..]).to_owned(),
            phone_labels: self.phone_labels.slice(s![start..end, ..]).to_owned(),
            lengths: self.lengths[start..end].to_vec(),
            names: self.names[start..end].to_vec(),
        }
    }

    /// Concatenate batches with matching padded widths along the batch axis.
    ///
    /// ## Errors
    /// [`CtcFeedError::InvalidBatch`] if `parts` is empty or the widths differ.
    pub fn concat(parts: &[Batch]) -> CFResult<Batch> {
        if parts.is_empty() {
            return Err(CtcFeedError::InvalidBatch(
                "cannot concatenate zero batches".to_string(),
            ));
        }
        let shape_err = |e: ndarray::ShapeError| CtcFeedError::InvalidBatch(e.to_string());

        let features: Vec<_> = parts.iter().map(|b| b.features.view()).collect();
        let char_labels: Vec<_> = parts.iter().map(|b| b.char_labels.view()).collect();
        let phone_labels: Vec<_> = parts.iter().map(|b| b.phone_labels.view()).collect();

        Ok(Batch {
            features: concatenate(Axis(0), &features).map_err(shape_err)?,
            char_labels: concatenate(Axis(0), &char_labels).map_err(shape_err)?,
            phone_labels: concatenate(Axis(0), &phone_labels).map_err(shape_err)?,
            lengths: parts.iter().flat_map(|b| b.lengths.iter().copied()).collect(),
            names: parts.iter().flat_map(|b| b.names.iter().cloned()).collect(),
        })
    }
}

/// Strip the directory and every extension from an example identifier.
///
/// `"dir/fadg0_si1279.npy"` becomes `"fadg0_si1279"`.
pub fn example_name(id: &str) -> &str {
    let base = Path::new(id)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(id);
    base.split('.').next().unwrap_or(base)
}

/// Builds padded [`Batch`]es from a [`SequenceStore`].
#[derive(Debug, Clone, Copy)]
pub struct BatchAssembler<'a> {
    store: &'a SequenceStore,
}

impl<'a> BatchAssembler<'a> {
    /// Create an assembler over `store`.
    pub fn new(store: &'a SequenceStore) -> Self {
        Self { store }
    }

    /// Assemble the examples at `indices`, in order.
    ///
    /// ## Errors
    /// [`CtcFeedError::InvalidBatch`] if `indices` is empty or out of range.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, indices)))]
    pub fn assemble(
        &self,
        indices: &[usize],
    ) -> CFResult<Batch> {
        if indices.is_empty() {
            return Err(CtcFeedError::InvalidBatch(
                "cannot assemble an empty batch".to_string(),
            ));
        }
        let examples: Vec<&Example> = indices
            .iter()
            .map(|&i| {
                self.store.get(i).ok_or_else(|| {
                    CtcFeedError::InvalidBatch(format!(
                        "index {i} out of range for {} examples",
                        self.store.len()
                    ))
                })
            })
            .collect::<CFResult<_>>()?;

        let max_frames = max_of(&examples, Example::frame_count);
        let max_char_len = max_of(&examples, |e| e.char_labels().len());
        let max_phone_len = max_of(&examples, |e| e.phone_labels().len());

        let n = examples.len();
        let mut features = Array3::<FeatureValue>::zeros((n, max_frames, self.store.feature_dim()));
        let mut char_labels = Array2::from_elem((n, max_char_len), LABEL_PAD);
        let mut phone_labels = Array2::from_elem((n, max_phone_len), LABEL_PAD);
        let mut lengths = Vec::with_capacity(n);
        let mut names = Vec::with_capacity(n);

        for (pos, example) in examples.iter().enumerate() {
            let frames = example.frame_count();
            features
                .slice_mut(s![pos, ..frames, ..])
                .assign(example.features());

            let chars = example.char_labels();
            char_labels
                .slice_mut(s![pos, ..chars.len()])
                .assign(&ArrayView1::from(chars));

            let phones = example.phone_labels();
            phone_labels
                .slice_mut(s![pos, ..phones.len()])
                .assign(&ArrayView1::from(phones));

            lengths.push(frames);
            names.push(example_name(example.name()).to_string());
        }

        log::trace!(
            "assembled batch: n={n} max_frames={max_frames} max_char_len={max_char_len} max_phone_len={max_phone_len}"
        );

        Ok(Batch {
            features,
            char_labels,
            phone_labels,
            lengths,
            names,
        })
    }
}

fn max_of<F>(
    examples: &[&Example],
    f: F,
) -> usize
where
    F: Fn(&Example) -> usize,
{
    examples.iter().map(|e| f(e)).max().unwrap_or(0)
}
