//! # Sparse Label Encoding
//!
//! CTC losses consume labels as a sparse tensor: the `(row, column)` coordinate
//! and value of every real label, plus the dense shape.

use ndarray::{Array2, ArrayView2};

use crate::types::{LABEL_PAD, LabelId};

/// A sparse view of a [`LABEL_PAD`]-padded label tensor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseLabels {
    /// `(row, column)` of each non-pad cell, in row-major order.
    pub indices: Vec<[usize; 2]>,

    /// The label at each coordinate in `indices`.
    pub values: Vec<LabelId>,

    /// `(rows, max_len)` of the dense tensor.
    pub dense_shape: [usize; 2],
}

impl SparseLabels {
    /// Encode a padded label tensor.
    pub fn encode(labels: ArrayView2<LabelId>) -> Self {
        let (indices, values): (Vec<[usize; 2]>, Vec<LabelId>) = labels
            .indexed_iter()
            .filter(|&(_, &v)| v != LABEL_PAD)
            .map(|((row, col), &v)| ([row, col], v))
            .unzip();

        Self {
            indices,
            values,
            dense_shape: [labels.nrows(), labels.ncols()],
        }
    }

    /// The number of stored labels.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// The number of labels in each row.
    pub fn row_lengths(&self) -> Vec<usize> {
        let mut lengths = vec![0; self.dense_shape[0]];
        for [row, _] in &self.indices {
            lengths[*row] += 1;
        }
        lengths
    }

    /// Rebuild the dense tensor; uncovered cells are [`LABEL_PAD`].
    pub fn to_dense(&self) -> Array2<LabelId> {
        let mut dense = Array2::from_elem((self.dense_shape[0], self.dense_shape[1]), LABEL_PAD);
        for ([row, col], &v) in self.indices.iter().zip(&self.values) {
            dense[[*row, *col]] = v;
        }
        dense
    }
}
