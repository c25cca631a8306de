//! # Common Types

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{CFResult, CtcFeedError};

/// The element type of feature matrices.
pub type FeatureValue = f32;

/// The element type of label sequences.
///
/// Signed, so that [`LABEL_PAD`] can never collide with a vocabulary index.
pub type LabelId = i32;

/// Padding value for unused cells of a padded label tensor.
pub const LABEL_PAD: LabelId = -1;

/// Per-frame feature width of the TIMIT input features.
pub const TIMIT_INPUT_SIZE: usize = 123;

/// A corpus split.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Training split.
    Train,

    /// Development split.
    Dev,

    /// Evaluation split.
    Test,
}

impl Split {
    /// Parse a split name.
    ///
    /// ## Errors
    /// [`CtcFeedError::Configuration`] if `name` is not one of `train`, `dev`, `test`.
    pub fn parse(name: &str) -> CFResult<Self> {
        Split::from_str(name).map_err(|_| {
            CtcFeedError::Configuration(format!(
                "split is \"train\" or \"dev\" or \"test\"; got {name:?}"
            ))
        })
    }
}

/// Phone-label granularity.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PhoneVocab {
    /// The folded 39 phone set.
    Phone39,

    /// The 48 phone training set.
    Phone48,

    /// The full 61 phone set.
    #[default]
    Phone61,
}

impl PhoneVocab {
    /// Parse a phone vocabulary name.
    ///
    /// ## Errors
    /// [`CtcFeedError::Configuration`] for unknown names.
    pub fn parse(name: &str) -> CFResult<Self> {
        PhoneVocab::from_str(name).map_err(|_| {
            CtcFeedError::Configuration(format!(
                "phone vocabulary is \"phone39\" or \"phone48\" or \"phone61\"; got {name:?}"
            ))
        })
    }
}

/// Which of the two label sources a label sequence comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Character-level labels.
    Character,

    /// Phone-level labels, at the given granularity.
    Phone(PhoneVocab),
}

impl LabelKind {
    /// The corpus directory name for this label source.
    pub fn dir_name(&self) -> String {
        match self {
            LabelKind::Character => "character".to_string(),
            LabelKind::Phone(vocab) => vocab.to_string(),
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}
