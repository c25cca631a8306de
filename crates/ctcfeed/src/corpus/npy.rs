//! # `.npy` Corpus Layout
//!
//! ```text
//! {root}/character/{split}/frame_num.json
//! {root}/character/{split}/input/{name}.npy
//! {root}/character/{split}/label/{name}.npy
//! {root}/{phone_vocab}/{split}/label/{name}.npy
//! ```
//!
//! Input features may be stored as `f32` or `f64`; labels as `i32` or `i64`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ndarray::{Array1, Array2};
use ndarray_npy::{ReadNpyError, read_npy};

use crate::{
    corpus::{CorpusSource, FrameCountIndex},
    errors::{CFResult, CtcFeedError},
    types::{FeatureValue, LabelId, LabelKind, Split},
};

/// File name of the per-split frame-count index.
pub const FRAME_INDEX_FILE: &str = "frame_num.json";

const NPY_EXTENSION: &str = "npy";

/// A [`CorpusSource`] over a directory of `.npy` files.
#[derive(Debug, Clone)]
pub struct NpyCorpus {
    root: PathBuf,
}

impl NpyCorpus {
    /// Open a corpus rooted at `root`.
    ///
    /// Does not check that the directory exists.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The corpus root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{kind}/{split}`
    pub fn split_dir(
        &self,
        kind: LabelKind,
        split: Split,
    ) -> PathBuf {
        self.root.join(kind.dir_name()).join(split.to_string())
    }

    /// The frame-count index path of a split.
    pub fn frame_index_path(
        &self,
        split: Split,
    ) -> PathBuf {
        self.split_dir(LabelKind::Character, split)
            .join(FRAME_INDEX_FILE)
    }

    /// The input feature path of an example.
    pub fn input_path(
        &self,
        split: Split,
        name: &str,
    ) -> PathBuf {
        self.split_dir(LabelKind::Character, split)
            .join("input")
            .join(format!("{name}.{NPY_EXTENSION}"))
    }

    /// The label path of an example.
    pub fn label_path(
        &self,
        split: Split,
        kind: LabelKind,
        name: &str,
    ) -> PathBuf {
        self.split_dir(kind, split)
            .join("label")
            .join(format!("{name}.{NPY_EXTENSION}"))
    }
}

fn is_wrong_dtype(err: &ReadNpyError) -> bool {
    matches!(err, ReadNpyError::WrongDescriptor(_))
}

impl CorpusSource for NpyCorpus {
    fn frame_counts(
        &self,
        split: Split,
    ) -> CFResult<FrameCountIndex> {
        let path = self.frame_index_path(split);
        log::debug!("reading frame index: {}", path.display());
        FrameCountIndex::load_json_path(path)
    }

    fn label_names(
        &self,
        split: Split,
        kind: LabelKind,
    ) -> CFResult<Vec<String>> {
        let dir = self.split_dir(kind, split).join("label");
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == NPY_EXTENSION)
                && let Some(stem) = path.file_stem()
            {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_features(
        &self,
        split: Split,
        name: &str,
    ) -> CFResult<Array2<FeatureValue>> {
        let path = self.input_path(split, name);
        match read_npy::<_, Array2<FeatureValue>>(&path) {
            Ok(features) => Ok(features),
            Err(err) if is_wrong_dtype(&err) => {
                let features: Array2<f64> = read_npy(&path)?;
                Ok(features.mapv(|x| x as FeatureValue))
            }
            Err(err) => Err(CtcFeedError::Npy(format!("{}: {err}", path.display()))),
        }
    }

    fn load_labels(
        &self,
        split: Split,
        kind: LabelKind,
        name: &str,
    ) -> CFResult<Vec<LabelId>> {
        let path = self.label_path(split, kind, name);
        match read_npy::<_, Array1<LabelId>>(&path) {
            Ok(labels) => Ok(labels.to_vec()),
            Err(err) if is_wrong_dtype(&err) => {
                let labels: Array1<i64> = read_npy(&path)?;
                labels
                    .iter()
                    .map(|&x| {
                        LabelId::try_from(x).map_err(|_| {
                            CtcFeedError::DataIntegrity(format!(
                                "{}: label {x} out of range",
                                path.display()
                            ))
                        })
                    })
                    .collect()
            }
            Err(err) => Err(CtcFeedError::Npy(format!("{}: {err}", path.display()))),
        }
    }
}
