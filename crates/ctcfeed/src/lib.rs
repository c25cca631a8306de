//! # `ctcfeed` CTC Mini-Batch Suite
//!
//! Mini-batch construction for multitask CTC speech training.
//!
//! A [`DataSet`] loads one corpus split (features plus character and phone
//! labels) into memory, and hands out padded mini-batches with sparse-encoded
//! labels, epoch after epoch.
//!
//! See:
//! * [`corpus`] to read corpora, and load them into a [`corpus::SequenceStore`].
//! * [`stacking`] to stack and skip feature frames.
//! * [`sampling`] for epoch bookkeeping and batch index selection.
//! * [`assembly`] to pad examples into batch tensors.
//! * [`sparse`] for the sparse label encoding.
//! * [`distribute`] to split batches across workers.
//!
//! ## Crate Features
//!
//! #### feature: ``default``
//!
//! * ``rayon``
//!
//! #### feature: ``rayon``
//!
//! This enables parallel frame stacking at load time using the ``rayon`` crate.
//!
//! #### feature: ``tracing``
//!
//! This enables a number of ``tracing`` instrumentation points.
//! This is only useful for timing tracing of the library itself.
//!
//! ## Corpus Layout
//!
//! ```text
//! {root}/character/{split}/frame_num.json
//! {root}/character/{split}/input/{name}.npy
//! {root}/character/{split}/label/{name}.npy
//! {root}/{phone61,phone48,phone39}/{split}/label/{name}.npy
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use ctcfeed::{
//!     DataSetOptions,
//!     corpus::NpyCorpus,
//!     distribute::ChunkDistributor,
//!     stacking::FrameStacking,
//!     types::{PhoneVocab, Split},
//! };
//!
//! fn example() -> ctcfeed::CFResult<()> {
//!     let corpus = NpyCorpus::new("/data/timit/ctc");
//!     let mut train = DataSetOptions::new(Split::Train, PhoneVocab::Phone39, 64)
//!         .with_stacking(Some(FrameStacking::new(3, 2)))
//!         .with_num_workers(2)
//!         .with_show_progress(true)
//!         .init(&corpus)?;
//!
//!     let batch = train.next_batch(None, Some(&ChunkDistributor))?;
//!     assert_eq!(batch.num_chunks(), 2);
//!     Ok(())
//! }
//! ```
#![warn(missing_docs, unused)]

pub mod assembly;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod distribute;
pub mod errors;
pub mod sampling;
pub mod sparse;
pub mod stacking;
pub mod types;

#[doc(inline)]
pub use config::DataSetOptions;
#[doc(inline)]
pub use dataset::{DataSet, EncodedBatch, EpochBatches, MiniBatch};
#[doc(inline)]
pub use errors::{CFResult, CtcFeedError};
