//! # Corpus Loading
//!
//! * [`CorpusSource`] - access to features and labels by example name.
//!   * [`NpyCorpus`] - the on-disk `.npy` layout.
//!   * [`MemoryCorpus`] - an in-memory corpus.
//! * [`SequenceStore`] - a split, loaded (and optionally stacked) into memory.

mod index;
mod npy;
mod source;
mod store;

#[doc(inline)]
pub use index::FrameCountIndex;
#[doc(inline)]
pub use npy::{FRAME_INDEX_FILE, NpyCorpus};
#[doc(inline)]
pub use source::{CorpusSource, MemoryCorpus};
#[doc(inline)]
pub use store::{Example, SequenceStore};
