#![allow(missing_docs)]

use std::{fs, path::Path};

use ctcfeed::{
    CtcFeedError,
    DataSetOptions,
    MiniBatch,
    corpus::{FRAME_INDEX_FILE, NpyCorpus},
    distribute::ChunkDistributor,
    sampling::ShufflePolicy,
    stacking::FrameStacking,
    types::{LABEL_PAD, LabelKind, PhoneVocab, Split},
};
use ndarray::{Array1, Array2, s};
use ndarray_npy::write_npy;
use tempdir::TempDir;

const INPUT_SIZE: usize = 6;

/// `(name, frames, char_len, phone_len)`
const UTTERANCES: &[(&str, usize, usize, usize)] = &[
    ("fadg0_si1279", 12, 5, 7),
    ("faks0_sa1", 7, 3, 4),
    ("fcjf0_sx307", 20, 9, 11),
    ("mdab0_si1039", 3, 1, 2),
    ("mjsw0_sa2", 16, 6, 3),
    ("mreb0_sx205", 9, 4, 6),
];

fn write_corpus(
    root: &Path,
    split: Split,
    vocab: PhoneVocab,
) -> NpyCorpus {
    let corpus = NpyCorpus::new(root);
    let phone = LabelKind::Phone(vocab);

    let input_dir = corpus.split_dir(LabelKind::Character, split).join("input");
    fs::create_dir_all(&input_dir).unwrap();
    for kind in [LabelKind::Character, phone] {
        fs::create_dir_all(corpus.split_dir(kind, split).join("label")).unwrap();
    }

    let mut index = serde_json::Map::new();
    for (i, &(name, frames, char_len, phone_len)) in UTTERANCES.iter().enumerate() {
        let features =
            Array2::from_shape_fn((frames, INPUT_SIZE), |(t, d)| (i * 1000 + t * 10 + d) as f32);
        write_npy(corpus.input_path(split, name), &features).unwrap();

        let chars = Array1::from_shape_fn(char_len, |c| ((i + c) % 28) as i32);
        write_npy(corpus.label_path(split, LabelKind::Character, name), &chars).unwrap();

        let phones = Array1::from_shape_fn(phone_len, |c| ((i * 3 + c) % 61) as i64);
        write_npy(corpus.label_path(split, phone, name), &phones).unwrap();

        index.insert(name.to_string(), frames.into());
    }
    fs::write(
        corpus
            .split_dir(LabelKind::Character, split)
            .join(FRAME_INDEX_FILE),
        serde_json::to_string(&index).unwrap(),
    )
    .unwrap();

    corpus
}

fn utterance(name: &str) -> (usize, usize, usize) {
    UTTERANCES
        .iter()
        .find(|(n, ..)| *n == name)
        .map(|&(_, f, c, p)| (f, c, p))
        .unwrap()
}

#[test]
fn test_sorted_epoch_from_disk() {
    TempDir::new("ctcfeed_sorted")
        .map(|dir| {
            let corpus = write_corpus(dir.path(), Split::Train, PhoneVocab::Phone61);
            let mut dataset = DataSetOptions::new(Split::Train, PhoneVocab::Phone61, 4)
                .with_input_size(INPUT_SIZE)
                .with_seed(Some(3))
                .init(&corpus)
                .unwrap();
            assert_eq!(dataset.len(), UTTERANCES.len());

            let batches: Vec<MiniBatch> = dataset
                .epoch_batches(None)
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(batches.len(), 2);
            assert!(!batches[0].rolled_over);
            assert!(batches[1].rolled_over);

            let first = batches[0].clone().into_single().unwrap();
            let mut lengths = first.lengths.clone();
            lengths.sort();
            assert_eq!(lengths, vec![3, 7, 9, 12]);
            assert_eq!(first.features.dim(), (4, 12, INPUT_SIZE));

            for (pos, name) in first.names.iter().enumerate() {
                let (frames, char_len, phone_len) = utterance(name);
                assert_eq!(first.lengths[pos], frames);
                assert!(
                    first
                        .features
                        .slice(s![pos, frames.., ..])
                        .iter()
                        .all(|&x| x == 0.0)
                );

                let chars = first.char_labels.to_dense();
                assert!(chars.slice(s![pos, ..char_len]).iter().all(|&x| x != LABEL_PAD));
                assert!(chars.slice(s![pos, char_len..]).iter().all(|&x| x == LABEL_PAD));
                assert_eq!(first.phone_labels.row_lengths()[pos], phone_len);
            }

            let second = &batches[1].chunks[0];
            let mut names = second.names.clone();
            names.sort();
            assert_eq!(names, vec!["fcjf0_sx307", "mjsw0_sa2"]);
            assert_eq!(dataset.epoch(), 1);
        })
        .unwrap();
}

#[test]
fn test_random_epochs_cover_corpus() {
    TempDir::new("ctcfeed_random")
        .map(|dir| {
            let corpus = write_corpus(dir.path(), Split::Dev, PhoneVocab::Phone39);
            let mut dataset = DataSetOptions::new(Split::Dev, PhoneVocab::Phone39, 4)
                .with_input_size(INPUT_SIZE)
                .with_sorted(false)
                .with_seed(Some(17))
                .init(&corpus)
                .unwrap();

            for epoch in 0..3 {
                let mut names: Vec<String> = dataset
                    .epoch_batches(None)
                    .flat_map(|b| b.unwrap().chunks)
                    .flat_map(|c| c.names)
                    .collect();
                names.sort();

                let mut expected: Vec<&str> = UTTERANCES.iter().map(|u| u.0).collect();
                expected.sort();
                assert_eq!(names, expected);
                assert_eq!(dataset.epoch(), epoch + 1);
            }
        })
        .unwrap();
}

#[test]
fn test_stacked_workers() {
    TempDir::new("ctcfeed_stacked")
        .map(|dir| {
            let corpus = write_corpus(dir.path(), Split::Test, PhoneVocab::Phone48);
            let mut dataset = DataSetOptions::new(Split::Test, PhoneVocab::Phone48, 6)
                .with_input_size(INPUT_SIZE)
                .with_stacking(Some(FrameStacking::new(3, 3)))
                .with_num_workers(3)
                .with_shuffle_policy(ShufflePolicy::Never)
                .init(&corpus)
                .unwrap();
            assert_eq!(dataset.feature_dim(), 3 * INPUT_SIZE);

            let batch = dataset.next_batch(None, Some(&ChunkDistributor)).unwrap();
            assert!(batch.rolled_over);
            assert_eq!(batch.num_chunks(), 3);

            // Frames 3, 7, 9, 12, 16, 20 stack to 1, 3, 3, 4, 6, 7.
            let lengths: Vec<usize> = batch
                .chunks
                .iter()
                .flat_map(|c| c.lengths.iter().copied())
                .collect();
            assert_eq!(lengths, vec![1, 3, 3, 4, 6, 7]);

            for chunk in &batch.chunks {
                assert_eq!(chunk.len(), 2);
                assert_eq!(chunk.features.dim(), (2, 7, 3 * INPUT_SIZE));
            }

            // The first stacked frame of "mdab0_si1039" is its frames 0, 1, 2.
            let first = &batch.chunks[0];
            assert_eq!(first.names[0], "mdab0_si1039");
            let row: Vec<f32> = first.features.slice(s![0, 0, ..]).to_vec();
            let expected: Vec<f32> = (0..3)
                .flat_map(|t| (0..INPUT_SIZE).map(move |d| (3000 + t * 10 + d) as f32))
                .collect();
            assert_eq!(row, expected);
        })
        .unwrap();
}

#[test]
fn test_missing_phone_labels() {
    TempDir::new("ctcfeed_missing")
        .map(|dir| {
            let corpus = write_corpus(dir.path(), Split::Train, PhoneVocab::Phone61);
            fs::remove_file(corpus.label_path(
                Split::Train,
                LabelKind::Phone(PhoneVocab::Phone61),
                "faks0_sa1",
            ))
            .unwrap();

            let err = DataSetOptions::new(Split::Train, PhoneVocab::Phone61, 2)
                .with_input_size(INPUT_SIZE)
                .init(&corpus)
                .unwrap_err();
            assert!(matches!(err, CtcFeedError::DataIntegrity(_)), "{err}");

            // A vocabulary which was never written fails on the label listing.
            let err = DataSetOptions::new(Split::Train, PhoneVocab::Phone39, 2)
                .with_input_size(INPUT_SIZE)
                .init(&corpus)
                .unwrap_err();
            assert!(matches!(err, CtcFeedError::Io(_)), "{err}");
        })
        .unwrap();
}
