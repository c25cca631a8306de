use std::io::Write;

use ctcfeed::{DataSet, EncodedBatch, distribute::ChunkDistributor};

use crate::{corpus_args::CorpusArgs, input_output::OutputArgs, logging::LogArgs};

/// Args for the epoch command.
#[derive(clap::Args, Debug)]
pub struct EpochArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Mini-batch size; must be divisible by `--workers`.
    #[arg(long, default_value = "32")]
    batch_size: usize,

    /// Number of workers to split each batch across.
    #[arg(long, default_value = "1")]
    workers: usize,

    /// Number of epochs to walk.
    #[arg(long, default_value = "1")]
    epochs: usize,

    /// Draw batches at random, rather than in ascending length order.
    #[arg(long)]
    random: bool,

    /// RNG seed.
    #[arg(long, default_value = None)]
    seed: Option<u64>,

    #[clap(flatten)]
    pub logging: LogArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl EpochArgs {
    /// Run the epoch command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let options = self
            .corpus
            .options(self.batch_size)?
            .with_num_workers(self.workers)
            .with_sorted(!self.random)
            .with_seed(self.seed);

        let mut dataset = DataSet::load(options, &self.corpus.corpus())?;
        log::info!(
            "{} examples; feature_dim={}",
            dataset.len(),
            dataset.feature_dim()
        );

        let mut writer = self.output.open_writer()?;
        for epoch in 0..self.epochs {
            for (idx, batch) in dataset
                .epoch_batches(Some(&ChunkDistributor))
                .enumerate()
            {
                let batch = batch?;
                for (chunk_idx, chunk) in batch.chunks.iter().enumerate() {
                    writeln!(
                        writer,
                        "epoch={epoch} batch={idx} chunk={chunk_idx} {}",
                        describe(chunk)
                    )?;
                }
            }
        }
        writer.flush()?;

        Ok(())
    }
}

/// One line describing a batch chunk.
fn describe(chunk: &EncodedBatch) -> String {
    let (batch, frames, dim) = chunk.features.dim();
    format!(
        "features={batch}x{frames}x{dim} char_labels={} phone_labels={} lengths={:?} names={}",
        describe_sparse(&chunk.char_labels),
        describe_sparse(&chunk.phone_labels),
        chunk.lengths,
        chunk.names.join(","),
    )
}

fn describe_sparse(labels: &ctcfeed::sparse::SparseLabels) -> String {
    let [rows, cols] = labels.dense_shape;
    format!("{rows}x{cols}/{}", labels.nnz())
}
