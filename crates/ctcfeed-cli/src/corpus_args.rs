use ctcfeed::{
    DataSetOptions,
    corpus::NpyCorpus,
    stacking::FrameStacking,
    types::{PhoneVocab, Split, TIMIT_INPUT_SIZE},
};

/// Corpus selection arg group.
#[derive(clap::Args, Debug)]
pub struct CorpusArgs {
    /// Corpus root directory.
    #[arg(long)]
    root: String,

    /// Corpus split: train, dev, or test.
    #[arg(long, default_value = "train")]
    split: String,

    /// Phone vocabulary: phone61, phone48, or phone39.
    #[arg(long, default_value = "phone61")]
    phone: String,

    /// Number of frames to stack.
    #[arg(long, default_value = None)]
    stack: Option<usize>,

    /// Number of frames to skip between stacked frames.
    #[arg(long, default_value = None)]
    skip: Option<usize>,

    /// Per-frame input feature width.
    #[arg(long, default_value_t = TIMIT_INPUT_SIZE)]
    input_size: usize,

    /// Show a progress bar while loading.
    #[arg(long)]
    progress: bool,
}

impl CorpusArgs {
    /// The on-disk corpus.
    pub fn corpus(&self) -> NpyCorpus {
        NpyCorpus::new(&self.root)
    }

    /// The frame stacking, if either `--stack` or `--skip` was given.
    pub fn stacking(&self) -> Option<FrameStacking> {
        match (self.stack, self.skip) {
            (None, None) => None,
            (stack, skip) => Some(FrameStacking::new(
                stack.unwrap_or(1),
                skip.unwrap_or(1),
            )),
        }
    }

    /// Data set options for this corpus selection.
    pub fn options(
        &self,
        batch_size: usize,
    ) -> Result<DataSetOptions, Box<dyn std::error::Error>> {
        let options = DataSetOptions::new(
            Split::parse(&self.split)?,
            PhoneVocab::parse(&self.phone)?,
            batch_size,
        )
        .with_stacking(self.stacking())
        .with_input_size(self.input_size)
        .with_show_progress(self.progress);

        options.validate()?;
        Ok(options)
    }
}
