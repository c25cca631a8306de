use std::io::Write;

use ctcfeed::{DataSet, corpus::Example};

use crate::{corpus_args::CorpusArgs, input_output::OutputArgs, logging::LogArgs};

/// Args for the stats command.
#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    #[clap(flatten)]
    pub logging: LogArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl StatsArgs {
    /// Run the stats command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let options = self.corpus.options(1)?;
        let dataset = DataSet::load(options, &self.corpus.corpus())?;
        let examples = dataset.store().examples();

        let mut writer = self.output.open_writer()?;
        writeln!(writer, "options: {}", serde_json::to_string(dataset.options())?)?;
        writeln!(writer, "examples: {}", examples.len())?;
        writeln!(writer, "feature_dim: {}", dataset.feature_dim())?;
        writeln!(writer, "frames: {}", Summary::of(examples, Example::frame_count))?;
        writeln!(
            writer,
            "char_labels: {}",
            Summary::of(examples, |e| e.char_labels().len())
        )?;
        writeln!(
            writer,
            "phone_labels: {}",
            Summary::of(examples, |e| e.phone_labels().len())
        )?;
        writer.flush()?;

        Ok(())
    }
}

/// Length statistics over a set of examples.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Summary {
    total: usize,
    min: usize,
    max: usize,
    mean: f64,
}

impl Summary {
    fn of<F>(
        examples: &[Example],
        f: F,
    ) -> Self
    where
        F: Fn(&Example) -> usize,
    {
        let lengths: Vec<usize> = examples.iter().map(f).collect();
        let total: usize = lengths.iter().sum();
        Self {
            total,
            min: lengths.iter().copied().min().unwrap_or(0),
            max: lengths.iter().copied().max().unwrap_or(0),
            mean: if lengths.is_empty() {
                0.0
            } else {
                total as f64 / lengths.len() as f64
            },
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "total={} min={} max={} mean={:.1}",
            self.total, self.min, self.max, self.mean
        )
    }
}
