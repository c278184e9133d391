//! Pipelines -- run a whole sweep and write it out.
//!
//! A sweep can be configured from the command line or from a TOML profile.
//! Both end up in [run_sweep], which owns the output file for the duration of the sweep.
use definitions::{SweepConfig, DEFAULT_SEED};
use serde::{Deserialize, Serialize};
extern crate log;
use log::*;
use shatter::{
    Error, GroupedWriter, OutputFormat, ResultSink, ShatteringEngine, Summarized,
};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// The configuration of the pipeline.
/// Every field except the sweep range has a default.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PipelineConfig {
    iterations: u32,
    segment_count_min: u32,
    segment_count_max: u32,
    #[serde(default)]
    group_results: bool,
    #[serde(default = "default_seed")]
    seed: u64,
    /// Output path. Standard output if none.
    output: Option<PathBuf>,
    /// One of csv, tsv, or json.
    #[serde(default = "default_format")]
    format: String,
    #[serde(default)]
    verbose: usize,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_format() -> String {
    "csv".to_string()
}

impl PipelineConfig {
    pub fn sweep_config(&self) -> shatter::Result<SweepConfig> {
        let config = SweepConfig::new(
            self.iterations,
            self.segment_count_min,
            self.segment_count_max,
            self.group_results,
        )?;
        Ok(config.with_seed(self.seed))
    }
    pub fn format(&self) -> shatter::Result<OutputFormat> {
        self.format.parse().map_err(Error::Profile)
    }
    pub fn verbose(&self) -> usize {
        self.verbose
    }
}

pub fn load_profile<P: AsRef<Path>>(path: P) -> shatter::Result<PipelineConfig> {
    let path = path.as_ref();
    let file = std::fs::read_to_string(path).map_err(|why| Error::io(why, path))?;
    toml::from_str(&file).map_err(|why| Error::Profile(why.to_string()))
}

pub fn init_logger(verbose: usize) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    if let Err(why) = env_logger::Builder::from_env(env).try_init() {
        debug!("{:?} Logger was already set.", why);
    }
}

pub fn run_pipeline(config: &PipelineConfig) -> shatter::Result<()> {
    init_logger(config.verbose);
    let sweep_config = config.sweep_config()?;
    let format = config.format()?;
    run_sweep(&sweep_config, config.output.as_deref(), format)
}

/// Run the sweep, streaming every run (or the grouped table) to `output`.
pub fn run_sweep(
    config: &SweepConfig,
    output: Option<&Path>,
    format: OutputFormat,
) -> shatter::Result<()> {
    let wtr: Box<dyn Write> = match output {
        Some(path) => {
            debug!("Opening {:?}", path);
            let file = std::fs::File::create(path).map_err(|why| Error::io(why, path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    let sink: Box<dyn ResultSink> = match (config.group_results, format.delimiter()) {
        (false, _) => format.sink(wtr),
        (true, Some(delimiter)) => Box::new(GroupedWriter::new(wtr, delimiter)),
        (true, None) => {
            warn!("Grouped results are written as CSV.");
            Box::new(GroupedWriter::new(wtr, b','))
        }
    };
    let mut engine = ShatteringEngine::with_sink(*config, Summarized::new(sink))?;
    let config = engine.config();
    info!(
        "SWEEP\t{}..={}\t{}\t{}\t{}",
        config.segment_count_min,
        config.segment_count_max,
        config.iterations,
        config.seed,
        config.total_runs(),
    );
    let outcome = engine.run_sweep();
    engine.sink().summary().log();
    outcome
}
