//! Destinations of [RunResult]s.
//! A sink is owned by the engine during a sweep. Its failures never stop the simulation.
use definitions::{RunResult, RESULT_COLUMNS};
use std::io::Write;

pub trait ResultSink {
    fn write_header(&mut self) -> std::io::Result<()> {
        Ok(())
    }
    fn append(&mut self, result: &RunResult) -> std::io::Result<()>;
    /// Flush and release. Called once at the end of a sweep, even an aborted one.
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<T: ResultSink + ?Sized> ResultSink for Box<T> {
    fn write_header(&mut self) -> std::io::Result<()> {
        (**self).write_header()
    }
    fn append(&mut self, result: &RunResult) -> std::io::Result<()> {
        (**self).append(result)
    }
    fn close(&mut self) -> std::io::Result<()> {
        (**self).close()
    }
}

/// No sink at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl ResultSink for Discard {
    fn append(&mut self, _: &RunResult) -> std::io::Result<()> {
        Ok(())
    }
}

/// Keep everything in memory.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    results: Vec<RunResult>,
    closed: bool,
}

impl Collector {
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
    pub fn into_results(self) -> Vec<RunResult> {
        self.results
    }
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ResultSink for Collector {
    fn append(&mut self, result: &RunResult) -> std::io::Result<()> {
        self.results.push(*result);
        Ok(())
    }
    fn close(&mut self) -> std::io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn delimiter(&self) -> Option<u8> {
        match self {
            OutputFormat::Csv => Some(b','),
            OutputFormat::Tsv => Some(b'\t'),
            OutputFormat::Json => None,
        }
    }
    /// Build a sink writing in this format into `wtr`.
    pub fn sink<W: Write + 'static>(&self, wtr: W) -> Box<dyn ResultSink> {
        match self.delimiter() {
            Some(delimiter) => Box::new(DelimitedWriter::new(wtr, delimiter)),
            None => Box::new(JsonLinesWriter::new(wtr)),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            _ => Err(format!("{} is not a supported format", s)),
        }
    }
}

impl std::default::Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Csv
    }
}

/// Header row, then one delimited row per run.
#[derive(Debug)]
pub struct DelimitedWriter<W: Write> {
    wtr: W,
    delimiter: u8,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(wtr: W, delimiter: u8) -> Self {
        Self { wtr, delimiter }
    }
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

/// Write one delimited line.
pub(crate) fn write_row<W: Write, D: std::fmt::Display>(
    wtr: &mut W,
    delimiter: u8,
    fields: &[D],
) -> std::io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            wtr.write_all(&[delimiter])?;
        }
        write!(wtr, "{}", field)?;
    }
    writeln!(wtr)
}

impl<W: Write> ResultSink for DelimitedWriter<W> {
    fn write_header(&mut self) -> std::io::Result<()> {
        write_row(&mut self.wtr, self.delimiter, &RESULT_COLUMNS)
    }
    fn append(&mut self, result: &RunResult) -> std::io::Result<()> {
        write_row(&mut self.wtr, self.delimiter, &result.fields())
    }
    fn close(&mut self) -> std::io::Result<()> {
        self.wtr.flush()
    }
}

/// One JSON object per line.
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    wtr: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(wtr: W) -> Self {
        Self { wtr }
    }
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: Write> ResultSink for JsonLinesWriter<W> {
    fn append(&mut self, result: &RunResult) -> std::io::Result<()> {
        serde_json::ser::to_writer(&mut self.wtr, result)?;
        writeln!(self.wtr)
    }
    fn close(&mut self) -> std::io::Result<()> {
        self.wtr.flush()
    }
}
