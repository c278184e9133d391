//! Aggregation of run results, per fragment count.
//! This is where `group_results` takes effect; the engine itself never aggregates.
use crate::sink::{write_row, ResultSink};
use definitions::RunResult;
use log::*;
use std::collections::BTreeMap;
use std::io::Write;

pub const GROUPED_COLUMNS: [&str; 5] = [
    "SegCount",
    "SegsLinked",
    "ExactMatches",
    "AdjacentSegs",
    "Frequency",
];

/// Running sums over the runs of one fragment count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregate {
    pub runs: u64,
    pub linked_sum: u64,
    pub exact_sum: u64,
    pub adjacent_sum: u64,
    /// Runs with at least one exact match.
    pub with_exact: u64,
    /// Runs whose chain incorporates every fragment.
    pub spanning: u64,
}

impl Aggregate {
    pub fn add(&mut self, result: &RunResult) {
        self.runs += 1;
        self.linked_sum += result.linked_segments as u64;
        self.exact_sum += result.exact_matches as u64;
        self.adjacent_sum += result.adjacent_segments as u64;
        self.with_exact += (result.exact_matches > 0) as u64;
        self.spanning += result.spans_all_segments() as u64;
    }
    fn mean(&self, sum: u64) -> f64 {
        match self.runs {
            0 => 0f64,
            runs => sum as f64 / runs as f64,
        }
    }
    pub fn mean_linked(&self) -> f64 {
        self.mean(self.linked_sum)
    }
    pub fn mean_exact(&self) -> f64 {
        self.mean(self.exact_sum)
    }
    pub fn mean_adjacent(&self) -> f64 {
        self.mean(self.adjacent_sum)
    }
    pub fn exact_match_rate(&self) -> f64 {
        self.mean(self.with_exact)
    }
    pub fn spanning_rate(&self) -> f64 {
        self.mean(self.spanning)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    per_count: BTreeMap<u32, Aggregate>,
}

impl Summary {
    pub fn from_results(results: &[RunResult]) -> Self {
        let mut summary = Self::default();
        results.iter().for_each(|r| summary.add(r));
        summary
    }
    pub fn add(&mut self, result: &RunResult) {
        self.per_count
            .entry(result.segments)
            .or_default()
            .add(result);
    }
    pub fn get(&self, segments: u32) -> Option<&Aggregate> {
        self.per_count.get(&segments)
    }
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Aggregate)> + '_ {
        self.per_count.iter().map(|(&n, agg)| (n, agg))
    }
    pub fn log(&self) {
        for (segments, agg) in self.iter() {
            info!(
                "SUMMARY\t{}\t{}\t{:.3}\t{:.3}\t{:.3}\t{:.4}\t{:.4}",
                segments,
                agg.runs,
                agg.mean_linked(),
                agg.mean_exact(),
                agg.mean_adjacent(),
                agg.exact_match_rate(),
                agg.spanning_rate(),
            );
        }
    }
}

/// (SegCount, SegsLinked, ExactMatches, AdjacentSegs)
pub type GroupKey = (u32, u32, u32, u32);

fn group_key(result: &RunResult) -> GroupKey {
    (
        result.segments,
        result.linked_segments,
        result.exact_matches,
        result.adjacent_segments,
    )
}

/// Count the runs sharing identical statistics, in ascending order of the statistics.
pub fn group_results(results: &[RunResult]) -> Vec<(GroupKey, u64)> {
    let mut counts: BTreeMap<GroupKey, u64> = BTreeMap::new();
    for result in results {
        *counts.entry(group_key(result)).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Sink writing the grouped table once the sweep is over.
#[derive(Debug)]
pub struct GroupedWriter<W: Write> {
    wtr: W,
    delimiter: u8,
    counts: BTreeMap<GroupKey, u64>,
}

impl<W: Write> GroupedWriter<W> {
    pub fn new(wtr: W, delimiter: u8) -> Self {
        Self {
            wtr,
            delimiter,
            counts: BTreeMap::new(),
        }
    }
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: Write> ResultSink for GroupedWriter<W> {
    fn write_header(&mut self) -> std::io::Result<()> {
        write_row(&mut self.wtr, self.delimiter, &GROUPED_COLUMNS)
    }
    fn append(&mut self, result: &RunResult) -> std::io::Result<()> {
        *self.counts.entry(group_key(result)).or_default() += 1;
        Ok(())
    }
    fn close(&mut self) -> std::io::Result<()> {
        let counts = std::mem::take(&mut self.counts);
        for ((segs, linked, exact, adjacent), freq) in counts {
            let row = [segs as u64, linked as u64, exact as u64, adjacent as u64, freq];
            write_row(&mut self.wtr, self.delimiter, &row)?;
        }
        self.wtr.flush()
    }
}

/// Forward everything to `inner` while keeping a [Summary].
#[derive(Debug)]
pub struct Summarized<S: ResultSink> {
    inner: S,
    summary: Summary,
}

impl<S: ResultSink> Summarized<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            summary: Summary::default(),
        }
    }
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
    pub fn into_parts(self) -> (S, Summary) {
        (self.inner, self.summary)
    }
}

impl<S: ResultSink> ResultSink for Summarized<S> {
    fn write_header(&mut self) -> std::io::Result<()> {
        self.inner.write_header()
    }
    fn append(&mut self, result: &RunResult) -> std::io::Result<()> {
        self.summary.add(result);
        self.inner.append(result)
    }
    fn close(&mut self) -> std::io::Result<()> {
        self.inner.close()
    }
}
