//! Shatter -- null distributions of random fragment rejoining.
//!
//! A chromosome shattered into `N` fragments is rejoined end to end at random, many times,
//! and each outcome is reduced to a few counts (chain length, restored junctions, neighbors kept).
//! The counts tell how often chance alone reproduces the original order.
pub mod engine;
pub mod error;
pub mod segment;
pub mod sink;
pub mod summary;
pub use engine::ShatteringEngine;
pub use error::{Error, InvariantViolation, Result};
pub use sink::{Collector, DelimitedWriter, Discard, JsonLinesWriter, OutputFormat, ResultSink};
pub use summary::{GroupedWriter, Summarized, Summary};
