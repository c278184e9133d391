use definitions::ConfigError;
use std::path::PathBuf;

/// Errors raised by the shattering simulator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid sweep configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("profile parsing error: {0}")]
    Profile(String),
}

impl Error {
    /// Convenience for wrapping an `io::Error` with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Broken bookkeeping inside an iteration. Every one of them is a logic defect,
/// so the sweep stops at the first occurrence and never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("a pair was requested with only {remaining} open ends")]
    ExhaustedEnds { remaining: usize },
    #[error("no open end at logical index {index} ({remaining} open ends)")]
    UnresolvedSlot { index: usize, remaining: usize },
    #[error("both picks resolved to the open end at logical index {index}")]
    DuplicatePick { index: usize },
    #[error("chain walk took {steps} steps, more than the {limit} segments")]
    ChainCycle { steps: usize, limit: usize },
    #[error("chain walk stopped at an open end after {hops} joins")]
    ChainBroken { hops: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
