//! Definitions -- A tiny interface for the shattering simulator.
//! The simulator is driven by one [SweepConfig](SweepConfig) and emits one [RunResult](RunResult) per iteration.
//! Both are plain serde structures so that they can be passed around as TOML profiles, JSON lines, or delimited rows.

use serde::{Deserialize, Serialize};

/// The seed used when a profile or the command line does not give one.
pub const DEFAULT_SEED: u64 = 42;

/// Column names of the delimited output, in order.
pub const RESULT_COLUMNS: [&str; 6] = [
    "TestIterations",
    "TestRun",
    "SegCount",
    "SegsLinked",
    "ExactMatches",
    "AdjacentSegs",
];

/// The two ends of a fragment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Start,
    End,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Start => Side::End,
            Side::End => Side::Start,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Side::Start => write!(f, "S"),
            Side::End => write!(f, "E"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("the number of iterations should be positive")]
    ZeroIterations,
    #[error("the minimum number of segments should be positive")]
    ZeroSegments,
    #[error("the segment range {min}..={max} is empty")]
    InvertedRange { min: u32, max: u32 },
}

/// The parameter sweep.
/// The number of fragments runs over `segment_count_min..=segment_count_max`,
/// and each of them is simulated `iterations` times.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepConfig {
    pub iterations: u32,
    pub segment_count_min: u32,
    pub segment_count_max: u32,
    /// Whether the consumer should aggregate identical results.
    /// The simulator itself never looks at this flag.
    #[serde(default)]
    pub group_results: bool,
    /// Seed of the random number generator shared by the whole sweep.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl SweepConfig {
    pub fn new(
        iterations: u32,
        segment_count_min: u32,
        segment_count_max: u32,
        group_results: bool,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            iterations,
            segment_count_min,
            segment_count_max,
            group_results,
            seed: DEFAULT_SEED,
        };
        config.validate().map(|_| config)
    }
    /// Sweep consisting of only one fragment count.
    pub fn single(segments: u32, iterations: u32) -> Result<Self, ConfigError> {
        Self::new(iterations, segments, segments, false)
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    /// Check the invariant of the sweep. Configurations coming from
    /// deserialization should be checked by this function before use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            Err(ConfigError::ZeroIterations)
        } else if self.segment_count_min == 0 {
            Err(ConfigError::ZeroSegments)
        } else if self.segment_count_max < self.segment_count_min {
            Err(ConfigError::InvertedRange {
                min: self.segment_count_min,
                max: self.segment_count_max,
            })
        } else {
            Ok(())
        }
    }
    /// The fragment counts to be simulated, in order.
    pub fn segment_counts(&self) -> std::ops::RangeInclusive<u32> {
        self.segment_count_min..=self.segment_count_max
    }
    /// Total number of runs in the sweep.
    pub fn total_runs(&self) -> u64 {
        let counts = (self.segment_count_max - self.segment_count_min) as u64 + 1;
        counts * self.iterations as u64
    }
}

/// The outcome of one randomized rejoining.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RunResult {
    /// The number of iterations per fragment count, echoed back.
    pub test_count: u32,
    /// 0-based index of this run within its fragment count.
    pub run_index: u32,
    /// Number of interior fragments.
    pub segments: u32,
    /// Number of joins walked from the left boundary to the right boundary.
    pub linked_segments: u32,
    /// Joins reproducing an original adjacency with the original orientation.
    pub exact_matches: u32,
    /// Originally neighboring pairs that both ended up in the chain.
    pub adjacent_segments: u32,
}

impl RunResult {
    /// The values in the order of [RESULT_COLUMNS].
    pub fn fields(&self) -> [u32; 6] {
        [
            self.test_count,
            self.run_index,
            self.segments,
            self.linked_segments,
            self.exact_matches,
            self.adjacent_segments,
        ]
    }
    /// True if every interior fragment was incorporated into the chain.
    pub fn spans_all_segments(&self) -> bool {
        self.linked_segments == self.segments + 1
    }
}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let [t, r, s, l, e, a] = self.fields();
        write!(f, "{}\t{}\t{}\t{}\t{}\t{}", t, r, s, l, e, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn valid_config() {
        let config = SweepConfig::new(100, 2, 5, true).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.segment_counts().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        assert_eq!(config.total_runs(), 400);
        let single = SweepConfig::single(7, 3).unwrap();
        assert_eq!(single.segment_count_min, single.segment_count_max);
        assert!(!single.group_results);
    }
    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            SweepConfig::new(10, 5, 2, false),
            Err(ConfigError::InvertedRange { min: 5, max: 2 })
        );
    }
    #[test]
    fn zeros_are_rejected() {
        assert_eq!(
            SweepConfig::new(0, 1, 2, false),
            Err(ConfigError::ZeroIterations)
        );
        assert_eq!(
            SweepConfig::new(1, 0, 2, false),
            Err(ConfigError::ZeroSegments)
        );
        assert_eq!(SweepConfig::single(0, 2), Err(ConfigError::ZeroSegments));
    }
    #[test]
    fn deserialize_with_defaults() {
        let config: SweepConfig =
            toml::from_str("iterations = 10\nsegment_count_min = 1\nsegment_count_max = 3\n")
                .unwrap();
        assert!(!config.group_results);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert!(config.validate().is_ok());
        let config: SweepConfig =
            toml::from_str("iterations = 10\nsegment_count_min = 4\nsegment_count_max = 3\n")
                .unwrap();
        assert!(config.validate().is_err());
    }
    #[test]
    fn result_fields() {
        let result = RunResult {
            test_count: 10,
            run_index: 3,
            segments: 3,
            linked_segments: 4,
            exact_matches: 4,
            adjacent_segments: 3,
        };
        assert!(result.spans_all_segments());
        assert_eq!(result.fields(), [10, 3, 3, 4, 4, 3]);
        assert_eq!(format!("{}", result), "10\t3\t3\t4\t4\t3");
        let json = serde_json::to_string(&result).unwrap();
        let back: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
    #[test]
    fn side_opposite() {
        assert_eq!(Side::Start.opposite(), Side::End);
        assert_eq!(Side::End.opposite(), Side::Start);
    }
}
