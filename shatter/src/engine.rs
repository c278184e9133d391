//! Randomized rejoining of shattered fragments.
//!
//! For each fragment count the engine rebuilds a [SegmentGraph], then repeatedly joins
//! two open ends chosen uniformly at random until the left boundary is connected to the right
//! boundary or no open end is left. The resulting chain is summarized into a [RunResult].
//! One generator, seeded once, is shared by every draw of the sweep so that two sweeps with
//! the same configuration emit identical results.
use crate::error::{InvariantViolation, Result};
use crate::segment::{SegmentGraph, Slot, Walk};
use crate::sink::{Discard, ResultSink};
use definitions::{RunResult, Side, SweepConfig};
use log::*;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::VecDeque;

pub struct ShatteringEngine<S: ResultSink = Discard> {
    config: SweepConfig,
    rng: Xoshiro256PlusPlus,
    graph: SegmentGraph,
    // Open ends in the current iteration.
    remaining: usize,
    // Joins made in the current iteration.
    link_count: usize,
    injected: VecDeque<usize>,
    linked_indices: Vec<usize>,
    last_result: Option<RunResult>,
    sink: S,
}

impl ShatteringEngine<Discard> {
    /// Engine without an output sink. Results are only reachable by [ShatteringEngine::last_result].
    pub fn new(config: SweepConfig) -> Result<Self> {
        Self::with_sink(config, Discard)
    }
}

impl<S: ResultSink> ShatteringEngine<S> {
    pub fn with_sink(config: SweepConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let rng: Xoshiro256PlusPlus = SeedableRng::seed_from_u64(config.seed);
        let graph = SegmentGraph::new(config.segment_count_min as usize);
        let remaining = graph.open_end_count();
        Ok(Self {
            config,
            rng,
            graph,
            remaining,
            link_count: 0,
            injected: VecDeque::new(),
            linked_indices: vec![],
            last_result: None,
            sink,
        })
    }
    /// Replace random draws by the given logical indices, consumed two per join.
    /// Each value is capped at `remaining - 1`. Once the queue is exhausted the generator takes over.
    pub fn with_injected_picks(mut self, picks: Vec<usize>) -> Self {
        self.injected = picks.into();
        self
    }
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }
    pub fn graph(&self) -> &SegmentGraph {
        &self.graph
    }
    pub fn remaining(&self) -> usize {
        self.remaining
    }
    pub fn link_count(&self) -> usize {
        self.link_count
    }
    /// Segment ids along the chain of the last completed iteration.
    pub fn linked_indices(&self) -> &[usize] {
        &self.linked_indices
    }
    pub fn last_result(&self) -> Option<&RunResult> {
        self.last_result.as_ref()
    }
    pub fn sink(&self) -> &S {
        &self.sink
    }
    pub fn into_sink(self) -> S {
        self.sink
    }
    /// (Re)build the graph for `segments` interior fragments.
    pub fn prepare(&mut self, segments: usize) {
        self.graph = SegmentGraph::new(segments);
        self.remaining = self.graph.open_end_count();
        self.link_count = 0;
        self.linked_indices.clear();
    }
    /// Run one randomized rejoining on the current graph and summarize it.
    pub fn run_iteration(&mut self, run_index: u32) -> Result<RunResult> {
        self.graph.clear_links();
        self.remaining = self.graph.open_end_count();
        self.link_count = 0;
        self.linked_indices.clear();
        debug_assert_eq!(self.remaining, 2 * self.graph.interior_count() + 2);
        while self.remaining > 0 {
            let (i, j) = self.pick_pair()?;
            let (a, b) = match self.graph.resolve_pair(i, j) {
                (Some(a), Some(b)) => (a, b),
                (None, _) => return Err(self.unresolved(i)),
                (_, None) => return Err(self.unresolved(j)),
            };
            if !self.graph.link(a, b) {
                return Err(self.unresolved(i));
            }
            self.remaining -= 2;
            self.link_count += 1;
            trace!("LINK\t{}\t{}\t{}", a, b, self.remaining);
            debug_assert!(self.graph.is_symmetric());
            if !self.more_links_possible()? {
                break;
            }
        }
        let result = self.update_results(run_index)?;
        trace!("RUN\t{}", result);
        self.last_result = Some(result);
        Ok(result)
    }
    fn unresolved(&self, index: usize) -> crate::error::Error {
        let remaining = self.remaining;
        InvariantViolation::UnresolvedSlot { index, remaining }.into()
    }
    /// Two distinct logical indices in `0..remaining`.
    fn pick_pair(&mut self) -> Result<(usize, usize)> {
        let remaining = self.remaining;
        if remaining < 2 {
            return Err(InvariantViolation::ExhaustedEnds { remaining }.into());
        }
        if remaining == 2 {
            return Ok((0, 1));
        }
        if self.injected.len() >= 2 {
            let picks: Vec<_> = self
                .injected
                .drain(..2)
                .map(|x| x.min(remaining - 1))
                .collect();
            let (i, j) = (picks[0], picks[1]);
            return match i == j {
                true => Err(InvariantViolation::DuplicatePick { index: i }.into()),
                false => Ok((i, j)),
            };
        }
        // A lone trailing value can not make a pair.
        self.injected.clear();
        let i = self.rng.gen_range(0..remaining);
        let mut j = self.rng.gen_range(0..remaining - 1);
        if j >= i {
            j += 1;
        }
        Ok((i, j))
    }
    /// Whether joining should go on. It stops once the boundaries are connected,
    /// since any further join could only close loops detached from the chain.
    pub fn more_links_possible(&self) -> Result<bool> {
        let segments = self.graph.segments();
        let (left, right) = (self.graph.left(), self.graph.right());
        if segments[left].is_link_open(Side::End) || segments[right].is_link_open(Side::Start) {
            return Ok(true);
        }
        match self.graph.walk() {
            Walk::Complete(_) => Ok(false),
            // Both boundaries hang on separate partial chains.
            Walk::DeadEnd(_) => Ok(true),
            Walk::Overrun { steps } => {
                let limit = self.graph.segment_count();
                Err(InvariantViolation::ChainCycle { steps, limit }.into())
            }
        }
    }
    /// Walk the finished chain and compute its statistics.
    fn update_results(&mut self, run_index: u32) -> Result<RunResult> {
        let chain = match self.graph.walk() {
            Walk::Complete(chain) => chain,
            Walk::DeadEnd(chain) => {
                let hops = chain.hops();
                return Err(InvariantViolation::ChainBroken { hops }.into());
            }
            Walk::Overrun { steps } => {
                let limit = self.graph.segment_count();
                return Err(InvariantViolation::ChainCycle { steps, limit }.into());
            }
        };
        let exact_matches = chain
            .joins
            .iter()
            .filter(|&&(from, to)| is_original_adjacency(from, to))
            .count();
        let mut in_chain = vec![false; self.graph.segment_count()];
        for &id in chain.path.iter() {
            in_chain[id] = true;
        }
        let interior = self.graph.interior_count();
        let adjacent_segments = (0..interior)
            .filter(|&i| in_chain[i] && in_chain[i + 1])
            .count();
        let linked_segments = chain.hops();
        self.linked_indices = chain.path;
        Ok(RunResult {
            test_count: self.config.iterations,
            run_index,
            segments: interior as u32,
            linked_segments: linked_segments as u32,
            exact_matches: exact_matches as u32,
            adjacent_segments: adjacent_segments as u32,
        })
    }
    /// Run the whole sweep. The sink is closed whether the sweep finishes or aborts.
    pub fn run_sweep(&mut self) -> Result<()> {
        let outcome = self.sweep();
        if let Err(why) = self.sink.close() {
            warn!("SINK\tClose\t{}", why);
        }
        outcome
    }
    fn sweep(&mut self) -> Result<()> {
        self.config.validate()?;
        if let Err(why) = self.sink.write_header() {
            warn!("SINK\tHeader\t{}", why);
        }
        let iterations = self.config.iterations;
        for segments in self.config.segment_counts() {
            self.prepare(segments as usize);
            debug!("SWEEP\t{}\t{}\tStart", segments, iterations);
            for run_index in 0..iterations {
                let result = match self.run_iteration(run_index) {
                    Ok(result) => result,
                    Err(why) => {
                        error!("ABORT\t{}\t{}\t{}", segments, run_index, why);
                        return Err(why);
                    }
                };
                if let Err(why) = self.sink.append(&result) {
                    warn!("SINK\t{}\t{}\t{}", segments, run_index, why);
                }
            }
            debug!("SWEEP\t{}\t{}\tEnd", segments, iterations);
        }
        Ok(())
    }
}

/// True if the join restores an original neighborhood: the "end" of `i` against the "start" of `i+1`,
/// walked in either direction.
pub fn is_original_adjacency(from: Slot, to: Slot) -> bool {
    let forward = to.segment == from.segment + 1 && from.side == Side::End && to.side == Side::Start;
    let backward =
        from.segment == to.segment + 1 && from.side == Side::Start && to.side == Side::End;
    forward || backward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sink::Collector;
    fn engine(segments: u32, picks: Vec<usize>) -> ShatteringEngine {
        let config = SweepConfig::single(segments, 1).unwrap();
        ShatteringEngine::new(config).unwrap().with_injected_picks(picks)
    }
    fn invariant(res: Result<RunResult>) -> InvariantViolation {
        match res {
            Err(Error::Invariant(why)) => why,
            res => panic!("{:?}", res),
        }
    }
    #[test]
    fn adjacency() {
        let s = Slot::new;
        assert!(is_original_adjacency(s(1, Side::End), s(2, Side::Start)));
        assert!(is_original_adjacency(s(2, Side::Start), s(1, Side::End)));
        assert!(!is_original_adjacency(s(1, Side::Start), s(2, Side::End)));
        assert!(!is_original_adjacency(s(1, Side::End), s(3, Side::Start)));
        assert!(!is_original_adjacency(s(2, Side::End), s(1, Side::Start)));
    }
    #[test]
    fn single_fragment_boundaries_joined() {
        // 0.E x 2.S: the boundaries meet and fragment 1 is left out.
        let mut engine = engine(1, vec![0, 3]);
        let result = engine.run_iteration(0).unwrap();
        assert_eq!(result.linked_segments, 1);
        assert_eq!(result.exact_matches, 0);
        assert_eq!(result.adjacent_segments, 0);
        assert_eq!(engine.linked_indices(), &[0, 2]);
        assert_eq!(engine.remaining(), 2);
        assert_eq!(engine.link_count(), 1);
        assert!(!engine.more_links_possible().unwrap());
    }
    #[test]
    fn single_fragment_random() {
        let mut engine = engine(1, vec![]);
        for run in 0..200 {
            let result = engine.run_iteration(run).unwrap();
            assert!(result.linked_segments == 1 || result.linked_segments == 2);
            assert_eq!(result.spans_all_segments(), result.linked_segments == 2);
        }
    }
    #[test]
    fn exact_original_chain() {
        let mut engine = engine(3, vec![0, 1, 0, 1, 0, 1]);
        let result = engine.run_iteration(0).unwrap();
        assert_eq!(result.segments, 3);
        assert_eq!(result.linked_segments, 4);
        assert_eq!(result.exact_matches, 4);
        assert_eq!(result.adjacent_segments, 3);
        assert_eq!(engine.linked_indices(), &[0, 1, 2, 3, 4]);
        assert_eq!(engine.remaining(), 0);
        assert_eq!(engine.last_result(), Some(&result));
    }
    #[test]
    fn skipped_neighbor_still_adjacent() {
        // 0.E-2.S, 2.E-3.S, 3.E-1.S, 1.E-4.S: fragments 1 and 2 are never joined directly.
        let mut engine = engine(3, vec![0, 3, 2, 3, 2, 0]);
        let result = engine.run_iteration(0).unwrap();
        assert_eq!(engine.linked_indices(), &[0, 2, 3, 1, 4]);
        assert_eq!(result.linked_segments, 4);
        assert_eq!(result.exact_matches, 1);
        assert_eq!(result.adjacent_segments, 3);
    }
    #[test]
    fn reversed_fragment() {
        // 0.E-1.S, 1.E-3.E, 3.S-2.E, 2.S-4.S: fragments 2 and 3 are inverted as a block.
        let mut engine = engine(3, vec![0, 1, 0, 4, 2, 1]);
        let result = engine.run_iteration(0).unwrap();
        assert_eq!(engine.linked_indices(), &[0, 1, 3, 2, 4]);
        assert_eq!(result.linked_segments, 4);
        // 0|1 as is, and 2|3 walked backwards.
        assert_eq!(result.exact_matches, 2);
        assert_eq!(result.adjacent_segments, 3);
    }
    #[test]
    fn detached_loop_is_left_out() {
        // 1.S-1.E closes fragment 1 on itself, the rest joins up.
        let mut engine = engine(2, vec![1, 2, 0, 1]);
        let result = engine.run_iteration(0).unwrap();
        assert_eq!(engine.linked_indices(), &[0, 2, 3]);
        assert_eq!(result.linked_segments, 2);
        assert_eq!(result.exact_matches, 1);
        assert_eq!(result.adjacent_segments, 0);
        assert!(engine.graph().segments()[1].fully_linked());
    }
    #[test]
    fn early_closure_keeps_open_ends() {
        let mut engine = engine(3, vec![0, 7]);
        let result = engine.run_iteration(0).unwrap();
        assert_eq!(result.linked_segments, 1);
        assert_eq!(result.adjacent_segments, 0);
        assert_eq!(engine.remaining(), 6);
        assert_eq!(engine.graph().open_end_count(), 6);
    }
    #[test]
    fn picks_are_capped() {
        let mut engine = engine(1, vec![0, 99]);
        let result = engine.run_iteration(0).unwrap();
        assert_eq!(result.linked_segments, 1);
        assert_eq!(engine.linked_indices(), &[0, 2]);
    }
    #[test]
    fn duplicated_picks_are_fatal() {
        let mut engine = engine(2, vec![7, 5]);
        assert_eq!(
            invariant(engine.run_iteration(0)),
            InvariantViolation::DuplicatePick { index: 5 }
        );
    }
    #[test]
    fn exhausted_ends_are_fatal() {
        let mut engine = engine(1, vec![]);
        engine.remaining = 1;
        match engine.pick_pair() {
            Err(Error::Invariant(InvariantViolation::ExhaustedEnds { remaining: 1 })) => {}
            res => panic!("{:?}", res),
        }
        engine.remaining = 2;
        assert_eq!(engine.pick_pair().unwrap(), (0, 1));
    }
    #[test]
    fn separate_partial_chains_keep_going() {
        // Both boundaries are used but hang on different pieces.
        let mut engine = engine(2, vec![]);
        let s = Slot::new;
        assert!(engine.graph.link(s(0, Side::End), s(1, Side::Start)));
        assert!(engine.graph.link(s(2, Side::End), s(3, Side::Start)));
        assert!(engine.more_links_possible().unwrap());
        assert!(engine.graph.link(s(1, Side::End), s(2, Side::Start)));
        assert!(!engine.more_links_possible().unwrap());
    }
    #[test]
    fn open_boundary_keeps_going() {
        let engine = engine(2, vec![]);
        assert!(engine.more_links_possible().unwrap());
    }
    #[test]
    fn conservation_and_termination() {
        let config = SweepConfig::single(1, 1).unwrap().with_seed(3290);
        let mut engine = ShatteringEngine::new(config).unwrap();
        for n in 1..30 {
            engine.prepare(n);
            assert_eq!(engine.remaining(), 2 * n + 2);
            for run in 0..50 {
                let result = engine.run_iteration(run).unwrap();
                assert!(engine.link_count() <= n + 1);
                assert_eq!(engine.remaining(), 2 * n + 2 - 2 * engine.link_count());
                assert_eq!(engine.remaining(), engine.graph().open_end_count());
                assert!(engine.graph().is_symmetric());
                assert!(1 <= result.linked_segments && result.linked_segments as usize <= n + 1);
                assert!(result.exact_matches <= result.linked_segments);
                assert!(result.adjacent_segments as usize <= n);
                assert_eq!(engine.linked_indices().len(), result.linked_segments as usize + 1);
            }
        }
    }
    #[test]
    fn sweep_writes_every_run() {
        let config = SweepConfig::new(5, 2, 4, false).unwrap();
        let mut engine = ShatteringEngine::with_sink(config, Collector::default()).unwrap();
        engine.run_sweep().unwrap();
        let results = engine.into_sink().into_results();
        assert_eq!(results.len(), 15);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.segments as usize, 2 + i / 5);
            assert_eq!(result.run_index as usize, i % 5);
            assert_eq!(result.test_count, 5);
        }
    }
    #[test]
    fn config_is_kept() {
        let config = SweepConfig::new(7, 3, 5, false).unwrap().with_seed(11);
        let mut engine = ShatteringEngine::with_sink(config, Collector::default()).unwrap();
        assert_eq!(engine.config(), &config);
        engine.run_sweep().unwrap();
        assert_eq!(engine.config(), &config);
        let total = engine.config().total_runs();
        assert_eq!(total, 21);
        assert_eq!(engine.into_sink().into_results().len() as u64, total);
    }
    #[test]
    fn invalid_config_is_rejected() {
        let config = SweepConfig {
            iterations: 1,
            segment_count_min: 5,
            segment_count_max: 2,
            group_results: false,
            seed: 1,
        };
        match ShatteringEngine::new(config) {
            Err(Error::Config(_)) => {}
            Err(why) => panic!("{:?}", why),
            Ok(_) => panic!("accepted {:?}", config),
        }
    }
}
