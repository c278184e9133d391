//! The fragment graph. Segments live in one arena and refer to each other by index,
//! so a join never needs two mutable references at once.
use definitions::Side;

/// One end of one segment, addressed by the arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub segment: usize,
    pub side: Side,
}

impl Slot {
    pub fn new(segment: usize, side: Side) -> Self {
        Self { segment, side }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.segment, self.side)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: usize,
    has_start_end: bool,
    has_end_end: bool,
    start_link: Option<Slot>,
    end_link: Option<Slot>,
}

impl Segment {
    /// The left telomere stub. Only the "end" side is exposed.
    pub fn left_boundary() -> Self {
        Self::with_sides(0, false, true)
    }
    /// The right telomere stub. Only the "start" side is exposed.
    pub fn right_boundary(id: usize) -> Self {
        Self::with_sides(id, true, false)
    }
    pub fn interior(id: usize) -> Self {
        Self::with_sides(id, true, true)
    }
    fn with_sides(id: usize, has_start_end: bool, has_end_end: bool) -> Self {
        Self {
            id,
            has_start_end,
            has_end_end,
            start_link: None,
            end_link: None,
        }
    }
    pub fn has_side(&self, side: Side) -> bool {
        match side {
            Side::Start => self.has_start_end,
            Side::End => self.has_end_end,
        }
    }
    /// The end on the other side of the join at `side`, if any.
    pub fn link(&self, side: Side) -> Option<Slot> {
        match side {
            Side::Start => self.start_link,
            Side::End => self.end_link,
        }
    }
    pub fn is_link_open(&self, side: Side) -> bool {
        self.has_side(side) && self.link(side).is_none()
    }
    pub fn fully_linked(&self) -> bool {
        !self.is_link_open(Side::Start) && !self.is_link_open(Side::End)
    }
    /// Open sides of this segment, "start" first.
    pub fn open_sides(&self) -> impl Iterator<Item = Side> + '_ {
        IntoIterator::into_iter([Side::Start, Side::End])
            .filter(move |&side| self.is_link_open(side))
    }
    fn set_link(&mut self, side: Side, to: Slot) {
        match side {
            Side::Start => self.start_link = Some(to),
            Side::End => self.end_link = Some(to),
        }
    }
    fn clear(&mut self) {
        self.start_link = None;
        self.end_link = None;
    }
}

/// A chain walked from the left boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    /// Segment ids in visiting order, the left boundary first.
    pub path: Vec<usize>,
    /// (exit, entry) for each join taken.
    pub joins: Vec<(Slot, Slot)>,
}

impl Chain {
    pub fn hops(&self) -> usize {
        self.joins.len()
    }
}

/// How a walk from the left boundary ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Walk {
    /// Reached the right boundary.
    Complete(Chain),
    /// Stopped at an open side.
    DeadEnd(Chain),
    /// Took more steps than there are segments.
    Overrun { steps: usize },
}

/// Boundary segment 0, interior fragments `1..=n`, boundary segment `n+1`.
#[derive(Debug, Clone)]
pub struct SegmentGraph {
    segments: Vec<Segment>,
}

impl SegmentGraph {
    pub fn new(interior: usize) -> Self {
        let segments: Vec<_> = std::iter::once(Segment::left_boundary())
            .chain((1..=interior).map(Segment::interior))
            .chain(std::iter::once(Segment::right_boundary(interior + 1)))
            .collect();
        Self { segments }
    }
    /// Number of interior fragments.
    pub fn interior_count(&self) -> usize {
        self.segments.len() - 2
    }
    /// Number of segments, boundaries included.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
    pub fn left(&self) -> usize {
        0
    }
    pub fn right(&self) -> usize {
        self.segments.len() - 1
    }
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
    pub fn clear_links(&mut self) {
        self.segments.iter_mut().for_each(Segment::clear);
    }
    /// Open ends in ascending segment order, "start" before "end".
    /// Logical indices used by the linking step refer to positions in this sequence.
    pub fn open_ends(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().flat_map(|seg| {
            seg.open_sides()
                .map(move |side| Slot::new(seg.id, side))
        })
    }
    pub fn open_end_count(&self) -> usize {
        self.segments.iter().map(|seg| seg.open_sides().count()).sum()
    }
    pub fn is_open(&self, slot: Slot) -> bool {
        self.segments
            .get(slot.segment)
            .map_or(false, |seg| seg.is_link_open(slot.side))
    }
    /// Resolve two logical indices with one pass over the open ends.
    pub fn resolve_pair(&self, i: usize, j: usize) -> (Option<Slot>, Option<Slot>) {
        let (mut first, mut second) = (None, None);
        for (idx, slot) in self.open_ends().enumerate() {
            if idx == i {
                first = Some(slot);
            }
            if idx == j {
                second = Some(slot);
            }
            if first.is_some() && second.is_some() {
                break;
            }
        }
        (first, second)
    }
    /// Join two open ends. Both sides point at each other afterwards.
    /// Returns false and leaves the graph untouched unless both ends are open and distinct.
    pub fn link(&mut self, a: Slot, b: Slot) -> bool {
        if a == b || !self.is_open(a) || !self.is_open(b) {
            return false;
        }
        self.segments[a.segment].set_link(a.side, b);
        self.segments[b.segment].set_link(b.side, a);
        true
    }
    /// Every join is recorded on both of its ends.
    pub fn is_symmetric(&self) -> bool {
        self.segments.iter().all(|seg| {
            [Side::Start, Side::End].iter().all(|&side| match seg.link(side) {
                None => true,
                Some(to) => {
                    let here = Slot::new(seg.id, side);
                    self.segments
                        .get(to.segment)
                        .and_then(|other| other.link(to.side))
                        == Some(here)
                }
            })
        })
    }
    /// Walk from the left boundary. A segment entered through one side is left through the other.
    pub fn walk(&self) -> Walk {
        let limit = self.segments.len();
        let right = self.right();
        let mut chain = Chain {
            path: vec![self.left()],
            joins: vec![],
        };
        let mut current = Slot::new(self.left(), Side::End);
        loop {
            let next = match self.segments[current.segment].link(current.side) {
                Some(next) => next,
                None => return Walk::DeadEnd(chain),
            };
            chain.joins.push((current, next));
            chain.path.push(next.segment);
            if next.segment == right {
                return Walk::Complete(chain);
            }
            if chain.joins.len() > limit {
                return Walk::Overrun {
                    steps: chain.joins.len(),
                };
            }
            current = Slot::new(next.segment, next.side.opposite());
        }
    }
}
