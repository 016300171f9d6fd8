use std::fmt::Debug;

use nonmax::NonMaxU32;
use num_traits::SaturatingAdd;
use rustc_hash::FxHashSet;

use crate::error::ArenaError;
use crate::state::State;

/// A reference to a [`SearchNode`] in a [`NodeArena`].
///
/// Indices are only meaningful for the arena that handed them out, and only
/// until the node is released.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex {
    index: NonMaxU32,
}

impl NodeIndex {
    #[inline(always)]
    fn new(index: usize) -> Option<Self> {
        let index = u32::try_from(index).ok()?;
        Some(Self {
            index: NonMaxU32::new(index)?,
        })
    }

    #[inline(always)]
    pub fn as_usize(&self) -> usize {
        self.index.get() as usize
    }
}

/// Where a live node currently sits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// In the frontier heap, at this position.
    Open { heap_index: usize },
    /// Expanded, at this position of the expansion order.
    Closed { order: usize },
    /// Neither, like the node being expanded or a solution node.
    Detached,
}

/// One discovered state with its best known path.
#[derive(Debug)]
pub struct SearchNode<S: State> {
    pub(crate) state: S,
    pub(crate) g: S::Cost,
    pub(crate) h: S::Cost,
    pub(crate) f: S::Cost,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) location: Location,
}

impl<S: State> SearchNode<S> {
    pub fn new(state: S, g: S::Cost, h: S::Cost, parent: Option<NodeIndex>) -> Self {
        Self {
            state,
            g,
            h,
            f: g.saturating_add(&h),
            parent,
            location: Location::Detached,
        }
    }

    /// Gives this node a better path through a new parent.
    ///
    /// `h` is kept as computed when the node was created.
    pub fn reach(&mut self, new_parent: NodeIndex, g: S::Cost) {
        debug_assert!(g < self.g);
        self.parent = Some(new_parent);
        self.g = g;
        self.f = g.saturating_add(&self.h);
    }

    pub fn state(&self) -> &S {
        &self.state
    }
    pub fn g(&self) -> S::Cost {
        self.g
    }
    pub fn h(&self) -> S::Cost {
        self.h
    }
    pub fn f(&self) -> S::Cost {
        self.f
    }
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }
    pub fn location(&self) -> Location {
        self.location
    }
}

#[derive(Debug)]
enum Slot<S: State> {
    Occupied(SearchNode<S>),
    Vacant { next_free: Option<NodeIndex> },
}

/// Owner of every [`SearchNode`] of a search.
///
/// Released slots are kept in a free list and handed out again before the
/// backing vector grows, so running many searches through the same arena
/// stops allocating once it has seen its largest search.
pub struct NodeArena<S: State> {
    slots: Vec<Slot<S>>,
    free: Option<NodeIndex>,
    live: usize,
    limit: Option<usize>,
    reused: usize,
}

impl<S: State> NodeArena<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0, None)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize, limit: Option<usize>) -> Self {
        let capacity = limit.map_or(capacity, |l| capacity.min(l));
        Self {
            slots: Vec::with_capacity(capacity),
            free: None,
            live: 0,
            limit,
            reused: 0,
        }
    }

    pub fn alloc(&mut self, node: SearchNode<S>) -> Result<NodeIndex, ArenaError> {
        if let Some(limit) = self.limit {
            if self.live >= limit {
                return Err(ArenaError::Exhausted { limit });
            }
        }

        let index = match self.free {
            Some(index) => {
                let slot = &mut self.slots[index.as_usize()];
                match slot {
                    Slot::Vacant { next_free } => self.free = *next_free,
                    Slot::Occupied(_) => unreachable!("Free list points to a live node"),
                }
                *slot = Slot::Occupied(node);
                self.reused += 1;
                index
            }
            None => {
                let index = NodeIndex::new(self.slots.len())
                    .ok_or(ArenaError::Exhausted { limit: self.live })?;
                self.slots.push(Slot::Occupied(node));
                index
            }
        };
        self.live += 1;

        self.verify();
        Ok(index)
    }

    /// Releases a node, making its slot available again.
    pub fn release(&mut self, index: NodeIndex) -> Option<SearchNode<S>> {
        let slot = self.slots.get_mut(index.as_usize())?;
        if let Slot::Vacant { .. } = slot {
            return None;
        }
        let old = std::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free,
            },
        );
        self.free = Some(index);
        self.live -= 1;

        match old {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    /// Releases every node except those in `keep`.
    pub fn retain(&mut self, keep: &[NodeIndex]) {
        let keep: FxHashSet<NodeIndex> = keep.iter().copied().collect();
        self.release_where(|i| !keep.contains(&i));
    }

    /// Releases every node.
    ///
    /// Slots are kept, lowest indices are reused first.
    pub fn clear(&mut self) {
        self.release_where(|_| true);
    }

    fn release_where<F: Fn(NodeIndex) -> bool>(&mut self, release: F) {
        // Rebuild the free list back to front so it hands out low indices first.
        let mut free = None;
        let mut live = 0;
        for i in (0..self.slots.len()).rev() {
            let Some(index) = NodeIndex::new(i) else {
                continue;
            };
            let slot = &mut self.slots[i];
            if let Slot::Occupied(_) = slot {
                if !release(index) {
                    live += 1;
                    continue;
                }
            }
            *slot = Slot::Vacant { next_free: free };
            free = Some(index);
        }
        self.free = free;
        self.live = live;

        self.verify();
    }

    #[inline(always)]
    pub fn get(&self, index: NodeIndex) -> Option<&SearchNode<S>> {
        match self.slots.get(index.as_usize()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Number of nodes currently alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
    /// Number of slots ever created, alive or not.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots.len()
    }
    /// How many allocations were served from a released slot.
    #[must_use]
    pub fn reused(&self) -> usize {
        self.reused
    }
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    fn verify(&self) {}

    #[cfg(feature = "verify")]
    fn verify(&self) {
        let occupied = self
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Occupied(_)))
            .count();
        debug_assert_eq!(occupied, self.live, "Live count is out of sync");

        let mut free = 0;
        let mut next = self.free;
        while let Some(i) = next {
            match &self.slots[i.as_usize()] {
                Slot::Vacant { next_free } => next = *next_free,
                Slot::Occupied(_) => panic!("Free list reached live node {i:?}"),
            }
            free += 1;
        }
        debug_assert_eq!(free + self.live, self.slots.len(), "Leaked slots");
    }
}

impl<S: State> Default for NodeArena<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> std::ops::Index<NodeIndex> for NodeArena<S> {
    type Output = SearchNode<S>;

    #[inline(always)]
    fn index(&self, index: NodeIndex) -> &Self::Output {
        match &self.slots[index.as_usize()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("Node {index:?} was released"),
        }
    }
}

impl<S: State> std::ops::IndexMut<NodeIndex> for NodeArena<S> {
    #[inline(always)]
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        match &mut self.slots[index.as_usize()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("Node {index:?} was released"),
        }
    }
}

impl<S: State> std::fmt::Debug for NodeArena<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "NodeArena{{({} live nodes, {} slots)}}",
            self.live,
            self.slots.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Successors;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Point(u32);

    impl State for Point {
        type Cost = u32;
        fn estimate_to_goal(&self, goal: &Self) -> u32 {
            self.0.abs_diff(goal.0)
        }
        fn successors(&self, _parent: Option<&Self>) -> Successors<Self> {
            Successors::new()
        }
        fn transition_cost(&self, _successor: &Self) -> u32 {
            1
        }
    }

    fn node(i: u32) -> SearchNode<Point> {
        SearchNode::new(Point(i), i, 0, None)
    }

    #[test]
    fn alloc_and_index() {
        let mut arena = NodeArena::<Point>::new();
        let a = arena.alloc(node(1)).unwrap();
        let b = arena.alloc(node(2)).unwrap();

        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena[a].state(), &Point(1));
        assert_eq!(arena[b].g(), 2);
    }

    #[test]
    fn released_slots_are_reused() {
        let mut arena = NodeArena::<Point>::new();
        let a = arena.alloc(node(1)).unwrap();
        let _b = arena.alloc(node(2)).unwrap();

        assert_eq!(arena.release(a).map(|n| n.state), Some(Point(1)));
        assert!(arena.get(a).is_none());
        assert_eq!(arena.release(a).map(|n| n.state), None);

        let c = arena.alloc(node(3)).unwrap();
        assert_eq!(c, a);
        assert_eq!(arena.slots(), 2);
        assert_eq!(arena.reused(), 1);
    }

    #[test]
    fn clear_reuses_low_indices_first() {
        let mut arena = NodeArena::<Point>::new();
        let first: Vec<NodeIndex> = (0..4).map(|i| arena.alloc(node(i)).unwrap()).collect();
        arena.clear();
        assert!(arena.is_empty());

        let second: Vec<NodeIndex> = (0..4).map(|i| arena.alloc(node(i)).unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(arena.slots(), 4);
    }

    #[test]
    fn retain_keeps_only_requested_nodes() {
        let mut arena = NodeArena::<Point>::new();
        let nodes: Vec<NodeIndex> = (0..5).map(|i| arena.alloc(node(i)).unwrap()).collect();

        arena.retain(&[nodes[1], nodes[3]]);
        assert_eq!(arena.len(), 2);
        assert!(arena.get(nodes[0]).is_none());
        assert_eq!(arena[nodes[1]].state(), &Point(1));
        assert_eq!(arena[nodes[3]].state(), &Point(3));

        // Released slots are handed out before growing.
        arena.alloc(node(7)).unwrap();
        arena.alloc(node(8)).unwrap();
        arena.alloc(node(9)).unwrap();
        assert_eq!(arena.slots(), 5);
        arena.alloc(node(10)).unwrap();
        assert_eq!(arena.slots(), 6);
    }

    #[test]
    fn limit_is_enforced_on_live_nodes() {
        let mut arena = NodeArena::<Point>::with_capacity(8, Some(2));
        let a = arena.alloc(node(1)).unwrap();
        arena.alloc(node(2)).unwrap();
        assert_eq!(
            arena.alloc(node(3)),
            Err(ArenaError::Exhausted { limit: 2 })
        );

        arena.release(a);
        assert!(arena.alloc(node(3)).is_ok());
    }

    #[test]
    fn reach_keeps_h() {
        let mut n = SearchNode::new(Point(4), 10u32, 3u32, None);
        assert_eq!(n.f(), 13);

        let mut arena = NodeArena::<Point>::new();
        let p = arena.alloc(node(0)).unwrap();
        n.reach(p, 6);
        assert_eq!(n.g(), 6);
        assert_eq!(n.h(), 3);
        assert_eq!(n.f(), 9);
        assert_eq!(n.parent(), Some(p));
    }
}
