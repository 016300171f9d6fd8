//! The open set.
//!
//! A d-ary min-heap of `(FrontierRank, NodeIndex)` that keeps the referenced
//! node updated (`SearchNode::location`), plus a map from states to their
//! nodes. Together they allow finding and re-ranking a node in the heap
//! without a linear search for its entry.

use std::fmt::Debug;

use rustc_hash::FxHashMap;

use crate::arena::Location;
use crate::arena::NodeArena;
use crate::arena::NodeIndex;
use crate::cost::Cost;
use crate::state::State;

const HEAP_ARITY: usize = 4usize;

#[inline(always)]
#[must_use]
fn up(i: usize) -> usize {
    (i - 1) / HEAP_ARITY
}
#[inline(always)]
#[must_use]
fn down_left(i: usize) -> usize {
    (HEAP_ARITY * i) + 1
}

/// The ranking tuple for A*
///
/// We prefer better f-values, and tie break by insertion order so equally good
/// nodes come out first-in first-out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrontierRank<C: Cost> {
    f: C,
    seq: u64,
}

impl<C: Cost> FrontierRank<C> {
    pub fn new(f: C, seq: u64) -> Self {
        Self { f, seq }
    }
    pub fn f(&self) -> C {
        self.f
    }
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Copy, Clone, Debug)]
struct FrontierEntry<C: Cost> {
    rank: FrontierRank<C>,
    node: NodeIndex,
}

pub struct Frontier<S: State> {
    heap: Vec<FrontierEntry<S::Cost>>,
    members: FxHashMap<S, NodeIndex>,
    next_seq: u64,
    high_water: usize,
}

impl<S: State> Frontier<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            members: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_seq: 0,
            high_water: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    /// Largest size the frontier reached since it was created or its mark
    /// was reset.
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// The node holding `state`, if it's waiting in the frontier.
    #[inline(always)]
    #[must_use]
    pub fn find(&self, state: &S) -> Option<NodeIndex> {
        self.members.get(state).copied()
    }

    /// Adds a node ranked by its current `f`.
    ///
    /// `state` is the lookup key and must equal the node's state.
    pub fn push(&mut self, arena: &mut NodeArena<S>, state: S, node: NodeIndex) {
        debug_assert_eq!(&state, arena[node].state());
        debug_assert_eq!(arena[node].location(), Location::Detached);
        self.verify_heap(arena);

        let heap_index = self.heap.len(); // Future heap_index
        let rank = FrontierRank::new(arena[node].f(), self.next_seq);
        self.next_seq += 1;

        arena[node].location = Location::Open { heap_index };
        let previous = self.members.insert(state, node);
        debug_assert!(previous.is_none(), "State was already in the frontier");
        self.heap.push(FrontierEntry { rank, node });
        self.sift_up(arena, heap_index);

        self.high_water = self.high_water.max(self.heap.len());
        self.verify_heap(arena);
    }

    /// Removes the best node, returning it with its lookup key.
    ///
    /// The node is left [`Location::Detached`].
    pub fn pop(&mut self, arena: &mut NodeArena<S>) -> Option<(S, NodeIndex)> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Pop");

        self.verify_heap(arena);
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        if last > 0 {
            self.swap(arena, 0, last);
        }
        let top = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.sift_down(arena, 0);
        }

        let node = &mut arena[top.node];
        node.location = Location::Detached;
        let (state, index) = self.members.remove_entry(&node.state)?;
        debug_assert_eq!(index, top.node);

        self.verify_heap(arena);
        Some((state, index))
    }

    /// Re-ranks a node in the frontier after its `f` improved.
    ///
    /// The node keeps its insertion order for tie-breaking.
    pub fn improve(&mut self, arena: &mut NodeArena<S>, node: NodeIndex) {
        let Location::Open { heap_index } = arena[node].location() else {
            debug_assert!(false, "Node {node:?} is not in the frontier");
            return;
        };
        debug_assert_eq!(self.heap[heap_index].node, node);

        let f = arena[node].f();
        debug_assert!(f <= self.heap[heap_index].rank.f);
        self.heap[heap_index].rank.f = f;
        self.sift_up(arena, heap_index);

        self.verify_heap(arena);
    }

    /// Forgets every node, resetting the insertion order.
    ///
    /// Nodes stay in the arena, releasing them is up to the caller. The high
    /// water mark survives.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.members.clear();
        self.next_seq = 0;
    }

    pub fn reset_high_water(&mut self) {
        self.high_water = self.heap.len();
    }

    /// The nodes in the frontier, best first.
    #[must_use]
    pub fn ordered(&self) -> Vec<NodeIndex> {
        let mut entries = self.heap.clone();
        entries.sort_unstable_by_key(|e| e.rank);
        entries.into_iter().map(|e| e.node).collect()
    }

    /// The rank of the best node, if any.
    #[must_use]
    pub fn peek_rank(&self) -> Option<FrontierRank<S::Cost>> {
        self.heap.first().map(|e| e.rank)
    }

    /// Raises a node
    /// Returns it's new index
    fn sift_up(&mut self, arena: &mut NodeArena<S>, index: usize) -> usize {
        debug_assert!(
            index < self.heap.len(),
            "Node is way out of sync. Index out of bounds..."
        );

        let mut pos = index;
        while pos > 0 {
            let parent = up(pos);
            if self.heap[parent].rank <= self.heap[pos].rank {
                break;
            }
            self.swap(arena, parent, pos);
            pos = parent;
        }
        pos
    }

    /// Lowers a node
    /// Returns it's new index
    fn sift_down(&mut self, arena: &mut NodeArena<S>, mut index: usize) -> usize {
        let len = self.heap.len();
        debug_assert!(
            index < len,
            "Node is way out of sync. Index out of bounds..."
        );

        loop {
            let first = down_left(index);
            if first >= len {
                break;
            }
            // Find the best child
            let last = (first + HEAP_ARITY).min(len);
            let mut child = first;
            for c in first + 1..last {
                if self.heap[c].rank < self.heap[child].rank {
                    child = c;
                }
            }

            if self.heap[index].rank <= self.heap[child].rank {
                break;
            }
            self.swap(arena, index, child);
            index = child;
        }
        index
    }

    /// Swaps two elements in the heap keeping the nodes' locations in sync.
    #[inline(always)]
    fn swap(&mut self, arena: &mut NodeArena<S>, l: usize, r: usize) {
        debug_assert!(l < r, "Swap({l}, {r}) uses wrong argument order");

        self.heap.swap(l, r);
        arena[self.heap[l].node].location = Location::Open { heap_index: l };
        arena[self.heap[r].node].location = Location::Open { heap_index: r };
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    fn verify_heap(&self, _arena: &NodeArena<S>) {
        // All good... (hopefully)
    }

    #[cfg(feature = "verify")]
    fn verify_heap(&self, arena: &NodeArena<S>) {
        debug_assert_eq!(self.heap.len(), self.members.len());
        // Every node,
        for (i, e) in self.heap.iter().enumerate() {
            // - Has the right intrusive index set.
            debug_assert_eq!(arena[e.node].location(), Location::Open { heap_index: i });
            // - Can be found through its state.
            debug_assert_eq!(self.members.get(arena[e.node].state()), Some(&e.node));

            // - Goes after its parent node, if any.
            if i == 0 {
                continue;
            }
            let p = up(i);
            debug_assert!(
                self.heap[p].rank <= e.rank,
                "Node[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.heap[p],
                e,
                self.heap.len(),
            );
        }
    }
}

impl<S: State> Default for Frontier<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> std::fmt::Debug for Frontier<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Frontier{{({} nodes", self.heap.len())?;
        if let Some(rank) = self.peek_rank() {
            write!(f, ", best f={}", rank.f)?;
        }
        write!(f, ")}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::SearchNode;
    use crate::state::Successors;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Label(&'static str);

    impl State for Label {
        type Cost = u32;
        fn estimate_to_goal(&self, _goal: &Self) -> u32 {
            0
        }
        fn successors(&self, _parent: Option<&Self>) -> Successors<Self> {
            Successors::new()
        }
        fn transition_cost(&self, _successor: &Self) -> u32 {
            1
        }
    }

    fn push(
        frontier: &mut Frontier<Label>,
        arena: &mut NodeArena<Label>,
        name: &'static str,
        g: u32,
        h: u32,
    ) -> NodeIndex {
        let node = arena
            .alloc(SearchNode::new(Label(name), g, h, None))
            .unwrap();
        frontier.push(arena, Label(name), node);
        node
    }

    fn drain(frontier: &mut Frontier<Label>, arena: &mut NodeArena<Label>) -> Vec<&'static str> {
        let mut names = vec![];
        while let Some((state, _node)) = frontier.pop(arena) {
            names.push(state.0);
        }
        names
    }

    #[test]
    fn pops_by_f() {
        let mut arena = NodeArena::new();
        let mut frontier = Frontier::new();

        push(&mut frontier, &mut arena, "c", 3, 0);
        push(&mut frontier, &mut arena, "e", 2, 3);
        push(&mut frontier, &mut arena, "f", 6, 0);
        push(&mut frontier, &mut arena, "a", 0, 1);
        push(&mut frontier, &mut arena, "d", 4, 0);
        push(&mut frontier, &mut arena, "b", 1, 1);
        assert_eq!(frontier.len(), 6);
        assert_eq!(frontier.high_water(), 6);

        assert_eq!(drain(&mut frontier, &mut arena), ["a", "b", "c", "d", "e", "f"]);
        assert!(frontier.is_empty());
    }

    #[test]
    fn ties_are_first_in_first_out() {
        let mut arena = NodeArena::new();
        let mut frontier = Frontier::new();

        let names = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8", "n9"];
        for (i, name) in names.into_iter().enumerate() {
            // Same f, different split between g and h.
            push(&mut frontier, &mut arena, name, i as u32, 10 - i as u32);
        }

        assert_eq!(drain(&mut frontier, &mut arena), names);
    }

    #[test]
    fn find_tracks_membership() {
        let mut arena = NodeArena::new();
        let mut frontier = Frontier::new();

        let a = push(&mut frontier, &mut arena, "a", 1, 0);
        let b = push(&mut frontier, &mut arena, "b", 2, 0);
        assert_eq!(frontier.find(&Label("a")), Some(a));
        assert_eq!(frontier.find(&Label("b")), Some(b));
        assert_eq!(frontier.find(&Label("z")), None);

        let (state, node) = frontier.pop(&mut arena).unwrap();
        assert_eq!(state, Label("a"));
        assert_eq!(node, a);
        assert_eq!(arena[a].location(), Location::Detached);
        assert_eq!(frontier.find(&Label("a")), None);
    }

    #[test]
    fn improve_repositions() {
        let mut arena = NodeArena::new();
        let mut frontier = Frontier::new();

        let parent = arena.alloc(SearchNode::new(Label("p"), 0, 0, None)).unwrap();
        for (name, g) in [("a", 5), ("b", 6), ("c", 7), ("d", 8), ("e", 9), ("f", 10)] {
            push(&mut frontier, &mut arena, name, g, 0);
        }
        let f = frontier.find(&Label("f")).unwrap();
        arena[f].reach(parent, 1);
        frontier.improve(&mut arena, f);

        assert_eq!(frontier.peek_rank().map(|r| r.f()), Some(1));
        assert_eq!(drain(&mut frontier, &mut arena), ["f", "a", "b", "c", "d", "e"]);
    }

    #[test]
    fn improve_keeps_insertion_order_on_ties() {
        let mut arena = NodeArena::new();
        let mut frontier = Frontier::new();

        let parent = arena.alloc(SearchNode::new(Label("p"), 0, 0, None)).unwrap();
        let early = push(&mut frontier, &mut arena, "early", 9, 0);
        push(&mut frontier, &mut arena, "late", 4, 0);

        arena[early].reach(parent, 4);
        frontier.improve(&mut arena, early);
        assert_eq!(drain(&mut frontier, &mut arena), ["early", "late"]);
    }

    #[test]
    fn ordered_snapshot_does_not_pop() {
        let mut arena = NodeArena::new();
        let mut frontier = Frontier::new();

        let b = push(&mut frontier, &mut arena, "b", 2, 0);
        let a = push(&mut frontier, &mut arena, "a", 1, 0);
        let c = push(&mut frontier, &mut arena, "c", 3, 0);

        assert_eq!(frontier.ordered(), vec![a, b, c]);
        assert_eq!(frontier.len(), 3);
    }

    #[test]
    fn clear_restarts_insertion_order() {
        let mut arena = NodeArena::new();
        let mut frontier = Frontier::new();

        push(&mut frontier, &mut arena, "a", 1, 0);
        frontier.clear();
        arena.clear();
        assert!(frontier.is_empty());
        assert_eq!(frontier.high_water(), 1);
        frontier.reset_high_water();
        assert_eq!(frontier.high_water(), 0);

        push(&mut frontier, &mut arena, "b", 1, 0);
        assert_eq!(frontier.peek_rank(), Some(FrontierRank::new(1, 0)));
    }
}
