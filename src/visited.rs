use rustc_hash::FxHashMap;

use crate::arena::Location;
use crate::arena::NodeArena;
use crate::arena::NodeIndex;
use crate::state::State;

/// The closed set.
///
/// Expanded nodes by state, plus the order they were expanded in. Nodes that
/// get reopened leave a hole in the order.
pub struct VisitedSet<S: State> {
    index: FxHashMap<S, NodeIndex>,
    order: Vec<Option<NodeIndex>>,
    high_water: usize,
}

impl<S: State> VisitedSet<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: Vec::with_capacity(capacity),
            high_water: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// The node holding `state`, if it was already expanded.
    #[inline(always)]
    #[must_use]
    pub fn find(&self, state: &S) -> Option<NodeIndex> {
        self.index.get(state).copied()
    }

    /// Marks a node as expanded.
    ///
    /// `state` is the lookup key and must equal the node's state.
    pub fn insert(&mut self, arena: &mut NodeArena<S>, state: S, node: NodeIndex) {
        debug_assert_eq!(&state, arena[node].state());
        debug_assert_eq!(arena[node].location(), Location::Detached);

        arena[node].location = Location::Closed {
            order: self.order.len(),
        };
        self.order.push(Some(node));
        let previous = self.index.insert(state, node);
        debug_assert!(previous.is_none(), "State was expanded twice");

        self.high_water = self.high_water.max(self.index.len());
    }

    /// Takes a node back out, to reopen it.
    pub fn remove(&mut self, arena: &mut NodeArena<S>, state: &S) -> Option<(S, NodeIndex)> {
        let (state, node) = self.index.remove_entry(state)?;
        match arena[node].location() {
            Location::Closed { order } => self.order[order] = None,
            location => debug_assert!(false, "Closed node is at {location:?}"),
        }
        arena[node].location = Location::Detached;
        Some((state, node))
    }

    /// Expanded nodes, in expansion order.
    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.order.iter().flatten().copied()
    }

    /// Forgets every node.
    ///
    /// Nodes stay in the arena, releasing them is up to the caller. The high
    /// water mark survives.
    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    pub fn reset_high_water(&mut self) {
        self.high_water = self.index.len();
    }
}

impl<S: State> Default for VisitedSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> std::fmt::Debug for VisitedSet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "VisitedSet{{({} nodes)}}", self.index.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::SearchNode;
    use crate::state::Successors;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Id(u8);

    impl State for Id {
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

    fn close(visited: &mut VisitedSet<Id>, arena: &mut NodeArena<Id>, id: u8) -> NodeIndex {
        let node = arena.alloc(SearchNode::new(Id(id), 0, 0, None)).unwrap();
        visited.insert(arena, Id(id), node);
        node
    }

    #[test]
    fn remembers_expanded_states() {
        let mut arena = NodeArena::new();
        let mut visited = VisitedSet::new();

        let a = close(&mut visited, &mut arena, 1);
        let b = close(&mut visited, &mut arena, 2);

        assert_eq!(visited.len(), 2);
        assert_eq!(visited.find(&Id(1)), Some(a));
        assert_eq!(visited.find(&Id(2)), Some(b));
        assert_eq!(visited.find(&Id(3)), None);
        assert_eq!(arena[b].location(), Location::Closed { order: 1 });
    }

    #[test]
    fn keeps_expansion_order_across_removals() {
        let mut arena = NodeArena::new();
        let mut visited = VisitedSet::new();

        let a = close(&mut visited, &mut arena, 1);
        let b = close(&mut visited, &mut arena, 2);
        let c = close(&mut visited, &mut arena, 3);

        assert_eq!(visited.remove(&mut arena, &Id(2)), Some((Id(2), b)));
        assert_eq!(arena[b].location(), Location::Detached);
        assert_eq!(visited.remove(&mut arena, &Id(2)), None);

        assert_eq!(visited.iter().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(visited.len(), 2);
        assert_eq!(visited.high_water(), 3);

        visited.clear();
        assert!(visited.is_empty());
        assert_eq!(visited.high_water(), 3);
        visited.reset_high_water();
        assert_eq!(visited.high_water(), 0);
    }
}
