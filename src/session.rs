//! Incremental A*.
//!
//! A [`SearchSession`] searches from one start to one goal, one expansion per
//! [`SearchSession::step`]. The caller decides when to step again, so a search
//! can be interleaved with other work, bounded, or abandoned at any point.
//!
//! ```
//! use astar::problems::romania::City;
//! use astar::session::SearchSession;
//! use astar::session::SearchState;
//!
//! let mut search = SearchSession::new();
//! search.set_start_and_goal(City::Arad, City::Bucharest).unwrap();
//! while search.step().unwrap() == SearchState::Searching {}
//!
//! let path: Vec<&City> = search.solution_path().unwrap().collect();
//! assert_eq!(path.first(), Some(&&City::Arad));
//! assert_eq!(path.last(), Some(&&City::Bucharest));
//! ```

use std::fmt::Debug;
use std::iter::FusedIterator;

use derive_more::Display;
use num_traits::SaturatingAdd;

use crate::arena::NodeArena;
use crate::cost::Cost;
use crate::arena::NodeIndex;
use crate::arena::SearchNode;
use crate::error::ArenaError;
use crate::error::ContractViolation;
use crate::error::SearchError;
use crate::frontier::Frontier;
use crate::state::State;
use crate::state::checked_estimate;
use crate::state::checked_transition_cost;
use crate::visited::VisitedSet;

/// Nodes preallocated by [`SearchConfig::default`].
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum SearchState {
    /// No start and goal yet.
    NotInitialized,
    /// Still looking, call [`SearchSession::step`] again.
    Searching,
    /// Found the goal, the solution is available.
    Succeeded,
    /// Exhausted the frontier or got cancelled. There's no path.
    Failed,
    /// The node arena hit its limit.
    OutOfResources,
    /// The problem broke its [`State`] contract.
    Invalid,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::NotInitialized | SearchState::Searching)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of live nodes, `None` for no limit.
    pub node_limit: Option<usize>,
    /// Nodes to preallocate room for.
    pub initial_capacity: usize,
}

impl SearchConfig {
    #[must_use]
    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            node_limit: None,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

/// Counters describing the current (or last) search.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub steps: usize,
    pub live_nodes: usize,
    pub arena_slots: usize,
    pub reused_slots: usize,
    pub frontier_len: usize,
    pub visited_len: usize,
    pub frontier_high_water: usize,
    pub visited_high_water: usize,
    pub successors_high_water: usize,
}

/// A read-only view of a node, for tracing.
#[derive(Debug)]
pub struct NodeView<'a, S: State> {
    pub state: &'a S,
    pub g: S::Cost,
    pub h: S::Cost,
    pub f: S::Cost,
    pub parent: Option<&'a S>,
}

impl<'a, S: State> NodeView<'a, S> {
    fn new(arena: &'a NodeArena<S>, node: &'a SearchNode<S>) -> Self {
        Self {
            state: node.state(),
            g: node.g(),
            h: node.h(),
            f: node.f(),
            parent: node.parent().map(|p| arena[p].state()),
        }
    }
}

/// The states of a solution, from start to goal.
///
/// Cloning it restarts the walk without touching the search.
#[derive(Clone)]
pub struct SolutionPath<'a, S: State> {
    arena: &'a NodeArena<S>,
    nodes: std::slice::Iter<'a, NodeIndex>,
}

impl<'a, S: State> Iterator for SolutionPath<'a, S> {
    type Item = &'a S;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(|&n| self.arena[n].state())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<S: State> DoubleEndedIterator for SolutionPath<'_, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.nodes.next_back().map(|&n| self.arena[n].state())
    }
}

impl<S: State> ExactSizeIterator for SolutionPath<'_, S> {}
impl<S: State> FusedIterator for SolutionPath<'_, S> {}

impl<S: State> Debug for SolutionPath<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// One start/goal search and the memory backing it.
///
/// The session can be [`reset`](SearchSession::reset) and reused, which
/// recycles the node slots of previous searches.
pub struct SearchSession<S: State> {
    config: SearchConfig,
    state: SearchState,

    /// All the search nodes. Naturally forms a search tree as each node may
    /// have a parent node.
    arena: NodeArena<S>,
    /// Discovered but not yet expanded nodes.
    frontier: Frontier<S>,
    /// Expanded nodes.
    visited: VisitedSet<S>,

    start: Option<S>,
    goal: Option<S>,

    /// Start to goal. `None` until found, or once released.
    solution: Option<Vec<NodeIndex>>,
    solution_cost: Option<S::Cost>,

    steps: usize,
    successors_high_water: usize,
    cancel_requested: bool,
}

impl<S: State> SearchSession<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    #[must_use]
    pub fn with_config(config: SearchConfig) -> Self {
        let capacity = config.initial_capacity;
        Self {
            config,
            state: SearchState::NotInitialized,
            arena: NodeArena::with_capacity(capacity, config.node_limit),
            frontier: Frontier::with_capacity(capacity),
            visited: VisitedSet::with_capacity(capacity),
            start: None,
            goal: None,
            solution: None,
            solution_cost: None,
            steps: 0,
            successors_high_water: 0,
            cancel_requested: false,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
    pub fn state(&self) -> SearchState {
        self.state
    }
    pub fn start(&self) -> Option<&S> {
        self.start.as_ref()
    }
    pub fn goal(&self) -> Option<&S> {
        self.goal.as_ref()
    }
    /// Expansion steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Starts a new search, dropping whatever this session was doing.
    ///
    /// Returns `Searching`, or `OutOfResources` if not even the start node
    /// fits in the arena.
    pub fn set_start_and_goal(&mut self, start: S, goal: S) -> Result<SearchState, SearchError> {
        self.clear();

        let h = match checked_estimate(&start, &goal) {
            Ok(h) => h,
            Err(violation) => return Err(self.invalidate(violation)),
        };
        let g = <S::Cost as num_traits::Zero>::zero();

        log::debug!("Searching from {start:?} to {goal:?} (h={h})");
        self.start = Some(start.clone());
        self.goal = Some(goal);
        self.transition(SearchState::Searching);

        match self.arena.alloc(SearchNode::new(start.clone(), g, h, None)) {
            Ok(node) => self.frontier.push(&mut self.arena, start, node),
            Err(e) => {
                log::warn!("Can't allocate the start node: {e}");
                self.release_all();
                self.transition(SearchState::OutOfResources);
            }
        }

        Ok(self.state)
    }

    /// Asks the search to stop.
    ///
    /// The next [`step`](SearchSession::step) fails the search and frees its
    /// nodes.
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }

    /// Expands one node.
    ///
    /// Returns the state the search is in afterwards. Stepping a search that
    /// was never started or already terminated is an error.
    pub fn step(&mut self) -> Result<SearchState, SearchError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Step");

        match self.state {
            SearchState::Searching => {}
            SearchState::NotInitialized => return Err(SearchError::NotInitialized),
            terminal => return Err(SearchError::AlreadyTerminated(terminal)),
        }

        if self.cancel_requested {
            log::debug!("Search cancelled after {} steps", self.steps);
            self.release_all();
            self.transition(SearchState::Failed);
            return Ok(self.state);
        }

        let Some((state, node_index)) = self.frontier.pop(&mut self.arena) else {
            self.release_all();
            self.transition(SearchState::Failed);
            return Ok(self.state);
        };
        self.steps += 1;

        let Some(goal) = self.goal.as_ref() else {
            return Err(SearchError::NotInitialized);
        };
        if state.is_goal(goal) {
            self.succeed(node_index);
            return Ok(self.state);
        }

        // Mark as closed
        self.visited.insert(&mut self.arena, state, node_index);

        match self.expand(node_index) {
            Ok(()) => Ok(self.state),
            Err(ExpandError::Contract(violation)) => Err(self.invalidate(violation)),
            Err(ExpandError::Arena(e)) => {
                log::warn!("Search ran out of nodes after {} steps: {e}", self.steps);
                self.release_all();
                self.transition(SearchState::OutOfResources);
                Ok(self.state)
            }
        }
    }

    /// Steps until the search terminates, or `max_steps` more steps were
    /// taken.
    ///
    /// Like [`step`](SearchSession::step), running a search that was never
    /// started or already terminated is an error, whatever the budget.
    pub fn run(&mut self, max_steps: Option<usize>) -> Result<SearchState, SearchError> {
        match self.state {
            SearchState::Searching => {}
            SearchState::NotInitialized => return Err(SearchError::NotInitialized),
            terminal => return Err(SearchError::AlreadyTerminated(terminal)),
        }

        let mut taken = 0usize;
        loop {
            if max_steps.is_some_and(|max| taken >= max) {
                return Ok(self.state);
            }
            let state = self.step()?;
            taken += 1;
            if state != SearchState::Searching {
                return Ok(state);
            }
        }
    }

    fn expand(&mut self, node_index: NodeIndex) -> Result<(), ExpandError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("NodeExpansion");

        let node = &self.arena[node_index];
        let g = node.g();
        let parent = node.parent().map(|p| self.arena[p].state());
        let successors = node.state().successors(parent);
        self.successors_high_water = self.successors_high_water.max(successors.len());

        let Some(goal) = self.goal.as_ref() else {
            return Ok(());
        };

        for s in successors {
            let c = checked_transition_cost(self.arena[node_index].state(), &s)?;
            let new_g = g.saturating_add(&c);
            if !new_g.valid() {
                return Err(ContractViolation::CostOverflow.into());
            }

            // Have we expanded this state already?
            if let Some(existing) = self.visited.find(&s) {
                if self.arena[existing].g() <= new_g {
                    continue;
                }
                // Found a cheaper path to an expanded node, reopen it.
                log::trace!("Reopening {s:?} (g={new_g})");
                if let Some((key, existing)) = self.visited.remove(&mut self.arena, &s) {
                    self.arena[existing].reach(node_index, new_g);
                    self.frontier.push(&mut self.arena, key, existing);
                }
                continue;
            }

            // Is it waiting to be expanded?
            if let Some(existing) = self.frontier.find(&s) {
                if self.arena[existing].g() <= new_g {
                    continue;
                }
                log::trace!("Improving {s:?} (g={new_g})");
                self.arena[existing].reach(node_index, new_g);
                self.frontier.improve(&mut self.arena, existing);
                continue;
            }

            // No, let's create a new node for it.
            let h = checked_estimate(&s, goal)?;
            log::trace!("Reached {s:?} (g={new_g}, h={h})");
            let new_node = self
                .arena
                .alloc(SearchNode::new(s.clone(), new_g, h, Some(node_index)))?;
            self.frontier.push(&mut self.arena, s, new_node);
        }

        Ok(())
    }

    /// Keeps only the path to `goal_node` and records it.
    fn succeed(&mut self, goal_node: NodeIndex) {
        #[cfg(feature = "coz_profile")]
        coz::progress!("GoalFound");

        let mut path = vec![goal_node];
        let mut node = goal_node;
        while let Some(parent) = self.arena[node].parent() {
            debug_assert!(parent != node);
            debug_assert!(path.len() <= self.arena.len(), "Parent links form a cycle");
            path.push(parent);
            node = parent;
        }
        path.reverse();

        let cost = self.arena[goal_node].g();
        log::debug!(
            "Found a path of {} states and cost {cost} after {} steps",
            path.len(),
            self.steps
        );

        self.frontier.clear();
        self.visited.clear();
        self.arena.retain(&path);
        self.solution = Some(path);
        self.solution_cost = Some(cost);
        self.transition(SearchState::Succeeded);
    }

    fn invalidate(&mut self, violation: ContractViolation) -> SearchError {
        log::warn!("Problem broke the state contract: {violation}");
        self.release_all();
        self.transition(SearchState::Invalid);
        SearchError::ContractViolation(violation)
    }

    #[inline(always)]
    fn transition(&mut self, to: SearchState) {
        if self.state != to {
            log::debug!("Search {} -> {}", self.state, to);
            self.state = to;
        }
    }

    fn release_all(&mut self) {
        self.frontier.clear();
        self.visited.clear();
        self.arena.clear();
        self.solution = None;
    }

    fn clear(&mut self) {
        self.release_all();
        self.frontier.reset_high_water();
        self.visited.reset_high_water();
        self.start = None;
        self.goal = None;
        self.solution_cost = None;
        self.steps = 0;
        self.successors_high_water = 0;
        self.cancel_requested = false;
    }

    fn solution(&self) -> Result<&[NodeIndex], SearchError> {
        if self.state != SearchState::Succeeded {
            return Err(SearchError::NoSolution(self.state));
        }
        self.solution
            .as_deref()
            .ok_or(SearchError::SolutionReleased)
    }

    /// The states from start to goal of a successful search.
    ///
    /// Can be called any number of times until the solution is released.
    pub fn solution_path(&self) -> Result<SolutionPath<'_, S>, SearchError> {
        let nodes = self.solution()?;
        Ok(SolutionPath {
            arena: &self.arena,
            nodes: nodes.iter(),
        })
    }

    /// The cost of the path from start to goal.
    pub fn solution_cost(&self) -> Result<S::Cost, SearchError> {
        self.solution()?;
        self.solution_cost
            .ok_or(SearchError::NoSolution(self.state))
    }

    /// Frees the nodes of the solution so they can be reused.
    pub fn release_solution(&mut self) -> Result<(), SearchError> {
        self.solution()?;
        self.arena.clear();
        self.solution = None;
        Ok(())
    }

    /// Forgets the current search, going back to `NotInitialized`.
    pub fn reset(&mut self) {
        self.clear();
        self.transition(SearchState::NotInitialized);
    }

    /// Nodes waiting to be expanded, best first.
    pub fn frontier(&self) -> impl Iterator<Item = NodeView<'_, S>> + '_ {
        self.frontier
            .ordered()
            .into_iter()
            .map(move |n| NodeView::new(&self.arena, &self.arena[n]))
    }

    /// Expanded nodes, in expansion order.
    pub fn visited(&self) -> impl Iterator<Item = NodeView<'_, S>> + '_ {
        self.visited
            .iter()
            .map(move |n| NodeView::new(&self.arena, &self.arena[n]))
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            steps: self.steps,
            live_nodes: self.arena.len(),
            arena_slots: self.arena.slots(),
            reused_slots: self.arena.reused(),
            frontier_len: self.frontier.len(),
            visited_len: self.visited.len(),
            frontier_high_water: self.frontier.high_water(),
            visited_high_water: self.visited.high_water(),
            successors_high_water: self.successors_high_water,
        }
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use thousands::Separable;

        let stats = self.stats();
        writeln!(out, "SearchSession Stats ({}):", self.state)?;
        writeln!(out, "  - Steps:      {}", stats.steps.separate_with_commas())?;

        let s = size_of::<SearchNode<S>>();
        writeln!(
            out,
            "  - |Nodes|:    {} ({})",
            stats.live_nodes.separate_with_commas(),
            Size::from_bytes(stats.live_nodes * s)
        )?;
        writeln!(
            out,
            "  - |Nodes|*:   {} ({}, {} reused)",
            stats.arena_slots.separate_with_commas(),
            Size::from_bytes(stats.arena_slots * s),
            stats.reused_slots.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - |Open|:     {} (max {})",
            stats.frontier_len.separate_with_commas(),
            stats.frontier_high_water.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - |Closed|:   {} (max {})",
            stats.visited_len.separate_with_commas(),
            stats.visited_high_water.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Successors: max {}",
            stats.successors_high_water.separate_with_commas()
        )?;

        Ok(())
    }
}

impl<S: State> Default for SearchSession<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> Debug for SearchSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("state", &self.state)
            .field("start", &self.start)
            .field("goal", &self.goal)
            .field("steps", &self.steps)
            .field("arena", &self.arena)
            .field("frontier", &self.frontier)
            .field("visited", &self.visited)
            .finish()
    }
}

enum ExpandError {
    Contract(ContractViolation),
    Arena(ArenaError),
}

impl From<ContractViolation> for ExpandError {
    fn from(e: ContractViolation) -> Self {
        ExpandError::Contract(e)
    }
}
impl From<ArenaError> for ExpandError {
    fn from(e: ArenaError) -> Self {
        ExpandError::Arena(e)
    }
}
