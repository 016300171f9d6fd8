use std::hash::Hash;
use std::hash::Hasher;

use derive_more::Display;
use thiserror::Error;

use crate::state::State;
use crate::state::Successors;

const MAX_ELEMENTS_DISPLAYED: usize = 40;
const RANDOM_STATE_MAX_TRIES: usize = 10_000;

pub type GridCost = u32;

/// Cells costing this much or more can't be entered.
pub const OBSTACLE: GridCost = 9;

/// A rectangular map where every cell has an entry cost.
#[derive(Clone, PartialEq, Eq)]
pub struct GridMap {
    width: u32,
    height: u32,
    cells: Vec<GridCost>,
}

impl GridMap {
    /// A map where every cell costs `cost`.
    pub fn uniform(width: u32, height: u32, cost: GridCost) -> Self {
        Self {
            width,
            height,
            cells: vec![cost; width as usize * height as usize],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline(always)]
    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize) + x as usize)
    }

    /// The cost of entering a cell. Cells outside the map are obstacles.
    #[inline(always)]
    pub fn at(&self, x: u32, y: u32) -> GridCost {
        match self.offset(x, y) {
            Some(i) => self.cells[i],
            None => OBSTACLE,
        }
    }

    /// Sets the cost of a cell, returning whether it was in the map.
    pub fn set(&mut self, x: u32, y: u32, cost: GridCost) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.cells[i] = cost;
                true
            }
            None => false,
        }
    }

    #[inline(always)]
    pub fn is_free(&self, x: u32, y: u32) -> bool {
        self.at(x, y) < OBSTACLE
    }

    /// The state at a free cell.
    pub fn state(&self, x: u32, y: u32) -> Option<GridState<'_>> {
        self.is_free(x, y).then_some(GridState { map: self, x, y })
    }

    /// A random free cell, if one turns up after a bounded number of tries.
    pub fn random_free_cell<R: rand::Rng>(&self, r: &mut R) -> Option<GridState<'_>> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        for _tries in 0..RANDOM_STATE_MAX_TRIES {
            let x = r.random_range(0..self.width);
            let y = r.random_range(0..self.height);
            if let Some(s) = self.state(x, y) {
                return Some(s);
            }
        }
        None
    }
}

impl std::fmt::Display for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Grid({}x{}):", self.width, self.height)?;
        for y in (0..self.height).take(MAX_ELEMENTS_DISPLAYED) {
            for x in (0..self.width).take(MAX_ELEMENTS_DISPLAYED) {
                match self.at(x, y) {
                    c if c >= OBSTACLE => write!(f, "█")?,
                    c => write!(f, "{c}")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Grid{:?}", self.dimensions())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Invalid character '{ch}' found at ({x},{y})")]
    InvalidCell { ch: char, x: usize, y: usize },
    #[error("Row {y} has {found} cells, expected {expected}")]
    RaggedRow {
        y: usize,
        expected: usize,
        found: usize,
    },
    #[error("Grid is too large")]
    TooLarge,
}

impl std::convert::TryFrom<&str> for GridMap {
    type Error = GridParseError;

    /// Parses one row per line, each cell being its cost digit. `#` is an
    /// obstacle.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let lines: Vec<&str> = s.lines().map(str::trim_end).collect();
        let Some(first) = lines.first() else {
            return Err(GridParseError::EmptyInput);
        };
        let width = first.chars().count();
        if width == 0 {
            return Err(GridParseError::EmptyInput);
        }

        let mut cells = Vec::with_capacity(width * lines.len());
        for (y, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridParseError::RaggedRow {
                    y,
                    expected: width,
                    found,
                });
            }
            for (x, ch) in line.chars().enumerate() {
                let cost = match ch {
                    '#' | '█' => OBSTACLE,
                    ch => ch
                        .to_digit(10)
                        .ok_or(GridParseError::InvalidCell { ch, x, y })?,
                };
                cells.push(cost);
            }
        }

        Ok(Self {
            width: u32::try_from(width).map_err(|_| GridParseError::TooLarge)?,
            height: u32::try_from(lines.len()).map_err(|_| GridParseError::TooLarge)?,
            cells,
        })
    }
}

/// A free cell of a [`GridMap`].
///
/// Two states are the same when they point to the same coordinates.
#[derive(Copy, Clone, Display)]
#[display("({x},{y})")]
pub struct GridState<'m> {
    map: &'m GridMap,
    x: u32,
    y: u32,
}

impl GridState<'_> {
    pub fn x(&self) -> u32 {
        self.x
    }
    pub fn y(&self) -> u32 {
        self.y
    }
    /// The cost of entering this cell.
    pub fn cost(&self) -> GridCost {
        self.map.at(self.x, self.y)
    }
}

impl PartialEq for GridState<'_> {
    fn eq(&self, other: &Self) -> bool {
        (self.x, self.y) == (other.x, other.y)
    }
}
impl Eq for GridState<'_> {}

impl Hash for GridState<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.x, self.y).hash(state);
    }
}

impl std::fmt::Debug for GridState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl State for GridState<'_> {
    type Cost = GridCost;

    /// Manhattan distance
    #[inline(always)]
    fn estimate_to_goal(&self, goal: &Self) -> GridCost {
        self.x.abs_diff(goal.x) + self.y.abs_diff(goal.y)
    }

    /// Moves left, up, right and down, never straight back to `parent`.
    fn successors(&self, parent: Option<&Self>) -> Successors<Self> {
        let (x, y) = (self.x, self.y);
        [
            x.checked_sub(1).map(|x| (x, y)),
            y.checked_sub(1).map(|y| (x, y)),
            x.checked_add(1).map(|x| (x, y)),
            y.checked_add(1).map(|y| (x, y)),
        ]
        .into_iter()
        .flatten()
        .filter_map(|(x, y)| self.map.state(x, y))
        .filter(|s| Some(s) != parent)
        .collect()
    }

    /// Entering a cell costs what the map says for it.
    #[inline(always)]
    fn transition_cost(&self, successor: &Self) -> GridCost {
        successor.cost()
    }
}
