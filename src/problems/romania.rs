//! Road trips across Romania, from Russell & Norvig's AI: A Modern Approach.

use derive_more::Display;
use thiserror::Error;

use crate::float_cost::FloatCost;
use crate::state::State;
use crate::state::Successors;

pub type RoadCost = FloatCost<f32>;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum City {
    Arad,
    Bucharest,
    Craiova,
    Drobeta,
    Eforie,
    Fagaras,
    Giurgiu,
    Hirsova,
    Iasi,
    Lugoj,
    Mehadia,
    Neamt,
    Oradea,
    Pitesti,
    RimnicuVilcea,
    Sibiu,
    Timisoara,
    Urziceni,
    Vaslui,
    Zerind,
}

/// Road lengths in km, as in the textbook map. Every road goes both ways.
#[rustfmt::skip]
const ROADS: [(City, City, u16); 23] = [
    (City::Arad,          City::Sibiu,         140),
    (City::Arad,          City::Timisoara,     118),
    (City::Arad,          City::Zerind,         75),
    (City::Bucharest,     City::Fagaras,       211),
    (City::Bucharest,     City::Giurgiu,        90),
    (City::Bucharest,     City::Pitesti,       101),
    (City::Bucharest,     City::Urziceni,       85),
    (City::Craiova,       City::Drobeta,       120),
    (City::Craiova,       City::Pitesti,       138),
    (City::Craiova,       City::RimnicuVilcea, 146),
    (City::Drobeta,       City::Mehadia,        75),
    (City::Eforie,        City::Hirsova,        86),
    (City::Fagaras,       City::Sibiu,          99),
    (City::Hirsova,       City::Urziceni,       98),
    (City::Iasi,          City::Neamt,          87),
    (City::Iasi,          City::Vaslui,         92),
    (City::Lugoj,         City::Mehadia,        70),
    (City::Lugoj,         City::Timisoara,     111),
    (City::Oradea,        City::Sibiu,         151),
    (City::Oradea,        City::Zerind,         71),
    (City::Pitesti,       City::RimnicuVilcea,  97),
    (City::RimnicuVilcea, City::Sibiu,          80),
    (City::Urziceni,      City::Vaslui,        142),
];

impl City {
    pub const ALL: [City; 20] = [
        City::Arad,
        City::Bucharest,
        City::Craiova,
        City::Drobeta,
        City::Eforie,
        City::Fagaras,
        City::Giurgiu,
        City::Hirsova,
        City::Iasi,
        City::Lugoj,
        City::Mehadia,
        City::Neamt,
        City::Oradea,
        City::Pitesti,
        City::RimnicuVilcea,
        City::Sibiu,
        City::Timisoara,
        City::Urziceni,
        City::Vaslui,
        City::Zerind,
    ];

    /// Length of the road between two cities, if there's one.
    pub fn road(&self, to: &City) -> Option<u16> {
        ROADS
            .iter()
            .find(|(a, b, _)| (a == self && b == to) || (a == to && b == self))
            .map(|(_, _, km)| *km)
    }

    /// Cities one road away, in `City::ALL` order.
    pub fn neighbours(&self) -> impl Iterator<Item = (City, u16)> + '_ {
        City::ALL
            .iter()
            .filter_map(move |c| self.road(c).map(|km| (*c, km)))
    }

    /// Straight-line distance to Bucharest in km.
    pub fn straight_line_to_bucharest(&self) -> u16 {
        match self {
            City::Arad => 366,
            City::Bucharest => 0,
            City::Craiova => 160,
            City::Drobeta => 242,
            City::Eforie => 161,
            City::Fagaras => 176,
            City::Giurgiu => 77,
            City::Hirsova => 151,
            City::Iasi => 226,
            City::Lugoj => 244,
            City::Mehadia => 241,
            City::Neamt => 234,
            City::Oradea => 380,
            City::Pitesti => 100,
            City::RimnicuVilcea => 193,
            City::Sibiu => 253,
            City::Timisoara => 329,
            City::Urziceni => 80,
            City::Vaslui => 199,
            City::Zerind => 374,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CityParseError {
    #[error("There is no city named '{0}' in the map")]
    UnknownCity(String),
}

impl std::str::FromStr for City {
    type Err = CityParseError;

    /// Parses a city name, ignoring case and spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        City::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(&name))
            .ok_or_else(|| CityParseError::UnknownCity(s.to_string()))
    }
}

impl State for City {
    type Cost = RoadCost;

    /// Straight-line distances are only known towards Bucharest, any other
    /// goal gets no guidance.
    fn estimate_to_goal(&self, goal: &Self) -> RoadCost {
        match goal {
            City::Bucharest => RoadCost::new(f32::from(self.straight_line_to_bucharest())),
            _ => RoadCost::new(0.0),
        }
    }

    fn successors(&self, _parent: Option<&Self>) -> Successors<Self> {
        self.neighbours().map(|(c, _)| c).collect()
    }

    fn transition_cost(&self, successor: &Self) -> RoadCost {
        match self.road(successor) {
            Some(km) => RoadCost::new(f32::from(km)),
            None => RoadCost::infinity(),
        }
    }
}
