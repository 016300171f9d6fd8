use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use astar::problems::grid::GridMap;
use astar::problems::grid::GridState;
use astar::problems::grid::OBSTACLE;
use astar::session::SearchSession;
use astar::session::SearchState;

const INSTANCES: u64 = 4;
const QUERIES: usize = 16;

/// A map with random costs and roughly 1 in 5 cells blocked.
fn random_map(rng: &mut ChaCha8Rng, side: u32) -> GridMap {
    let mut map = GridMap::uniform(side, side, 1);
    for y in 0..side {
        for x in 0..side {
            let cost = if rng.random_ratio(1, 5) {
                OBSTACLE
            } else {
                rng.random_range(1..OBSTACLE)
            };
            map.set(x, y, cost);
        }
    }
    map
}

fn queries<'m>(map: &'m GridMap, rng: &mut ChaCha8Rng) -> Vec<(GridState<'m>, GridState<'m>)> {
    (0..QUERIES)
        .filter_map(|_| Some((map.random_free_cell(rng)?, map.random_free_cell(rng)?)))
        .collect()
}

/// Runs every query on a single session, so nodes get reused.
fn solve_all<'m>(
    search: &mut SearchSession<GridState<'m>>,
    queries: &[(GridState<'m>, GridState<'m>)],
) -> usize {
    let mut solved = 0;
    for (start, goal) in queries {
        search.set_start_and_goal(*start, *goal).unwrap();
        if search.run(None).unwrap() == SearchState::Succeeded {
            solved += 1;
        }
    }
    solved
}

fn grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid A*");

    for side in [64, 256] {
        for seed in 0..INSTANCES {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let map = random_map(&mut rng, side);
            let queries = queries(&map, &mut rng);

            let mut search = SearchSession::new();
            let solved = solve_all(&mut search, &queries);
            log::info!(
                "{side}x{side}:{seed} solved {solved}/{} queries in {} slots",
                queries.len(),
                search.stats().arena_slots
            );

            group.bench_with_input(
                BenchmarkId::new("reused-session", format!("{side}x{side}:{seed}")),
                &queries,
                |b, queries| b.iter(|| solve_all(&mut search, queries)),
            );
            group.bench_with_input(
                BenchmarkId::new("fresh-session", format!("{side}x{side}:{seed}")),
                &queries,
                |b, queries| b.iter(|| solve_all(&mut SearchSession::new(), queries)),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, grid_search);
criterion_main!(benches);
