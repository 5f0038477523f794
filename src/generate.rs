//! Randomized depth-first maze carving.
//!
//! Corridors live on odd coordinates, walls on even ones, so carving a
//! connection means opening the single wall cell between two lattice cells.
//! The result is a perfect maze: the passage cells form a spanning tree over
//! the odd sublattice, with exactly one simple path between any two of them.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{Grid, Pos, Tile, DIRS};

/// Carve a perfect maze on a `width` x `height` grid.
///
/// The caller is expected to have validated the dimensions (both at least 5);
/// anything smaller than 3 has no odd interior cell to start from.
pub fn generate(width: usize, height: usize, rng: &mut impl Rng) -> Grid {
    let mut grid = Grid::solid(width, height);

    let origin = random_odd_cell(width, height, rng);
    grid.set(origin, Tile::Passage);

    // Explicit stack instead of recursion; depth would otherwise grow with
    // the maze diagonal.
    let mut stack = vec![origin];
    while let Some(&current) = stack.last() {
        let neighbors = uncarved_neighbors(&grid, current);
        let Some(&(next, between)) = neighbors.choose(rng) else {
            stack.pop();
            continue;
        };
        grid.set(between, Tile::Passage);
        grid.set(next, Tile::Passage);
        stack.push(next);
    }

    grid
}

fn random_odd_cell(width: usize, height: usize, rng: &mut impl Rng) -> Pos {
    let x = 1 + 2 * rng.gen_range(0..(width - 1) / 2);
    let y = 1 + 2 * rng.gen_range(0..(height - 1) / 2);
    Pos::new(x, y)
}

/// Distance-2 lattice neighbors of `pos` that are still wall, paired with the
/// wall cell between.
fn uncarved_neighbors(grid: &Grid, pos: Pos) -> Vec<(Pos, Pos)> {
    let mut out = Vec::new();
    for dir in DIRS {
        let Some(mid) = grid.step(pos, dir) else {
            continue;
        };
        let Some(next) = grid.step(mid, dir) else {
            continue;
        };
        // Keep the outer ring solid even when a dimension is even.
        if next.x == 0 || next.y == 0 || next.x == grid.width() - 1 || next.y == grid.height() - 1
        {
            continue;
        }
        if grid.get(next) == Tile::Wall {
            out.push((next, mid));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn passage_edges(grid: &Grid) -> usize {
        // Count right/down adjacencies once each.
        let mut edges = 0;
        for cell in grid.passage_cells() {
            for dir in [crate::grid::Dir::Right, crate::grid::Dir::Down] {
                if let Some(next) = grid.step(cell, dir) {
                    if grid.get(next) == Tile::Passage {
                        edges += 1;
                    }
                }
            }
        }
        edges
    }

    #[test]
    fn carves_a_perfect_maze() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let grid = generate(25, 17, &mut rng);
            let passages = grid.passage_cells();
            assert!(!passages.is_empty());

            // Tree property: connected with |cells| - 1 edges.
            assert_eq!(passage_edges(&grid), passages.len() - 1);
            let dist = grid.bfs_distance(passages[0]);
            for cell in &passages {
                assert!(dist[cell.y][cell.x] >= 0, "unreachable cell {cell:?}");
            }
        }
    }

    #[test]
    fn carving_stays_inside_the_border() {
        let mut rng = StdRng::seed_from_u64(11);
        let grid = generate(25, 17, &mut rng);
        for x in 0..grid.width() {
            assert_eq!(grid.get(Pos::new(x, 0)), Tile::Wall);
            assert_eq!(grid.get(Pos::new(x, grid.height() - 1)), Tile::Wall);
        }
        for y in 0..grid.height() {
            assert_eq!(grid.get(Pos::new(0, y)), Tile::Wall);
            assert_eq!(grid.get(Pos::new(grid.width() - 1, y)), Tile::Wall);
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let a = generate(25, 17, &mut StdRng::seed_from_u64(42));
        let b = generate(25, 17, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn minimum_viable_grid() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = generate(5, 5, &mut rng);
        let passages = grid.passage_cells();
        // 2x2 lattice cells plus the carved walls between them.
        assert!(passages.len() >= 4);
        assert_eq!(passage_edges(&grid), passages.len() - 1);
    }
}
