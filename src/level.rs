//! Generate-then-place pipeline, one invocation per round.

use rand::Rng;

use crate::generate::generate;
use crate::grid::Grid;
use crate::place::{place, Placement};
use crate::{LevelError, Result};

/// Placement keeps failing only when the dimensions cannot satisfy the
/// thresholds; a fresh maze is cheap, so retry rather than relax.
const MAX_ATTEMPTS: usize = 50;

/// Knobs for one round. Thresholds scale with the grid, matching the classic
/// 25x17 layout when left at `Default`.
#[derive(Clone, Debug)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    pub key_door_count: usize,
    pub monster_count: usize,
    /// Start-to-goal Manhattan distance must exceed this.
    pub min_goal_distance: usize,
    /// Monsters spawn at least this far from the start.
    pub min_monster_distance: usize,
}

impl Config {
    pub fn new(width: usize, height: usize) -> Self {
        Config {
            width,
            height,
            key_door_count: 4,
            monster_count: 3,
            min_goal_distance: (width + height) / 3,
            min_monster_distance: width / 3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(25, 17)
    }
}

/// A freshly built round: the carved and decorated maze plus everything the
/// simulation needs to know about it.
#[derive(Clone, Debug)]
pub struct Level {
    pub grid: Grid,
    pub placement: Placement,
}

/// Carve and populate a maze, regenerating from scratch whenever placement
/// cannot satisfy its constraints.
pub fn build_level(config: &Config, rng: &mut impl Rng) -> Result<Level> {
    if config.width < 5 || config.height < 5 {
        return Err(LevelError::GridTooSmall {
            width: config.width,
            height: config.height,
        });
    }

    for _ in 0..MAX_ATTEMPTS {
        let mut grid = generate(config.width, config.height, rng);
        if let Ok(placement) = place(&mut grid, config, rng) {
            return Ok(Level { grid, placement });
        }
    }
    Err(LevelError::RetriesExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Pos;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_degenerate_dimensions() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = Config::new(3, 17);
        assert!(matches!(
            build_level(&config, &mut rng),
            Err(LevelError::GridTooSmall { .. })
        ));
    }

    #[test]
    fn even_dimensions_are_accepted() {
        // The carver leaves the extra row/column as wall; only sub-5 grids
        // are rejected.
        let config = Config::new(24, 16);
        let level = build_level(&config, &mut StdRng::seed_from_u64(5)).unwrap();
        let grid = &level.grid;
        for x in 0..grid.width() {
            assert!(!grid.is_open(Pos::new(x, 0)));
            assert!(!grid.is_open(Pos::new(x, grid.height() - 1)));
        }
        for y in 0..grid.height() {
            assert!(!grid.is_open(Pos::new(0, y)));
            assert!(!grid.is_open(Pos::new(grid.width() - 1, y)));
        }
    }

    #[test]
    fn classic_round_holds_all_invariants() {
        // 25x17, seed 42, four pairs, one monster.
        let mut config = Config::default();
        config.monster_count = 1;
        let mut rng = StdRng::seed_from_u64(42);
        let level = build_level(&config, &mut rng).unwrap();
        let p = &level.placement;

        assert!(p.goal.manhattan(p.start) > config.min_goal_distance);
        assert_eq!(p.keys.len(), p.doors.len());
        assert!(p.keys.len() <= 4);
        assert!(p.monsters.len() <= 1);
        let dist = level.grid.bfs_distance(p.start);
        assert!(dist[p.goal.y][p.goal.x] >= 0);
    }

    #[test]
    fn same_seed_reproduces_the_round() {
        let config = Config::default();
        let a = build_level(&config, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = build_level(&config, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.placement, b.placement);
    }

    #[test]
    fn different_seeds_diverge() {
        let config = Config::default();
        let a = build_level(&config, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = build_level(&config, &mut StdRng::seed_from_u64(43)).unwrap();
        assert!(
            a.placement.start != b.placement.start
                || a.placement.goal != b.placement.goal
                || a.placement.keys != b.placement.keys
        );
    }

    #[test]
    fn passage_tree_survives_decoration() {
        // Key and door tiles replace passage and wall cells respectively;
        // the underlying open structure must stay a connected maze.
        let config = Config::default();
        let level = build_level(&config, &mut StdRng::seed_from_u64(7)).unwrap();
        let grid = &level.grid;
        let mut open = 0;
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                if grid.is_open(Pos::new(x, y)) {
                    open += 1;
                }
            }
        }
        let passages = grid.passage_cells().len();
        let keys = level.placement.keys.len();
        let doors = level.placement.doors.len();
        assert_eq!(open, passages + keys + doors);
    }
}
