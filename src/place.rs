//! Start/goal/key/door/monster placement on a carved maze.

use rand::Rng;

use crate::grid::{Grid, Pos, Tile};
use crate::level::Config;

/// Where everything ended up for one round.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Placement {
    pub start: Pos,
    pub goal: Pos,
    pub keys: Vec<Pos>,
    pub doors: Vec<Pos>,
    pub monsters: Vec<Pos>,
}

/// The maze cannot host a valid placement; the caller should carve a fresh one.
#[derive(Debug, PartialEq, Eq)]
pub struct RetryRequired;

/// Populate `grid` with start, goal, key/door pairs, and monster spawns.
///
/// Keys and doors are always placed in equal number; when fewer qualifying
/// door walls exist than requested, both counts shrink to match. Monsters
/// never spawn closer to the start than `min_monster_distance`, dropping
/// spawns instead. Key and door tiles are written into the grid; those are
/// the only mutations.
pub fn place(
    grid: &mut Grid,
    config: &Config,
    rng: &mut impl Rng,
) -> Result<Placement, RetryRequired> {
    let mut pool = grid.passage_cells();
    if pool.is_empty() {
        return Err(RetryRequired);
    }

    let idx = rng.gen_range(0..pool.len());
    let start = take_at(&mut pool, idx);

    let goal_choices: Vec<usize> = (0..pool.len())
        .filter(|&i| pool[i].manhattan(start) > config.min_goal_distance)
        .collect();
    if goal_choices.is_empty() {
        return Err(RetryRequired);
    }
    let goal = take_at(&mut pool, goal_choices[rng.gen_range(0..goal_choices.len())]);

    // Doors go on former connecting walls, so the count of qualifying walls
    // caps the number of pairs.
    let mut door_walls = door_candidates(grid);
    let pairs = config
        .key_door_count
        .min(door_walls.len())
        .min(pool.len());

    let mut doors = Vec::with_capacity(pairs);
    let mut keys = Vec::with_capacity(pairs);
    for _ in 0..pairs {
        let idx = rng.gen_range(0..door_walls.len());
        let door = take_at(&mut door_walls, idx);
        grid.set(door, Tile::Door);
        doors.push(door);

        let idx = rng.gen_range(0..pool.len());
        let key = take_at(&mut pool, idx);
        grid.set(key, Tile::Key);
        keys.push(key);
    }

    let mut monsters = Vec::new();
    for _ in 0..config.monster_count {
        let choices: Vec<usize> = (0..pool.len())
            .filter(|&i| pool[i].manhattan(start) >= config.min_monster_distance)
            .collect();
        if choices.is_empty() {
            break;
        }
        let spawn = take_at(&mut pool, choices[rng.gen_range(0..choices.len())]);
        monsters.push(spawn);
    }

    // Doors never cut the carved tree and keys stay walkable, but verify the
    // round is winnable before handing it out.
    let dist = grid.bfs_distance(start);
    if dist[goal.y][goal.x] < 0 {
        return Err(RetryRequired);
    }

    Ok(Placement {
        start,
        goal,
        keys,
        doors,
        monsters,
    })
}

fn take_at(pool: &mut Vec<Pos>, idx: usize) -> Pos {
    pool.swap_remove(idx)
}

/// Wall cells sitting exactly between two passages, vertically or
/// horizontally. Opening one bridges two corridors.
fn door_candidates(grid: &Grid) -> Vec<Pos> {
    let mut out = Vec::new();
    for y in 1..grid.height() - 1 {
        for x in 1..grid.width() - 1 {
            let pos = Pos::new(x, y);
            if grid.get(pos) != Tile::Wall {
                continue;
            }
            let vertical = grid.get(Pos::new(x, y - 1)) == Tile::Passage
                && grid.get(Pos::new(x, y + 1)) == Tile::Passage;
            let horizontal = grid.get(Pos::new(x - 1, y)) == Tile::Passage
                && grid.get(Pos::new(x + 1, y)) == Tile::Passage;
            if vertical || horizontal {
                out.push(pos);
            }
        }
    }
    out
}
