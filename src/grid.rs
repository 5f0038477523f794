//! Tile grid shared by the generator, the placer, and the game loop.

use std::collections::VecDeque;

/// A single cell of the maze.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    Passage,
    Key,
    Door,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }

    pub fn manhattan(self, other: Pos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

pub const DIRS: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

impl Dir {
    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

/// The maze. Tiles are indexed `[y][x]`; borders stay `Wall`.
#[derive(Clone, PartialEq, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Vec<Tile>>,
}

impl Grid {
    /// An all-wall grid, ready for carving.
    pub fn solid(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            tiles: vec![vec![Tile::Wall; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, pos: Pos) -> Tile {
        self.tiles[pos.y][pos.x]
    }

    pub fn set(&mut self, pos: Pos, tile: Tile) {
        self.tiles[pos.y][pos.x] = tile;
    }

    /// Neighbor of `pos` one step in `dir`, if it stays on the grid.
    pub fn step(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = pos.x as isize + dx;
        let ny = pos.y as isize + dy;
        if nx < 0 || ny < 0 || nx >= self.width as isize || ny >= self.height as isize {
            return None;
        }
        Some(Pos::new(nx as usize, ny as usize))
    }

    /// True for any tile the player can occupy once keys are spent (everything
    /// but solid wall).
    pub fn is_open(&self, pos: Pos) -> bool {
        self.get(pos) != Tile::Wall
    }

    /// True for tiles walkable without a key: `Passage` or `Key`.
    pub fn is_walkable(&self, pos: Pos) -> bool {
        matches!(self.get(pos), Tile::Passage | Tile::Key)
    }

    /// Every `Passage` cell, scanned row-major.
    pub fn passage_cells(&self) -> Vec<Pos> {
        let mut cells = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Pos::new(x, y);
                if self.get(pos) == Tile::Passage {
                    cells.push(pos);
                }
            }
        }
        cells
    }

    /// BFS distance map from `start` over walkable tiles (`Passage`/`Key`),
    /// ignoring doors. Unreached cells hold -1.
    pub fn bfs_distance(&self, start: Pos) -> Vec<Vec<i32>> {
        let mut dist = vec![vec![-1; self.width]; self.height];
        let mut q = VecDeque::new();
        dist[start.y][start.x] = 0;
        q.push_back(start);

        while let Some(pos) = q.pop_front() {
            let base = dist[pos.y][pos.x];
            for dir in DIRS {
                let Some(next) = self.step(pos, dir) else {
                    continue;
                };
                if !self.is_walkable(next) {
                    continue;
                }
                if dist[next.y][next.x] == -1 {
                    dist[next.y][next.x] = base + 1;
                    q.push_back(next);
                }
            }
        }
        dist
    }
}
