//! Maze core for a keys-and-doors chase game: a randomized-DFS perfect-maze
//! carver plus constrained placement of start, goal, key/door pairs, and
//! monster spawns. The terminal front end in `main.rs` consumes this; the
//! core itself does no I/O and draws all randomness from an explicit `Rng`,
//! so a seed reproduces a round exactly.

pub mod generate;
pub mod grid;
pub mod level;
pub mod place;

pub use generate::generate;
pub use grid::{Dir, Grid, Pos, Tile};
pub use level::{build_level, Config, Level};
pub use place::{place, Placement, RetryRequired};

#[derive(thiserror::Error, Debug)]
pub enum LevelError {
    #[error("grid {width}x{height} is too small to carve a maze")]
    GridTooSmall { width: usize, height: usize },

    #[error("no valid placement found after {attempts} attempts; dimensions too tight for the requested layout")]
    RetriesExhausted { attempts: usize },
}

pub type Result<T> = std::result::Result<T, LevelError>;
