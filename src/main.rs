use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use maze_adventure::grid::DIRS;
use maze_adventure::{build_level, Config, Dir, Grid, Level, Pos, Tile};

const CELL_W: usize = 2;
const DEFAULT_TICK_MS: u64 = 110;
const DEFAULT_RENDER_FPS: u64 = 120;
const INPUT_HOLD_MS: u64 = 160;
const ROUND_SECONDS: u64 = 90;
const MONSTER_MOVE_INTERVAL: u32 = 2;
const MONSTER_CHASE_CHANCE: f64 = 0.7;
const FIREBALL_COOLDOWN: u32 = 6;

#[derive(Clone, Copy, PartialEq)]
struct Fireball {
    pos: Pos,
    dir: Dir,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Outcome {
    Won,
    Caught,
    TimedOut,
}

struct Game {
    grid: Grid,
    player: Pos,
    facing: Dir,
    goal: Pos,
    keys_held: u32,
    monsters: Vec<Pos>,
    monster_tick: u32,
    fireballs: Vec<Fireball>,
    fire_cooldown: u32,
    deadline: Instant,
    outcome: Option<Outcome>,
}

impl Game {
    fn from_level(level: Level) -> Self {
        Game {
            grid: level.grid,
            player: level.placement.start,
            facing: Dir::Right,
            goal: level.placement.goal,
            keys_held: 0,
            monsters: level.placement.monsters,
            monster_tick: 0,
            fireballs: Vec::new(),
            fire_cooldown: 0,
            deadline: Instant::now() + Duration::from_secs(ROUND_SECONDS),
            outcome: None,
        }
    }

    fn remaining_secs(&self) -> u64 {
        self.deadline
            .saturating_duration_since(Instant::now())
            .as_secs()
    }

    fn move_player(&mut self, dir: Dir) {
        self.facing = dir;
        let Some(next) = self.grid.step(self.player, dir) else {
            return;
        };
        match self.grid.get(next) {
            Tile::Wall => {}
            Tile::Passage => self.player = next,
            Tile::Key => {
                // The grid is the single source of truth for what remains on
                // the floor, so pickup converts the tile in place.
                self.grid.set(next, Tile::Passage);
                self.keys_held += 1;
                self.player = next;
            }
            Tile::Door => {
                if self.keys_held > 0 {
                    self.grid.set(next, Tile::Passage);
                    self.keys_held -= 1;
                    self.player = next;
                }
            }
        }
    }

    fn fire(&mut self) {
        if self.fire_cooldown > 0 {
            return;
        }
        self.fire_cooldown = FIREBALL_COOLDOWN;
        self.fireballs.push(Fireball {
            pos: self.player,
            dir: self.facing,
        });
    }

    fn update_fireballs(&mut self) {
        let mut kept = Vec::with_capacity(self.fireballs.len());
        for ball in self.fireballs.drain(..) {
            let Some(next) = self.grid.step(ball.pos, ball.dir) else {
                continue;
            };
            // Fireballs burn out against walls and closed doors.
            if !self.grid.is_walkable(next) {
                continue;
            }
            if let Some(idx) = self.monsters.iter().position(|m| *m == next) {
                self.monsters.swap_remove(idx);
                continue;
            }
            kept.push(Fireball {
                pos: next,
                dir: ball.dir,
            });
        }
        self.fireballs = kept;
        if self.fire_cooldown > 0 {
            self.fire_cooldown -= 1;
        }
    }

    fn update_monsters(&mut self, rng: &mut impl Rng) {
        self.monster_tick = self.monster_tick.wrapping_add(1);
        if self.monster_tick % MONSTER_MOVE_INTERVAL != 0 {
            return;
        }
        let dist = self.grid.bfs_distance(self.player);
        let taken = self.monsters.clone();
        for (idx, monster) in self.monsters.iter_mut().enumerate() {
            let next = if rng.gen_bool(MONSTER_CHASE_CHANCE) {
                chase_step(&self.grid, *monster, &dist, rng)
            } else {
                drift_step(&self.grid, *monster, rng)
            };
            if let Some(next) = next {
                let blocked = taken
                    .iter()
                    .enumerate()
                    .any(|(other, pos)| other != idx && *pos == next);
                if !blocked {
                    *monster = next;
                }
            }
        }
    }

    fn handle_collisions(&mut self) {
        if self.monsters.iter().any(|m| *m == self.player) {
            self.outcome = Some(Outcome::Caught);
        }
    }

    fn check_goal(&mut self) {
        if self.player == self.goal {
            self.outcome = Some(Outcome::Won);
        }
    }

    fn check_timer(&mut self) {
        // remaining_secs truncates, so it reads 0 for the whole final second;
        // only the deadline itself ends the round.
        if Instant::now() >= self.deadline {
            self.outcome = Some(Outcome::TimedOut);
        }
    }
}

/// Step along the BFS gradient toward the player, tie-breaking at random.
fn chase_step(grid: &Grid, pos: Pos, dist: &[Vec<i32>], rng: &mut impl Rng) -> Option<Pos> {
    let mut options = Vec::new();
    let mut best = i32::MAX;
    for dir in DIRS {
        let Some(next) = grid.step(pos, dir) else {
            continue;
        };
        if !grid.is_walkable(next) {
            continue;
        }
        let d = dist[next.y][next.x];
        if d < 0 {
            continue;
        }
        if d < best {
            best = d;
            options.clear();
            options.push(next);
        } else if d == best {
            options.push(next);
        }
    }
    options.choose(rng).copied()
}

fn drift_step(grid: &Grid, pos: Pos, rng: &mut impl Rng) -> Option<Pos> {
    let open: Vec<Pos> = DIRS
        .iter()
        .filter_map(|dir| grid.step(pos, *dir))
        .filter(|next| grid.is_walkable(*next))
        .collect();
    open.choose(rng).copied()
}

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Monster,
    Fireball,
    Goal,
    Wall,
    Floor,
    Key,
    Door,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Floor,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

fn main() -> io::Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(stdout: &mut Stdout) -> io::Result<()> {
    let settings = read_settings();
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let config = Config::default();
    let level = build_level(&config, &mut rng)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let mut game = Game::from_level(level);

    let mut renderer = Renderer::new(config.width, config.height);
    let mut last_tick = Instant::now();
    let mut last_seen: [Option<Instant>; 4] = [None, None, None, None];
    let mut last_pressed: Option<Dir> = None;
    let mut fire_requested = false;
    let frame_time = Duration::from_micros(1_000_000 / settings.render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Char(' ') => fire_requested = true,
                        KeyCode::Up | KeyCode::Char('k') => {
                            last_seen[idx_for_dir(Dir::Up)] = Some(Instant::now());
                            last_pressed = Some(Dir::Up);
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            last_seen[idx_for_dir(Dir::Down)] = Some(Instant::now());
                            last_pressed = Some(Dir::Down);
                        }
                        KeyCode::Left | KeyCode::Char('h') => {
                            last_seen[idx_for_dir(Dir::Left)] = Some(Instant::now());
                            last_pressed = Some(Dir::Left);
                        }
                        KeyCode::Right | KeyCode::Char('l') => {
                            last_seen[idx_for_dir(Dir::Right)] = Some(Instant::now());
                            last_pressed = Some(Dir::Right);
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= Duration::from_millis(settings.tick_ms) {
            last_tick = Instant::now();
            let desired_dir = active_dir_recent(&last_seen, last_pressed);
            tick(&mut game, &mut rng, desired_dir, fire_requested);
            fire_requested = false;
            render(stdout, &game, &mut renderer)?;
            if let Some(outcome) = game.outcome {
                return render_end_screen(stdout, &game, outcome);
            }
        } else {
            render(stdout, &game, &mut renderer)?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn tick(game: &mut Game, rng: &mut impl Rng, desired_dir: Option<Dir>, fire: bool) {
    if let Some(dir) = desired_dir {
        game.move_player(dir);
    }
    if fire {
        game.fire();
    }
    game.check_goal();
    if game.outcome.is_some() {
        return;
    }
    game.update_fireballs();
    game.update_monsters(rng);
    game.handle_collisions();
    game.check_timer();
}

struct Settings {
    tick_ms: u64,
    render_fps: u64,
    seed: Option<u64>,
}

fn read_settings() -> Settings {
    let tick_ms = std::env::var("MAZE_TICK_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TICK_MS);
    let render_fps = std::env::var("MAZE_FPS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RENDER_FPS);
    let seed = std::env::var("MAZE_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok());
    Settings {
        tick_ms,
        render_fps,
        seed,
    }
}

fn render(stdout: &mut Stdout, game: &Game, renderer: &mut Renderer) -> io::Result<()> {
    let width = game.grid.width();
    let height = game.grid.height();
    let needed_h = (height + 2) as u16;
    let needed_w = (width * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let hud = format!(
        "Keys: {}  Monsters: {}  Time: {}s  (space: fireball, q: quit)",
        game.keys_held,
        game.monsters.len(),
        game.remaining_secs()
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for y in 0..height {
        for x in 0..width {
            let pos = Pos::new(x, y);
            let cell = cell_for(game, pos);
            let idx = y * width + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn cell_for(game: &Game, pos: Pos) -> Cell {
    if pos == game.player {
        return Cell {
            glyph: Glyph::Player,
            color: Color::Yellow,
        };
    }
    if game.monsters.iter().any(|m| *m == pos) {
        return Cell {
            glyph: Glyph::Monster,
            color: Color::Red,
        };
    }
    if game.fireballs.iter().any(|f| f.pos == pos) {
        return Cell {
            glyph: Glyph::Fireball,
            color: Color::DarkYellow,
        };
    }
    if pos == game.goal {
        return Cell {
            glyph: Glyph::Goal,
            color: Color::Green,
        };
    }
    match game.grid.get(pos) {
        Tile::Wall => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Tile::Passage => Cell {
            glyph: Glyph::Floor,
            color: Color::Reset,
        },
        Tile::Key => Cell {
            glyph: Glyph::Key,
            color: Color::Yellow,
        },
        Tile::Door => Cell {
            glyph: Glyph::Door,
            color: Color::DarkYellow,
        },
    }
}

fn draw_cell(
    stdout: &mut Stdout,
    renderer: &Renderer,
    x: usize,
    y: usize,
    cell: Cell,
) -> io::Result<()> {
    let (text, color) = match cell.glyph {
        Glyph::Player => ("😃", cell.color),
        Glyph::Monster => ("👾", cell.color),
        Glyph::Fireball => ("🔥", cell.color),
        Glyph::Goal => ("🍎", cell.color),
        Glyph::Wall => ("██", cell.color),
        Glyph::Floor => ("  ", cell.color),
        Glyph::Key => ("🔑", cell.color),
        Glyph::Door => ("🚪", cell.color),
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn render_end_screen(stdout: &mut Stdout, game: &Game, outcome: Outcome) -> io::Result<()> {
    let msg = match outcome {
        Outcome::Won => format!(
            "You win! Escaped with {}s to spare. (press q to quit)",
            game.remaining_secs()
        ),
        Outcome::Caught => "Game over - a monster caught you. (press q to quit)".to_string(),
        Outcome::TimedOut => "Game over - time ran out. (press q to quit)".to_string(),
    };
    let (term_w, term_h) = terminal::size()?;
    let needed_h = (game.grid.height() + 2) as u16;
    let needed_w = (game.grid.width() * CELL_W) as u16;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(MoveTo(0, needed_h))?;
    } else {
        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        stdout.queue(MoveTo(origin_x, origin_y + game.grid.height() as u16))?;
    }
    stdout.queue(Print(msg))?;
    stdout.flush()?;
    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    return Ok(());
                }
            }
        }
    }
}

fn active_dir_recent(last_seen: &[Option<Instant>; 4], last_pressed: Option<Dir>) -> Option<Dir> {
    let now = Instant::now();
    if let Some(dir) = last_pressed {
        if let Some(t) = last_seen[idx_for_dir(dir)] {
            if now.duration_since(t) <= Duration::from_millis(INPUT_HOLD_MS) {
                return Some(dir);
            }
        }
    }
    let mut best: Option<(Dir, Instant)> = None;
    for (idx, dir) in DIRS.iter().enumerate() {
        if let Some(t) = last_seen[idx] {
            if now.duration_since(t) <= Duration::from_millis(INPUT_HOLD_MS) {
                match best {
                    None => best = Some((*dir, t)),
                    Some((_, bt)) if t > bt => best = Some((*dir, t)),
                    _ => {}
                }
            }
        }
    }
    best.map(|(dir, _)| dir)
}

fn idx_for_dir(dir: Dir) -> usize {
    match dir {
        Dir::Up => 0,
        Dir::Down => 1,
        Dir::Left => 2,
        Dir::Right => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        let mut grid = Grid::solid(7, 3);
        for x in 1..6 {
            grid.set(Pos::new(x, 1), Tile::Passage);
        }
        grid
    }

    fn game_on(grid: Grid, player: Pos, goal: Pos) -> Game {
        Game {
            grid,
            player,
            facing: Dir::Right,
            goal,
            keys_held: 0,
            monsters: Vec::new(),
            monster_tick: 0,
            fireballs: Vec::new(),
            fire_cooldown: 0,
            deadline: Instant::now() + Duration::from_secs(ROUND_SECONDS),
            outcome: None,
        }
    }

    #[test]
    fn key_pickup_clears_tile_and_counts() {
        let mut grid = corridor();
        grid.set(Pos::new(2, 1), Tile::Key);
        let mut game = game_on(grid, Pos::new(1, 1), Pos::new(5, 1));
        game.move_player(Dir::Right);
        assert_eq!(game.player, Pos::new(2, 1));
        assert_eq!(game.keys_held, 1);
        assert_eq!(game.grid.get(Pos::new(2, 1)), Tile::Passage);
    }

    #[test]
    fn door_blocks_without_key_and_opens_with_one() {
        let mut grid = corridor();
        grid.set(Pos::new(2, 1), Tile::Door);
        let mut game = game_on(grid, Pos::new(1, 1), Pos::new(5, 1));

        game.move_player(Dir::Right);
        assert_eq!(game.player, Pos::new(1, 1));

        game.keys_held = 1;
        game.move_player(Dir::Right);
        assert_eq!(game.player, Pos::new(2, 1));
        assert_eq!(game.keys_held, 0);
        assert_eq!(game.grid.get(Pos::new(2, 1)), Tile::Passage);
    }

    #[test]
    fn fireball_destroys_monster_in_its_path() {
        let mut game = game_on(corridor(), Pos::new(1, 1), Pos::new(5, 1));
        game.monsters.push(Pos::new(3, 1));
        game.fire();
        game.update_fireballs(); // advances to x=2
        assert_eq!(game.fireballs.len(), 1);
        game.update_fireballs(); // lands on the monster
        assert!(game.monsters.is_empty());
        assert!(game.fireballs.is_empty());
    }

    #[test]
    fn fireball_burns_out_on_walls() {
        let mut game = game_on(corridor(), Pos::new(4, 1), Pos::new(5, 1));
        game.fire();
        game.update_fireballs(); // x=5
        game.update_fireballs(); // wall at x=6
        assert!(game.fireballs.is_empty());
    }

    #[test]
    fn reaching_the_goal_wins() {
        let mut game = game_on(corridor(), Pos::new(4, 1), Pos::new(5, 1));
        game.move_player(Dir::Right);
        game.check_goal();
        assert_eq!(game.outcome, Some(Outcome::Won));
    }

    #[test]
    fn monster_contact_ends_the_round() {
        let mut game = game_on(corridor(), Pos::new(2, 1), Pos::new(5, 1));
        game.monsters.push(Pos::new(2, 1));
        game.handle_collisions();
        assert_eq!(game.outcome, Some(Outcome::Caught));
    }

    #[test]
    fn final_second_still_counts() {
        let mut game = game_on(corridor(), Pos::new(1, 1), Pos::new(5, 1));
        game.deadline = Instant::now() + Duration::from_millis(400);
        game.check_timer();
        assert_eq!(game.outcome, None);

        game.deadline = Instant::now();
        game.check_timer();
        assert_eq!(game.outcome, Some(Outcome::TimedOut));
    }

    #[test]
    fn chase_moves_along_the_bfs_gradient() {
        let grid = corridor();
        let player = Pos::new(1, 1);
        let dist = grid.bfs_distance(player);
        let mut rng = StdRng::seed_from_u64(0);
        let next = chase_step(&grid, Pos::new(4, 1), &dist, &mut rng);
        assert_eq!(next, Some(Pos::new(3, 1)));
    }
}
