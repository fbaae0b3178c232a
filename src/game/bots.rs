//! Autonomous bot navigation: a wander/pursue state machine advanced once per
//! world tick against the shared tile grid and the live player snapshots.

use rand::Rng;
use std::f32::consts::PI;

use crate::game::constants::bots;
use crate::game::map::TileGrid;
use crate::game::player::PlayerSnapshot;
use crate::util::angle;

/// Navigation state. A pursuing bot keeps its locked target's nickname and
/// re-validates it every tick.
#[derive(Debug, Clone, PartialEq)]
pub enum BotMode {
    Wandering,
    Pursuing { target: String },
}

/// Per-bot state. Each bot owns and mutates only its own instance.
#[derive(Debug, Clone)]
pub struct BotState {
    pub nickname: String,
    pub x: f32,
    pub y: f32,
    pub a: f32,
    /// Heading the bot is steering toward while wandering
    pub target_a: f32,
    /// Seconds until the next wander decision
    pub next_decision_in: f32,
    pub mode: BotMode,
}

impl BotState {
    pub fn new(nickname: impl Into<String>, x: f32, y: f32, a: f32) -> Self {
        let a = angle::normalize(a);
        Self {
            nickname: nickname.into(),
            x,
            y,
            a,
            target_a: a,
            next_decision_in: 0.0,
            mode: BotMode::Wandering,
        }
    }

    pub fn to_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot::new(self.nickname.clone(), self.x, self.y, self.a, true)
    }
}

/// Advance one bot by `dt` seconds.
pub fn update<R: Rng>(
    bot: &mut BotState,
    grid: &TileGrid,
    players: &[PlayerSnapshot],
    dt: f32,
    rng: &mut R,
) {
    if let Some((distance, bearing)) = acquire_target(bot, grid, players) {
        turn_towards(bot, bearing, dt);
        if distance > bots::STOP_DISTANCE && !try_move_forward(bot, grid, dt) {
            bounce(bot, rng);
        }
        return;
    }

    bot.next_decision_in -= dt;
    if bot.next_decision_in <= 0.0 {
        bot.target_a = rng.gen_range(0.0..angle::TWO_PI);
        bot.next_decision_in = rng.gen_range(bots::DECISION_MIN..bots::DECISION_MAX);
    }

    turn_towards(bot, bot.target_a, dt);
    if !try_move_forward(bot, grid, dt) {
        bounce(bot, rng);
    }
}

/// Validate the locked target with the wider lose range, else scan for the
/// nearest live player within detect range and line of sight. Updates
/// `bot.mode` to reflect the outcome.
fn acquire_target(
    bot: &mut BotState,
    grid: &TileGrid,
    players: &[PlayerSnapshot],
) -> Option<(f32, f32)> {
    if let BotMode::Pursuing { target } = &bot.mode {
        let locked = players
            .iter()
            .find(|s| s.is_alive && s.nickname.eq_ignore_ascii_case(target));
        if let Some(snap) = locked {
            if let Some(data) = target_data(bot, grid, snap, bots::LOSE_RANGE) {
                return Some(data);
            }
        }
    }

    let mut best: Option<(f32, f32, String)> = None;
    for snap in players {
        if !snap.is_alive {
            continue;
        }
        let Some((distance, bearing)) = target_data(bot, grid, snap, bots::DETECT_RANGE) else {
            continue;
        };
        if best.as_ref().map_or(true, |(d, _, _)| distance < *d) {
            best = Some((distance, bearing, snap.nickname.clone()));
        }
    }

    match best {
        Some((distance, bearing, target)) => {
            bot.mode = BotMode::Pursuing { target };
            Some((distance, bearing))
        }
        None => {
            bot.mode = BotMode::Wandering;
            None
        }
    }
}

fn target_data(
    bot: &BotState,
    grid: &TileGrid,
    snap: &PlayerSnapshot,
    max_range: f32,
) -> Option<(f32, f32)> {
    let dx = snap.x - bot.x;
    let dy = snap.y - bot.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance > max_range {
        return None;
    }
    if !grid.line_of_sight(bot.x, bot.y, snap.x, snap.y) {
        return None;
    }
    Some((distance, angle::bearing(dx, dy)))
}

fn turn_towards(bot: &mut BotState, target_a: f32, dt: f32) {
    let delta = angle::shortest_delta(bot.a, target_a);
    let max_turn = bots::TURN_SPEED * dt;
    bot.a = if delta.abs() <= max_turn {
        angle::normalize(target_a)
    } else {
        angle::normalize(bot.a + delta.signum() * max_turn)
    };
}

fn try_move_forward(bot: &mut BotState, grid: &TileGrid, dt: f32) -> bool {
    let step = bots::SPEED * dt;
    let nx = bot.x + bot.a.cos() * step;
    let ny = bot.y + bot.a.sin() * step;
    if grid.is_walkable(nx, ny) {
        bot.x = nx;
        bot.y = ny;
        return true;
    }
    false
}

/// Blocked step: pick a random heading bias around the current one and retry
/// after a short delay.
fn bounce<R: Rng>(bot: &mut BotState, rng: &mut R) {
    bot.target_a = angle::normalize(bot.a + (rng.gen::<f32>() - 0.5) * PI);
    bot.next_decision_in = rng.gen_range(bots::BOUNCE_DECISION_MIN..bots::BOUNCE_DECISION_MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_grid() -> TileGrid {
        TileGrid::open(20, 10)
    }

    #[test]
    fn test_wanders_when_no_player_in_range() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(5);
        let mut bot = BotState::new("Bot1", 3.5, 3.5, 0.0);
        bot.next_decision_in = 1.0;

        // Player 12 units away is outside detect range (10)
        let players = vec![PlayerSnapshot::new("far", 15.5, 3.5, 0.0, true)];
        update(&mut bot, &grid, &players, 0.05, &mut rng);

        assert_eq!(bot.mode, BotMode::Wandering);
        assert!((bot.next_decision_in - 0.95).abs() < 1e-5);
    }

    #[test]
    fn test_decision_timer_elapsing_picks_new_heading() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(6);
        let mut bot = BotState::new("Bot1", 10.5, 5.5, 0.0);
        bot.next_decision_in = 0.01;
        bot.target_a = 0.0;

        update(&mut bot, &grid, &[], 0.05, &mut rng);

        assert_eq!(bot.mode, BotMode::Wandering);
        assert!((0.0..angle::TWO_PI).contains(&bot.target_a));
        assert!(bot.next_decision_in >= bots::DECISION_MIN - 0.05);
        assert!(bot.next_decision_in <= bots::DECISION_MAX);
    }

    #[test]
    fn test_acquires_visible_player_in_detect_range() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(7);
        let mut bot = BotState::new("Bot1", 3.5, 5.5, std::f32::consts::PI);
        let players = vec![PlayerSnapshot::new("prey", 8.5, 5.5, 0.0, true)];

        update(&mut bot, &grid, &players, 0.05, &mut rng);

        assert_eq!(
            bot.mode,
            BotMode::Pursuing {
                target: "prey".to_string()
            }
        );
    }

    #[test]
    fn test_pursuit_turns_toward_target() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(8);
        let mut bot = BotState::new("Bot1", 3.5, 5.5, 0.5);
        let players = vec![PlayerSnapshot::new("prey", 8.5, 5.5, 0.0, true)];

        for _ in 0..40 {
            update(&mut bot, &grid, &players, 0.05, &mut rng);
        }
        // Target sits due east; heading converges onto the bearing
        assert!(angle::shortest_delta(bot.a, 0.0).abs() < 0.2);
        assert!(bot.x > 3.5, "bot should close distance");
    }

    #[test]
    fn test_locked_target_kept_inside_lose_range() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(9);
        let mut bot = BotState::new("Bot1", 3.5, 5.5, 0.0);
        bot.mode = BotMode::Pursuing {
            target: "prey".to_string(),
        };
        // 12 units: outside detect range but inside lose range
        let players = vec![PlayerSnapshot::new("prey", 15.5, 5.5, 0.0, true)];

        update(&mut bot, &grid, &players, 0.05, &mut rng);

        assert_eq!(
            bot.mode,
            BotMode::Pursuing {
                target: "prey".to_string()
            }
        );
    }

    #[test]
    fn test_target_dropped_beyond_lose_range() {
        let grid = TileGrid::open(40, 10);
        let mut rng = StdRng::seed_from_u64(10);
        let mut bot = BotState::new("Bot1", 3.5, 5.5, 0.0);
        bot.mode = BotMode::Pursuing {
            target: "prey".to_string(),
        };
        let players = vec![PlayerSnapshot::new("prey", 20.5, 5.5, 0.0, true)];

        update(&mut bot, &grid, &players, 0.05, &mut rng);

        assert_eq!(bot.mode, BotMode::Wandering);
    }

    #[test]
    fn test_dead_target_reverts_to_wandering() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(11);
        let mut bot = BotState::new("Bot1", 3.5, 5.5, 0.0);
        bot.mode = BotMode::Pursuing {
            target: "prey".to_string(),
        };
        let players = vec![PlayerSnapshot::new("prey", 6.5, 5.5, 0.0, false)];

        update(&mut bot, &grid, &players, 0.05, &mut rng);

        assert_eq!(bot.mode, BotMode::Wandering);
    }

    #[test]
    fn test_wall_blocks_acquisition() {
        let grid = TileGrid::from_rows(&[
            "###########",
            "#    #    #",
            "#    #    #",
            "#    #    #",
            "###########",
        ]);
        let mut rng = StdRng::seed_from_u64(12);
        let mut bot = BotState::new("Bot1", 2.5, 2.5, 0.0);
        let players = vec![PlayerSnapshot::new("prey", 8.5, 2.5, 0.0, true)];

        update(&mut bot, &grid, &players, 0.05, &mut rng);

        assert_eq!(bot.mode, BotMode::Wandering);
    }

    #[test]
    fn test_stops_at_stop_distance() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(13);
        let mut bot = BotState::new("Bot1", 5.0, 5.5, 0.0);
        let players = vec![PlayerSnapshot::new("prey", 5.5, 5.5, 0.0, true)];

        update(&mut bot, &grid, &players, 0.05, &mut rng);

        assert_eq!(bot.x, 5.0, "bot inside stop distance must not advance");
    }

    #[test]
    fn test_blocked_step_schedules_redecision() {
        let grid = open_grid();
        let mut rng = StdRng::seed_from_u64(14);
        // Wedged against the right border, heading into it, timer far out
        let mut bot = BotState::new("Bot1", 18.9, 5.5, 0.0);
        bot.target_a = 0.0;
        bot.next_decision_in = 10.0;

        update(&mut bot, &grid, &[], 0.2, &mut rng);

        assert!(bot.next_decision_in >= bots::BOUNCE_DECISION_MIN - f32::EPSILON);
        assert!(bot.next_decision_in <= bots::BOUNCE_DECISION_MAX);
    }
}
