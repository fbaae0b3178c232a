use chrono::{DateTime, Utc};

use crate::game::constants::movement;
use crate::game::map::TileGrid;
use crate::util::angle;

/// Position plus heading, the minimal state of any mobile entity. Heading is
/// kept normalized to [0, 2π).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub a: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, a: f32) -> Self {
        Self {
            x,
            y,
            a: angle::normalize(a),
        }
    }

    /// Step along the heading, clamped by wall collision.
    pub fn move_forward(&mut self, dt: f32, grid: &TileGrid) {
        self.step(dt, 1.0, grid);
    }

    /// Step against the heading, clamped by wall collision.
    pub fn move_back(&mut self, dt: f32, grid: &TileGrid) {
        self.step(dt, -1.0, grid);
    }

    fn step(&mut self, dt: f32, sign: f32, grid: &TileGrid) {
        let step = movement::SPEED * dt * sign;
        let nx = self.x + self.a.cos() * step;
        let ny = self.y + self.a.sin() * step;
        if grid.is_walkable(nx, ny) {
            self.x = nx;
            self.y = ny;
        }
    }

    /// Rotate counterclockwise (screen-left) at the fixed angular rate.
    pub fn turn_left(&mut self, dt: f32) {
        self.a = angle::normalize(self.a - movement::SPEED * movement::TURN_RATE * dt);
    }

    /// Rotate clockwise (screen-right) at the fixed angular rate.
    pub fn turn_right(&mut self, dt: f32) {
        self.a = angle::normalize(self.a + movement::SPEED * movement::TURN_RATE * dt);
    }
}

/// The latest broadcastable pose + liveness for a player or bot, as seen by
/// every other observer. Updates are last-writer-wins per nickname.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub nickname: String,
    pub x: f32,
    pub y: f32,
    pub a: f32,
    pub updated_at: DateTime<Utc>,
    pub is_alive: bool,
}

impl PlayerSnapshot {
    pub fn new(nickname: impl Into<String>, x: f32, y: f32, a: f32, is_alive: bool) -> Self {
        Self {
            nickname: nickname.into(),
            x,
            y,
            a,
            updated_at: Utc::now(),
            is_alive,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.x, self.y, self.a)
    }
}
