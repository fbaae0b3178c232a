/// Rendering constants
pub mod render {
    use std::f32::consts::PI;

    /// Horizontal field of view in radians (45 degrees)
    pub const FIELD_OF_VIEW: f32 = PI / 4.0;
    /// Maximum ray travel distance in world units
    pub const MAX_DEPTH: f32 = 16.0;
    /// Ray march step in world units
    pub const RAY_STEP: f32 = 0.1;
    /// Corner angle threshold for wall-seam shading, radians
    pub const BOUNDARY_THRESHOLD: f32 = 0.005;

    /// Default frame size in characters
    pub const DEFAULT_COLS: usize = 120;
    pub const DEFAULT_ROWS: usize = 40;
    /// Resize clamp bounds
    pub const MIN_COLS: usize = 40;
    pub const MAX_COLS: usize = 240;
    pub const MIN_ROWS: usize = 12;
    pub const MAX_ROWS: usize = 80;
    /// Sprite projection scale clamp bounds
    pub const MIN_VIEW_SCALE: f32 = 0.5;
    pub const MAX_VIEW_SCALE: f32 = 3.0;
}

/// Map generation constants
pub mod map {
    /// Default grid size in cells
    pub const WIDTH: usize = 20;
    pub const HEIGHT: usize = 10;

    /// Target wall fraction is sampled uniformly from this range per attempt
    pub const MIN_WALL_CHANCE: f32 = 0.10;
    pub const MAX_WALL_CHANCE: f32 = 0.35;
    /// Minimum open fraction of interior cells for a grid to be accepted
    pub const MIN_OPEN_RATIO: f32 = 0.40;
    /// Generation attempts before falling back to an all-open interior
    pub const MAX_ATTEMPTS: usize = 10;

    /// Wall block size ranges, inclusive
    pub const BLOCK_MIN_W: usize = 1;
    pub const BLOCK_MAX_W: usize = 4;
    pub const BLOCK_MIN_H: usize = 1;
    pub const BLOCK_MAX_H: usize = 3;
}

/// Player movement constants
pub mod movement {
    /// Walk speed in world units per second
    pub const SPEED: f32 = 5.0;
    /// Rotation rate factor; angular rate is SPEED * TURN_RATE rad/s
    pub const TURN_RATE: f32 = 0.28;
    /// Fixed time slice applied per input token
    pub const INPUT_DT: f32 = 0.05;
}

/// Bot behavior constants
pub mod bots {
    /// Bots spawned when bot mode is enabled
    pub const COUNT: usize = 6;
    /// Walk speed in world units per second
    pub const SPEED: f32 = 2.5;
    /// Maximum turn rate in radians per second
    pub const TURN_SPEED: f32 = 2.2;
    /// Wander decision interval bounds in seconds
    pub const DECISION_MIN: f32 = 0.6;
    pub const DECISION_MAX: f32 = 1.8;
    /// Re-decision delay bounds after a blocked step
    pub const BOUNCE_DECISION_MIN: f32 = 0.2;
    pub const BOUNCE_DECISION_MAX: f32 = 0.6;
    /// Target acquisition range in world units
    pub const DETECT_RANGE: f32 = 10.0;
    /// Range at which a locked target is dropped
    pub const LOSE_RANGE: f32 = 14.0;
    /// Bots stop advancing within this distance of their target
    pub const STOP_DISTANCE: f32 = 0.8;
    /// Per-tick time slice clamp in seconds
    pub const MAX_STEP_DT: f32 = 0.2;
}

/// Combat constants
pub mod combat {
    /// Line-of-sight sampling step in world units
    pub const LOS_STEP: f32 = 0.05;
    /// Targets closer than this are rejected (degenerate bearing)
    pub const MIN_TARGET_DISTANCE: f32 = 0.05;
}

/// Weapon cooldowns
pub mod weapons {
    pub const PISTOL_COOLDOWN_MS: u64 = 200;
    pub const SHOTGUN_COOLDOWN_MS: u64 = 500;
}

/// World tick constants
pub mod tick {
    /// Tick rate in Hz
    pub const RATE: u32 = 20;
    /// Tick duration in milliseconds
    pub const DURATION_MS: u64 = 1000 / RATE as u64;
}
