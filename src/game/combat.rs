//! Hit-scan combat: field-of-view projection, line-of-sight sampling, and the
//! sprite-silhouette crosshair test. One discrete shot, nearest hit wins.

use crate::game::constants::{combat, render};
use crate::game::map::TileGrid;
use crate::game::player::{PlayerSnapshot, Pose};
use crate::game::sprites::{self, Sprite};
use crate::util::angle;

/// Which registry supplies combat candidates (and bot navigation targets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSource {
    #[default]
    Players,
    Bots,
}

/// Resolve a shot fired from `pose` against the candidate set. Candidates
/// that are dead or the shooter are skipped; among the rest the nearest one
/// passing projection, line-of-sight and crosshair overlap is returned.
pub fn resolve(
    grid: &TileGrid,
    shooter: &str,
    pose: &Pose,
    screen_width: usize,
    screen_height: usize,
    view_scale: f32,
    candidates: &[PlayerSnapshot],
) -> Option<String> {
    let sprite_scale = sprites::distance_scale(screen_width, screen_height, view_scale);

    let mut best: Option<(f32, &PlayerSnapshot)> = None;
    for snap in candidates {
        if !snap.is_alive || snap.nickname.eq_ignore_ascii_case(shooter) {
            continue;
        }
        let Some((screen_x, distance)) = project_to_screen(pose, screen_width, snap.x, snap.y)
        else {
            continue;
        };
        if !grid.line_of_sight(pose.x, pose.y, snap.x, snap.y) {
            continue;
        }
        let sprite = sprites::select_enemy_sprite(distance * sprite_scale);
        if !crosshair_hit(screen_x, screen_width, sprite) {
            continue;
        }
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, snap));
        }
    }

    best.map(|(_, snap)| snap.nickname.clone())
}

/// Map a world position into the viewport: the bearing offset from the left
/// field-of-view edge scales into [0, width]. Rejects degenerate or
/// out-of-depth distances and bearings outside the field of view. The
/// wraparound branch keeps its asymmetric comparison; a bearing exactly on
/// the right edge maps one past the last column.
pub fn project_to_screen(
    pose: &Pose,
    screen_width: usize,
    target_x: f32,
    target_y: f32,
) -> Option<(i32, f32)> {
    let dx = target_x - pose.x;
    let dy = target_y - pose.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance <= combat::MIN_TARGET_DISTANCE || distance > render::MAX_DEPTH {
        return None;
    }

    let target_angle = angle::bearing(dx, dy);
    let mut fov_left = pose.a - render::FIELD_OF_VIEW / 2.0;
    if fov_left < 0.0 {
        fov_left += angle::TWO_PI;
    }

    let diff = if target_angle < fov_left
        && fov_left - angle::TWO_PI + render::FIELD_OF_VIEW > target_angle
    {
        target_angle + angle::TWO_PI - fov_left
    } else {
        target_angle - fov_left
    };
    if diff < 0.0 || diff > render::FIELD_OF_VIEW {
        return None;
    }

    let ratio = diff / render::FIELD_OF_VIEW;
    Some(((screen_width as f32 * ratio) as i32, distance))
}

/// Whether the viewport's horizontal center lies within the sprite's
/// projected half-width around the target's screen position.
pub fn crosshair_hit(screen_x: i32, screen_width: usize, sprite: Sprite) -> bool {
    let half_width = (sprite[0].chars().count() / 2) as i32;
    let center = (screen_width / 2) as i32;
    center >= screen_x - half_width && center <= screen_x + half_width
}
