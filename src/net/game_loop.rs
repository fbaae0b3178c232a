//! The fixed-rate world tick: advance bots once, then render and transmit one
//! frame per active session, in parallel. Per-session failures are isolated;
//! a slow or broken connection never stalls the other sessions or the tick.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;

use crate::game::combat;
use crate::game::constants::tick;
use crate::game::frame;
use crate::game::player::{PlayerSnapshot, Pose};
use crate::game::raycast::Renderer;
use crate::game::sprites;
use crate::net::host::WorldHost;
use crate::net::session::PlayerSession;

/// Spawn the world tick task.
pub fn start(host: Arc<WorldHost>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(tick::DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("World loop started at {} Hz", tick::RATE);
        let mut last = Instant::now();

        loop {
            ticker.tick().await;
            let now = Instant::now();
            let dt = (now - last).as_secs_f32();
            last = now;

            host.update_bots(dt);

            let sessions = host.sessions_snapshot();
            if sessions.is_empty() {
                continue;
            }
            let visible = host.visible_snapshots();

            let fan_out = sessions.into_iter().map(|session| {
                let host = host.clone();
                let visible = visible.clone();
                async move {
                    if let Some(text) = build_frame(&host, &session, &visible).await {
                        session.send_text(text).await;
                    }
                }
            });
            join_all(fan_out).await;
        }
    })
}

/// Build one frame for the session under its render lock: raycast the walls,
/// draw visible enemies with depth testing, then the minimap, weapon, and
/// help overlays. Returns `None` for sessions already closed.
pub async fn build_frame(
    host: &WorldHost,
    session: &PlayerSession,
    visible: &[PlayerSnapshot],
) -> Option<String> {
    if session.is_closed() {
        return None;
    }

    let mut renderer = session.renderer().await;
    session.sync_viewport(&mut renderer);

    let pose = session.pose();
    let view = session.view();
    renderer.render(host.grid(), &pose);

    let self_alive = host
        .get_snapshot(session.nickname())
        .map_or(true, |snap| snap.is_alive);
    let sprite_scale = sprites::distance_scale(view.cols, view.rows, view.scale);

    let mut minimap_others = Vec::with_capacity(visible.len());
    for snap in visible {
        if snap.nickname.eq_ignore_ascii_case(session.nickname()) {
            continue;
        }
        minimap_others.push((snap.x, snap.y, snap.a));
        draw_enemy(&mut renderer, &pose, snap, sprite_scale);
    }

    if session.minimap_visible() {
        let viewer = if self_alive { Some(pose) } else { None };
        frame::overlay_minimap(
            renderer.frame_mut(),
            host.grid(),
            viewer.as_ref(),
            &minimap_others,
        );
    }

    if self_alive {
        let (cols, rows) = (renderer.width() as i32, renderer.height() as i32);
        frame::draw_sprite(renderer.frame_mut(), session.weapon_sprite(), cols / 2, rows - 1);
    }

    frame::draw_help_overlay(renderer.frame_mut());
    Some(renderer.frame().to_text())
}

/// Project one enemy into the frame: FOV mapping for the column, wall
/// projection for the anchor row, silhouette by scaled distance, nickname
/// label above it. Each cell is depth-tested against the wall raster.
fn draw_enemy(renderer: &mut Renderer, pose: &Pose, snap: &PlayerSnapshot, sprite_scale: f32) {
    let width = renderer.width();
    let height = renderer.height() as f32;

    let Some((screen_x, distance)) = combat::project_to_screen(pose, width, snap.x, snap.y)
    else {
        return;
    };

    let ceiling = (height / 2.0 - height / distance) as i32;
    let floor = renderer.height() as i32 - ceiling;
    let anchor_y = floor.min(renderer.height() as i32);

    let sprite = sprites::select_enemy_sprite(distance * sprite_scale);
    let (frame, depth) = renderer.frame_and_depth();
    frame::draw_occluded_sprite(frame, depth, sprite, screen_x, anchor_y, distance);
    frame::draw_name(
        frame,
        depth,
        &snap.nickname,
        screen_x,
        anchor_y - sprite.len() as i32 - 1,
        distance,
    );
}
