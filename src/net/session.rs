//! Per-connection session state and its independent input-receive loop.
//!
//! The input loop owns the player's pose and weapon state; the render state
//! is an owned value the tick loop locks exclusively. The two meet through a
//! pending-view cell: resizes deposited by the input loop are applied by the
//! next render, so neither loop ever blocks on the other's critical section.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::game::constants::{movement, render, weapons};
use crate::game::player::Pose;
use crate::game::raycast::Renderer;
use crate::game::sprites::{self, Sprite};
use crate::net::host::WorldHost;
use crate::services::directory::PlayerDirectory;
use crate::services::state_client::PlayerStateClient;

/// Applied frame geometry plus the sprite projection scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub cols: usize,
    pub rows: usize,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            cols: render::DEFAULT_COLS,
            rows: render::DEFAULT_ROWS,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weapon {
    #[default]
    Pistol,
    Shotgun,
}

impl Weapon {
    /// Cooldown between shots; doubles as the firing-sprite duration.
    pub fn cooldown(&self) -> Duration {
        match self {
            Weapon::Pistol => Duration::from_millis(weapons::PISTOL_COOLDOWN_MS),
            Weapon::Shotgun => Duration::from_millis(weapons::SHOTGUN_COOLDOWN_MS),
        }
    }
}

#[derive(Debug, Default)]
struct WeaponState {
    equipped: Weapon,
    last_shot: Option<Instant>,
}

impl WeaponState {
    fn is_shooting(&self) -> bool {
        self.last_shot
            .is_some_and(|at| at.elapsed() <= self.equipped.cooldown())
    }
}

type WsSink = SplitSink<WebSocket, Message>;

/// One per active connection; shared between the input loop (owner of pose
/// and weapon state) and the tick loop (owner of the render state).
pub struct PlayerSession {
    nickname: String,
    pose: Mutex<Pose>,
    view: Mutex<Viewport>,
    pending_view: Mutex<Option<Viewport>>,
    weapon: Mutex<WeaponState>,
    minimap_visible: AtomicBool,
    render: tokio::sync::Mutex<Renderer>,
    sink: tokio::sync::Mutex<Option<WsSink>>,
    close: watch::Sender<bool>,
}

impl PlayerSession {
    pub fn new(nickname: String, spawn: Pose, sink: Option<WsSink>) -> Arc<Self> {
        let view = Viewport::default();
        let (close, _) = watch::channel(false);
        Arc::new(Self {
            nickname,
            pose: Mutex::new(spawn),
            view: Mutex::new(view),
            pending_view: Mutex::new(None),
            weapon: Mutex::new(WeaponState::default()),
            minimap_visible: AtomicBool::new(true),
            render: tokio::sync::Mutex::new(Renderer::new(view.cols, view.rows)),
            sink: tokio::sync::Mutex::new(sink),
            close,
        })
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Consistent copy of the owned pose.
    pub fn pose(&self) -> Pose {
        *self.pose.lock()
    }

    /// The currently applied viewport (pending resizes not yet included).
    pub fn view(&self) -> Viewport {
        *self.view.lock()
    }

    pub fn minimap_visible(&self) -> bool {
        self.minimap_visible.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        *self.close.borrow()
    }

    /// Signal the session to terminate; the input loop observes this even
    /// while parked on the socket.
    pub fn close(&self, reason: &str) {
        debug!("Closing session '{}': {}", self.nickname, reason);
        self.close.send_replace(true);
    }

    /// Sprite for the equipped weapon, firing variant while on cooldown.
    pub fn weapon_sprite(&self) -> Sprite {
        let weapon = self.weapon.lock();
        match (weapon.equipped, weapon.is_shooting()) {
            (Weapon::Pistol, false) => sprites::PISTOL_IDLE,
            (Weapon::Pistol, true) => sprites::PISTOL_FIRE,
            (Weapon::Shotgun, false) => sprites::SHOTGUN_IDLE,
            (Weapon::Shotgun, true) => sprites::SHOTGUN_FIRE,
        }
    }

    /// Exclusive access to the render state, serializing this session's
    /// renders across ticks.
    pub async fn renderer(&self) -> tokio::sync::MutexGuard<'_, Renderer> {
        self.render.lock().await
    }

    /// Apply a deposited view change to the render state, if any.
    pub fn sync_viewport(&self, renderer: &mut Renderer) {
        if let Some(view) = self.pending_view.lock().take() {
            *self.view.lock() = view;
            if renderer.width() != view.cols || renderer.height() != view.rows {
                *renderer = Renderer::new(view.cols, view.rows);
            }
        }
    }

    /// Send one text frame; failures are logged and reported, never raised.
    pub async fn send_text(&self, text: String) -> bool {
        if self.is_closed() {
            return false;
        }
        let mut sink = self.sink.lock().await;
        let Some(sink) = sink.as_mut() else {
            return false;
        };
        match sink.send(Message::Text(text.into())).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Frame send to '{}' failed: {}", self.nickname, e);
                false
            }
        }
    }

    /// Best-effort close frame, then drop the sink.
    async fn shutdown_socket(&self) {
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.send(Message::Close(None)).await;
        }
    }

    /// Receive loop: apply control tokens until the socket ends, `Escape`
    /// arrives, or the session is force-closed.
    pub async fn run_input_loop(&self, host: &WorldHost, mut receiver: SplitStream<WebSocket>) {
        let mut closed = self.close.subscribe();
        while !self.is_closed() {
            tokio::select! {
                _ = closed.changed() => {}
                message = receiver.next() => {
                    let Some(message) = message else { break };
                    let message = match message {
                        Ok(message) => message,
                        Err(e) => {
                            debug!("Session '{}' socket error: {}", self.nickname, e);
                            break;
                        }
                    };
                    match message {
                        Message::Text(text) => {
                            if !self.handle_token(text.as_str(), host) {
                                break;
                            }
                        }
                        Message::Binary(data) => {
                            if let Ok(token) = std::str::from_utf8(&data) {
                                if !self.handle_token(token, host) {
                                    break;
                                }
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
            }
        }
    }

    /// Apply one inbound control token; returns false to end the session.
    /// Unrecognized tokens are ignored without any state change.
    pub(crate) fn handle_token(&self, token: &str, host: &WorldHost) -> bool {
        if token
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("RESIZE"))
        {
            if let Some(view) = parse_resize(token, self.view()) {
                *self.pending_view.lock() = Some(view);
            }
            return true;
        }

        let dt = movement::INPUT_DT;
        match token {
            "Escape" => return false,
            "KeyW" => {
                self.pose.lock().move_forward(dt, host.grid());
                self.broadcast_pose(host);
            }
            "KeyS" => {
                self.pose.lock().move_back(dt, host.grid());
                self.broadcast_pose(host);
            }
            "KeyA" => {
                self.pose.lock().turn_left(dt);
                self.broadcast_pose(host);
            }
            "KeyD" => {
                self.pose.lock().turn_right(dt);
                self.broadcast_pose(host);
            }
            "KeyM" => {
                self.minimap_visible.fetch_xor(true, Ordering::Relaxed);
            }
            "KeyB" => {
                host.toggle_bots_mode(&self.nickname);
            }
            "Digit1" => {
                self.weapon.lock().equipped = Weapon::Pistol;
            }
            "Digit2" => {
                self.weapon.lock().equipped = Weapon::Shotgun;
            }
            "Space" => {
                if self.try_mark_shot() {
                    let pose = self.pose();
                    let view = self.view();
                    host.handle_shoot(&self.nickname, pose, view.cols, view.rows, view.scale);
                }
            }
            _ => {}
        }
        true
    }

    fn broadcast_pose(&self, host: &WorldHost) {
        let pose = self.pose();
        host.upsert_snapshot(&self.nickname, pose.x, pose.y, pose.a, None);
    }

    /// Record the shot time iff the weapon cooldown has elapsed.
    fn try_mark_shot(&self) -> bool {
        let mut weapon = self.weapon.lock();
        if weapon.is_shooting() {
            return false;
        }
        weapon.last_shot = Some(Instant::now());
        true
    }
}

/// Parse a `RESIZE <cols> <rows> [<scale>]` message against the current view.
/// Returns the clamped new viewport, or `None` when the message is malformed
/// or changes nothing.
fn parse_resize(message: &str, current: Viewport) -> Option<Viewport> {
    let parts: Vec<&str> = message.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    let cols: usize = parts[1].parse().ok()?;
    let rows: usize = parts[2].parse().ok()?;

    let mut scale = current.scale;
    if let Some(raw) = parts.get(3) {
        if let Ok(parsed) = raw.parse::<f32>() {
            scale = parsed.clamp(render::MIN_VIEW_SCALE, render::MAX_VIEW_SCALE);
        }
    }

    let view = Viewport {
        cols: cols.clamp(render::MIN_COLS, render::MAX_COLS),
        rows: rows.clamp(render::MIN_ROWS, render::MAX_ROWS),
        scale,
    };
    let unchanged = view.cols == current.cols
        && view.rows == current.rows
        && (view.scale - current.scale).abs() <= 0.001;
    if unchanged {
        return None;
    }
    Some(view)
}

/// Full session lifecycle for an accepted socket: register (closing any
/// replaced session for the nickname), announce, run the input loop, then
/// tear down registry entries and persist the final pose.
pub async fn run_session(
    host: Arc<WorldHost>,
    directory: Arc<PlayerDirectory>,
    state_client: Arc<PlayerStateClient>,
    socket: WebSocket,
    nickname: String,
    spawn: Pose,
) {
    let (sink, stream) = socket.split();
    let session = PlayerSession::new(nickname.clone(), spawn, Some(sink));

    if let Some(previous) = host.register_session(session.clone()) {
        previous.close("Replaced");
    }
    host.upsert_snapshot(&nickname, spawn.x, spawn.y, spawn.a, Some(true));
    host.analytics().track_session_start(&nickname);
    info!("Session started for '{}'", nickname);

    session.run_input_loop(&host, stream).await;
    session.shutdown_socket().await;

    host.analytics().track_session_end(&nickname);
    state_client.save(&nickname, session.pose()).await;
    host.unregister_session(&session);
    host.remove_snapshot(&nickname);
    directory.remove(&nickname);
    info!("Session ended for '{}'", nickname);
}
