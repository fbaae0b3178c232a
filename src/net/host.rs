//! The world host: single owner of the shared mutable registries (sessions,
//! player snapshots, bots) and of the immutable tile grid. Registries are
//! guarded maps with last-writer-wins semantics per key; enumeration clones a
//! point-in-time value list under the read lock.

use hashbrown::HashMap;
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

use crate::game::bots::{self, BotState};
use crate::game::combat::{self, TargetSource};
use crate::game::constants::bots as bot_consts;
use crate::game::map::TileGrid;
use crate::game::player::{PlayerSnapshot, Pose};
use crate::net::session::PlayerSession;
use crate::services::analytics::AnalyticsService;
use crate::util::angle;

pub struct WorldHost {
    grid: Arc<TileGrid>,
    sessions: RwLock<HashMap<String, Arc<PlayerSession>>>,
    snapshots: RwLock<HashMap<String, PlayerSnapshot>>,
    bots: RwLock<HashMap<String, BotState>>,
    target_source: RwLock<TargetSource>,
    analytics: AnalyticsService,
}

impl WorldHost {
    pub fn new(grid: Arc<TileGrid>, analytics: AnalyticsService) -> Self {
        Self {
            grid,
            sessions: RwLock::new(HashMap::new()),
            snapshots: RwLock::new(HashMap::new()),
            bots: RwLock::new(HashMap::new()),
            target_source: RwLock::new(TargetSource::Players),
            analytics,
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    pub fn target_source(&self) -> TargetSource {
        *self.target_source.read()
    }

    // --- session registry ---

    pub fn has_session(&self, nickname: &str) -> bool {
        self.sessions.read().contains_key(&registry_key(nickname))
    }

    /// Point-in-time list of live sessions for the tick fan-out.
    pub fn sessions_snapshot(&self) -> Vec<Arc<PlayerSession>> {
        self.sessions.read().values().cloned().collect()
    }

    /// Insert the session under its nickname, returning a replaced session
    /// (same nickname reconnecting) for the caller to close.
    pub fn register_session(&self, session: Arc<PlayerSession>) -> Option<Arc<PlayerSession>> {
        self.sessions
            .write()
            .insert(registry_key(session.nickname()), session)
    }

    /// Remove the session, but only if this exact session still owns the
    /// slot; a replaced session's late cleanup must not evict its successor.
    pub fn unregister_session(&self, session: &Arc<PlayerSession>) {
        let key = registry_key(session.nickname());
        let mut sessions = self.sessions.write();
        if sessions
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            sessions.remove(&key);
        }
    }

    // --- snapshot registry (last-writer-wins per nickname) ---

    pub fn upsert_snapshot(&self, nickname: &str, x: f32, y: f32, a: f32, is_alive: Option<bool>) {
        let key = registry_key(nickname);
        let mut snapshots = self.snapshots.write();
        let alive = is_alive.unwrap_or_else(|| {
            snapshots.get(&key).map_or(true, |existing| existing.is_alive)
        });
        snapshots.insert(
            key,
            PlayerSnapshot::new(nickname.trim(), x, y, a, alive),
        );
    }

    pub fn get_snapshot(&self, nickname: &str) -> Option<PlayerSnapshot> {
        self.snapshots.read().get(&registry_key(nickname)).cloned()
    }

    pub fn remove_snapshot(&self, nickname: &str) {
        self.snapshots.write().remove(&registry_key(nickname));
    }

    fn set_alive(&self, nickname: &str, alive: bool) {
        let key = registry_key(nickname);
        let mut snapshots = self.snapshots.write();
        let updated = match snapshots.get(&key) {
            Some(existing) => {
                PlayerSnapshot::new(nickname.trim(), existing.x, existing.y, existing.a, alive)
            }
            None => PlayerSnapshot::new(nickname.trim(), 0.0, 0.0, 0.0, alive),
        };
        snapshots.insert(key, updated);
    }

    pub fn player_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.snapshots.read().values().cloned().collect()
    }

    pub fn alive_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.snapshots
            .read()
            .values()
            .filter(|s| s.is_alive)
            .cloned()
            .collect()
    }

    /// The snapshot set every session renders as enemies, selected by the
    /// active target source.
    pub fn visible_snapshots(&self) -> Vec<PlayerSnapshot> {
        match self.target_source() {
            TargetSource::Bots => self
                .bots
                .read()
                .values()
                .map(BotState::to_snapshot)
                .collect(),
            TargetSource::Players => self.alive_snapshots(),
        }
    }

    // --- world queries ---

    pub fn is_walkable(&self, x: f32, y: f32) -> bool {
        self.grid.is_walkable(x, y)
    }

    /// Pick an unoccupied spawn cell, excluding alive players and bots.
    pub fn try_spawn(&self) -> Option<(f32, f32)> {
        let mut occupied: Vec<(f32, f32)> = self
            .alive_snapshots()
            .iter()
            .map(|s| (s.x, s.y))
            .collect();
        occupied.extend(self.bots.read().values().map(|b| (b.x, b.y)));
        self.grid.try_spawn(&mut rand::thread_rng(), &occupied)
    }

    // --- bot mode ---

    /// Flip between player-versus-player and bot-match target sets.
    pub fn toggle_bots_mode(&self, requested_by: &str) {
        let mut source = self.target_source.write();
        *source = match *source {
            TargetSource::Players => TargetSource::Bots,
            TargetSource::Bots => TargetSource::Players,
        };
        let now_bots = *source == TargetSource::Bots;
        drop(source);

        if now_bots {
            self.spawn_bots();
        } else {
            self.bots.write().clear();
        }
        info!(
            "Bot mode {} by '{}'",
            if now_bots { "enabled" } else { "disabled" },
            requested_by
        );
    }

    fn spawn_bots(&self) {
        let mut occupied: Vec<(f32, f32)> = self
            .alive_snapshots()
            .iter()
            .map(|s| (s.x, s.y))
            .collect();

        let mut rng = rand::thread_rng();
        let mut bots = self.bots.write();
        bots.clear();
        for i in 1..=bot_consts::COUNT {
            let Some((x, y)) = self.grid.try_spawn(&mut rng, &occupied) else {
                break;
            };
            occupied.push((x, y));
            let a = rng.gen_range(0.0..angle::TWO_PI);
            let name = format!("Bot{i}");
            bots.insert(registry_key(&name), BotState::new(name, x, y, a));
        }
    }

    /// Advance every bot by the (clamped) tick delta.
    pub fn update_bots(&self, dt: f32) {
        if self.target_source() != TargetSource::Bots {
            return;
        }
        let step = dt.clamp(0.0, bot_consts::MAX_STEP_DT);
        let players = self.alive_snapshots();
        let mut rng = rand::thread_rng();

        let mut bots = self.bots.write();
        for bot in bots.values_mut() {
            bots::update(bot, &self.grid, &players, step, &mut rng);
        }
    }

    pub fn bot_count(&self) -> usize {
        self.bots.read().len()
    }

    // --- combat ---

    /// Resolve one hitscan shot from the shooter's pose and viewport; applies
    /// the kill effect and returns the victim, if any.
    pub fn handle_shoot(
        &self,
        shooter: &str,
        pose: Pose,
        screen_width: usize,
        screen_height: usize,
        view_scale: f32,
    ) -> Option<String> {
        if !self.can_shoot(shooter) {
            return None;
        }

        let source = self.target_source();
        let candidates = match source {
            TargetSource::Bots => self
                .bots
                .read()
                .values()
                .map(BotState::to_snapshot)
                .collect::<Vec<_>>(),
            TargetSource::Players => self.player_snapshots(),
        };

        let victim = combat::resolve(
            &self.grid,
            shooter,
            &pose,
            screen_width,
            screen_height,
            view_scale,
            &candidates,
        )?;

        match source {
            TargetSource::Bots => self.kill_bot(&victim),
            TargetSource::Players => self.kill_player(&victim),
        }
        self.analytics.track_kill(shooter, &victim);
        info!("'{}' shot '{}'", shooter, victim);
        Some(victim)
    }

    /// Dead shooters cannot fire; an unknown shooter (no snapshot yet) can.
    fn can_shoot(&self, shooter: &str) -> bool {
        if shooter.trim().is_empty() {
            return false;
        }
        self.get_snapshot(shooter).map_or(true, |snap| snap.is_alive)
    }

    fn kill_player(&self, nickname: &str) {
        self.set_alive(nickname, false);
        let session = self.sessions.read().get(&registry_key(nickname)).cloned();
        if let Some(session) = session {
            session.close("Killed");
        } else {
            debug!("Killed player '{}' has no live session", nickname);
        }
    }

    fn kill_bot(&self, nickname: &str) {
        self.bots.write().remove(&registry_key(nickname));
    }
}

fn registry_key(nickname: &str) -> String {
    nickname.trim().to_lowercase()
}
