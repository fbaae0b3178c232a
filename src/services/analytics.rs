//! Fire-and-forget gameplay analytics: events are queued on an unbounded
//! channel and shipped by a background task with HMAC-SHA256 request auth.
//! When not configured the service degrades to a no-op.

use base64::Engine;
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use parking_lot::Mutex;
use ring::hmac;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AnalyticsConfig;

const PLATFORM: &str = "server";
const SDK_VERSION: &str = "rest api v2";

#[derive(Debug, Clone)]
struct SessionContext {
    session_id: String,
    session_num: u32,
    started_at: DateTime<Utc>,
}

struct Inner {
    config: AnalyticsConfig,
    tx: mpsc::UnboundedSender<Value>,
    sessions: Mutex<HashMap<String, SessionContext>>,
    session_counts: Mutex<HashMap<String, u32>>,
}

/// Cheaply cloneable handle; all tracking calls are non-blocking.
#[derive(Clone)]
pub struct AnalyticsService {
    inner: Arc<Inner>,
}

impl AnalyticsService {
    /// Build the service and spawn the background shipping task.
    pub fn start(config: AnalyticsConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            inner: Arc::new(Inner {
                config: config.clone(),
                tx,
                sessions: Mutex::new(HashMap::new()),
                session_counts: Mutex::new(HashMap::new()),
            }),
        };

        if config.is_active() {
            tokio::spawn(ship_events(rx, config));
        } else {
            info!("Analytics disabled");
            drop(rx);
        }

        service
    }

    pub fn is_active(&self) -> bool {
        self.inner.config.is_active()
    }

    pub fn track_session_start(&self, nickname: &str) {
        if !self.is_active() {
            return;
        }
        let Some(user_id) = normalize_user_id(nickname) else {
            return;
        };

        let session = self.open_session(&user_id);
        let event = self.base_event("user", &session, &user_id);
        self.enqueue(event);
    }

    pub fn track_session_end(&self, nickname: &str) {
        if !self.is_active() {
            return;
        }
        let Some(user_id) = normalize_user_id(nickname) else {
            return;
        };
        let Some(session) = self.inner.sessions.lock().remove(&user_id) else {
            return;
        };

        let mut event = self.base_event("session_end", &session, &user_id);
        let length = (Utc::now() - session.started_at)
            .num_seconds()
            .clamp(0, 172_800);
        event["length"] = json!(length);
        self.enqueue(event);
    }

    pub fn track_kill(&self, killer: &str, victim: &str) {
        self.track_design_event(killer, "Combat:Kill");
        self.track_design_event(victim, "Combat:Death");
    }

    fn track_design_event(&self, nickname: &str, event_id: &str) {
        if !self.is_active() {
            return;
        }
        let Some(user_id) = normalize_user_id(nickname) else {
            return;
        };
        let Some(session) = self.inner.sessions.lock().get(&user_id).cloned() else {
            return;
        };

        let mut event = self.base_event("design", &session, &user_id);
        event["event_id"] = json!(event_id);
        self.enqueue(event);
    }

    fn open_session(&self, user_id: &str) -> SessionContext {
        let session_num = {
            let mut counts = self.inner.session_counts.lock();
            let count = counts.entry(user_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let session = SessionContext {
            session_id: Uuid::new_v4().to_string(),
            session_num,
            started_at: Utc::now(),
        };
        self.inner
            .sessions
            .lock()
            .insert(user_id.to_string(), session.clone());
        session
    }

    fn base_event(&self, category: &str, session: &SessionContext, user_id: &str) -> Value {
        let mut event = json!({
            "category": category,
            "v": 2,
            "user_id": user_id,
            "session_id": session.session_id,
            "session_num": session.session_num,
            "sdk_version": SDK_VERSION,
            "platform": PLATFORM,
            "client_ts": Utc::now().timestamp(),
        });
        if let Some(build) = &self.inner.config.build {
            event["build"] = json!(build);
        }
        event
    }

    fn enqueue(&self, event: Value) {
        if self.inner.tx.send(event).is_err() {
            warn!("Analytics queue closed, dropping event");
        }
    }
}

async fn ship_events(mut rx: mpsc::UnboundedReceiver<Value>, config: AnalyticsConfig) {
    let http = reqwest::Client::new();
    let url = format!("{}/v2/{}/events", config.base_url, config.game_key);

    while let Some(event) = rx.recv().await {
        let payload = match serde_json::to_string(&[&event]) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode analytics event: {}", e);
                continue;
            }
        };
        let auth = compute_hmac(&payload, &config.secret_key);

        let result = http
            .post(&url)
            .header("Authorization", auth)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await;
        match result {
            Ok(response) if !response.status().is_success() => {
                warn!("Analytics send failed: {}", response.status());
            }
            Err(e) => {
                warn!("Analytics send failed: {}", e);
            }
            Ok(_) => {}
        }
    }
}

/// Base64-encoded HMAC-SHA256 of the payload, keyed by the secret.
fn compute_hmac(payload: &str, secret_key: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret_key.as_bytes());
    let tag = hmac::sign(&key, payload.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
}

fn normalize_user_id(nickname: &str) -> Option<String> {
    let id = nickname.trim().to_lowercase();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_config() -> AnalyticsConfig {
        AnalyticsConfig {
            enabled: true,
            game_key: "game".to_string(),
            secret_key: "secret".to_string(),
            base_url: "http://localhost:0".to_string(),
            build: None,
        }
    }

    #[tokio::test]
    async fn test_inactive_service_tracks_nothing() {
        let service = AnalyticsService::start(AnalyticsConfig::default());
        assert!(!service.is_active());
        service.track_session_start("alice");
        assert!(service.inner.sessions.lock().is_empty());
    }

    #[tokio::test]
    async fn test_session_numbers_increment() {
        let service = AnalyticsService::start(active_config());

        service.track_session_start("Alice");
        service.track_session_end("alice");
        service.track_session_start("ALICE");

        let sessions = service.inner.sessions.lock();
        assert_eq!(sessions.get("alice").unwrap().session_num, 2);
    }

    #[tokio::test]
    async fn test_design_event_requires_open_session() {
        let service = AnalyticsService::start(active_config());
        // No session yet: must not panic and must not create one
        service.track_kill("alice", "bob");
        assert!(service.inner.sessions.lock().is_empty());
    }

    #[test]
    fn test_hmac_is_deterministic() {
        let a = compute_hmac("payload", "secret");
        let b = compute_hmac("payload", "secret");
        assert_eq!(a, b);
        assert_ne!(a, compute_hmac("payload", "other"));
        assert!(!a.is_empty());
    }

    #[test]
    fn test_user_id_normalization() {
        assert_eq!(normalize_user_id("  Alice "), Some("alice".to_string()));
        assert_eq!(normalize_user_id("   "), None);
    }
}
