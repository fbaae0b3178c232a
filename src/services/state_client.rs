//! Client for the external position-persistence service: load a player's last
//! known pose on connect, save it on disconnect. All failures are swallowed;
//! persistence is best-effort and never affects the session.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::game::player::Pose;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PersistedPose {
    pub x: f32,
    pub y: f32,
    pub a: f32,
}

impl From<Pose> for PersistedPose {
    fn from(pose: Pose) -> Self {
        Self {
            x: pose.x,
            y: pose.y,
            a: pose.a,
        }
    }
}

/// HTTP client for the state service; a `None` base URL disables it.
pub struct PlayerStateClient {
    base_url: Option<String>,
    http: reqwest::Client,
}

impl PlayerStateClient {
    pub fn new(base_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { base_url, http }
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fetch the last persisted pose, if the service is configured and has
    /// one. Any transport or decode failure reads as "no saved state".
    pub async fn load(&self, nickname: &str) -> Option<PersistedPose> {
        let base = self.base_url.as_deref()?;
        let url = format!("{}/players/{}/state", base, nickname.trim().to_lowercase());

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                response.json::<PersistedPose>().await.ok()
            }
            Ok(response) => {
                debug!("State load for '{}' returned {}", nickname, response.status());
                None
            }
            Err(e) => {
                debug!("State load for '{}' failed: {}", nickname, e);
                None
            }
        }
    }

    /// Persist the pose; failures are logged and dropped.
    pub async fn save(&self, nickname: &str, pose: Pose) {
        let Some(base) = self.base_url.as_deref() else {
            return;
        };
        let url = format!("{}/players/{}/state", base, nickname.trim().to_lowercase());

        let result = self
            .http
            .put(&url)
            .json(&PersistedPose::from(pose))
            .send()
            .await;
        match result {
            Ok(response) if !response.status().is_success() => {
                warn!("State save for '{}' returned {}", nickname, response.status());
            }
            Err(e) => {
                warn!("State save for '{}' failed: {}", nickname, e);
            }
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_is_inert() {
        let client = PlayerStateClient::new(None);
        assert!(!client.is_enabled());
        assert_eq!(client.load("alice").await, None);
        // save must be a no-op rather than an error
        client.save("alice", Pose::new(3.5, 3.5, 0.0)).await;
    }

    #[test]
    fn test_persisted_pose_roundtrip() {
        let pose = PersistedPose {
            x: 4.5,
            y: 2.5,
            a: 1.25,
        };
        let json = serde_json::to_string(&pose).unwrap();
        let back: PersistedPose = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pose);
    }
}
