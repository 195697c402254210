use base64::{engine::general_purpose, Engine as _};
use chrono::Duration;
use rand::Rng;

/// Runtime configuration, read once from the environment at boot.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub session_key: Vec<u8>,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub refresh_replay_grace_secs: i64,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
            let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
            format!("0.0.0.0:{port}")
        });

        let session_key = match std::env::var("SESSION_KEY") {
            Ok(b64) => general_purpose::STANDARD
                .decode(b64)
                .map_err(|_| anyhow::anyhow!("SESSION_KEY must be base64"))?,
            Err(_) => {
                // sessions won't survive a restart without a fixed key
                tracing::warn!("SESSION_KEY not set, generating an ephemeral signing key");
                rand::thread_rng().gen::<[u8; 32]>().to_vec()
            }
        };

        let access_ttl_minutes = env_i64("ACCESS_TOKEN_TTL_MINUTES", 15);
        let refresh_ttl_days = env_i64("REFRESH_TOKEN_TTL_DAYS", 14);
        let refresh_replay_grace_secs = env_i64("REFRESH_REPLAY_GRACE_SECS", 30);

        let seed_demo_data = std::env::var("SEED_DEMO_DATA")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(true);

        Ok(Config {
            bind_addr,
            session_key,
            access_ttl_minutes,
            refresh_ttl_days,
            refresh_replay_grace_secs,
            seed_demo_data,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }

    pub fn refresh_replay_grace(&self) -> Duration {
        Duration::seconds(self.refresh_replay_grace_secs)
    }

    /// Fixed-key config for tests; no environment involved.
    pub fn for_tests() -> Self {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            session_key: b"test-session-key-test-session-ke".to_vec(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 14,
            refresh_replay_grace_secs: 30,
            seed_demo_data: false,
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
