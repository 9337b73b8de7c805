//! Typed configuration for the bridge and both platform adapters.

use std::{fmt, path::PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, Serializer},
};

/// Default sidecar endpoint for the WhatsApp Web bridge process.
pub const DEFAULT_SIDECAR_URL: &str = "ws://127.0.0.1:9876";

/// Default WhatsApp session name.
pub const DEFAULT_SESSION: &str = "main";

/// Default deadline for one platform round trip, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub discord: DiscordConfig,
    pub whatsapp: WhatsAppConfig,
    pub bridge: BridgeConfig,
}

/// Discord bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
        }
    }
}

/// Connection to the WhatsApp Web sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// WebSocket URL of the sidecar.
    pub sidecar_url: String,
    /// Session name used to key stored credentials.
    pub session: String,
    /// Where the sidecar keeps auth state. Sidecar default when unset.
    pub auth_dir: Option<PathBuf>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            sidecar_url: DEFAULT_SIDECAR_URL.into(),
            session: DEFAULT_SESSION.into(),
            auth_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Deadline for each platform round trip.
    pub request_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn serialize_secret<S: Serializer>(secret: &Secret<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(secret.expose_secret())
}
