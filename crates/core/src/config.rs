use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub gateway: GatewayConfig,
    pub ingest: IngestConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CIDVAULT_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CIDVAULT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            postgres: PostgresConfig::from_env_profiled(p),
            gateway: GatewayConfig::from_env_profiled(p),
            ingest: IngestConfig::from_env_profiled(p),
            auth: AuthConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:   {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  postgres: configured={}, max_connections={}",
            self.postgres.is_configured(),
            self.postgres.max_connections
        );
        tracing::info!(
            "  gateway:  url={}, timeout={}s",
            self.gateway.base_url,
            self.gateway.fetch_timeout_secs
        );
        tracing::info!(
            "  ingest:   concurrency={}, shutdown_grace={}s",
            self.ingest.concurrency,
            self.ingest.shutdown_grace_secs
        );
        tracing::info!("  auth:     user_configured={}", self.auth.username.is_some());
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Upper bound on the multipart body of a CID list upload.
    pub upload_max_bytes: usize,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "API_HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "API_PORT", 8080),
            request_timeout_secs: profiled_env_u64(p, "REQUEST_TIMEOUT_SECS", 10),
            upload_max_bytes: profiled_env_u64(p, "UPLOAD_MAX_BYTES", 32 * 1024) as usize,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            database_url: profiled_env_opt(p, "DATABASE_URL"),
            max_connections: profiled_env_u32(p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.database_url.is_some()
    }
}

// ── IPFS gateway ──────────────────────────────────────────────

pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.io/ipfs/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Prefix the CID is appended to, e.g. `https://ipfs.io/ipfs/`.
    pub base_url: String,
    pub fetch_timeout_secs: u64,
}

impl GatewayConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            base_url: profiled_env_or(p, "IPFS_GATEWAY_URL", DEFAULT_GATEWAY_URL),
            fetch_timeout_secs: profiled_env_u64(p, "FETCH_TIMEOUT_SECS", 10),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            fetch_timeout_secs: 10,
        }
    }
}

// ── Ingestion ─────────────────────────────────────────────────

pub const DEFAULT_INGEST_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum units of work executing at once. Never below 1.
    pub concurrency: usize,
    pub shutdown_grace_secs: u64,
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            concurrency: (profiled_env_u32(p, "INGEST_CONCURRENCY", DEFAULT_INGEST_CONCURRENCY as u32)
                as usize)
                .max(1),
            shutdown_grace_secs: profiled_env_u64(p, "SHUTDOWN_GRACE_SECS", 10),
        }
    }

    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            ..Self::default()
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_INGEST_CONCURRENCY,
            shutdown_grace_secs: 10,
        }
    }
}

// ── Basic auth ────────────────────────────────────────────────

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            username: profiled_env_opt(p, "BASIC_AUTH_USER"),
            password: profiled_env_opt(p, "BASIC_AUTH_PASS"),
        }
    }

    /// Compare presented credentials against the configured pair.
    /// Unset values compare as empty strings; there is no open mode.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username.as_deref().unwrap_or("") == username
            && self.password.as_deref().unwrap_or("") == password
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_concurrency_never_zero() {
        assert_eq!(IngestConfig::with_concurrency(0).concurrency, 1);
        assert_eq!(IngestConfig::with_concurrency(7).concurrency, 7);
        assert_eq!(IngestConfig::default().concurrency, 5);
    }

    #[test]
    fn gateway_defaults() {
        let gw = GatewayConfig::default();
        assert_eq!(gw.base_url, "https://ipfs.io/ipfs/");
        assert_eq!(gw.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn unset_auth_only_matches_empty_credentials() {
        let auth = AuthConfig::default();
        assert!(!auth.matches("anyone", "anything"));
        assert!(!auth.matches("anyone", ""));
        assert!(auth.matches("", ""));
    }

    #[test]
    fn auth_enabled_requires_exact_match() {
        let auth = AuthConfig {
            username: Some("admin".into()),
            password: Some("s3cret".into()),
        };
        assert!(auth.matches("admin", "s3cret"));
        assert!(!auth.matches("admin", "wrong"));
        assert!(!auth.matches("root", "s3cret"));
    }

    #[test]
    fn auth_debug_redacts_password() {
        let auth = AuthConfig {
            username: Some("admin".into()),
            password: Some("s3cret".into()),
        };
        let shown = format!("{:?}", auth);
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("admin"));
    }
}
