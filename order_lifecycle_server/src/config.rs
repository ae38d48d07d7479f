use std::{env, time::Duration};

use log::*;
use olc_common::{parse_millis, Secret};
use order_lifecycle_engine::{
    lease::AcquirePolicy,
    webhook::{SignatureMode, DEFAULT_SIGNATURE_HEADER},
    ProcessingDelay,
};

const DEFAULT_OLC_HOST: &str = "127.0.0.1";
const DEFAULT_OLC_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/orders.db";
const DEFAULT_LOCK_TTL: Duration = Duration::from_millis(1000);
const DEFAULT_LOCK_MAX_ATTEMPTS: u32 = 50;
const DEFAULT_LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_MAX_PROCESSING_DELAY: Duration = Duration::from_millis(2000);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WEBHOOK_SECRET: &str = "default-webhook-secret-change-me";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// When `None`, leases are kept in process memory. That is only safe with a single server instance.
    pub redis_url: Option<String>,
    pub lock: LockConfig,
    /// Ceiling of the random delay inserted while a transition holds its lease. Zero disables the delay.
    pub max_processing_delay: Duration,
    pub webhook: WebhookConfig,
    /// How long a transition route waits for its result before answering 504.
    pub request_timeout: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockConfig {
    pub ttl: Duration,
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub secret: Secret<String>,
    pub mode: SignatureMode,
    pub signature_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLC_HOST.to_string(),
            port: DEFAULT_OLC_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: None,
            lock: LockConfig::default(),
            max_processing_delay: DEFAULT_MAX_PROCESSING_DELAY,
            webhook: WebhookConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_LOCK_TTL,
            max_attempts: DEFAULT_LOCK_MAX_ATTEMPTS,
            retry_interval: DEFAULT_LOCK_RETRY_INTERVAL,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: Secret::new(DEFAULT_WEBHOOK_SECRET.to_string()),
            mode: SignatureMode::default(),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OLC_HOST").ok().unwrap_or_else(|| DEFAULT_OLC_HOST.into());
        let port = env::var("OLC_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OLC_PORT. {e} Using the default, {DEFAULT_OLC_PORT}, instead."
                    );
                    DEFAULT_OLC_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OLC_PORT);
        let database_url = env::var("OLC_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ OLC_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let redis_url = env::var("OLC_REDIS_URL").ok().filter(|s| !s.trim().is_empty());
        let lock = LockConfig::from_env_or_default();
        let max_processing_delay = duration_from_env("OLC_MAX_PROCESSING_DELAY_MS", DEFAULT_MAX_PROCESSING_DELAY);
        let request_timeout = duration_from_env("OLC_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT);
        let webhook = WebhookConfig::from_env_or_default();
        Self { host, port, database_url, redis_url, lock, max_processing_delay, webhook, request_timeout }
    }

    pub fn acquire_policy(&self) -> AcquirePolicy {
        AcquirePolicy::default()
            .with_ttl(self.lock.ttl)
            .with_max_attempts(self.lock.max_attempts)
            .with_retry_interval(self.lock.retry_interval)
    }

    pub fn processing_delay(&self) -> ProcessingDelay {
        ProcessingDelay::up_to(self.max_processing_delay)
    }
}

impl LockConfig {
    pub fn from_env_or_default() -> Self {
        let ttl = duration_from_env("OLC_LOCK_TTL_MS", DEFAULT_LOCK_TTL);
        let ttl = if ttl.is_zero() {
            warn!("🪛️ OLC_LOCK_TTL_MS cannot be zero. Using the default of {}ms.", DEFAULT_LOCK_TTL.as_millis());
            DEFAULT_LOCK_TTL
        } else {
            ttl
        };
        let max_attempts = env::var("OLC_LOCK_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| {
                s.trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .or_else(|| {
                        warn!("🪛️ Invalid configuration value for OLC_LOCK_MAX_ATTEMPTS: {s}");
                        None
                    })
            })
            .unwrap_or(DEFAULT_LOCK_MAX_ATTEMPTS);
        let retry_interval = duration_from_env("OLC_LOCK_RETRY_INTERVAL_MS", DEFAULT_LOCK_RETRY_INTERVAL);
        Self { ttl, max_attempts, retry_interval }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("OLC_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            warn!(
                "🚨️🚨️🚨️ OLC_WEBHOOK_SECRET is not set. Using the built-in default secret. Anyone can forge shipping \
                 webhooks against this server. DO NOT run a production instance like this. 🚨️🚨️🚨️"
            );
            DEFAULT_WEBHOOK_SECRET.to_string()
        });
        let mode = match env::var("OLC_WEBHOOK_SIGNATURE_MODE") {
            Ok(s) => s.parse::<SignatureMode>().unwrap_or_else(|e| {
                warn!("🪛️ {e}. Using the default, {}.", SignatureMode::default());
                SignatureMode::default()
            }),
            Err(_) => SignatureMode::default(),
        };
        if mode == SignatureMode::Canonical {
            info!(
                "🪛️ Webhook signatures use the canonical policy. The shipping status and details are NOT covered by \
                 the signature. Set OLC_WEBHOOK_SIGNATURE_MODE=raw to sign the whole body."
            );
        }
        let signature_header = env::var("OLC_WEBHOOK_SIGNATURE_HEADER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.to_string());
        Self { secret: Secret::new(secret), mode, signature_header }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret.reveal() == DEFAULT_WEBHOOK_SECRET
    }
}

fn duration_from_env(name: &str, default: Duration) -> Duration {
    env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {}ms.", default.as_millis()))
        .and_then(|s| parse_millis(&s).map_err(|e| warn!("🪛️ Invalid configuration value for {name}. {e}")))
        .ok()
        .unwrap_or(default)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the configuration that request handlers need. It carries no secrets.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub request_timeout: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { request_timeout: config.request_timeout }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}
