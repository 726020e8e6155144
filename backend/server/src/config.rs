use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::notify::{DispatchPolicy, MailSettings};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown store backend '{other}', expected redis or memory"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub registrations_key: String,
    pub resend_url: String,
    pub resend_api_key: Option<String>,
    pub notify_timeout: Duration,
    pub mail: MailSettings,
    pub dispatch: DispatchPolicy,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_sources(|key| env::var(key).ok(), read_secret)
    }

    pub fn from_sources<V, S>(var: V, secret: S) -> Result<Self>
    where
        V: Fn(&str) -> Option<String>,
        S: Fn(&str) -> Option<String>,
    {
        let defaults = DispatchPolicy::default();

        Ok(Self {
            port: try_load(&var, "RUST_PORT", "8080")?,
            store_backend: try_load(&var, "STORE_BACKEND", "redis")?,
            redis_url: try_load(&var, "REDIS_URL", "redis://127.0.0.1:6379")?,
            registrations_key: try_load(&var, "REGISTRATIONS_KEY", "registrations")?,
            resend_url: try_load(&var, "RESEND_URL", "https://api.resend.com")?,
            resend_api_key: secret("RESEND_API_KEY").filter(|key| !key.is_empty()),
            notify_timeout: Duration::from_millis(try_load(&var, "NOTIFY_TIMEOUT_MS", "5000")?),
            mail: MailSettings {
                from: try_load(&var, "MAIL_FROM", "Workshop Registration <noreply@example.com>")?,
                organizer: try_load(&var, "ORGANIZER_EMAIL", "organizer@example.com")?,
                event_name: try_load(&var, "EVENT_NAME", "Tech Workshop")?,
            },
            dispatch: DispatchPolicy {
                capacity: try_load(&var, "NOTIFY_QUEUE_CAPACITY", "100")?,
                max_attempts: try_load(&var, "NOTIFY_MAX_ATTEMPTS", "2")?,
                retry_backoff: defaults.retry_backoff,
            },
        })
    }
}

fn try_load<T, V>(var: &V, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}

/// Docker secret first, then the environment.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(s) => Some(s.trim().to_string()),
        Err(_) => env::var(secret_name).ok().or_else(|| {
            warn!("{secret_name} not found in secrets or environment");
            None
        }),
    }
}
