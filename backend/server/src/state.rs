use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{
    config::{Config, StoreBackend},
    database::{MemoryStore, RedisStore, RegistrationStore, init_redis},
    lookup::LookupService,
    notify::{NotificationDispatcher, Notifier, ResendNotifier},
    registration::RegistrationService,
};

pub struct AppState {
    pub config: Config,
    pub registrations: RegistrationService,
    pub lookup: LookupService,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Connects the configured store and mail provider and starts the
    /// notification worker, whose handle is returned alongside the state.
    pub async fn new(config: Config) -> Result<(Arc<Self>, JoinHandle<()>)> {
        let store: Arc<dyn RegistrationStore> = match config.store_backend {
            StoreBackend::Redis => {
                let connection = init_redis(&config.redis_url).await?;
                Arc::new(RedisStore::new(connection, config.registrations_key.clone()))
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store, registrations will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        if config.resend_api_key.is_none() {
            warn!("RESEND_API_KEY missing, organizer notifications are disabled");
        }

        let notifier: Arc<dyn Notifier> = Arc::new(ResendNotifier::new(
            config.resend_url.clone(),
            config.resend_api_key.clone(),
            config.notify_timeout,
        )?);

        info!("State initialized");

        Ok(Self::from_parts(config, store, notifier))
    }

    pub fn from_parts(
        config: Config,
        store: Arc<dyn RegistrationStore>,
        notifier: Arc<dyn Notifier>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (dispatcher, worker) = NotificationDispatcher::spawn(
            notifier.clone(),
            config.mail.clone(),
            config.dispatch.clone(),
        );

        let state = Arc::new(Self {
            registrations: RegistrationService::new(store.clone(), dispatcher),
            lookup: LookupService::new(store),
            notifier,
            config,
        });

        (state, worker)
    }
}
