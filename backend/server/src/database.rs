//! # Registration Store
//!
//! Durable home of registrant records, keyed by normalized email.
//!
//! ## Requirements
//!
//! - At most one record per normalized email, enforced atomically by the store
//! - Duplicate inserts reported as a typed [`StoreError::UniqueViolation`]
//! - Records are never updated or deleted by the application
//! - Lookup by email returns only the access code
//!
//! ## Redis Implementation
//!
//! - Redis hash: 1 big key (`registrations`), then email-record pairs
//! - Record is the JSON-encoded [`Registration`]
//! - Insert is a single `HSETNX`, either the whole record lands or nothing does
//! - Lookup is a single `HGET`
//! - No read-then-write, concurrent inserts for one email race inside Redis
//!
//! ## Memory Implementation
//!
//! Same contract behind a mutex, for tests and local runs without Redis.
use std::{
    collections::{HashMap, hash_map::Entry},
    time::Duration,
};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::{access_code::AccessCode, models::Registration};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("corrupt record: {e}"))
    }
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn insert(&self, registration: &Registration) -> Result<(), StoreError>;

    /// `email` must already be normalized.
    async fn access_code_by_email(&self, email: &str) -> Result<Option<AccessCode>, StoreError>;
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis");

    Ok(connection_manager)
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    key: String,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager, key: impl Into<String>) -> Self {
        Self {
            connection,
            key: key.into(),
        }
    }
}

#[async_trait]
impl RegistrationStore for RedisStore {
    async fn insert(&self, registration: &Registration) -> Result<(), StoreError> {
        let record = serde_json::to_string(registration)?;
        let mut connection = self.connection.clone();

        let inserted: bool = connection
            .hset_nx(&self.key, registration.email(), record)
            .await?;

        if !inserted {
            return Err(StoreError::UniqueViolation("email"));
        }

        Ok(())
    }

    async fn access_code_by_email(&self, email: &str) -> Result<Option<AccessCode>, StoreError> {
        let mut connection = self.connection.clone();

        let record: Option<String> = connection.hget(&self.key, email).await?;

        record.as_deref().map(decode_access_code).transpose()
    }
}

fn decode_access_code(raw: &str) -> Result<AccessCode, StoreError> {
    Ok(serde_json::from_str::<Registration>(raw)?.access_code)
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Registration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    pub async fn get(&self, email: &str) -> Option<Registration> {
        self.records.lock().await.get(email).cloned()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert(&self, registration: &Registration) -> Result<(), StoreError> {
        match self
            .records
            .lock()
            .await
            .entry(registration.email().to_string())
        {
            Entry::Vacant(entry) => {
                entry.insert(registration.clone());
                Ok(())
            }
            Entry::Occupied(_) => Err(StoreError::UniqueViolation("email")),
        }
    }

    async fn access_code_by_email(&self, email: &str) -> Result<Option<AccessCode>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .get(email)
            .map(|r| r.access_code.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Registrant, RegistrationForm};

    fn registration(email: &str, code: &str) -> Registration {
        let registrant = Registrant::try_from(RegistrationForm {
            full_name: "Jane Doe".into(),
            phone_number: "+2348012345678".into(),
            email: email.into(),
            school_name: "X School".into(),
            position: "Proprietor".into(),
            lga_town: "Ila".into(),
            how_heard: "Other".into(),
        })
        .unwrap();

        Registration::new(registrant, AccessCode::from(code.to_string()))
    }

    #[test]
    fn test_decode_access_code() {
        let raw = serde_json::to_string(&registration("a@x.com", "AAAA-AAAA")).unwrap();

        assert_eq!(decode_access_code(&raw).unwrap().as_str(), "AAAA-AAAA");
    }

    #[test]
    fn test_decode_corrupt_record() {
        let err = decode_access_code("not json").unwrap_err();

        assert!(matches!(
            err,
            StoreError::Unavailable(ref reason) if reason.starts_with("corrupt record")
        ));
    }

    #[tokio::test]
    async fn test_memory_insert_then_lookup() {
        let store = MemoryStore::new();
        store.insert(&registration("a@x.com", "AAAA-AAAA")).await.unwrap();

        let code = store.access_code_by_email("a@x.com").await.unwrap();
        assert_eq!(code.unwrap().as_str(), "AAAA-AAAA");
        assert!(store.access_code_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_duplicate_keeps_original() {
        let store = MemoryStore::new();
        store.insert(&registration("a@x.com", "AAAA-AAAA")).await.unwrap();

        let err = store
            .insert(&registration("a@x.com", "BBBB-BBBB"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UniqueViolation("email")));
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("a@x.com").await.unwrap().access_code.as_str(),
            "AAAA-AAAA"
        );
    }

    #[tokio::test]
    async fn test_memory_concurrent_inserts_one_wins() {
        let store = std::sync::Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert(&registration("race@x.com", &format!("CODE-{i:04}")))
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(store.len().await, 1);
    }
}
