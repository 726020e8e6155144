#![allow(dead_code)]

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use server::{
    access_code::AccessCode,
    config::Config,
    database::{RegistrationStore, StoreError},
    models::{Registration, RegistrationForm},
    notify::{DispatchPolicy, EmailMessage, MailSettings, Notifier, NotifyError},
};
use tokio::sync::Mutex;

pub fn sample_form(email: &str) -> RegistrationForm {
    RegistrationForm {
        full_name: "Jane Doe".into(),
        phone_number: "+234 801 234 5678".into(),
        email: email.into(),
        school_name: "X School".into(),
        position: "Proprietor".into(),
        lga_town: "Ila".into(),
        how_heard: "WhatsApp Group".into(),
    }
}

pub fn mail_settings() -> MailSettings {
    MailSettings {
        from: "Workshop <noreply@example.com>".into(),
        organizer: "organizer@example.com".into(),
        event_name: "Tech Workshop".into(),
    }
}

pub fn fast_policy() -> DispatchPolicy {
    DispatchPolicy {
        capacity: 16,
        max_attempts: 2,
        retry_backoff: Duration::from_millis(1),
    }
}

pub fn test_config() -> Config {
    let mut config = Config::from_sources(|_| None, |_| None).expect("default config");
    config.mail = mail_settings();
    config.dispatch = fast_policy();
    config
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<String, NotifyError> {
        let mut sent = self.sent.lock().await;
        sent.push(message.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

/// Simulates a mail provider outage.
#[derive(Default)]
pub struct FailingNotifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _message: &EmailMessage) -> Result<String, NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Rejected {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "provider down".into(),
        })
    }
}

pub struct UnconfiguredNotifier;

#[async_trait]
impl Notifier for UnconfiguredNotifier {
    async fn send(&self, _message: &EmailMessage) -> Result<String, NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

/// Simulates the store being down.
#[derive(Default)]
pub struct UnavailableStore {
    pub inserts: AtomicUsize,
}

#[async_trait]
impl RegistrationStore for UnavailableStore {
    async fn insert(&self, _registration: &Registration) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn access_code_by_email(&self, _email: &str) -> Result<Option<AccessCode>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}
