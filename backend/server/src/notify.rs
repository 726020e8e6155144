//! # Organizer Notifications
//!
//! Every committed registration is mailed to the event organizer.
//!
//! - Best effort: the registration is already stored when this runs
//! - Queue handoff, the request never waits on the mail provider
//! - Failures are logged, never returned to the registrant
//! - Provider is Resend over plain HTTPS
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, error, warn};

use crate::{models::Registration, utils::escape_html};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Clone, Debug)]
pub struct MailSettings {
    pub from: String,
    pub organizer: String,
    pub event_name: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the provider's message id.
    async fn send(&self, message: &EmailMessage) -> Result<String, NotifyError>;
}

pub struct ResendNotifier {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendNotifier {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<String, NotifyError> {
        let api_key = self.api_key.as_deref().ok_or(NotifyError::NotConfigured)?;

        let res = self
            .client
            .post(format!("{}/emails", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(message)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        Ok(res.json::<ResendResponse>().await?.id)
    }
}

pub fn registration_email(registration: &Registration, settings: &MailSettings) -> EmailMessage {
    let r = &registration.registrant;
    let event = escape_html(&settings.event_name);

    let rows = [
        ("Full Name", r.full_name.as_str()),
        ("Email", r.email.as_str()),
        ("Phone", r.phone_number.as_str()),
        ("School", r.school_name.as_str()),
        ("Position", r.position.as_str()),
        ("LGA/Town", r.lga_town.as_str()),
        ("How They Heard", r.how_heard.as_str()),
    ]
    .iter()
    .map(|(label, value)| {
        format!(
            r#"<tr><td style="padding: 8px 0; font-weight: bold; width: 150px;">{label}:</td><td style="padding: 8px 0;">{}</td></tr>"#,
            escape_html(value)
        )
    })
    .collect::<String>();

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
<h2 style="color: #FF7947; border-bottom: 2px solid #FF7947; padding-bottom: 10px;">New Registration for {event}</h2>
<div style="background-color: #f9f9f9; padding: 20px; border-radius: 8px; margin: 20px 0;">
<h3 style="color: #333; margin-top: 0;">Registration Details</h3>
<table style="width: 100%; border-collapse: collapse;">
{rows}
<tr style="background-color: #FF7947; color: white;"><td style="padding: 12px 8px; font-weight: bold;">Access Code:</td><td style="padding: 12px 8px; font-size: 18px; font-weight: bold; letter-spacing: 2px;">{code}</td></tr>
</table>
</div>
<p style="color: #666; font-size: 14px;">Registered at {created_at}. This registration was processed automatically.</p>
</div>"#,
        code = escape_html(registration.access_code.as_str()),
        created_at = registration.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    EmailMessage {
        from: settings.from.clone(),
        to: vec![settings.organizer.clone()],
        subject: format!("New Workshop Registration - {}", settings.event_name),
        html,
    }
}

#[derive(Clone, Debug)]
pub struct DispatchPolicy {
    pub capacity: usize,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            capacity: 100,
            max_attempts: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Handle to the background notification worker.
///
/// Cloning shares the queue. The worker exits after every handle is dropped
/// and the queue is drained.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<Registration>,
}

impl NotificationDispatcher {
    pub fn spawn(
        notifier: Arc<dyn Notifier>,
        settings: MailSettings,
        policy: DispatchPolicy,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Registration>(policy.capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(registration) = rx.recv().await {
                let message = registration_email(&registration, &settings);
                deliver(notifier.as_ref(), &message, registration.email(), &policy).await;
            }

            debug!("Notification queue closed");
        });

        (Self { tx }, worker)
    }

    /// Never waits. A full or closed queue drops the notification.
    pub fn dispatch(&self, registration: Registration) {
        match self.tx.try_send(registration) {
            Ok(()) => {}
            Err(TrySendError::Full(r)) => {
                warn!("Notification queue full, dropping notification for {}", r.email());
            }
            Err(TrySendError::Closed(r)) => {
                error!("Notification worker stopped, dropping notification for {}", r.email());
            }
        }
    }
}

async fn deliver(notifier: &dyn Notifier, message: &EmailMessage, email: &str, policy: &DispatchPolicy) {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match notifier.send(message).await {
            Ok(id) => {
                debug!("Organizer notified of {email} (message {id})");
                return;
            }
            Err(NotifyError::NotConfigured) => {
                warn!("Email service not configured, skipping notification for {email}");
                return;
            }
            Err(e) if attempt < attempts => {
                warn!("Notification for {email} failed (attempt {attempt}/{attempts}): {e}");
                sleep(policy.retry_backoff).await;
            }
            Err(e) => {
                error!("Notification for {email} failed after {attempts} attempts: {e}");
            }
        }
    }
}
