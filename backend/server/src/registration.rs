//! # Registration
//!
//! Validate, issue a code, insert once, notify the organizer.
//!
//! ## Flow
//!
//! 1. Validate and normalize the form, no store access on failure
//! 2. Generate an access code server side
//! 3. Insert the full record, the store's email constraint decides duplicates
//! 4. On success, hand the record to the notification queue and return the code
//!
//! ## Outcomes
//!
//! - `Success`: exactly one record written
//! - `DuplicateEmail`: nothing written, the original code is left untouched
//! - `Invalid` / `Failure`: nothing written
//!
//! Registering an email twice does not echo the first code back. It can only
//! be recovered through the lookup path.
use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    access_code::{AccessCode, generate_access_code},
    database::{RegistrationStore, StoreError},
    models::{Registrant, Registration, RegistrationForm, ValidationError},
    notify::NotificationDispatcher,
};

#[derive(Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Success { access_code: AccessCode },
    DuplicateEmail,
    Invalid(ValidationError),
    Failure { reason: String },
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
    notifications: NotificationDispatcher,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RegistrationStore>, notifications: NotificationDispatcher) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub async fn register(&self, form: RegistrationForm) -> RegistrationOutcome {
        let registrant = match Registrant::try_from(form) {
            Ok(registrant) => registrant,
            Err(e) => return RegistrationOutcome::Invalid(e),
        };

        let registration = Registration::new(registrant, generate_access_code());

        match self.store.insert(&registration).await {
            Ok(()) => {
                debug!("Registered {}", registration.email());

                let access_code = registration.access_code.clone();
                self.notifications.dispatch(registration);

                RegistrationOutcome::Success { access_code }
            }
            Err(StoreError::UniqueViolation(_)) => {
                debug!("Duplicate registration for {}", registration.email());
                RegistrationOutcome::DuplicateEmail
            }
            Err(e @ StoreError::Unavailable(_)) => {
                error!("Failed to store registration for {}: {e}", registration.email());
                RegistrationOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        }
    }
}
