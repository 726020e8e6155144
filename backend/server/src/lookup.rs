use std::sync::Arc;

use tracing::debug;

use crate::{
    access_code::AccessCode,
    database::{RegistrationStore, StoreError},
    utils::normalize_email,
};

#[derive(Debug, PartialEq, Eq)]
pub enum LookupOutcome {
    Found { access_code: AccessCode },
    NotFound,
}

/// Read-only path from an email back to its access code.
#[derive(Clone)]
pub struct LookupService {
    store: Arc<dyn RegistrationStore>,
}

impl LookupService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    /// Malformed and unknown emails are both `NotFound`.
    pub async fn lookup(&self, email: &str) -> Result<LookupOutcome, StoreError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(LookupOutcome::NotFound);
        }

        match self.store.access_code_by_email(&email).await? {
            Some(access_code) => {
                debug!("Lookup hit for {email}");
                Ok(LookupOutcome::Found { access_code })
            }
            None => {
                debug!("Lookup miss for {email}");
                Ok(LookupOutcome::NotFound)
            }
        }
    }
}
