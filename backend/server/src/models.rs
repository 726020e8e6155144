use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    access_code::AccessCode,
    utils::{clean_field, looks_like_email, normalize_email},
};

pub const MAX_FIELD_LEN: usize = 200;
pub const MAX_EMAIL_LEN: usize = 254;

/// Registration form as posted by the browser.
///
/// Absent fields deserialize as empty so they fail validation by name
/// instead of rejecting the whole payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub school_name: String,
    pub position: String,
    pub lga_town: String,
    pub how_heard: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

/// Validated and normalized registrant details.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registrant {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub school_name: String,
    pub position: String,
    pub lga_town: String,
    pub how_heard: String,
}

impl TryFrom<RegistrationForm> for Registrant {
    type Error = ValidationError;

    fn try_from(form: RegistrationForm) -> Result<Self, Self::Error> {
        let email = normalize_email(&form.email);
        required("email", &email, MAX_EMAIL_LEN)?;
        if !looks_like_email(&email) {
            return Err(ValidationError::new("email", "is not a valid email address"));
        }

        Ok(Self {
            full_name: text("fullName", &form.full_name)?,
            phone_number: text("phoneNumber", &form.phone_number)?,
            email,
            school_name: text("schoolName", &form.school_name)?,
            position: text("position", &form.position)?,
            lga_town: text("lgaTown", &form.lga_town)?,
            how_heard: text("howHeard", &form.how_heard)?,
        })
    }
}

fn text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let cleaned = clean_field(value);
    required(field, &cleaned, MAX_FIELD_LEN)?;

    Ok(cleaned)
}

fn required(field: &'static str, value: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }

    if value.chars().count() > max_len {
        return Err(ValidationError::new(field, "is too long"));
    }

    Ok(())
}

/// Stored record. Written once, never updated.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(flatten)]
    pub registrant: Registrant,
    pub access_code: AccessCode,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(registrant: Registrant, access_code: AccessCode) -> Self {
        Self {
            registrant,
            access_code,
            created_at: Utc::now(),
        }
    }

    pub fn email(&self) -> &str {
        &self.registrant.email
    }
}
