//! Per-user contacts: validation, queries and the upcoming-birthday window.
//!
//! Every query is scoped to the owning user. A contact that belongs to
//! someone else is reported exactly like one that does not exist.

pub mod birthdays;
pub mod queries;

use thiserror::Error;

use crate::models::contact::ContactInput;
use crate::validation::{is_e164_phone, is_email};

/// Contact errors.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Contact not found")]
    NotFound,

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=100;
const EMAIL_MAX_LEN: usize = 256;
const NOTE_MAX_LEN: usize = 500;

impl ContactInput {
    /// Check field lengths and formats.
    pub fn validate(&self) -> Result<(), ContactError> {
        check_name("first_name", &self.first_name)?;
        check_name("last_name", &self.last_name)?;
        if self.email.chars().count() > EMAIL_MAX_LEN || !is_email(&self.email) {
            return Err(ContactError::Validation(
                "email must be a valid address of at most 256 characters".into(),
            ));
        }
        if !is_e164_phone(&self.phone) {
            return Err(ContactError::Validation(
                "phone must be in E.164 format, e.g. +14155552671".into(),
            ));
        }
        if let Some(note) = &self.note
            && note.chars().count() > NOTE_MAX_LEN
        {
            return Err(ContactError::Validation(
                "note must be at most 500 characters".into(),
            ));
        }
        Ok(())
    }
}

fn check_name(field: &str, value: &str) -> Result<(), ContactError> {
    if NAME_LEN.contains(&value.chars().count()) {
        Ok(())
    } else {
        Err(ContactError::Validation(format!(
            "{field} must be between 2 and 100 characters"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn input() -> ContactInput {
        ContactInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+442071234567".into(),
            birthday: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
            note: None,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn short_name_fails() {
        let mut c = input();
        c.first_name = "A".into();
        assert!(matches!(c.validate(), Err(ContactError::Validation(_))));
    }

    #[test]
    fn bad_phone_fails() {
        let mut c = input();
        c.phone = "020 7123 4567".into();
        assert!(matches!(c.validate(), Err(ContactError::Validation(_))));
    }

    #[test]
    fn bad_email_fails() {
        let mut c = input();
        c.email = "ada.example.com".into();
        assert!(matches!(c.validate(), Err(ContactError::Validation(_))));
    }

    #[test]
    fn long_note_fails() {
        let mut c = input();
        c.note = Some("x".repeat(501));
        assert!(matches!(c.validate(), Err(ContactError::Validation(_))));
        c.note = Some("x".repeat(500));
        assert!(c.validate().is_ok());
    }
}
