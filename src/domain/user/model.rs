use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Regular,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Regular => "user",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            _ => Self::Regular,
        }
    }
}

/// User model
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub vehicle_number: Option<String>,
    pub pin_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub vehicle_number: Option<String>,
    pub pin_code: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.username.trim().is_empty() {
            return Err(DomainError::Validation("Username must not be empty".into()));
        }
        if !self.email.contains('@') {
            return Err(DomainError::Validation(format!(
                "Invalid email: {}",
                self.email
            )));
        }
        if let Some(pin) = &self.pin_code {
            if pin.len() > 6 || !pin.chars().all(|c| c.is_ascii_digit()) {
                return Err(DomainError::Validation(format!(
                    "PIN code must be up to 6 digits, got {}",
                    pin
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(pin: Option<&str>) -> NewUser {
        NewUser {
            username: "ravi".into(),
            email: "ravi@example.com".into(),
            role: UserRole::Regular,
            vehicle_number: Some("KA01AB1234".into()),
            pin_code: pin.map(String::from),
        }
    }

    #[test]
    fn role_string_roundtrip() {
        assert_eq!(UserRole::from_str(UserRole::Admin.as_str()), UserRole::Admin);
        assert_eq!(UserRole::from_str(UserRole::Regular.as_str()), UserRole::Regular);
        assert_eq!(UserRole::from_str("whatever"), UserRole::Regular);
    }

    #[test]
    fn pin_code_must_be_digits() {
        assert!(user(Some("560001")).validate().is_ok());
        assert!(user(None).validate().is_ok());
        assert!(user(Some("56A001")).validate().is_err());
        assert!(user(Some("5600011")).validate().is_err());
    }

    #[test]
    fn email_needs_at_sign() {
        let mut u = user(None);
        u.email = "nobody".into();
        assert!(u.validate().is_err());
    }
}
