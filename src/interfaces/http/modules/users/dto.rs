//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{NewUser, User, UserRole};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub vehicle_number: Option<String>,
    #[validate(length(min = 6, max = 6))]
    pub pin_code: Option<String>,
}

impl From<RegisterUserRequest> for NewUser {
    fn from(r: RegisterUserRequest) -> Self {
        // Profiles created over the API are always regular users
        NewUser {
            username: r.username,
            email: r.email,
            role: UserRole::Regular,
            vehicle_number: r.vehicle_number,
            pin_code: r.pin_code,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub vehicle_number: Option<String>,
    pub pin_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            vehicle_number: u.vehicle_number,
            pin_code: u.pin_code,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReservationListQuery {
    /// Only the open reservation(s)
    #[serde(default)]
    pub open: bool,
}
