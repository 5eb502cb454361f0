//! Wire types exchanged with the backend API.
//!
//! These must stay free of native-only dependencies; the browser shell uses
//! them as-is.

use serde::{Deserialize, Serialize};

use hrdesk_auth::{Credentials, Registration, User};

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<&Credentials> for LoginRequest {
    fn from(value: &Credentials) -> Self {
        Self {
            email: value.identifier.trim().to_string(),
            password: value.secret.clone(),
        }
    }
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl From<&Registration> for RegisterRequest {
    fn from(value: &Registration) -> Self {
        Self {
            first_name: value.first_name.trim().to_string(),
            last_name: value.last_name.trim().to_string(),
            email: value.email.trim().to_string(),
            password: value.secret.clone(),
        }
    }
}

/// Response of both login and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}
