//! Media API Types
//!
//! Request and response bodies for the media cloud HTTP API.
//! Every error response from the server has the shape `{"error": "<message>"}`.

use serde::{Deserialize, Serialize};

/// Registration request
/// Endpoint: POST /api/v1/auth/register
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub invite_code: String,
    /// Refreshed captcha token, required when the server runs the captcha flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Login request
/// Endpoint: POST /api/v1/auth/login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Account as returned by register/login
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{id}")?,
            None => write!(f, "#?")?,
        }
        if let Some(name) = &self.username {
            write!(f, " {name}")?;
        }
        if let Some(email) = &self.email {
            write!(f, " <{email}>")?;
        }
        if let Some(role) = &self.role {
            write!(f, " [{role}]")?;
        }
        Ok(())
    }
}

/// Successful register/login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

impl AuthResponse {
    pub fn user_id(&self) -> Option<u64> {
        self.user.as_ref().and_then(|u| u.id)
    }
}

/// Captcha challenge
/// Endpoint: GET /api/v1/auth/captcha
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaChallenge {
    pub captcha_id: String,
    /// Short-lived token exchanged for a refreshed one once the captcha is solved
    pub auth_token: String,
    /// Base64 image, optionally carrying a `data:image/...;base64,` prefix
    pub captcha_b64: String,
}

/// Endpoint: POST /api/v1/auth/verify-captcha
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyCaptchaRequest {
    pub captcha_id: String,
    pub captcha_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedCaptcha {
    pub auth_token: String,
}

/// Mutable material fields
/// Endpoint: PUT /api/v1/materials/{id}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialUpdate {
    pub original_filename: String,
    pub is_starred: bool,
    pub is_public: bool,
}

/// File to send as a multipart material upload
#[derive(Debug, Clone)]
pub struct MaterialUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub workflow_id: Option<u64>,
}

/// Error body returned on non-success statuses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub error: Option<String>,
}
