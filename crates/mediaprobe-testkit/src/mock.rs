//! Mock media server for unit and integration testing
//!
//! Wraps a `wiremock::MockServer` with one helper per endpoint the probe
//! touches, so tests can script server behaviour without a real backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use mediaprobe_testkit::mock::MockMediaApi;
//!
//! # async fn example() {
//! let api = MockMediaApi::start().await;
//! api.health(200).await;
//! api.register_rejected(400, "invite code already used").await;
//! api.login_ok("fallback-token", 1).await;
//!
//! assert!(api.requests_to("POST", "/api/v1/auth/login").await.is_empty());
//! # }
//! ```

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const CAPTCHA_PATH: &str = "/api/v1/auth/captcha";
pub const VERIFY_CAPTCHA_PATH: &str = "/api/v1/auth/verify-captcha";
pub const MATERIALS_PATH: &str = "/api/v1/materials";

/// Priority for catch-all mocks; wiremock prefers lower numbers
const FALLBACK_PRIORITY: u8 = 10;

/// Matches requests that carry no `Authorization` header at all
#[derive(Debug, Clone, Copy)]
pub struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

fn error_body(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "error": message }))
}

/// Scriptable stand-in for the media cloud server
pub struct MockMediaApi {
    server: MockServer,
}

impl MockMediaApi {
    /// Start a server on a random local port
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to point the probe at
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// GET / answers `status`
    pub async fn health(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(status).set_body_string("media cloud"))
            .mount(&self.server)
            .await;
    }

    /// Registration succeeds with 201
    pub async fn register_created(&self, token: &str, user_id: u64) {
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": token,
                "user": { "id": user_id, "username": "probe_user", "role": "user" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Registration fails with `status` and an error body
    pub async fn register_rejected(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .respond_with(error_body(status, message))
            .mount(&self.server)
            .await;
    }

    /// Login succeeds with 200
    pub async fn login_ok(&self, token: &str, user_id: u64) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": token,
                "user": { "id": user_id, "username": "probe_user", "role": "user" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Login fails with `status`
    pub async fn login_rejected(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(error_body(status, message))
            .mount(&self.server)
            .await;
    }

    /// Captcha endpoint issues a challenge with the given image payload
    pub async fn captcha(&self, captcha_id: &str, auth_token: &str, captcha_b64: &str) {
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "captcha_id": captcha_id,
                "auth_token": auth_token,
                "captcha_b64": captcha_b64,
            })))
            .mount(&self.server)
            .await;
    }

    /// `code` is accepted and exchanged for `refreshed_token`; any other code gets 400
    pub async fn verify_captcha(&self, code: &str, refreshed_token: &str) {
        Mock::given(method("POST"))
            .and(path(VERIFY_CAPTCHA_PATH))
            .and(body_partial_json(json!({ "captcha_code": code })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "auth_token": refreshed_token })),
            )
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(VERIFY_CAPTCHA_PATH))
            .respond_with(error_body(400, "wrong captcha code"))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&self.server)
            .await;
    }

    /// Material listing answers `without_auth` when no Authorization header is
    /// sent and `invalid_token` for `Bearer invalid_token`
    pub async fn materials_guard(&self, without_auth: u16, invalid_token: u16) {
        Mock::given(method("GET"))
            .and(path(MATERIALS_PATH))
            .and(NoAuthorization)
            .respond_with(error_body(without_auth, "missing token"))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(MATERIALS_PATH))
            .and(header("authorization", "Bearer invalid_token"))
            .respond_with(error_body(invalid_token, "invalid token"))
            .mount(&self.server)
            .await;
    }

    /// Uploads authorized with `token` succeed and return `material_id`
    pub async fn upload_ok(&self, token: &str, material_id: u64) {
        Mock::given(method("POST"))
            .and(path(MATERIALS_PATH))
            .and(header("authorization", format!("Bearer {token}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": material_id, "original_filename": "test_upload.txt" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Every upload fails with `status`
    pub async fn upload_rejected(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(MATERIALS_PATH))
            .respond_with(error_body(status, message))
            .mount(&self.server)
            .await;
    }

    /// PUT /api/v1/materials/{material_id} with `token` succeeds
    pub async fn update_ok(&self, token: &str, material_id: u64) {
        Mock::given(method("PUT"))
            .and(path(format!("{MATERIALS_PATH}/{material_id}")))
            .and(header("authorization", format!("Bearer {token}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": material_id }
            })))
            .mount(&self.server)
            .await;
    }

    /// Every request the server has seen, in arrival order
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests matching `method` and exact `path`
    pub async fn requests_to(&self, http_method: &str, request_path: &str) -> Vec<Request> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
            .collect()
    }
}

/// A solid-colour PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encoding an in-memory PNG cannot fail");
    buf
}

/// PNG wrapped as `data:image/png;base64,...`, the way the captcha endpoint sends it
pub fn png_data_uri(width: u32, height: u32) -> String {
    format!(
        "data:image/png;base64,{}",
        STANDARD.encode(png_bytes(width, height))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_bytes_signature() {
        let png = png_bytes(2, 2);
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn test_png_data_uri_prefix() {
        let uri = png_data_uri(1, 1);
        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), png_bytes(1, 1));
    }

    #[tokio::test]
    async fn test_materials_guard_distinguishes_headers() {
        let api = MockMediaApi::start().await;
        api.materials_guard(401, 403).await;

        let url = format!("{}{MATERIALS_PATH}", api.uri());
        let client = reqwest::Client::new();

        let anonymous = client.get(&url).send().await.unwrap();
        assert_eq!(anonymous.status().as_u16(), 401);

        let bogus = client.get(&url).bearer_auth("invalid_token").send().await.unwrap();
        assert_eq!(bogus.status().as_u16(), 403);

        assert_eq!(api.requests_to("GET", MATERIALS_PATH).await.len(), 2);
    }

    #[tokio::test]
    async fn test_verify_captcha_wrong_code_rejected() {
        let api = MockMediaApi::start().await;
        api.verify_captcha("abcd", "fresh").await;

        let url = format!("{}{VERIFY_CAPTCHA_PATH}", api.uri());
        let client = reqwest::Client::new();

        let wrong = client
            .post(&url)
            .json(&json!({ "captcha_id": "c1", "captcha_code": "zzzz" }))
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status().as_u16(), 400);

        let right = client
            .post(&url)
            .json(&json!({ "captcha_id": "c1", "captcha_code": "abcd" }))
            .send()
            .await
            .unwrap();
        assert_eq!(right.status().as_u16(), 200);
    }
}
