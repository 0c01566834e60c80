//! Media API HTTP Client
//!
//! Thin typed wrapper over the media cloud endpoints. The client never holds
//! credentials: authorized calls take the bearer token as an argument, and every
//! call hands back the raw status and body so callers decide what counts as a pass.

use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::types::*;

/// API prefix shared by every endpoint except the root health check
pub const API_PREFIX: &str = "api/v1/";

/// Errors that can occur when talking to the media API
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MediaError {
    /// True when the server could not be reached at all
    pub fn is_connect(&self) -> bool {
        matches!(self, MediaError::Request(e) if e.is_connect())
    }
}

/// Result type for media API operations
pub type MediaResult<T> = Result<T, MediaError>;

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Reply {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    async fn read(response: reqwest::Response) -> MediaResult<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode the body into a typed response
    pub fn json<T: DeserializeOwned>(&self) -> MediaResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Body as loose JSON, if it is JSON at all
    pub fn value(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Best-effort error message: the `error` field, else the raw body
    pub fn error_message(&self) -> String {
        match self.json::<ApiError>() {
            Ok(ApiError { error: Some(msg) }) => msg,
            _ if !self.body.trim().is_empty() => self.body.trim().to_string(),
            _ => "unknown error".to_string(),
        }
    }
}

/// Client for the media cloud HTTP API
///
/// # Example
/// ```no_run
/// use mediaprobe::client::MediaClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MediaClient::new("http://localhost:8080")?;
/// let reply = client.root().await?;
/// println!("status: {}", reply.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MediaClient {
    /// Base URL of the server, always ending in `/`
    base_url: Url,
    client: Client,
}

impl MediaClient {
    /// Create a client for the given server URL
    pub fn new(base_url: &str) -> MediaResult<Self> {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(base_url: &str, client: Client) -> MediaResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> MediaResult<Url> {
        Ok(self.base_url.join(API_PREFIX)?.join(path)?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        url: Url,
        token: Option<&str>,
        body: &B,
    ) -> MediaResult<Reply> {
        debug!(%method, %url, "Sending JSON request");
        let mut request = self.client.request(method, url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Reply::read(request.send().await?).await
    }

    // =========================================================================
    // Root
    // =========================================================================

    /// GET /
    pub async fn root(&self) -> MediaResult<Reply> {
        debug!(url = %self.base_url, "Probing server root");
        let response = self.client.get(self.base_url.clone()).send().await?;
        Reply::read(response).await
    }

    // =========================================================================
    // Auth Endpoints
    // =========================================================================

    /// POST /api/v1/auth/register
    pub async fn register(&self, req: &RegisterRequest) -> MediaResult<Reply> {
        let url = self.endpoint("auth/register")?;
        self.send_json(reqwest::Method::POST, url, None, req).await
    }

    /// POST /api/v1/auth/login
    pub async fn login(&self, req: &LoginRequest) -> MediaResult<Reply> {
        let url = self.endpoint("auth/login")?;
        self.send_json(reqwest::Method::POST, url, None, req).await
    }

    /// GET /api/v1/auth/captcha
    pub async fn captcha(&self) -> MediaResult<Reply> {
        let url = self.endpoint("auth/captcha")?;
        debug!(%url, "Requesting captcha");
        Reply::read(self.client.get(url).send().await?).await
    }

    /// POST /api/v1/auth/verify-captcha
    pub async fn verify_captcha(&self, req: &VerifyCaptchaRequest) -> MediaResult<Reply> {
        let url = self.endpoint("auth/verify-captcha")?;
        self.send_json(reqwest::Method::POST, url, None, req).await
    }

    // =========================================================================
    // Material Endpoints
    // =========================================================================

    /// GET /api/v1/materials
    ///
    /// `authorization` is sent verbatim as a bearer token when present.
    pub async fn list_materials(&self, authorization: Option<&str>) -> MediaResult<Reply> {
        let url = self.endpoint("materials")?;
        let mut request = self.client.get(url);
        if let Some(token) = authorization {
            request = request.bearer_auth(token);
        }
        Reply::read(request.send().await?).await
    }

    /// POST /api/v1/materials (multipart)
    pub async fn upload_material(&self, token: &str, upload: MaterialUpload) -> MediaResult<Reply> {
        let url = self.endpoint("materials")?;
        let size = upload.bytes.len();
        let part = Part::bytes(upload.bytes).file_name(upload.file_name.clone());
        let mut form = Form::new().part("file", part);
        if let Some(workflow_id) = upload.workflow_id {
            form = form.text("workflow_id", workflow_id.to_string());
        }

        debug!(%url, file = %upload.file_name, size, "Uploading material");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Reply::read(response).await
    }

    /// PUT /api/v1/materials/{id}
    pub async fn update_material(
        &self,
        token: &str,
        material_id: u64,
        update: &MaterialUpdate,
    ) -> MediaResult<Reply> {
        let url = self.endpoint(&format!("materials/{material_id}"))?;
        self.send_json(reqwest::Method::PUT, url, Some(token), update)
            .await
    }
}
