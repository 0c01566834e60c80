//! Probe steps
//!
//! Each step issues one request, narrates the exchange and records a
//! `StepOutcome`. A status other than the expected one is a soft failure: the
//! step returns normally and the scenario decides whether to fall back or stop.
//! Only transport errors propagate as `ProbeError`.

use std::path::Path;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::input::keys;
use super::traits::{ProbeContext, ProbeError, StepOutcome};
use crate::captcha;
use crate::client::{
    AuthResponse, CaptchaChallenge, LoginRequest, MaterialUpdate, MaterialUpload, MediaError,
    RegisterRequest, VerifiedCaptcha, VerifyCaptchaRequest,
};
use crate::fixtures::file_name;
use crate::session::{Session, token_preview};

pub const HEALTH: &str = "health";
pub const REGISTER: &str = "register";
pub const LOGIN: &str = "login";
pub const CAPTCHA: &str = "captcha";
pub const CAPTCHA_IMAGE: &str = "captcha_image";
pub const VERIFY_CAPTCHA: &str = "verify_captcha";
pub const UPLOAD: &str = "upload";
pub const UPDATE: &str = "update";
pub const UNAUTHORIZED: &str = "unauthorized";
pub const INVALID_TOKEN: &str = "invalid_token";

/// Token sent by the invalid-token check
pub const INVALID_TOKEN_VALUE: &str = "invalid_token";

/// GET /; any transport failure means the server is unreachable
pub async fn health_check(ctx: &mut ProbeContext) -> Result<bool, ProbeError> {
    let reply = match ctx.client.root().await {
        Ok(reply) => reply,
        Err(MediaError::Request(e)) => {
            ctx.narrator
                .fail("cannot reach the server, make sure it is running");
            return Err(ProbeError::Connection(e));
        }
        Err(e) => return Err(e.into()),
    };
    ctx.narrator.exchange("health check", &reply);

    let status = reply.status();
    let outcome = if status == StatusCode::OK {
        StepOutcome::passed(HEALTH, format!("server reachable, status {}", status.as_u16()))
    } else {
        StepOutcome::failed(HEALTH, format!("server answered status {}", status.as_u16()))
    };
    Ok(ctx.record(outcome.with_status(status)))
}

/// POST register; on 201 the token and user id land in the session
pub async fn register(
    ctx: &mut ProbeContext,
    session: &mut Session,
    req: &RegisterRequest,
) -> Result<bool, ProbeError> {
    info!(username = %req.username, captcha = req.auth_token.is_some(), "Registering");
    let reply = ctx.client.register(req).await?;
    ctx.narrator
        .exchange(&format!("register {}", req.username), &reply);

    let status = reply.status();
    let outcome = if status == StatusCode::CREATED {
        match reply.json::<AuthResponse>() {
            Ok(auth) => {
                let user_id = auth.user_id();
                let message = format!(
                    "registered {}, user id {}, token {}",
                    req.username,
                    display_id(user_id),
                    token_preview(&auth.token)
                );
                session.authenticate(auth.token, user_id);
                StepOutcome::passed(REGISTER, message)
            }
            Err(e) => StepOutcome::failed(REGISTER, format!("registration body unusable: {e}")),
        }
    } else {
        StepOutcome::failed(
            REGISTER,
            format!("registration failed: {}", reply.error_message()),
        )
    };
    Ok(ctx.record(outcome.with_status(status)))
}

/// POST login; on 200 the token lands in the session
pub async fn login(
    ctx: &mut ProbeContext,
    session: &mut Session,
    req: &LoginRequest,
) -> Result<bool, ProbeError> {
    info!(username = %req.username, captcha = req.auth_token.is_some(), "Logging in");
    let reply = ctx.client.login(req).await?;
    ctx.narrator.exchange(&format!("login {}", req.username), &reply);

    let status = reply.status();
    let outcome = if status == StatusCode::OK {
        match reply.json::<AuthResponse>() {
            Ok(auth) => {
                let user = auth
                    .user
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown user".to_string());
                let message = format!(
                    "logged in as {}, user {user}, token {}",
                    req.username,
                    token_preview(&auth.token)
                );
                let user_id = auth.user_id();
                session.authenticate(auth.token, user_id);
                StepOutcome::passed(LOGIN, message)
            }
            Err(e) => StepOutcome::failed(LOGIN, format!("login body unusable: {e}")),
        }
    } else {
        StepOutcome::failed(LOGIN, format!("login failed: {}", reply.error_message()))
    };
    Ok(ctx.record(outcome.with_status(status)))
}

/// GET captcha and write its image under the working directory
///
/// A challenge that cannot be saved is still returned; the operator may read
/// the code some other way.
pub async fn fetch_captcha(
    ctx: &mut ProbeContext,
) -> Result<Option<CaptchaChallenge>, ProbeError> {
    let reply = ctx.client.captcha().await?;
    ctx.narrator.exchange("captcha", &reply);

    let status = reply.status();
    if status != StatusCode::OK {
        ctx.record(
            StepOutcome::failed(
                CAPTCHA,
                format!("captcha request failed: {}", reply.error_message()),
            )
            .with_status(status),
        );
        return Ok(None);
    }

    let challenge = match reply.json::<CaptchaChallenge>() {
        Ok(c) => c,
        Err(e) => {
            ctx.record(
                StepOutcome::failed(CAPTCHA, format!("captcha body unusable: {e}"))
                    .with_status(status),
            );
            return Ok(None);
        }
    };
    ctx.record(
        StepOutcome::passed(
            CAPTCHA,
            format!("captcha issued, id {}", challenge.captcha_id),
        )
        .with_status(status),
    );
    ctx.narrator
        .info(&format!("auth token: {}", token_preview(&challenge.auth_token)));

    let path = ctx.workdir().join(&ctx.config.captcha.image_path);
    match captcha::save_image(&challenge.captcha_b64, &path).await {
        Ok(saved) => {
            ctx.record(StepOutcome::passed(
                CAPTCHA_IMAGE,
                format!("captcha image saved to {}", path.display()),
            ));
            if let (Some(format), Some((w, h))) = (&saved.format, saved.dimensions) {
                ctx.narrator
                    .info(&format!("image size: {w}x{h}, format: {format}"));
            }
            debug!(bytes = saved.bytes, path = %path.display(), "Captcha written");
        }
        Err(e) => {
            ctx.record(StepOutcome::failed(
                CAPTCHA_IMAGE,
                format!("failed to save captcha image: {e}"),
            ));
        }
    }
    Ok(Some(challenge))
}

/// Ask the operator for the code and exchange it for a refreshed auth token
pub async fn verify_captcha(
    ctx: &mut ProbeContext,
    challenge: &CaptchaChallenge,
) -> Result<Option<String>, ProbeError> {
    let image = ctx.config.captcha.image_path.display().to_string();
    ctx.narrator
        .info(&format!("enter the captcha code (see {image})"));
    let code = ctx.prompter.ask(keys::CAPTCHA_CODE, "captcha code").await?;

    let req = VerifyCaptchaRequest {
        captcha_id: challenge.captcha_id.clone(),
        captcha_code: code,
    };
    let reply = ctx.client.verify_captcha(&req).await?;
    ctx.narrator.exchange("verify captcha", &reply);

    let status = reply.status();
    if status != StatusCode::OK {
        ctx.record(
            StepOutcome::failed(
                VERIFY_CAPTCHA,
                format!("captcha rejected: {}", reply.error_message()),
            )
            .with_status(status),
        );
        return Ok(None);
    }

    match reply.json::<VerifiedCaptcha>() {
        Ok(verified) => {
            ctx.record(
                StepOutcome::passed(
                    VERIFY_CAPTCHA,
                    format!(
                        "captcha accepted, new auth token {}",
                        token_preview(&verified.auth_token)
                    ),
                )
                .with_status(status),
            );
            Ok(Some(verified.auth_token))
        }
        Err(e) => {
            ctx.record(
                StepOutcome::failed(VERIFY_CAPTCHA, format!("verification body unusable: {e}"))
                    .with_status(status),
            );
            Ok(None)
        }
    }
}

/// Multipart upload of `path`; returns the new material id
///
/// Without a session token no request is sent.
pub async fn upload_material(
    ctx: &mut ProbeContext,
    session: &Session,
    path: &Path,
    workflow_id: Option<u64>,
) -> Result<Option<u64>, ProbeError> {
    let Some(token) = session.token() else {
        ctx.record(StepOutcome::failed(UPLOAD, "no session token, log in first"));
        return Ok(None);
    };

    let name = file_name(path);
    let bytes = tokio::fs::read(path).await?;
    info!(file = %name, size = bytes.len(), ?workflow_id, "Uploading material");
    let upload = MaterialUpload {
        file_name: name.clone(),
        bytes,
        workflow_id,
    };
    let reply = ctx.client.upload_material(token, upload).await?;
    ctx.narrator.exchange(&format!("upload {name}"), &reply);

    let status = reply.status();
    if status != StatusCode::OK {
        ctx.record(
            StepOutcome::failed(UPLOAD, format!("upload failed: {}", reply.error_message()))
                .with_status(status),
        );
        return Ok(None);
    }

    let material_id = reply.value().as_ref().and_then(material_id);
    match material_id {
        Some(id) => {
            ctx.record(
                StepOutcome::passed(UPLOAD, format!("uploaded {name}, material id {id}"))
                    .with_status(status),
            );
        }
        None => {
            ctx.record(
                StepOutcome::passed(UPLOAD, format!("uploaded {name}")).with_status(status),
            );
            warn!(file = %name, "Upload response carried no material id");
            ctx.narrator.warn("response carried no material id");
        }
    }
    Ok(material_id)
}

/// `data.id` from an upload response, numeric or numeric string
fn material_id(body: &serde_json::Value) -> Option<u64> {
    let id = body.pointer("/data/id")?;
    id.as_u64()
        .or_else(|| id.as_str().and_then(|s| s.parse().ok()))
}

/// PUT the mutable fields of a material
pub async fn update_material(
    ctx: &mut ProbeContext,
    session: &Session,
    material_id: u64,
    update: &MaterialUpdate,
) -> Result<bool, ProbeError> {
    let Some(token) = session.token() else {
        ctx.record(StepOutcome::failed(UPDATE, "no session token, log in first"));
        return Ok(false);
    };

    let reply = ctx
        .client
        .update_material(token, material_id, update)
        .await?;
    ctx.narrator
        .exchange(&format!("update material {material_id}"), &reply);

    let status = reply.status();
    let outcome = if status == StatusCode::OK {
        StepOutcome::passed(UPDATE, format!("material {material_id} updated"))
    } else {
        StepOutcome::failed(UPDATE, format!("update failed: {}", reply.error_message()))
    };
    Ok(ctx.record(outcome.with_status(status)))
}

/// GET materials without credentials; 401 is the passing answer
pub async fn check_unauthorized(ctx: &mut ProbeContext) -> Result<bool, ProbeError> {
    let reply = ctx.client.list_materials(None).await?;
    ctx.narrator.exchange("materials without token", &reply);
    Ok(expect_rejection(ctx, UNAUTHORIZED, "unauthenticated access", reply.status()))
}

/// GET materials with a well-formed but bogus bearer token; 401 is the passing answer
pub async fn check_invalid_token(ctx: &mut ProbeContext) -> Result<bool, ProbeError> {
    let reply = ctx.client.list_materials(Some(INVALID_TOKEN_VALUE)).await?;
    ctx.narrator.exchange("materials with invalid token", &reply);
    Ok(expect_rejection(ctx, INVALID_TOKEN, "invalid token", reply.status()))
}

fn expect_rejection(ctx: &mut ProbeContext, step: &str, what: &str, status: StatusCode) -> bool {
    let outcome = if status == StatusCode::UNAUTHORIZED {
        StepOutcome::passed(step, format!("{what} correctly rejected"))
    } else {
        StepOutcome::failed(
            step,
            format!("{what} was not rejected (status {})", status.as_u16()),
        )
    };
    ctx.record(outcome.with_status(status))
}

fn display_id(id: Option<u64>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
