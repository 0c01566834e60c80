//! Captcha Scenario
//!
//! Interactive walk through the captcha-guarded auth endpoints.
//!
//! ## What it checks
//!
//! 1. A captcha challenge is issued and its image can be decoded to disk
//! 2. The code typed by the operator is accepted and yields a refreshed auth token
//! 3. Login accepts the refreshed token
//! 4. Registration accepts the refreshed token
//!
//! Steps 1 and 2 stop the run on failure; 3 and 4 are both attempted.
//!
//! ## Prompts
//!
//! `captcha_code`, then `username`/`password` for login, then
//! `username`/`email`/`password`/`invite_code` for registration.

use async_trait::async_trait;
use tracing::info;

use super::input::keys;
use super::steps;
use super::traits::{ProbeContext, ProbeError, Scenario, ScenarioResult};
use crate::client::{LoginRequest, RegisterRequest};
use crate::session::Session;

pub struct CaptchaScenario;

#[async_trait]
impl Scenario for CaptchaScenario {
    fn name(&self) -> &'static str {
        "captcha"
    }

    fn description(&self) -> &'static str {
        "Captcha challenge, verification, then login and register with the auth token"
    }

    fn enabled_by_default(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<ScenarioResult, ProbeError> {
        let started = ctx.begin();
        let mut session = Session::new(ctx.client.base_url().clone());
        info!(target_url = %session.base_url(), "Starting captcha scenario");

        ctx.narrator.section("fetch captcha");
        let Some(challenge) = steps::fetch_captcha(ctx).await? else {
            ctx.narrator.fail("no captcha, stopping");
            return Ok(ctx.finish(self.name(), started));
        };

        ctx.narrator.section("verify captcha");
        let Some(auth_token) = steps::verify_captcha(ctx, &challenge).await? else {
            ctx.narrator.fail("captcha not verified, stopping");
            return Ok(ctx.finish(self.name(), started));
        };

        ctx.narrator.section("login with auth token");
        let login = LoginRequest {
            username: ctx.prompter.ask(keys::USERNAME, "username").await?,
            password: ctx.prompter.ask(keys::PASSWORD, "password").await?,
            auth_token: Some(auth_token.clone()),
        };
        steps::login(ctx, &mut session, &login).await?;

        ctx.narrator.section("register with auth token");
        let register = RegisterRequest {
            username: ctx.prompter.ask(keys::USERNAME, "username").await?,
            email: ctx.prompter.ask(keys::EMAIL, "email").await?,
            password: ctx.prompter.ask(keys::PASSWORD, "password").await?,
            invite_code: ctx.prompter.ask(keys::INVITE_CODE, "invite code").await?,
            auth_token: Some(auth_token),
        };
        steps::register(ctx, &mut session, &register).await?;

        Ok(ctx.finish(self.name(), started))
    }
}
