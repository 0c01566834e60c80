//! Full Scenario
//!
//! Walks every non-interactive endpoint.
//!
//! ## What it checks
//!
//! 1. The server answers on `/`
//! 2. `/api/v1/materials` rejects requests without a token and with a bogus one
//! 3. A fresh account registers (falling back to `fallback_login`)
//! 4. A text fixture uploads into the configured workflow and can be updated
//! 5. A second fixture uploads without a workflow
//!
//! Fixtures `test.txt` and `test_image.txt` are removed whether or not the
//! uploads succeeded.

use async_trait::async_trait;
use tracing::info;

use super::steps;
use super::traits::{ProbeContext, ProbeError, Scenario, ScenarioResult};
use crate::client::{LoginRequest, MaterialUpdate, RegisterRequest};
use crate::fixtures::FixtureSet;
use crate::session::Session;

pub const TEXT_FIXTURE: &str = "test.txt";
pub const IMAGE_FIXTURE: &str = "test_image.txt";

pub struct FullScenario;

impl FullScenario {
    async fn authenticate(ctx: &mut ProbeContext, session: &mut Session) -> Result<bool, ProbeError> {
        let account = ctx.config.account.clone();
        let username = account.username_for_run();
        let register = RegisterRequest {
            email: account.email_for(&username),
            username,
            password: account.password.clone(),
            invite_code: account.invite_code.clone(),
            auth_token: None,
        };

        ctx.narrator.section("register");
        if steps::register(ctx, session, &register).await? {
            return Ok(true);
        }

        ctx.narrator
            .warn("registration failed, trying to log in with an existing account");
        let fallback = ctx.config.fallback_credentials();
        let login = LoginRequest {
            username: fallback.username,
            password: fallback.password,
            auth_token: None,
        };
        let logged_in = steps::login(ctx, session, &login).await?;
        if logged_in {
            ctx.tolerate(steps::REGISTER);
        } else {
            ctx.narrator.fail("cannot log in, skipping remaining steps");
        }
        Ok(logged_in)
    }

    async fn uploads(
        ctx: &mut ProbeContext,
        session: &Session,
        fixtures: &mut FixtureSet,
    ) -> Result<(), ProbeError> {
        let upload = ctx.config.upload.clone();

        let text = fixtures
            .create(TEXT_FIXTURE, "mediaprobe text fixture")
            .await?;
        ctx.narrator.section("upload material");
        if let Some(material_id) =
            steps::upload_material(ctx, session, &text, upload.workflow_id).await?
        {
            ctx.narrator.section("update material");
            let update = MaterialUpdate {
                original_filename: upload.updated_filename.clone(),
                is_starred: upload.starred,
                is_public: upload.public,
            };
            steps::update_material(ctx, session, material_id, &update).await?;
        }

        // stands in for an image; the server accepts any file type
        let image = fixtures
            .create(IMAGE_FIXTURE, "mediaprobe simulated image")
            .await?;
        ctx.narrator.section("upload second material without workflow");
        steps::upload_material(ctx, session, &image, None).await?;
        Ok(())
    }
}

#[async_trait]
impl Scenario for FullScenario {
    fn name(&self) -> &'static str {
        "full"
    }

    fn description(&self) -> &'static str {
        "Negative auth checks, registration, two uploads and an update"
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<ScenarioResult, ProbeError> {
        let started = ctx.begin();
        let mut session = Session::new(ctx.client.base_url().clone());
        info!(target_url = %session.base_url(), "Starting full scenario");

        ctx.narrator.section("health check");
        if !steps::health_check(ctx).await? {
            return Ok(ctx.finish(self.name(), started));
        }

        ctx.narrator.section("unauthorized access");
        steps::check_unauthorized(ctx).await?;
        ctx.narrator.section("invalid token");
        steps::check_invalid_token(ctx).await?;

        if !Self::authenticate(ctx, &mut session).await? {
            return Ok(ctx.finish(self.name(), started));
        }

        let mut fixtures = FixtureSet::new(ctx.workdir());
        let chain = Self::uploads(ctx, &session, &mut fixtures).await;
        fixtures.cleanup();
        chain?;

        Ok(ctx.finish(self.name(), started))
    }
}
