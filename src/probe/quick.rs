//! Quick Scenario
//!
//! Shortest useful pass over the API.
//!
//! ## What it checks
//!
//! 1. The server can be reached; a non-200 answer on `/` is only a warning
//! 2. The configured account can register, or else log in with the same credentials
//! 3. A file can be uploaded with the session token
//! 4. The uploaded material can be renamed and flagged
//!
//! `test_upload.txt` is always created in the working directory and removed at
//! the end. It is also the uploaded file unless `upload.file` names another one.

use async_trait::async_trait;
use tracing::info;

use super::steps;
use super::traits::{ProbeContext, ProbeError, Scenario, ScenarioResult};
use crate::client::{LoginRequest, MaterialUpdate, RegisterRequest};
use crate::fixtures::FixtureSet;
use crate::session::Session;

pub const UPLOAD_FIXTURE: &str = "test_upload.txt";
const UPLOAD_FIXTURE_CONTENTS: &str = "mediaprobe quick upload fixture";

pub struct QuickScenario;

impl QuickScenario {
    async fn authenticate(ctx: &mut ProbeContext, session: &mut Session) -> Result<bool, ProbeError> {
        let account = ctx.config.account.clone();
        let register = RegisterRequest {
            username: account.username.clone(),
            email: account.email_for(&account.username),
            password: account.password.clone(),
            invite_code: account.invite_code.clone(),
            auth_token: None,
        };

        ctx.narrator.section("register");
        if steps::register(ctx, session, &register).await? {
            return Ok(true);
        }

        ctx.narrator.section("login (fallback)");
        let login = LoginRequest {
            username: account.username,
            password: account.password,
            auth_token: None,
        };
        let logged_in = steps::login(ctx, session, &login).await?;
        if logged_in {
            ctx.tolerate(steps::REGISTER);
        }
        Ok(logged_in)
    }

    async fn upload_and_update(
        ctx: &mut ProbeContext,
        session: &Session,
        fixtures: &mut FixtureSet,
    ) -> Result<(), ProbeError> {
        let fixture = fixtures
            .create(UPLOAD_FIXTURE, UPLOAD_FIXTURE_CONTENTS)
            .await?;
        let upload = ctx.config.upload.clone();
        let path = upload.file.clone().unwrap_or(fixture);

        ctx.narrator.section("upload material");
        let Some(material_id) = steps::upload_material(ctx, session, &path, upload.workflow_id).await?
        else {
            return Ok(());
        };

        ctx.narrator.section("update material");
        let update = MaterialUpdate {
            original_filename: upload.updated_filename,
            is_starred: upload.starred,
            is_public: upload.public,
        };
        steps::update_material(ctx, session, material_id, &update).await?;
        Ok(())
    }
}

#[async_trait]
impl Scenario for QuickScenario {
    fn name(&self) -> &'static str {
        "quick"
    }

    fn description(&self) -> &'static str {
        "Health, register or login, upload and update one material"
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<ScenarioResult, ProbeError> {
        let started = ctx.begin();
        let mut session = Session::new(ctx.client.base_url().clone());
        info!(target_url = %session.base_url(), "Starting quick scenario");

        ctx.narrator.section("health check");
        // only an unreachable server ends the run
        if !steps::health_check(ctx).await? {
            ctx.tolerate(steps::HEALTH);
            ctx.narrator
                .warn("root path did not answer 200, continuing anyway");
        }

        if !Self::authenticate(ctx, &mut session).await? {
            return Ok(ctx.finish(self.name(), started));
        }

        let mut fixtures = FixtureSet::new(ctx.workdir());
        let chain = Self::upload_and_update(ctx, &session, &mut fixtures).await;
        fixtures.cleanup();
        chain?;

        Ok(ctx.finish(self.name(), started))
    }
}
