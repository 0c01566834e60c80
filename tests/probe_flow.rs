//! End-to-end scenario runs against a mock media server

use std::path::Path;

use mediaprobe::config::{Config, Credentials};
use mediaprobe::probe::steps;
use mediaprobe::probe::{
    CaptchaScenario, FullScenario, IMAGE_FIXTURE, ProbeContext, ProbeError, QuickScenario,
    Scenario, ScriptedPrompter, TEXT_FIXTURE, Transcript, UPLOAD_FIXTURE, Verdict,
};
use mediaprobe::session::Session;
use mediaprobe_testkit::mock::{LOGIN_PATH, MATERIALS_PATH, REGISTER_PATH, VERIFY_CAPTCHA_PATH};
use mediaprobe_testkit::{MockMediaApi, png_bytes, png_data_uri};
use serde_json::Value;
use wiremock::Request;

fn context(
    base_url: &str,
    transcript: &Transcript,
    prompter: ScriptedPrompter,
    workdir: &Path,
) -> ProbeContext {
    context_with(
        Config::default_config().with_base_url(base_url),
        transcript,
        prompter,
        workdir,
    )
}

fn context_with(
    config: Config,
    transcript: &Transcript,
    prompter: ScriptedPrompter,
    workdir: &Path,
) -> ProbeContext {
    ProbeContext::new(config, Box::new(transcript.clone()), Box::new(prompter))
        .unwrap()
        .with_workdir(workdir)
}

fn admin_fallback(base_url: &str) -> Config {
    let mut config = Config::default_config().with_base_url(base_url);
    config.fallback_login = Some(Credentials {
        username: "admin".to_string(),
        password: "admin-pass".to_string(),
    });
    config
}

fn authorization(req: &Request) -> Option<String> {
    req.headers
        .get("authorization")
        .map(|v| v.to_str().unwrap().to_string())
}

fn json_body(req: &Request) -> Value {
    serde_json::from_slice(&req.body).unwrap()
}

#[tokio::test]
async fn test_registration_token_authorizes_following_requests() {
    let api = MockMediaApi::start().await;
    api.health(200).await;
    api.register_created("tok-abc", 7).await;
    api.upload_ok("tok-abc", 55).await;
    api.update_ok("tok-abc", 55).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    let result = QuickScenario.run(&mut ctx).await.unwrap();
    assert!(result.passed, "failures: {:?}", transcript.failures());

    let uploads = api.requests_to("POST", MATERIALS_PATH).await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(authorization(&uploads[0]).as_deref(), Some("Bearer tok-abc"));
    let multipart = String::from_utf8_lossy(&uploads[0].body);
    assert!(multipart.contains("name=\"workflow_id\""));
    assert!(multipart.contains(UPLOAD_FIXTURE));

    let updates = api.requests_to("PUT", &format!("{MATERIALS_PATH}/55")).await;
    assert_eq!(updates.len(), 1);
    assert_eq!(authorization(&updates[0]).as_deref(), Some("Bearer tok-abc"));
    let body = json_body(&updates[0]);
    assert_eq!(body["is_starred"], true);
    assert_eq!(body["is_public"], false);

    assert!(api.requests_to("POST", LOGIN_PATH).await.is_empty());
}

#[tokio::test]
async fn test_failed_registration_falls_back_to_login() {
    let api = MockMediaApi::start().await;
    api.health(200).await;
    api.register_rejected(400, "invite code already used").await;
    api.login_ok("tok-login", 3).await;
    api.upload_ok("tok-login", 9).await;
    api.update_ok("tok-login", 9).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    let result = QuickScenario.run(&mut ctx).await.unwrap();

    let logins = api.requests_to("POST", LOGIN_PATH).await;
    assert_eq!(logins.len(), 1);
    assert_eq!(json_body(&logins[0])["username"], "probe_user");

    assert!(result.passed);
    assert_eq!(result.outcome(steps::REGISTER).unwrap().verdict, Verdict::Tolerated);
    assert!(transcript.contains("invite code already used"));

    let uploads = api.requests_to("POST", MATERIALS_PATH).await;
    assert_eq!(authorization(&uploads[0]).as_deref(), Some("Bearer tok-login"));
}

#[tokio::test]
async fn test_failed_login_stops_before_upload() {
    let api = MockMediaApi::start().await;
    api.health(200).await;
    api.register_rejected(400, "username taken").await;
    api.login_rejected(401, "wrong password").await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    let result = QuickScenario.run(&mut ctx).await.unwrap();

    assert!(!result.passed);
    assert_eq!(result.outcome(steps::REGISTER).unwrap().verdict, Verdict::Failed);
    assert_eq!(result.outcome(steps::LOGIN).unwrap().status, Some(401));
    assert!(api.requests_to("POST", MATERIALS_PATH).await.is_empty());
    assert!(!dir.path().join(UPLOAD_FIXTURE).exists());
}

#[tokio::test]
async fn test_quick_continues_when_root_path_missing() {
    let api = MockMediaApi::start().await;
    api.health(404).await;
    api.register_created("tok-404", 8).await;
    api.upload_ok("tok-404", 31).await;
    api.update_ok("tok-404", 31).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    let result = QuickScenario.run(&mut ctx).await.unwrap();
    assert!(result.passed, "failures: {:?}", transcript.failures());

    let health = result.outcome(steps::HEALTH).unwrap();
    assert_eq!(health.verdict, Verdict::Tolerated);
    assert_eq!(health.status, Some(404));

    assert_eq!(api.requests_to("POST", REGISTER_PATH).await.len(), 1);
    assert_eq!(api.requests_to("POST", MATERIALS_PATH).await.len(), 1);
    assert_eq!(
        api.requests_to("PUT", &format!("{MATERIALS_PATH}/31"))
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn test_full_stops_when_root_path_missing() {
    let api = MockMediaApi::start().await;
    api.health(404).await;
    api.materials_guard(401, 401).await;
    api.register_created("tok-full", 11).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    let result = FullScenario.run(&mut ctx).await.unwrap();
    assert!(!result.passed);
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcome(steps::HEALTH).unwrap().verdict, Verdict::Failed);
    assert!(api.requests_to("GET", MATERIALS_PATH).await.is_empty());
    assert!(api.requests_to("POST", REGISTER_PATH).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    // nothing listens on port 1
    let mut ctx = context(
        "http://127.0.0.1:1",
        &transcript,
        ScriptedPrompter::default(),
        dir.path(),
    );

    let err = QuickScenario.run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, ProbeError::Connection(_)));
    assert!(transcript.contains("cannot reach the server"));
}

#[tokio::test]
async fn test_captcha_flow_strips_prefix_and_threads_auth_token() {
    let api = MockMediaApi::start().await;
    api.captcha("cap-1", "auth-1", &png_data_uri(8, 6)).await;
    api.verify_captcha("x7y8", "auth-2").await;
    api.login_ok("tok-captcha", 4).await;
    api.register_created("tok-new", 5).await;

    let prompter = ScriptedPrompter::default()
        .answer("captcha_code", "x7y8")
        .answer("username", "alice")
        .answer("password", "alice-pass")
        .answer("username", "bob")
        .answer("email", "bob@example.com")
        .answer("password", "bob-pass")
        .answer("invite_code", "INV-1");

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, prompter, dir.path());

    let result = CaptchaScenario.run(&mut ctx).await.unwrap();
    assert!(result.passed, "failures: {:?}", transcript.failures());

    let saved = std::fs::read(dir.path().join("captcha.png")).unwrap();
    assert_eq!(saved, png_bytes(8, 6));
    assert!(transcript.contains("image size: 8x6, format: Png"));

    let verify = api.requests_to("POST", VERIFY_CAPTCHA_PATH).await;
    assert_eq!(json_body(&verify[0])["captcha_id"], "cap-1");

    let login = json_body(&api.requests_to("POST", LOGIN_PATH).await[0]);
    assert_eq!(login["username"], "alice");
    assert_eq!(login["auth_token"], "auth-2");

    let register = json_body(&api.requests_to("POST", REGISTER_PATH).await[0]);
    assert_eq!(register["username"], "bob");
    assert_eq!(register["invite_code"], "INV-1");
    assert_eq!(register["auth_token"], "auth-2");
}

#[tokio::test]
async fn test_wrong_captcha_code_stops_flow() {
    let api = MockMediaApi::start().await;
    api.captcha("cap-1", "auth-1", &png_data_uri(2, 2)).await;
    api.verify_captcha("right", "auth-2").await;

    let prompter = ScriptedPrompter::default().answer("captcha_code", "wrong");
    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, prompter, dir.path());

    let result = CaptchaScenario.run(&mut ctx).await.unwrap();
    assert!(!result.passed);
    assert_eq!(result.outcome(steps::VERIFY_CAPTCHA).unwrap().status, Some(400));
    assert!(transcript.contains("wrong captcha code"));
    assert!(api.requests_to("POST", LOGIN_PATH).await.is_empty());
}

#[tokio::test]
async fn test_negative_checks_pass_on_401() {
    let api = MockMediaApi::start().await;
    api.materials_guard(401, 401).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    assert!(steps::check_unauthorized(&mut ctx).await.unwrap());
    assert!(steps::check_invalid_token(&mut ctx).await.unwrap());

    let requests = api.requests_to("GET", MATERIALS_PATH).await;
    assert_eq!(authorization(&requests[0]), None);
    assert_eq!(authorization(&requests[1]).as_deref(), Some("Bearer invalid_token"));
}

#[tokio::test]
async fn test_negative_check_fails_when_server_lets_anonymous_in() {
    let api = MockMediaApi::start().await;
    api.materials_guard(200, 401).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    assert!(!steps::check_unauthorized(&mut ctx).await.unwrap());
    assert!(
        transcript
            .failures()
            .iter()
            .any(|f| f.contains("was not rejected (status 200)"))
    );
}

#[tokio::test]
async fn test_negative_check_fails_when_bogus_token_accepted() {
    let api = MockMediaApi::start().await;
    api.materials_guard(401, 200).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    assert!(!steps::check_invalid_token(&mut ctx).await.unwrap());
    let result = ctx.finish("negative", std::time::Instant::now());
    let outcome = result.outcome(steps::INVALID_TOKEN).unwrap();
    assert_eq!(outcome.verdict, Verdict::Failed);
    assert_eq!(outcome.status, Some(200));
    assert!(transcript.contains("invalid token was not rejected (status 200)"));
}

#[tokio::test]
async fn test_full_falls_back_to_configured_login() {
    let api = MockMediaApi::start().await;
    api.health(200).await;
    api.materials_guard(401, 401).await;
    api.register_rejected(403, "registration closed").await;
    api.login_ok("tok-admin", 1).await;
    api.upload_ok("tok-admin", 40).await;
    api.update_ok("tok-admin", 40).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context_with(
        admin_fallback(&api.uri()),
        &transcript,
        ScriptedPrompter::default(),
        dir.path(),
    );

    let result = FullScenario.run(&mut ctx).await.unwrap();
    assert!(result.passed, "failures: {:?}", transcript.failures());
    assert_eq!(result.outcome(steps::REGISTER).unwrap().verdict, Verdict::Tolerated);

    let logins = api.requests_to("POST", LOGIN_PATH).await;
    assert_eq!(logins.len(), 1);
    let login = json_body(&logins[0]);
    assert_eq!(login["username"], "admin");
    assert_eq!(login["password"], "admin-pass");

    let uploads = api.requests_to("POST", MATERIALS_PATH).await;
    assert_eq!(uploads.len(), 2);
    assert!(
        uploads
            .iter()
            .all(|u| authorization(u).as_deref() == Some("Bearer tok-admin"))
    );
}

#[tokio::test]
async fn test_full_stops_when_fallback_login_fails() {
    let api = MockMediaApi::start().await;
    api.health(200).await;
    api.materials_guard(401, 401).await;
    api.register_rejected(403, "registration closed").await;
    api.login_rejected(401, "bad admin password").await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context_with(
        admin_fallback(&api.uri()),
        &transcript,
        ScriptedPrompter::default(),
        dir.path(),
    );

    let result = FullScenario.run(&mut ctx).await.unwrap();
    assert!(!result.passed);
    assert_eq!(result.outcome(steps::REGISTER).unwrap().verdict, Verdict::Failed);
    assert_eq!(result.outcome(steps::LOGIN).unwrap().status, Some(401));
    assert!(transcript.contains("cannot log in"));

    assert!(api.requests_to("POST", MATERIALS_PATH).await.is_empty());
    assert!(!dir.path().join(TEXT_FIXTURE).exists());
}

#[tokio::test]
async fn test_fixtures_removed_after_failed_uploads() {
    let api = MockMediaApi::start().await;
    api.health(200).await;
    api.materials_guard(401, 401).await;
    api.register_created("tok-full", 11).await;
    api.upload_rejected(500, "storage offline").await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    let result = FullScenario.run(&mut ctx).await.unwrap();
    assert!(!result.passed);
    // both uploads were attempted
    assert_eq!(api.requests_to("POST", MATERIALS_PATH).await.len(), 2);
    assert!(transcript.contains("storage offline"));

    assert!(!dir.path().join(TEXT_FIXTURE).exists());
    assert!(!dir.path().join(IMAGE_FIXTURE).exists());
}

#[tokio::test]
async fn test_fixtures_removed_after_successful_uploads() {
    let api = MockMediaApi::start().await;
    api.health(200).await;
    api.materials_guard(401, 401).await;
    api.register_created("tok-full", 11).await;
    api.upload_ok("tok-full", 21).await;
    api.update_ok("tok-full", 21).await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());

    let result = FullScenario.run(&mut ctx).await.unwrap();
    assert!(result.passed, "failures: {:?}", transcript.failures());

    let register = json_body(&api.requests_to("POST", REGISTER_PATH).await[0]);
    let username = register["username"].as_str().unwrap();
    assert!(username.starts_with("probe_user_"));
    assert_eq!(register["email"], format!("{username}@example.com"));

    let uploads = api.requests_to("POST", MATERIALS_PATH).await;
    assert_eq!(uploads.len(), 2);
    assert!(!String::from_utf8_lossy(&uploads[1].body).contains("workflow_id"));

    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_upload_without_token_sends_nothing() {
    let api = MockMediaApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("orphan.txt");
    std::fs::write(&file, "x").unwrap();

    let transcript = Transcript::new();
    let mut ctx = context(&api.uri(), &transcript, ScriptedPrompter::default(), dir.path());
    let session = Session::new(ctx.client.base_url().clone());

    let id = steps::upload_material(&mut ctx, &session, &file, Some(1))
        .await
        .unwrap();
    assert_eq!(id, None);
    assert!(api.requests().await.is_empty());
    assert!(transcript.contains("log in first"));
}
