mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use agentfn::agents::runtime::AuthMode;
use agentfn::agents::{AgentError, ClientManager, RunRequest, RunnerSettings, SessionRunner};
use common::*;
use secrecy::ExposeSecret;

#[tokio::test]
async fn test_buffered_run_collects_result() {
    let mut script: Vec<_> = (1..=7)
        .map(|i| message(&format!("m{}", i), &format!("message {}", i)))
        .collect();
    script.insert(2, tool_start("t1", "call-1", "calculator"));
    script.insert(3, tool_end("t2", "call-1", "calculator"));
    script.push(idle("idle"));

    let state = FakeState::with_script(script);
    let runner = runner(&state, quick_settings());

    let result = runner.run(RunRequest::new("What is 2+2?")).await.unwrap();

    assert_eq!(result.session_id, "session-1");
    assert_eq!(result.content, "message 7");
    assert_eq!(
        result.content_intermediate,
        vec!["message 2", "message 3", "message 4", "message 5", "message 6"]
    );
    assert_eq!(result.tool_calls.len(), 1);
    assert_eq!(result.tool_calls[0].tool_name.as_deref(), Some("calculator"));
    assert_eq!(result.tool_calls[0].tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(*state.prompts.lock().unwrap(), vec!["What is 2+2?".to_string()]);

    let created = state.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert!(!created[0].streaming);
    assert_eq!(created[0].system_message.content, "You are a test agent.");
    assert!(created[0].tools.iter().any(|t| t.name == "calculator"));
}

#[tokio::test]
async fn test_run_without_messages_has_empty_content() {
    let state = FakeState::with_script(vec![idle("idle")]);
    let runner = runner(&state, quick_settings());

    let result = runner.run(RunRequest::new("hello")).await.unwrap();
    assert_eq!(result.content, "");
    assert!(result.content_intermediate.is_empty());
    assert!(result.tool_calls.is_empty());
}

#[tokio::test]
async fn test_unknown_session_id_creates_with_that_id() {
    let dir = tempfile::tempdir().unwrap();
    let state = FakeState::with_script(vec![message("m1", "hi"), idle("idle")]);
    let runner = runner(
        &state,
        RunnerSettings {
            config_dir: Some(dir.path().to_path_buf()),
            ..quick_settings()
        },
    );

    let result = runner
        .run(RunRequest::new("hello").with_session_id(Some("abc".to_string())))
        .await
        .unwrap();

    assert_eq!(result.session_id, "abc");
    assert!(state.resumed.lock().unwrap().is_empty());
    assert_eq!(
        state.created.lock().unwrap()[0].session_id.as_deref(),
        Some("abc")
    );
}

#[tokio::test]
async fn test_existing_session_is_resumed() {
    let dir = config_dir_with_session("abc");
    let state = FakeState::with_script(vec![message("m1", "welcome back"), idle("idle")]);
    let runner = runner(
        &state,
        RunnerSettings {
            config_dir: Some(dir.path().to_path_buf()),
            model: "gpt-5".to_string(),
            ..quick_settings()
        },
    );

    let result = runner
        .run(RunRequest::new("again").with_session_id(Some("abc".to_string())))
        .await
        .unwrap();

    assert_eq!(result.session_id, "abc");
    assert_eq!(result.content, "welcome back");
    assert!(state.created.lock().unwrap().is_empty());

    let resumed = state.resumed.lock().unwrap();
    assert_eq!(resumed.len(), 1);
    assert_eq!(resumed[0].0, "abc");
    assert_eq!(resumed[0].1.model, "gpt-5");
    assert_eq!(resumed[0].1.config_dir.as_deref(), Some(dir.path()));
}

#[tokio::test]
async fn test_failed_resume_does_not_fall_back_to_create() {
    let dir = config_dir_with_session("abc");
    let state = FakeState::with_script(vec![idle("idle")]);
    state.fail_resume.store(true, Ordering::SeqCst);
    let runner = runner(
        &state,
        RunnerSettings {
            config_dir: Some(dir.path().to_path_buf()),
            ..quick_settings()
        },
    );

    let err = runner
        .run(RunRequest::new("again").with_session_id(Some("abc".to_string())))
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Resume { .. }));
    assert!(state.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_run_times_out_without_idle() {
    let state = FakeState::with_script(vec![message("m1", "partial")]);
    let runner = runner(&state, quick_settings());

    let err = runner.run(RunRequest::new("slow")).await.unwrap_err();
    assert!(matches!(err, AgentError::Timeout(_)));
}

#[tokio::test]
async fn test_session_error_fails_the_run() {
    let state = FakeState::with_script(vec![
        message("m1", "working"),
        session_error("e1", "model quota exceeded"),
    ]);
    let runner = runner(&state, quick_settings());

    let err = runner.run(RunRequest::new("go")).await.unwrap_err();
    match err {
        AgentError::Runtime(message) => assert_eq!(message, "model quota exceeded"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_prompt_never_reaches_runtime() {
    let state = FakeState::new();
    let runner = runner(&state, quick_settings());

    let err = runner.run(RunRequest::new("")).await.unwrap_err();
    assert!(matches!(err, AgentError::Validation(_)));
    assert_eq!(state.starts(), 0);
}

#[tokio::test]
async fn test_startup_failure_surfaces() {
    let state = FakeState::new();
    state.fail_start.store(true, Ordering::SeqCst);
    let runner = runner(&state, quick_settings());

    let err = runner.run(RunRequest::new("hello")).await.unwrap_err();
    assert!(matches!(err, AgentError::Startup(_)));
}

#[tokio::test]
async fn test_streaming_buffered_run_collects_deltas() {
    let state = FakeState::with_script(vec![
        delta("d1", "Hel"),
        delta("d2", "lo"),
        message("m1", "Hello"),
        idle("idle"),
    ]);
    let runner = runner(&state, quick_settings());

    let result = runner
        .run_buffered(RunRequest::new("greet"), true)
        .await
        .unwrap();
    assert_eq!(result.content, "Hello");
    assert_eq!(result.content_intermediate, vec!["Hel", "lo"]);
    assert!(state.created.lock().unwrap()[0].streaming);
}

#[test]
fn test_byok_session_config() {
    let state = FakeState::new();
    let mut options = client_options();
    options.auth = AuthMode::resolve(
        None,
        Some("https://foundry.example/openai/v1".to_string()),
        Some("secret-key".to_string()),
        Some("gpt-4.1".to_string()),
    );
    let clients = Arc::new(ClientManager::new(
        Arc::new(FakeConnector {
            state: state.clone(),
        }),
        options,
    ));
    let runner = SessionRunner::new(clients, Vec::new(), quick_settings());

    let config = runner.session_config(None, false);
    assert_eq!(config.model, "gpt-4.1");
    let provider = config.provider.expect("byok provider");
    assert_eq!(provider.base_url, "https://foundry.example/openai/v1");
    assert_eq!(provider.api_key.expose_secret(), "secret-key");

    // Resumed sessions keep the plain model and carry no provider
    let resume = runner.resume_config(false);
    assert_eq!(resume.model, RunnerSettings::default().model);
}
