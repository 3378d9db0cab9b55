mod common;

use agentfn::adapters::rmcp_server::{handle_trigger, trigger_context};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_trigger_returns_chat_payload() {
    let state = FakeState::with_script(vec![message("m1", "Four."), idle("idle")]);
    let runner = runner(&state, quick_settings());

    let context = trigger_context(&json!({"prompt": "2+2?"}));
    let (payload, is_error) = handle_trigger(&runner, &context).await;

    assert!(!is_error);
    assert_eq!(payload["session_id"], "session-1");
    assert_eq!(payload["response"], "Four.");
    assert_eq!(payload["response_intermediate"], json!([]));
    assert_eq!(payload["tool_calls"], json!([]));
}

#[tokio::test]
async fn test_trigger_resumes_named_session() {
    let dir = config_dir_with_session("mcp-session");
    let state = FakeState::with_script(vec![message("m1", "again"), idle("idle")]);
    let runner = runner(
        &state,
        agentfn::agents::RunnerSettings {
            config_dir: Some(dir.path().to_path_buf()),
            ..quick_settings()
        },
    );

    let context = json!({"arguments": {"prompt": "more"}, "sessionId": "mcp-session"});
    let (payload, is_error) = handle_trigger(&runner, &context).await;

    assert!(!is_error);
    assert_eq!(payload["session_id"], "mcp-session");
    assert_eq!(state.resumed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_trigger_without_prompt_is_an_error() {
    let state = FakeState::new();
    let runner = runner(&state, quick_settings());

    let (payload, is_error) = handle_trigger(&runner, &trigger_context(&json!({}))).await;
    assert!(is_error);
    assert_eq!(payload, json!({"error": "Missing 'prompt'"}));
    assert_eq!(state.starts(), 0);
}

#[tokio::test]
async fn test_trigger_failure_is_reported_as_error_payload() {
    let state = FakeState::with_script(vec![session_error("e1", "runtime exploded")]);
    let runner = runner(&state, quick_settings());

    let (payload, is_error) =
        handle_trigger(&runner, &trigger_context(&json!({"prompt": "go"}))).await;
    assert!(is_error);
    assert!(payload["error"].as_str().unwrap().contains("runtime exploded"));
}
