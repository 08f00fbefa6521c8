use super::*;
use crate::core::chat_stream::StreamMessage;
use crate::core::commands::{find_mode, InputCommand, ModeSetting};
use crate::core::message::{Message, Role};
use crate::core::state::SessionState;
use crate::utils::test_utils::{
    create_test_assets, create_test_preferences, RecordingServer, ScriptedGateway, ScriptedInput,
    SharedBuffer,
};

struct Harness {
    app: App,
    gateway: ScriptedGateway,
    server: RecordingServer,
    output: SharedBuffer,
    reads: std::sync::Arc<std::sync::Mutex<usize>>,
}

fn harness(gateway: ScriptedGateway, lines: &[&str], server: RecordingServer) -> Harness {
    let output = SharedBuffer::default();
    let input = ScriptedInput::new(lines);
    let reads = input.read_counter();
    let app = App::new(
        create_test_preferences(),
        SessionContext::new(create_test_assets(), ModeSetting::default()),
        Console::new(Box::new(output.clone()), false),
        Box::new(gateway.clone()),
        Box::new(server.clone()),
        Box::new(input),
    );
    Harness {
        app,
        gateway,
        server,
        output,
        reads,
    }
}

fn normal_harness(gateway: ScriptedGateway, lines: &[&str]) -> Harness {
    let mut h = harness(gateway, lines, RecordingServer::default());
    h.app.session.seed_history();
    h.app.session.state.transition(SessionState::Normal);
    h
}

fn reads(h: &Harness) -> usize {
    *h.reads.lock().unwrap()
}

#[tokio::test]
async fn initialize_seeds_history_and_enters_normal() {
    let mut h = harness(ScriptedGateway::new(), &[], RecordingServer::default());

    h.app.initialize().await.unwrap();

    assert!(h.app.session.state.is(SessionState::Normal));
    assert_eq!(h.app.session.history.len(), 3);
    assert!(h.app.session.history.starts_with_system());
    assert_eq!(
        h.server.calls(),
        vec!["server start".to_string(), "load luna-test-model".to_string()]
    );
    assert!(h.output.plain_text().contains("== Luna =="));
}

#[tokio::test]
async fn server_failures_during_init_are_only_warnings() {
    let mut h = harness(ScriptedGateway::new(), &[], RecordingServer::failing());

    h.app.initialize().await.unwrap();

    assert!(h.app.session.state.is(SessionState::Normal));
    let text = h.output.plain_text();
    assert!(text.contains("Could not start the local server"));
    assert!(text.contains("Model loading failed"));
}

#[tokio::test]
async fn turn_streams_reply_into_one_assistant_message() {
    let gateway = ScriptedGateway::new().reply(&["Hel", "lo", "!"]);
    let mut h = normal_harness(gateway, &["How are you?"]);

    let outcome = h.app.run_turn().await.unwrap();

    assert_eq!(outcome, TurnOutcome::Continue);
    let messages = h.app.session.history.messages();
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[3], Message::assistant("Hello!"));
    assert_eq!(messages[4], Message::user("How are you?"));
    assert!(h.output.plain_text().starts_with("Hello!\n>> "));

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 3);
    assert_eq!(requests[0].temperature, 0.80);
}

#[tokio::test]
async fn mode_command_changes_temperature_and_appends_two_messages() {
    let gateway = ScriptedGateway::new().reply(&["Hi."]);
    let mut h = normal_harness(gateway, &["mode:factual"]);

    h.app.run_turn().await.unwrap();

    let messages = h.app.session.history.messages();
    assert_eq!(messages.len(), 6);
    assert_eq!(
        messages[4],
        Message::assistant(
            "The user requested `factual` mode. The AI Temperature setting has changed to 0.30."
        )
    );
    assert_eq!(
        messages[5],
        Message::user("Explain your `factual` mode to me in 12 words or less.")
    );
    assert_eq!(h.app.session.mode.temperature, 0.30);
    assert_eq!(h.app.session.mode.label, "factual");
    assert!(h.app.session.state.is(SessionState::Normal));
    assert!(h
        .output
        .plain_text()
        .contains(" << Command \"factual\" received\n"));
}

#[tokio::test]
async fn exit_phrase_moves_to_quitting_with_fixed_messages() {
    let gateway = ScriptedGateway::new().reply(&["Hi."]);
    let mut h = normal_harness(gateway, &["  QUIT "]);

    h.app.run_turn().await.unwrap();

    let messages = h.app.session.history.messages();
    assert_eq!(messages.len(), 6);
    assert_eq!(
        messages[4],
        Message::assistant("The user has chosen to exit the terminal application.")
    );
    assert_eq!(messages[5], Message::user("Goodbye."));
    assert!(h.app.session.state.is(SessionState::Quitting));
    assert!(h
        .output
        .plain_text()
        .contains(" << Command \"quit\" received!\n"));
}

#[tokio::test]
async fn quitting_round_completes_once_without_reading_input() {
    let gateway = ScriptedGateway::new().reply(&["Farewell, friend."]);
    let mut h = normal_harness(gateway, &["never read"]);
    h.app.apply_command(InputCommand::ExitRequested, "bye, luna!").unwrap();
    let before = h.app.session.history.len();

    let outcome = h.app.run_turn().await.unwrap();

    assert_eq!(outcome, TurnOutcome::Finished);
    assert_eq!(reads(&h), 0);
    assert_eq!(h.gateway.requests().len(), 1);
    assert_eq!(h.app.session.history.len(), before + 1);
    assert_eq!(
        h.app.session.history.last(),
        Some(&Message::assistant("Farewell, friend."))
    );
    assert_eq!(h.server.calls(), vec!["unload luna-test-model".to_string()]);
    assert!(h.output.plain_text().ends_with(" *** Goodbye! ***\n"));
}

#[tokio::test]
async fn failed_attempt_is_discarded_and_retried_once() {
    let gateway = ScriptedGateway::new()
        .failure(&["partial "], GatewayError::Stream("reset by peer".to_string()))
        .reply(&["Complete answer."]);
    let mut h = normal_harness(gateway, &["next"]);

    h.app.run_turn().await.unwrap();

    let assistant_replies: Vec<&Message> = h
        .app
        .session
        .history
        .messages()
        .iter()
        .skip(3)
        .filter(|m| m.role == Role::Assistant)
        .collect();
    assert_eq!(assistant_replies, vec![&Message::assistant("Complete answer.")]);
    assert!(!h
        .app
        .session
        .history
        .messages()
        .iter()
        .any(|m| m.content.contains("partial")));

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages, requests[1].messages);
    assert!(h.output.plain_text().contains("Stream interrupted: reset by peer"));
}

#[tokio::test]
async fn second_failure_is_fatal_and_releases_the_model() {
    let gateway = ScriptedGateway::new()
        .failure(&[], GatewayError::Transport("refused".to_string()))
        .failure(&[], GatewayError::Api("API Error: No models loaded".to_string()));
    let mut h = normal_harness(gateway, &[]);

    let err = h.app.run().await.unwrap_err();

    match err {
        AppError::Gateway(GatewayError::Api(msg)) => {
            assert_eq!(msg, "API Error: No models loaded")
        }
        other => panic!("expected API error, got {other:?}"),
    }
    assert_eq!(h.app.session.history.len(), 3);
    assert_eq!(h.server.calls(), vec!["unload luna-test-model".to_string()]);
}

#[tokio::test]
async fn stream_closed_without_end_counts_as_failure() {
    let gateway = ScriptedGateway::new()
        .script(vec![StreamMessage::Chunk("cut".to_string())])
        .reply(&["whole"]);
    let mut h = normal_harness(gateway, &["x"]);

    h.app.run_turn().await.unwrap();

    assert_eq!(h.app.session.history.messages()[3], Message::assistant("whole"));
    assert_eq!(h.gateway.requests().len(), 2);
}

#[tokio::test]
async fn blank_input_requests_continuation() {
    let gateway = ScriptedGateway::new().reply(&["Thinking"]);
    let mut h = normal_harness(gateway, &["   "]);

    h.app.run_turn().await.unwrap();

    assert_eq!(h.app.session.history.len(), 5);
    assert_eq!(
        h.app.session.history.messages()[4],
        Message::user(
            "(The user sent a blank message, indicating they would like you to continue your current thought.)"
        )
    );
    assert_eq!(h.app.session.mode, ModeSetting::default());
    assert!(h.app.session.state.is(SessionState::Normal));
}

#[tokio::test]
async fn plain_message_is_kept_verbatim() {
    let gateway = ScriptedGateway::new().reply(&["ok"]);
    let mut h = normal_harness(gateway, &["  Mode:Factual please  "]);

    h.app.run_turn().await.unwrap();

    assert_eq!(
        h.app.session.history.last(),
        Some(&Message::user("  Mode:Factual please  "))
    );
    assert_eq!(h.app.session.mode, ModeSetting::default());
}

#[tokio::test]
async fn end_of_input_behaves_like_exit() {
    let gateway = ScriptedGateway::new().reply(&["Hi."]);
    let mut h = normal_harness(gateway, &[]);

    h.app.run_turn().await.unwrap();

    assert!(h.app.session.state.is(SessionState::Quitting));
    assert_eq!(h.app.session.history.last(), Some(&Message::user("Goodbye.")));
    assert!(!h.output.plain_text().contains("received!"));
}

#[tokio::test]
async fn full_session_runs_until_farewell() {
    let gateway = ScriptedGateway::new()
        .reply(&["I am Luna."])
        .reply(&["Factual mode: short, precise answers."])
        .reply(&["Goodbye!"]);
    let mut h = harness(
        gateway,
        &["mode:factual", "luna:exit", "unreachable"],
        RecordingServer::default(),
    );

    h.app.run().await.unwrap();

    assert_eq!(h.gateway.requests().len(), 3);
    assert_eq!(h.gateway.requests()[1].temperature, 0.30);
    assert_eq!(reads(&h), 2);
    assert_eq!(
        h.server.calls(),
        vec![
            "server start".to_string(),
            "load luna-test-model".to_string(),
            "unload luna-test-model".to_string(),
        ]
    );
    // seed(3) + reply + mode pair + reply + exit pair + final reply
    assert_eq!(h.app.session.history.len(), 10);
    assert!(h.output.plain_text().ends_with(" *** Goodbye! ***\n"));
}

#[tokio::test]
async fn stop_server_on_exit_is_honored() {
    let gateway = ScriptedGateway::new().reply(&["bye"]);
    let mut h = normal_harness(gateway, &[]);
    h.app.prefs.stop_server_on_exit = true;
    h.app.session.state.transition(SessionState::Quitting);

    h.app.run_turn().await.unwrap();

    assert_eq!(
        h.server.calls(),
        vec![
            "unload luna-test-model".to_string(),
            "server stop".to_string()
        ]
    );
}

#[test]
fn mode_echo_uses_table_label() {
    let mut h = normal_harness(ScriptedGateway::new(), &[]);
    let verbose = find_mode("mode:verbose").unwrap();

    h.app
        .apply_command(InputCommand::ModeChange(verbose), "MODE:VERBOSE")
        .unwrap();

    assert_eq!(h.app.session.mode.temperature, 1.65);
    assert!(h.app.session.history.messages()[3]
        .content
        .ends_with("has changed to 1.65."));
}
