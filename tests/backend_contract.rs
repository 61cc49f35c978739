//! Backend HTTP contract tests.
//!
//! These verify the exact wire format the client speaks against the chat
//! backend: form-encoded request bodies, JSON response shapes, and the
//! tagged error convention on `/message`.

use std::sync::Arc;

use charla::app::{App, Author};
use charla::bridge::HostBridge;
use charla::client::BackendClient;
use charla::config::Config;
use charla::error::ChatError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn message_request_is_form_encoded_with_input_and_action() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("input=hello"))
        .and(body_string_contains("action=chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response_type": "success",
            "response": "hi there"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&mock_server.uri());
    let response = client.send_message("hello", "chat").await.unwrap();

    assert!(!response.is_error());
    assert_eq!(response.response, "hi there");
}

#[tokio::test]
async fn error_tagged_response_is_parsed_not_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response_type": "error",
            "response": "Error: 500"
        })))
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&mock_server.uri());
    let response = client.send_message("x", "query").await.unwrap();

    assert!(response.is_error());
    assert_eq!(response.response, "Error: 500");
}

#[tokio::test]
async fn non_success_status_is_a_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&mock_server.uri());
    let result = client.send_message("x", "chat").await;

    match result {
        Err(ChatError::BackendStatus(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected BackendStatus error, got {other:?}"),
    }
}

#[tokio::test]
async fn system_prompt_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/system"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "You are a helpful assistant."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/system"))
        .and(body_string_contains("content=You"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "System content updated successfully"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&mock_server.uri());

    let current = client.get_system().await.unwrap();
    assert_eq!(current.content, "You are a helpful assistant.");

    let saved = client.set_system("You are terse.").await.unwrap();
    assert_eq!(saved.message, "System content updated successfully");
}

// End-to-end exchange through the view-controller: submit, wait for the
// dispatcher, observe the transcript.

fn app_against(server: &MockServer) -> App {
    let (bridge, _rx) = HostBridge::new(["dictation", "session"]);
    let config = Config {
        server_url: Some(server.uri()),
        default_action: None,
        dictation_command: None,
    };
    App::new(&config, Arc::new(bridge), None)
}

async fn settle(app: &mut App) {
    for _ in 0..200 {
        app.poll().await;
        if !app.typing {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("request never settled");
}

#[tokio::test]
async fn successful_exchange_lands_in_the_transcript() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response_type": "success",
            "response": "the answer is 42"
        })))
        .mount(&mock_server)
        .await;

    let mut app = app_against(&mock_server);
    app.input = "what is the answer".into();
    app.submit();
    assert!(app.typing);

    settle(&mut app).await;

    assert_eq!(app.transcript.len(), 2);
    assert_eq!(app.transcript[0].author, Author::User);
    assert_eq!(app.transcript[1].author, Author::Bot);
    assert_eq!(app.transcript[1].text, "the answer is 42");
    assert!(app.dialog.is_none());
}

#[tokio::test]
async fn backend_error_surfaces_as_dialog_not_transcript() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response_type": "error",
            "response": "boom"
        })))
        .mount(&mock_server)
        .await;

    let mut app = app_against(&mock_server);
    app.input = "trigger".into();
    app.submit();

    settle(&mut app).await;

    // Only the optimistic user entry; the failed exchange adds nothing.
    assert_eq!(app.transcript.len(), 1);
    assert_eq!(
        app.dialog,
        Some(charla::app::Dialog::Error("boom".into()))
    );
}
