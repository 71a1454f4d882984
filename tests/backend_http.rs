//! HTTP backend integration tests
//!
//! Runs `HttpAssistantBackend` and `HttpSpeechBackend` against a `wiremock`
//! mock server and checks request shapes and response handling.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use travelchat::backend::{
    AssistantBackend, ChatRequest, HttpAssistantBackend, HttpSpeechBackend, SpeechBackend,
};
use travelchat::config::{BackendConfig, SpeechConfig};

fn assistant(server: &MockServer) -> HttpAssistantBackend {
    HttpAssistantBackend::new(&BackendConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    })
    .expect("backend")
}

fn speech(server: &MockServer) -> HttpSpeechBackend {
    HttpSpeechBackend::new(&SpeechConfig {
        enabled: true,
        base_url: server.uri(),
        timeout_seconds: 5,
        output_dir: None,
    })
    .expect("speech backend")
}

#[tokio::test]
async fn test_chat_posts_message_and_session_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/chat/"))
        .and(body_json(json!({
            "message": "hotels in Paris",
            "session_id": "session_1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "I found 2 hotels in Paris.",
            "session_id": "session_1",
            "tools_used": ["hotel_search"],
            "hotel_data": [
                {"id": "h1", "name": "Le Marais Inn"},
                {"id": "h2", "name": "Hotel Lutetia"}
            ],
            "selected_hotel": null,
            "timestamp": "2025-07-06T17:16:42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = assistant(&server)
        .chat(&ChatRequest::new("hotels in Paris", "session_1"))
        .await
        .unwrap();

    assert_eq!(reply.reply, "I found 2 hotels in Paris.");
    assert_eq!(reply.hotel_data.unwrap().len(), 2);
    assert_eq!(reply.tools_used, Some(vec!["hotel_search".to_string()]));
}

#[tokio::test]
async fn test_chat_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/chat/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = assistant(&server)
        .chat(&ChatRequest::new("hi", "session_1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_chat_unparseable_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/chat/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = assistant(&server)
        .chat(&ChatRequest::new("hi", "session_1"))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_history_and_clear_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/history/session_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"reply": "Where to?", "session_id": "session_1"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/chat/history/session_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = assistant(&server);
    let history = backend.history("session_1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reply, "Where to?");

    assert!(backend.clear_history("session_1").await.unwrap());
}

#[tokio::test]
async fn test_hotel_search_sends_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/hotels/search"))
        .and(query_param("q", "paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "h1",
                "name": "Le Marais Inn",
                "location": "Paris",
                "price": 180.0,
                "rating": 4.5,
                "amenities": ["wifi"]
            }
        ])))
        .mount(&server)
        .await;

    let hotels = assistant(&server).search_hotels("paris").await.unwrap();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0].name, "Le Marais Inn");
    assert_eq!(hotels[0].amenities, vec!["wifi".to_string()]);
}

#[tokio::test]
async fn test_hotel_details_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/hotels/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let hotel = assistant(&server).hotel_details("missing").await.unwrap();
    assert!(hotel.is_none());
}

#[tokio::test]
async fn test_hotel_details_id_stays_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/hotels/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a/b",
            "name": "Slash Hotel",
            "location": "Paris",
            "price": 99.0,
            "rating": 4.0
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/hotels/a/b"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let hotel = assistant(&server).hotel_details("a/b").await.unwrap().unwrap();
    assert_eq!(hotel.name, "Slash Hotel");
}

#[tokio::test]
async fn test_hotel_details_dot_dot_is_refused_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = assistant(&server).hotel_details("..").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_transcribe_returns_voice_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"voice": " hotels in Lisbon "})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = speech(&server)
        .transcribe(vec![1, 2, 3], "recording.webm")
        .await
        .unwrap();
    assert_eq!(text, "hotels in Lisbon");
}

#[tokio::test]
async fn test_empty_transcription_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"voice": ""})))
        .mount(&server)
        .await;

    let result = speech(&server).transcribe(vec![1], "recording.webm").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_synthesize_returns_audio_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .and(body_json(json!({"text": "Welcome to Paris"})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
        .mount(&server)
        .await;

    let audio = speech(&server).synthesize("Welcome to Paris").await.unwrap();
    assert_eq!(audio, b"ID3audio".to_vec());
}
