use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agente_core::prompts::{CONNECTION_ERROR_REPLY, EMPTY_REPLY};
use agente_core::{AgentError, Config, Role, Session, SilentOutput, Storage};

const CHAT_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
const TTS_PATH: &str = "/v1beta/models/gemini-2.5-flash-preview-tts:generateContent";

fn config_for(server: &MockServer) -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        api_base: server.uri(),
        ..Config::default()
    }
}

fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    }))
}

#[tokio::test]
async fn test_chat_reply_is_appended_and_history_carried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(text_reply("Você vai abordar o cliente?"))
        .expect(2)
        .mount(&server)
        .await;

    let mut session = Session::start(config_for(&server), Storage::in_memory(), SilentOutput);

    let reply = session.send_message("Oi").await.unwrap();
    assert_eq!(reply.role, Role::Model);
    assert_eq!(reply.text, "Você vai abordar o cliente?");

    session.send_message("Eu abordo").await.unwrap();
    assert_eq!(session.transcript().len(), 4);

    let requests = server.received_requests().await.unwrap();
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();

    assert_eq!(first["contents"].as_array().unwrap().len(), 1);
    assert!(first["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Christian Bot"));
    assert!((first["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

    let turns = second["contents"].as_array().unwrap();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0]["parts"][0]["text"], "Oi");
    assert_eq!(turns[1]["role"], "model");
    assert_eq!(turns[2]["parts"][0]["text"], "Eu abordo");
}

#[tokio::test]
async fn test_failed_chat_keeps_user_message_and_appends_one_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut session = Session::start(config_for(&server), Storage::open(dir.path()), SilentOutput);
    session.login("Gabi").unwrap();
    session.ensure_transcript();

    let reply = session.send_message("Qual o próximo passo?").await.unwrap();
    assert_eq!(reply.text, CONNECTION_ERROR_REPLY);

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].role, Role::User);
    assert_eq!(transcript[1].text, "Qual o próximo passo?");
    assert_eq!(transcript[2].role, Role::Model);

    // Everything was persisted, timestamps included
    let saved = transcript.to_vec();
    let reloaded = Session::start(config_for(&server), Storage::open(dir.path()), SilentOutput);
    assert_eq!(reloaded.transcript(), saved.as_slice());
    assert_eq!(reloaded.user().name, "Gabi");
}

#[tokio::test]
async fn test_empty_reply_uses_fixed_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let mut session = Session::start(config_for(&server), Storage::in_memory(), SilentOutput);
    let reply = session.send_message("Oi").await.unwrap();
    assert_eq!(reply.text, EMPTY_REPLY);
}

#[tokio::test]
async fn test_whitespace_reply_is_kept_as_is() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(text_reply("  "))
        .mount(&server)
        .await;

    let mut session = Session::start(config_for(&server), Storage::in_memory(), SilentOutput);
    let reply = session.send_message("Oi").await.unwrap();
    assert_eq!(reply.text, "  ");
}

#[tokio::test]
async fn test_unreachable_server_replies_with_connection_error() {
    // Bind then drop a listener so the port is known to be closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = Config {
        api_key: Some("test-key".to_string()),
        api_base: format!("http://127.0.0.1:{}", port),
        ..Config::default()
    };

    let mut session = Session::start(config, Storage::in_memory(), SilentOutput);
    session.login("Rafa").unwrap();
    session.ensure_transcript();

    let reply = session.send_message("Como abordo o diretor?").await.unwrap();
    assert_eq!(reply.role, Role::Model);
    assert_eq!(reply.text, CONNECTION_ERROR_REPLY);

    let roles: Vec<Role> = session.transcript().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
    assert_eq!(session.transcript()[1].text, "Como abordo o diretor?");
}

#[tokio::test]
async fn test_podcast_audio_is_decoded() {
    let server = MockServer::start().await;

    let samples: Vec<i16> = vec![0, 8192, -16384, 32767];
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{
                    "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": STANDARD.encode(&bytes) }
                }]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::start(config_for(&server), Storage::in_memory(), SilentOutput);
    let buffer = session.podcast_request().unwrap().fetch().await.unwrap();

    assert_eq!(buffer.sample_rate(), 24_000);
    assert_eq!(buffer.channel_count(), 1);
    assert_eq!(
        buffer.channel(0).unwrap().to_vec(),
        vec![0.0f32, 0.25, -0.5, 32767.0 / 32768.0]
    );

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
    assert_eq!(
        body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
        "Kore"
    );
}

#[tokio::test]
async fn test_podcast_without_audio_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(text_reply("sem áudio"))
        .mount(&server)
        .await;

    let mut session = Session::start(config_for(&server), Storage::in_memory(), SilentOutput);
    let result = session.play_podcast().await;
    assert!(matches!(result, Err(AgentError::Audio(_))));
    assert!(!session.is_playing());
}
