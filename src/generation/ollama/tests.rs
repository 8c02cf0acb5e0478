use super::*;
use serde_json::json;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

fn test_generator(server: &MockServer) -> OllamaGenerator {
    let url = Url::parse(&server.uri()).expect("mock server uri should parse");
    let config = OllamaConfig {
        host: url.host_str().expect("mock server has host").to_string(),
        port: url.port().expect("mock server has port"),
        generation_model: "test-chat".to_string(),
        ..OllamaConfig::default()
    };
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_retry_attempts(1);
    OllamaGenerator::with_client(client, &config)
}

#[test]
fn generator_configuration() {
    let generator =
        OllamaGenerator::new(&OllamaConfig::default()).expect("Failed to create generator");
    assert_eq!(generator.model(), "llama3.2:latest");
    assert_eq!(generator.temperature, 0.2);
}

#[tokio::test]
async fn generates_trimmed_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "test-chat",
            "stream": false,
            "options": {"temperature": 0.2}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "test-chat",
            "message": {"role": "assistant", "content": "  Cats are mammals.\n"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = test_generator(&server);
    let answer = tokio::task::spawn_blocking(move || {
        generator.generate("what are cats", &["cats are mammals".to_string()])
    })
    .await
    .expect("blocking task should finish")
    .expect("generation should succeed");

    assert_eq!(answer, "Cats are mammals.");
}

#[tokio::test]
async fn service_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let generator = test_generator(&server);
    let result = tokio::task::spawn_blocking(move || {
        generator.generate("what are cats", &["cats are mammals".to_string()])
    })
    .await
    .expect("blocking task should finish");

    assert!(result.is_err());
}
