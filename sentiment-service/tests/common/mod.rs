#![allow(dead_code)]

use secrecy::Secret;
use sentiment_service::config::{CorsConfig, FailureStatus, SentimentConfig, UpstreamConfig};
use sentiment_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::time::Duration;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_MODEL: &str = "llama-3.3-70b-versatile";

pub fn test_config(upstream_base_url: &str) -> SentimentConfig {
    SentimentConfig {
        common: CoreConfig {
            port: 0, // Random port
            log_level: "debug".to_string(),
        },
        service_name: "sentiment-service-test".to_string(),
        upstream: UpstreamConfig {
            base_url: upstream_base_url.to_string(),
            api_key: Secret::new(TEST_API_KEY.to_string()),
            model: TEST_MODEL.to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(5),
        },
        cors: CorsConfig::default(),
        failure_status: FailureStatus::Ok,
        otlp_endpoint: None,
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(upstream_base_url: &str) -> Self {
        Self::spawn_with(test_config(upstream_base_url)).await
    }

    pub async fn spawn_with(config: SentimentConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn process_text(&self, text: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/process_text", self.address))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Chat-completion body whose first choice carries `content`.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": TEST_MODEL,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

/// An address nothing is listening on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
