use service_core::config::Config;
use student_service::config::{GenerationSettings, ObservabilitySettings, StudentConfig};
use student_service::startup::Application;
use std::net::{IpAddr, Ipv4Addr};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application on a random port. Summaries go to `generation_url`.
    pub async fn spawn_with_generation_url(generation_url: String) -> Self {
        let config = StudentConfig {
            common: Config {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 0,
            },
            generation: GenerationSettings {
                url: generation_url,
                timeout_secs: 5,
                ..GenerationSettings::default()
            },
            observability: ObservabilitySettings {
                log_level: "warn".to_string(),
                otlp_endpoint: None,
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, client }
    }

    /// Spawn with a generation backend that refuses connections.
    pub async fn spawn() -> Self {
        Self::spawn_with_generation_url(unreachable_url()).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_student(&self, body: serde_json::Value) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/students"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse JSON")
    }
}

/// URL of a local port nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind a free port");
    let port = listener.local_addr().expect("No local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}/api/generate", port)
}
