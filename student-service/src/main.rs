use service_core::observability::init_tracing;
use student_service::config::StudentConfig;
use student_service::services::init_metrics;
use student_service::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = StudentConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "student-service",
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    if let Err(e) = init_metrics() {
        tracing::warn!("Prometheus recorder not installed: {}", e);
    }

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
