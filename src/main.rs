use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use mail_insight::config::{CategoryTable, ReplyTemplates, ServiceConfig};
use mail_insight::llm::create_service;
use mail_insight::pipeline::AnalysisPipeline;
use mail_insight::server::rate_limit::RateLimits;
use mail_insight::server::{AppState, build_router};
use mail_insight::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; an optional log directory adds a non-blocking
    // daily rolling file writer.
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let _log_guard = match std::env::var("MAIL_INSIGHT_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mail-insight.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .init();
            None
        }
    };

    // Generative service configuration
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: OPENAI_API_KEY not set");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });
    let model =
        std::env::var("MAIL_INSIGHT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let timeout_secs: u64 = std::env::var("MAIL_INSIGHT_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    let mut service_config = ServiceConfig::new(secrecy::SecretString::from(api_key), &model)
        .with_timeout(Duration::from_secs(timeout_secs));
    if let Ok(base_url) = std::env::var("MAIL_INSIGHT_BASE_URL") {
        service_config = service_config.with_base_url(base_url);
    }
    let service = create_service(&service_config);

    // Configuration tables (built-in defaults when the files are absent)
    let categories_path = std::env::var("MAIL_INSIGHT_CATEGORIES").ok().map(PathBuf::from);
    let categories = Arc::new(
        CategoryTable::load_or_default(categories_path.as_deref())
            .context("Failed to load category table")?,
    );
    let templates_path = std::env::var("MAIL_INSIGHT_TEMPLATES").ok().map(PathBuf::from);
    let templates = Arc::new(
        ReplyTemplates::load_or_default(templates_path.as_deref())
            .context("Failed to load reply templates")?,
    );
    tracing::info!(
        categories = categories.names().len(),
        "Configuration tables loaded"
    );

    // Database
    let db_path = std::env::var("MAIL_INSIGHT_DB_PATH")
        .unwrap_or_else(|_| "./data/mail-insight.db".to_string());
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(std::path::Path::new(&db_path))
            .await
            .with_context(|| format!("Failed to open database at {db_path}"))?,
    );

    // Pipeline + HTTP surface
    let pipeline = Arc::new(AnalysisPipeline::new(service, categories, templates));
    let state = AppState {
        pipeline,
        db,
        limits: Arc::new(RateLimits::new()),
        model: model.clone(),
    };

    let allowed_origin = std::env::var("MAIL_INSIGHT_ALLOWED_ORIGIN").ok();
    let router = build_router(state, allowed_origin.as_deref());

    let port: u16 = std::env::var("MAIL_INSIGHT_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{port}");

    eprintln!("mail-insight v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {model}");
    eprintln!("   Database: {db_path}");
    eprintln!("   API: http://{addr}/api/v1");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router)
        .await
        .context("Server error")?;

    Ok(())
}
