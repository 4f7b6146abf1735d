use std::sync::Arc;

use leadflow::config::Config;
use leadflow::flow::FlowRunner;
use leadflow::outbound::{GraphSender, MessageSender};
use leadflow::sink::{LeadSink, SheetsSink};
use leadflow::store::{ConversationStore, LibSqlBackend};
use leadflow::webhook::webhook_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    eprintln!("📋 leadflow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook", config.port);
    eprintln!("   Sheet tab: {}", config.sheets.tab);

    // ── Store ───────────────────────────────────────────────────────────
    let store: Arc<dyn ConversationStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Adapters + flow ─────────────────────────────────────────────────
    let sender: Arc<dyn MessageSender> = Arc::new(GraphSender::new(config.page_access_token));
    let sink: Arc<dyn LeadSink> = Arc::new(SheetsSink::new(config.sheets));
    let flow = Arc::new(FlowRunner::new(store, sender, sink));

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = webhook_routes(flow, config.verify_token)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}
