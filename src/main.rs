use std::sync::Arc;

use kirana_relay::admin::{AdminState, admin_routes};
use kirana_relay::classify::HttpClassifier;
use kirana_relay::config::Config;
use kirana_relay::dispatch::Dispatcher;
use kirana_relay::onboarding::OnboardingFlow;
use kirana_relay::order::OrderBuilder;
use kirana_relay::router::MessageRouter;
use kirana_relay::session::SessionStore;
use kirana_relay::store::{LibSqlBackend, Store};
use kirana_relay::transcribe::HttpTranscriber;
use kirana_relay::transport::webhook::{WebhookState, webhook_routes};
use kirana_relay::transport::{Transport, TwilioTransport};

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

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TWILIO_ACCOUNT_SID=AC...");
        eprintln!("  export TWILIO_AUTH_TOKEN=...");
        std::process::exit(1);
    });

    eprintln!("🛒 kirana-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook:     POST http://{}/whatsapp", config.bind_addr);
    eprintln!("   Health:      GET  http://{}/health", config.bind_addr);
    eprintln!("   Orders API:  GET  http://{}/api/orders", config.bind_addr);
    eprintln!("   Transcriber: {}", config.transcriber_url);
    eprintln!("   Classifier:  {}", config.classifier_url);

    // ── Store ───────────────────────────────────────────────────────
    let store: Arc<dyn Store> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {e}",
                    config.db_path.display()
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database:    {}", config.db_path.display());

    // ── Collaborators ───────────────────────────────────────────────
    let transport: Arc<dyn Transport> = Arc::new(TwilioTransport::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_from.clone(),
    ));
    let transcriber = Arc::new(HttpTranscriber::new(config.transcriber_url.clone()));
    let classifier = Arc::new(HttpClassifier::new(config.classifier_url.clone()));

    if !config.extra_recipients.is_empty() {
        eprintln!(
            "   Extra recipients: {}",
            config.extra_recipients.join(", ")
        );
    }

    // ── Pipeline ────────────────────────────────────────────────────
    let sessions = Arc::new(SessionStore::new());
    let router = Arc::new(MessageRouter::new(
        sessions.clone(),
        store.clone(),
        OnboardingFlow::new(store.clone(), sessions.clone()),
        OrderBuilder::new(classifier, store.clone()),
        Dispatcher::new(
            transport.clone(),
            store.clone(),
            config.extra_recipients.clone(),
        ),
        transport,
        transcriber,
        config.audio_dir.clone(),
        config.language_hint.clone(),
    ));

    // ── HTTP server ─────────────────────────────────────────────────
    let app = webhook_routes(WebhookState { router })
        .merge(admin_routes(AdminState { store }));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Server started");
    eprintln!();
    axum::serve(listener, app).await?;

    Ok(())
}
