use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use vetter_core::assistant::GeminiClient;
use vetter_server::archive::CandidateDirectory;
use vetter_server::config::Config;
use vetter_server::db::SqliteDb;
use vetter_server::persistent_store::PersistentSessionStore;
use vetter_server::routes::router;
use vetter_server::timer::AnswerTimers;
use vetter_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting vetter interview server");

    let config = Config::from_env().context("Failed to load configuration from environment")?;

    let assistant = GeminiClient::with_endpoint(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        config.gemini_model.clone(),
    );

    let db_path = config.state_dir.join("vetter-state.db");
    info!("Using state database: {}", db_path.display());
    let db = tokio::task::spawn_blocking(move || SqliteDb::new(&db_path))
        .await
        .context("spawn_blocking panicked")?
        .context("Failed to initialize SQLite database")?;
    let db = Arc::new(db);

    // Rehydrate everything before accepting any requests: the session store
    // applies its startup recovery, and a restored in-progress session gates
    // input until the resume-or-restart decision arrives.
    let store = Arc::new(
        PersistentSessionStore::open(db.clone())
            .await
            .context("Failed to open session store")?,
    );
    if store.resume_pending().await {
        info!("Restored an in-progress interview; awaiting resume-or-restart decision");
    }

    let directory = Arc::new(
        CandidateDirectory::load(db)
            .await
            .context("Failed to load candidate archive")?,
    );

    let (events_tx, mut events_rx) = mpsc::channel(64);

    let app_state = Arc::new(AppState {
        store: store.clone(),
        directory,
        assistant: Arc::new(assistant),
        timers: Arc::new(AnswerTimers::new()),
        events_tx,
    });

    // Drain timer expiries into the session store.
    let timer_state = app_state.clone();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let ctx = timer_state.interpreter_context();
            timer_state.store.process_event(event, &ctx).await;
        }
    });

    let app = router(app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
