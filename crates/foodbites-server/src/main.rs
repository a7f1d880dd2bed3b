//! FoodBites WhatsApp bot server.
//!
//! Loads the config directory, picks a session store (PostgreSQL when
//! `DATABASE_URL` is set, in-memory otherwise), wires the conversation engine
//! to the WhatsApp Cloud API and serves the webhook.

mod routes;
mod sweeper;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use foodbites_channels::{WhatsAppClient, WhisperTranscriber};
use foodbites_core::{llm, ConversationEngine, EngineDeps};
use foodbites_memory::{InMemorySessionStore, PgSessionStore};
use foodbites_types::config::FoodBitesConfig;
use foodbites_types::config_loader::ConfigLoader;
use foodbites_types::traits::{SessionStore, SystemClock, Transcriber};

use crate::routes::AppState;
use crate::sweeper::SweepTarget;

#[derive(Debug, Parser)]
#[command(author, version, about = "FoodBites Kitchen WhatsApp bot")]
struct Cli {
    /// Port to listen on for webhook requests
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Config directory (bot.yaml, menu.yaml, business.yaml); built-in defaults when omitted
    #[arg(long, env = "FOODBITES_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// WhatsApp Cloud API access token
    #[arg(long, env = "WHATSAPP_TOKEN", hide_env_values = true)]
    whatsapp_token: String,

    /// Business phone number id messages are sent from
    #[arg(long, env = "PHONE_NUMBER_ID")]
    phone_number_id: String,

    /// Token Meta echoes during the webhook verification handshake
    #[arg(long, env = "VERIFY_TOKEN", hide_env_values = true)]
    verify_token: String,

    /// OpenAI API key, used for completions and voice transcription
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// PostgreSQL URL; selects the shared session store
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "FOODBITES_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(dir: Option<&PathBuf>) -> Result<FoodBitesConfig> {
    match dir {
        Some(dir) => ConfigLoader::new(dir)
            .load()
            .with_context(|| format!("loading config from {}", dir.display())),
        None => {
            warn!("no config directory given, using built-in defaults");
            let mut config = FoodBitesConfig::default();
            ConfigLoader::normalize(&mut config);
            ConfigLoader::validate(&config).context("built-in config is invalid")?;
            Ok(config)
        }
    }
}

async fn open_store(database_url: Option<&str>) -> Result<(Arc<dyn SessionStore>, SweepTarget)> {
    match database_url {
        Some(url) => {
            let store = Arc::new(
                PgSessionStore::new(url)
                    .await
                    .context("connecting to session database")?,
            );
            info!(backend = "postgres", "session store ready");
            let shared: Arc<dyn SessionStore> = store.clone();
            Ok((shared, SweepTarget::Postgres(store)))
        }
        None => {
            let store = Arc::new(InMemorySessionStore::new());
            info!(backend = "memory", "session store ready");
            let shared: Arc<dyn SessionStore> = store.clone();
            Ok((shared, SweepTarget::Memory(store)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config_dir.as_ref())?;
    let assistant = &config.bot.assistant;

    let (store, sweep_target) = open_store(cli.database_url.as_deref()).await?;
    let llm = llm::from_config(assistant, cli.openai_api_key.as_deref())
        .context("configuring LLM provider")?;

    let transcriber: Option<Arc<dyn Transcriber>> = match &cli.openai_api_key {
        Some(key) => Some(Arc::new(WhisperTranscriber::with_base_url(
            key.clone(),
            assistant.transcription_model.clone(),
            assistant.openai_base_url.clone(),
        ))),
        None => {
            warn!("OPENAI_API_KEY not set, voice notes will not be transcribed");
            None
        }
    };

    let engine = ConversationEngine::new(
        EngineDeps {
            store,
            llm,
            clock: Arc::new(SystemClock),
        },
        &config,
    )
    .context("building conversation engine")?;

    let whatsapp = Arc::new(WhatsAppClient::new(
        cli.whatsapp_token.clone(),
        cli.phone_number_id.clone(),
        &config.bot.whatsapp,
    ));

    let sweeper = sweeper::spawn(
        sweep_target,
        Duration::from_secs(config.bot.session.sweep_interval_secs),
    );

    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        sink: whatsapp.clone(),
        media: whatsapp,
        transcriber,
        verify_token: cli.verify_token.clone(),
        voice_failure: config.bot.assets.voice_failure.clone(),
    });

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        addr = %addr,
        model = %config.bot.assistant.model,
        categories = config.menu.categories.len(),
        "FoodBites bot listening"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    info!("FoodBites bot stopped");
    Ok(())
}
