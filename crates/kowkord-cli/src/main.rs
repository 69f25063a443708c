mod commands;
mod render;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use kowkord_api::{ClientConfig, HttpGateway};
use kowkord_state::{AppState, Dispatcher, StoreConfig};
use kowkord_types::api::Credential;
use kowkord_types::events::Intent;

use commands::Outcome;
use render::Renderer;

const DEFAULT_LOG_FILTER: &str = "kowkord_cli=info,kowkord_state=info,kowkord_api=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they never interleave with the timeline
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = client_config_from_env()?;
    info!(api_base = %config.api_base, timeout = ?config.request_timeout, "starting");

    let gateway = Arc::new(HttpGateway::new(config.clone())?);
    let (store, store_task) = Dispatcher::spawn(gateway, StoreConfig::from(&config));
    let render_task = tokio::spawn(render_loop(store.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let credential = match std::env::var("KOWKORD_TOKEN").ok().and_then(Credential::new) {
        Some(credential) => credential,
        None => {
            print!("Token: ");
            std::io::stdout().flush()?;
            let line = lines.next_line().await?.unwrap_or_default();
            Credential::new(line).context("no token given")?
        }
    };
    store.dispatch(Intent::Login { credential });

    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        let snapshot = store.snapshot();
        match commands::resolve(command, &snapshot) {
            Ok(Outcome::Dispatch(intents)) => {
                for intent in intents {
                    if !store.dispatch(intent) {
                        warn!("state store is gone");
                        break;
                    }
                }
            }
            Ok(Outcome::Show(kind)) => render::listing(kind, &snapshot, &mut std::io::stdout().lock())?,
            Ok(Outcome::Quit) => break,
            Err(e) => eprintln!("{e}"),
        }
    }

    // Dropping the last handle stops the store
    drop(store);
    store_task.await?;
    render_task.abort();
    info!("bye");
    Ok(())
}

fn client_config_from_env() -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::default();
    if let Ok(base) = std::env::var("KOWKORD_API_BASE") {
        config = config.with_api_base(base);
    }
    if let Ok(secs) = std::env::var("KOWKORD_TIMEOUT_SECS") {
        let secs: u64 = secs
            .trim()
            .parse()
            .with_context(|| format!("KOWKORD_TIMEOUT_SECS is not a number: {secs:?}"))?;
        config = config.with_timeout(Duration::from_secs(secs.max(1)));
    }
    Ok(config)
}

async fn render_loop(mut snapshots: watch::Receiver<AppState>) {
    let mut renderer = Renderer::default();
    while snapshots.changed().await.is_ok() {
        let state = snapshots.borrow_and_update().clone();
        if let Err(e) = renderer.render(&state, &mut std::io::stdout().lock()) {
            warn!("render failed: {}", e);
            break;
        }
    }
}
