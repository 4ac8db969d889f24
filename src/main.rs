mod backend;
mod config;
mod console;
mod engine;
mod server;
mod state;
mod table;
mod types;
mod wallet;

#[cfg(test)]
mod tests;

use anyhow::Result;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.parse().unwrap_or_default()),
        )
        .with_target(false)
        .init();

    let port = config.http_port;
    let console = config.console;

    tracing::info!(
        local_sim = config.local_sim,
        backend = %config.backend_http,
        port,
        "highlow-table starting"
    );

    let app_state = state::AppState::new(config);

    match table::open_session(&app_state).await {
        Ok(game) => {
            tracing::info!(
                min_bet = game.min_bet,
                max_bet = game.max_bet,
                win_ratio = game.win_ratio,
                multiplier = %game.payout_multiplier,
                "session opened on startup"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not open session on startup — open via /api/session/open");
        }
    }

    if console {
        let console_app = app_state.clone();
        tokio::spawn(async move {
            console::run_stdin(console_app).await;
        });
    }

    let router = server::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("HTTP server listening on 0.0.0.0:{port}");

    axum::serve(listener, router).await?;

    Ok(())
}
