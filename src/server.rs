use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use url::Url;

use crate::backend::{BackendClient, PlayerSnapshot};
use crate::state::{AppState, CurrentRound};
use crate::table::{self, TableError};
use crate::types::{GameConfig, LastRound, RoundPhase, Side};

/// Upper bound for a single /api/simulate batch
const MAX_SIM_ROUNDS: u64 = 1_000_000;

type S = Arc<AppState>;

pub fn build_router(state: S) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/config", get(get_config))
        .route("/api/events", get(get_events))
        .route("/api/history", get(get_history))
        .route("/api/session/open", post(post_session_open))
        .route("/api/session/close", post(post_session_close))
        .route("/api/table", post(post_table))
        .route("/api/play", post(post_play))
        .route("/api/reset", post(post_reset))
        .route("/api/refresh-balance", post(post_refresh_balance))
        .route("/api/simulate", post(post_simulate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn table_error(e: TableError) -> (StatusCode, String) {
    let status = match &e {
        TableError::Bet(_) | TableError::NoPlayer | TableError::LocalSession => {
            StatusCode::BAD_REQUEST
        }
        TableError::SessionNotOpen
        | TableError::RoundInProgress
        | TableError::ResultPending
        | TableError::NoResult => StatusCode::CONFLICT,
        TableError::Backend(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

// ── Status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusResponse {
    phase: RoundPhase,
    session_open: bool,
    local_sim: bool,
    round: u64,
    balance: u64,
    total_staked: u64,
    total_paid_out: u64,
    rounds_settled: u64,
    game: Option<GameConfig>,
    player: Option<PlayerSnapshot>,
    current: Option<CurrentRound>,
    last_round: Option<LastRound>,
}

async fn get_status(State(state): State<S>) -> Json<StatusResponse> {
    let config = state.config.read().unwrap();
    let wallet = state.wallet.lock().unwrap();
    let phase = state.current_phase();

    Json(StatusResponse {
        phase,
        session_open: state.session_open(),
        local_sim: config.local_sim,
        round: *state.round_seq.lock().unwrap(),
        balance: wallet.balance,
        total_staked: wallet.total_staked,
        total_paid_out: wallet.total_paid_out,
        rounds_settled: wallet.rounds_settled,
        game: state.game.read().unwrap().clone(),
        player: state.player.read().unwrap().clone(),
        current: *state.current.read().unwrap(),
        last_round: state.last_round.read().unwrap().clone(),
    })
}

async fn get_config(State(state): State<S>) -> Json<serde_json::Value> {
    let config = state.config.read().unwrap();
    Json(serde_json::json!({
        "backend_http": config.backend_http,
        "telegram_id": config.telegram_id,
        "local_sim": config.local_sim,
        "roll_delay_ms": config.roll_delay_ms,
        "balance_sync_secs": config.balance_sync_secs,
        "starting_balance": config.starting_balance,
        "min_bet": config.min_bet,
        "max_bet": config.max_bet,
        "payout_multiplier": config.payout_multiplier.to_string(),
        "win_ratio": config.win_ratio,
        "player_set": config.has_player(),
    }))
}

async fn get_events(State(state): State<S>) -> Json<Vec<crate::state::EventEntry>> {
    let events = state.events.lock().unwrap();
    Json(events.iter().cloned().collect())
}

async fn get_history(State(state): State<S>) -> Json<Vec<crate::state::BalanceSnapshot>> {
    let history = state.balance_history.lock().unwrap();
    Json(history.clone())
}

// ── Session ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OpenSessionRequest {
    telegram_id: Option<i64>,
}

async fn post_session_open(
    State(state): State<S>,
    body: Option<Json<OpenSessionRequest>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if let Some(id) = body.and_then(|Json(b)| b.telegram_id) {
        let mut config = state.config.write().unwrap();
        config.telegram_id = id;
        config.persist();
    }

    let game = table::open_session(&state).await.map_err(table_error)?;
    let balance = state.wallet.lock().unwrap().balance;
    Ok(Json(serde_json::json!({"ok": true, "game": game, "balance": balance})))
}

async fn post_session_close(
    State(state): State<S>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    table::close_session(&state).map_err(table_error)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Table settings (persisted; game rules apply at the next session open) ──

#[derive(Deserialize)]
struct TableRequest {
    backend_http: Option<String>,
    telegram_id: Option<i64>,
    local_sim: Option<bool>,
    roll_delay_ms: Option<u64>,
    balance_sync_secs: Option<u64>,
    starting_balance: Option<u64>,
    min_bet: Option<u64>,
    max_bet: Option<u64>,
    payout_multiplier: Option<String>,
    win_ratio: Option<u8>,
}

async fn post_table(
    State(state): State<S>,
    Json(body): Json<TableRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if state.is_rolling() {
        return Err((StatusCode::CONFLICT, "cannot change table while a round is rolling".into()));
    }

    let mut config = state.config.write().unwrap();

    if let Some(v) = &body.backend_http {
        let url = Url::parse(v)
            .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid backend_http url: {v}")))?;
        config.backend_http = url.to_string().trim_end_matches('/').to_string();
        *state.backend.write().unwrap() = BackendClient::new(&config.backend_http);
    }
    if let Some(v) = body.telegram_id { config.telegram_id = v; }
    if let Some(v) = body.local_sim { config.local_sim = v; }
    if let Some(v) = body.roll_delay_ms { config.roll_delay_ms = v; }
    if let Some(v) = body.balance_sync_secs { config.balance_sync_secs = v; }
    if let Some(v) = body.starting_balance { config.starting_balance = v; }
    if let Some(v) = body.min_bet { config.min_bet = v; }
    if let Some(v) = body.max_bet { config.max_bet = v; }
    if let Some(v) = &body.payout_multiplier {
        config.payout_multiplier = v.parse()
            .map_err(|_| (StatusCode::BAD_REQUEST, "invalid payout_multiplier".into()))?;
    }
    if let Some(v) = body.win_ratio { config.win_ratio = v.min(100); }
    config.persist();
    drop(config);

    state.push_event("table", "table settings updated + saved");
    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Play / reset ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PlayBody {
    side: String,
    stake: u64,
}

async fn post_play(
    State(state): State<S>,
    Json(body): Json<PlayBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let side = Side::parse(&body.side)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown side: {}", body.side)))?;

    let round = table::play(&state, side, body.stake).map_err(table_error)?;
    Ok(Json(serde_json::json!({"ok": true, "round": round, "phase": "rolling"})))
}

async fn post_reset(
    State(state): State<S>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    table::reset(&state).map_err(table_error)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Balance ─────────────────────────────────────────────────────────────────

async fn post_refresh_balance(
    State(state): State<S>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let balance = table::refresh_balance(&state).await.map_err(table_error)?;
    Ok(Json(serde_json::json!({"ok": true, "balance": balance})))
}

// ── Simulation ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SimulateRequest {
    side: String,
    stake: u64,
    rounds: u64,
}

async fn post_simulate(
    State(state): State<S>,
    Json(body): Json<SimulateRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let side = Side::parse(&body.side)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown side: {}", body.side)))?;
    if body.stake == 0 {
        return Err((StatusCode::BAD_REQUEST, "stake must be > 0".into()));
    }
    if body.rounds == 0 || body.rounds > MAX_SIM_ROUNDS {
        return Err((StatusCode::BAD_REQUEST, format!("rounds must be 1..={MAX_SIM_ROUNDS}")));
    }

    let report = table::simulate(&state, side, body.stake, body.rounds);
    Ok(Json(serde_json::json!({"ok": true, "report": report})))
}
