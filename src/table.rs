use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::backend::PlayRequest;
use crate::engine::{self, SimReport};
use crate::state::AppState;
use crate::types::{BetError, GameConfig, LastRound, RoundOutcome, RoundPhase, Side};

/// Hard ceiling on any single backend call
const BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("no session open")]
    SessionNotOpen,

    #[error("no player configured — set telegram_id first")]
    NoPlayer,

    #[error("round in progress")]
    RoundInProgress,

    #[error("result on display — reset the table to bet again")]
    ResultPending,

    #[error("no result to clear")]
    NoResult,

    #[error("local simulation has no backend balance")]
    LocalSession,

    #[error(transparent)]
    Bet(#[from] BetError),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Open (or re-open) a table session. Live sessions pull the game settings
/// and the player balance from the backend; local sessions start from the
/// configured house defaults and bankroll.
pub async fn open_session(app: &Arc<AppState>) -> Result<GameConfig, TableError> {
    if app.is_rolling() {
        return Err(TableError::RoundInProgress);
    }

    let config = app.config.read().unwrap().clone();

    let (game, balance, player) = if config.local_sim {
        (config.house_defaults(), config.starting_balance, None)
    } else {
        if !config.has_player() {
            return Err(TableError::NoPlayer);
        }
        let backend = app.backend.read().unwrap().clone();
        let settings = tokio::time::timeout(BACKEND_TIMEOUT, backend.fetch_settings())
            .await
            .map_err(|_| anyhow::anyhow!("settings fetch timed out"))??;
        let game = settings.into_game_config();
        let player = tokio::time::timeout(BACKEND_TIMEOUT, backend.fetch_player(config.telegram_id))
            .await
            .map_err(|_| anyhow::anyhow!("player fetch timed out"))??;
        (game, player.balance, Some(player))
    };

    if let Some(cancel) = app.sync_cancel.write().unwrap().take() {
        cancel.cancel();
    }

    app.reset_for_new_session(balance);
    *app.game.write().unwrap() = Some(game.clone());
    *app.player.write().unwrap() = player;
    app.snapshot_balance();

    if config.local_sim {
        tracing::info!(balance, win_ratio = game.win_ratio, "local session opened");
        app.push_event("session", &format!(
            "local session opened — balance {balance}, win ratio {}%, pays x{}",
            game.win_ratio, game.payout_multiplier
        ));
    } else {
        tracing::info!(telegram_id = config.telegram_id, balance, win_ratio = game.win_ratio, "live session opened");
        app.push_event("session", &format!(
            "live session opened for player {} — balance {balance}",
            config.telegram_id
        ));
        spawn_balance_sync(app);
    }

    Ok(game)
}

pub fn close_session(app: &Arc<AppState>) -> Result<(), TableError> {
    if app.is_rolling() {
        return Err(TableError::RoundInProgress);
    }
    if !app.session_open() {
        return Err(TableError::SessionNotOpen);
    }

    if let Some(cancel) = app.sync_cancel.write().unwrap().take() {
        cancel.cancel();
    }
    *app.game.write().unwrap() = None;
    *app.player.write().unwrap() = None;

    let summary = app.wallet.lock().unwrap().summary();
    tracing::info!(%summary, "session closed");
    app.push_event("session", &format!("session closed — {summary}"));
    Ok(())
}

/// Take a bet. Validates the stake against the session rules and the
/// bankroll, debits it, and spawns the roll; the table shows ROLLING until
/// the spawned task settles. Returns the round number.
pub fn play(app: &Arc<AppState>, side: Side, stake: u64) -> Result<u64, TableError> {
    let game = app
        .game
        .read()
        .unwrap()
        .clone()
        .ok_or(TableError::SessionNotOpen)?;

    let phase = app.current_phase();
    if phase != RoundPhase::Betting {
        return Err(blocked_by(phase));
    }

    let balance = app.wallet.lock().unwrap().balance;
    game.validate_stake(stake, balance)?;

    let round = app.begin_round(side, stake).map_err(blocked_by)?;

    app.wallet.lock().unwrap().debit_stake(stake);
    app.snapshot_balance();

    let (local_sim, delay_ms, telegram_id) = {
        let config = app.config.read().unwrap();
        (config.local_sim, config.roll_delay_ms, config.telegram_id)
    };

    tracing::info!(round, side = %side, stake, simulated = local_sim, "round rolling");
    app.push_event("round", &format!("round {round}: {stake} on {side}"));

    let task_app = app.clone();
    tokio::spawn(async move {
        resolve_round(task_app, game, round, side, stake, local_sim, delay_ms, telegram_id).await;
    });

    Ok(round)
}

fn blocked_by(phase: RoundPhase) -> TableError {
    match phase {
        RoundPhase::Rolling => TableError::RoundInProgress,
        _ => TableError::ResultPending,
    }
}

async fn resolve_round(
    app: Arc<AppState>,
    game: GameConfig,
    round: u64,
    side: Side,
    stake: u64,
    local_sim: bool,
    delay_ms: u64,
    telegram_id: i64,
) {
    // The shake is pure theatre for the webview; nothing is drawn until it ends.
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    if local_sim {
        let outcome = {
            let mut rng = rand::thread_rng();
            engine::settle(side, stake, &game, &mut rng)
        };
        app.wallet.lock().unwrap().settle_local(outcome.payout);
        app.snapshot_balance();

        let (f1, f2) = outcome.faces.unwrap_or((0, 0));
        if outcome.is_win {
            app.push_event("result", &format!(
                "round {round}: rolled {f1}+{f2} = {} — WIN, paid {}",
                outcome.total, outcome.payout
            ));
        } else {
            app.push_event("result", &format!(
                "round {round}: rolled {f1}+{f2} = {} — lose", outcome.total
            ));
        }
        tracing::info!(
            round, total = outcome.total, is_win = outcome.is_win, payout = outcome.payout,
            "round settled locally"
        );

        app.finish_roll(LastRound {
            round,
            side,
            stake,
            outcome,
            simulated: true,
            settled_at: chrono::Utc::now().to_rfc3339(),
        });
        return;
    }

    // Delegated settlement: the backend decides and its balance wins.
    let backend = app.backend.read().unwrap().clone();
    let request = PlayRequest { telegram_id, amount: stake, choice: side };

    let settled = match tokio::time::timeout(BACKEND_TIMEOUT, backend.play(&request)).await {
        Ok(Ok(resp)) => match resp.balance_units() {
            Some(new_balance) => Ok((resp, new_balance)),
            None => Err(anyhow::anyhow!("play response missing newBalance")),
        },
        Ok(Err(e)) => Err(e),
        Err(_) => Err(anyhow::anyhow!("play delegation timed out")),
    };

    match settled {
        Ok((resp, new_balance)) => {
            let outcome = RoundOutcome {
                is_win: resp.won(),
                total: resp.result(),
                faces: None,
                payout: resp.payout_units(),
            };
            app.wallet.lock().unwrap().settle_remote(new_balance, outcome.payout);
            app.snapshot_balance();

            if outcome.is_win {
                app.push_event("result", &format!(
                    "round {round}: server rolled {} ({}) — WIN, paid {}",
                    outcome.total, resp.landed(), outcome.payout
                ));
            } else {
                app.push_event("result", &format!(
                    "round {round}: server rolled {} ({}) — lose",
                    outcome.total, resp.landed()
                ));
            }
            tracing::info!(
                round, result = outcome.total, is_win = outcome.is_win,
                payout = outcome.payout, balance = new_balance,
                "round settled by backend"
            );

            app.finish_roll(LastRound {
                round,
                side,
                stake,
                outcome,
                simulated: false,
                settled_at: chrono::Utc::now().to_rfc3339(),
            });
        }
        Err(e) => {
            // The round never settled: give the stake back and reopen betting.
            app.wallet.lock().unwrap().refund_stake(stake);
            app.snapshot_balance();
            app.abort_roll();
            tracing::error!(round, error = %e, "delegated settlement failed — stake refunded");
            app.push_event("error", &format!(
                "round {round}: settlement failed ({e}) — stake refunded"
            ));
        }
    }
}

/// Clear a displayed result and reopen betting
pub fn reset(app: &Arc<AppState>) -> Result<(), TableError> {
    if app.clear_result() {
        app.push_event("reset", "table reopened for betting");
        return Ok(());
    }
    match app.current_phase() {
        RoundPhase::Rolling => Err(TableError::RoundInProgress),
        _ => Err(TableError::NoResult),
    }
}

/// Manual authoritative balance pull for a live session
pub async fn refresh_balance(app: &Arc<AppState>) -> Result<u64, TableError> {
    if !app.session_open() {
        return Err(TableError::SessionNotOpen);
    }
    if app.is_rolling() {
        return Err(TableError::RoundInProgress);
    }

    let config = app.config.read().unwrap().clone();
    if config.local_sim {
        return Err(TableError::LocalSession);
    }

    let backend = app.backend.read().unwrap().clone();
    let player = tokio::time::timeout(BACKEND_TIMEOUT, backend.fetch_player(config.telegram_id))
        .await
        .map_err(|_| anyhow::anyhow!("player fetch timed out"))??;

    // A round may have started while the fetch was in flight.
    if app.is_rolling() {
        return Err(TableError::RoundInProgress);
    }

    app.wallet.lock().unwrap().set_balance(player.balance);
    app.snapshot_balance();
    let balance = player.balance;
    *app.player.write().unwrap() = Some(player);

    app.push_event("sync", &format!("balance refreshed from backend: {balance}"));
    Ok(balance)
}

/// Monte-Carlo batch against the active rules (session rules if a session
/// is open, house defaults otherwise). The wallet is never touched.
pub fn simulate(app: &Arc<AppState>, side: Side, stake: u64, rounds: u64) -> SimReport {
    let game = app
        .game
        .read()
        .unwrap()
        .clone()
        .unwrap_or_else(|| app.config.read().unwrap().house_defaults());
    let mut rng = rand::thread_rng();
    engine::simulate(side, stake, rounds, &game, &mut rng)
}

/// Background task: keep the wallet aligned with the backend while a live
/// session sits in BETTING. Cancelled on session close or re-open.
fn spawn_balance_sync(app: &Arc<AppState>) {
    let cancel = CancellationToken::new();
    *app.sync_cancel.write().unwrap() = Some(cancel.clone());

    let sync_app = app.clone();
    tokio::spawn(async move {
        let secs = sync_app.config.read().unwrap().balance_sync_secs;
        let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
        interval.tick().await; // skip immediate first tick (session open just synced)
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if sync_app.is_rolling() {
                        continue;
                    }
                    let telegram_id = sync_app.config.read().unwrap().telegram_id;
                    let backend = sync_app.backend.read().unwrap().clone();
                    match backend.fetch_player(telegram_id).await {
                        Ok(player) => {
                            // A round may have started while the fetch was in flight.
                            if sync_app.is_rolling() {
                                continue;
                            }
                            sync_app.wallet.lock().unwrap().set_balance(player.balance);
                            sync_app.snapshot_balance();
                            tracing::debug!(balance = player.balance, "periodic balance sync");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "periodic balance sync failed");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("balance sync task stopped");
                    break;
                }
            }
        }
    });
}
