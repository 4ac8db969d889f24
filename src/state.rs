use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendClient, PlayerSnapshot};
use crate::config::Config;
use crate::types::{GameConfig, LastRound, RoundPhase, Side};
use crate::wallet::{self, Wallet};

#[derive(Debug, Clone, Serialize)]
pub struct EventEntry {
    pub ts: String,
    pub kind: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSnapshot {
    pub ts: String,
    pub balance: u64,
}

/// The bet currently rolling
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurrentRound {
    pub round: u64,
    pub side: Side,
    pub stake: u64,
}

pub struct AppState {
    pub config: RwLock<Config>,
    pub backend: RwLock<BackendClient>,
    pub game: RwLock<Option<GameConfig>>,
    pub player: RwLock<Option<PlayerSnapshot>>,
    pub phase: RwLock<RoundPhase>,
    pub wallet: Wallet,
    pub round_seq: Mutex<u64>,
    pub current: RwLock<Option<CurrentRound>>,
    pub last_round: RwLock<Option<LastRound>>,
    pub events: Mutex<VecDeque<EventEntry>>,
    pub balance_history: Mutex<Vec<BalanceSnapshot>>,
    pub sync_cancel: RwLock<Option<CancellationToken>>,
}

const MAX_EVENTS: usize = 200;

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let starting_balance = config.starting_balance;
        let backend = BackendClient::new(&config.backend_http);
        Arc::new(Self {
            config: RwLock::new(config),
            backend: RwLock::new(backend),
            game: RwLock::new(None),
            player: RwLock::new(None),
            phase: RwLock::new(RoundPhase::Betting),
            wallet: wallet::new_wallet(starting_balance),
            round_seq: Mutex::new(0),
            current: RwLock::new(None),
            last_round: RwLock::new(None),
            events: Mutex::new(VecDeque::with_capacity(MAX_EVENTS)),
            balance_history: Mutex::new(Vec::new()),
            sync_cancel: RwLock::new(None),
        })
    }

    pub fn push_event(&self, kind: &str, detail: &str) {
        let entry = EventEntry {
            ts: chrono::Utc::now().format("%H:%M:%S").to_string(),
            kind: kind.to_string(),
            detail: detail.to_string(),
        };
        let mut events = self.events.lock().unwrap();
        if events.len() >= MAX_EVENTS {
            events.pop_front();
        }
        events.push_back(entry);
    }

    pub fn snapshot_balance(&self) {
        let balance = self.wallet.lock().unwrap().balance;
        self.balance_history.lock().unwrap().push(BalanceSnapshot {
            ts: chrono::Utc::now().format("%H:%M:%S").to_string(),
            balance,
        });
    }

    pub fn current_phase(&self) -> RoundPhase {
        *self.phase.read().unwrap()
    }

    pub fn is_rolling(&self) -> bool {
        self.current_phase() == RoundPhase::Rolling
    }

    pub fn session_open(&self) -> bool {
        self.game.read().unwrap().is_some()
    }

    /// Move BETTING -> ROLLING and stamp the bet, all under one lock so
    /// only a single round can ever be in flight.
    /// Returns the round number, or the phase that blocked the bet.
    pub fn begin_round(&self, side: Side, stake: u64) -> Result<u64, RoundPhase> {
        let mut phase = self.phase.write().unwrap();
        if *phase != RoundPhase::Betting {
            return Err(*phase);
        }
        *phase = RoundPhase::Rolling;

        let mut seq = self.round_seq.lock().unwrap();
        *seq += 1;
        let round = *seq;
        *self.current.write().unwrap() = Some(CurrentRound { round, side, stake });
        Ok(round)
    }

    /// Record the settled outcome and move ROLLING -> RESULT
    pub fn finish_roll(&self, last: LastRound) {
        *self.last_round.write().unwrap() = Some(last);
        *self.current.write().unwrap() = None;
        *self.phase.write().unwrap() = RoundPhase::Result;
    }

    /// Abandon the in-flight roll and reopen betting
    pub fn abort_roll(&self) {
        *self.current.write().unwrap() = None;
        *self.phase.write().unwrap() = RoundPhase::Betting;
    }

    /// Move RESULT -> BETTING; false if there is no result to clear
    pub fn clear_result(&self) -> bool {
        let mut phase = self.phase.write().unwrap();
        if *phase != RoundPhase::Result {
            return false;
        }
        *phase = RoundPhase::Betting;
        *self.last_round.write().unwrap() = None;
        true
    }

    pub fn reset_for_new_session(&self, balance: u64) {
        *self.phase.write().unwrap() = RoundPhase::Betting;
        *self.current.write().unwrap() = None;
        *self.last_round.write().unwrap() = None;
        *self.round_seq.lock().unwrap() = 0;
        let mut wallet = self.wallet.lock().unwrap();
        wallet.balance = balance;
        wallet.total_staked = 0;
        wallet.total_paid_out = 0;
        wallet.rounds_settled = 0;
        drop(wallet);
        self.events.lock().unwrap().clear();
        self.balance_history.lock().unwrap().clear();
    }
}
