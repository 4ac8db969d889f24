use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use url::Url;

use crate::types::GameConfig;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SavedSettings {
    pub backend_http: Option<String>,
    pub telegram_id: Option<i64>,
    pub local_sim: Option<bool>,
    pub roll_delay_ms: Option<u64>,
    pub balance_sync_secs: Option<u64>,
    pub starting_balance: Option<u64>,
    pub min_bet: Option<u64>,
    pub max_bet: Option<u64>,
    pub payout_multiplier: Option<String>,
    pub win_ratio: Option<u8>,
}

impl SavedSettings {
    pub fn load() -> Self {
        let path = Path::new(SETTINGS_FILE);
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => {
                    match serde_json::from_str(&contents) {
                        Ok(s) => return s,
                        Err(e) => tracing::warn!("failed to parse {SETTINGS_FILE}: {e}"),
                    }
                }
                Err(e) => tracing::warn!("failed to read {SETTINGS_FILE}: {e}"),
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(SETTINGS_FILE, json) {
                    tracing::warn!("failed to write {SETTINGS_FILE}: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to serialize settings: {e}"),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            backend_http: Some(config.backend_http.clone()),
            telegram_id: Some(config.telegram_id).filter(|id| *id != 0),
            local_sim: Some(config.local_sim),
            roll_delay_ms: Some(config.roll_delay_ms),
            balance_sync_secs: Some(config.balance_sync_secs),
            starting_balance: Some(config.starting_balance),
            min_bet: Some(config.min_bet),
            max_bet: Some(config.max_bet),
            payout_multiplier: Some(config.payout_multiplier.to_string()),
            win_ratio: Some(config.win_ratio),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub backend_http: String,
    pub telegram_id: i64,
    pub local_sim: bool,

    pub roll_delay_ms: u64,
    pub balance_sync_secs: u64,
    pub starting_balance: u64,

    pub min_bet: u64,
    pub max_bet: u64,
    pub payout_multiplier: Decimal,
    pub win_ratio: u8,

    pub console: bool,
    pub log_level: String,
    pub http_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let saved = SavedSettings::load();

        let backend_raw = saved.backend_http
            .unwrap_or_else(|| env_or("BACKEND_HTTP", "http://localhost:8080"));
        let backend_url = Url::parse(&backend_raw)
            .with_context(|| format!("invalid BACKEND_HTTP url: {backend_raw}"))?;
        let backend_http = backend_url.to_string().trim_end_matches('/').to_string();

        Ok(Self {
            backend_http,
            telegram_id: saved.telegram_id
                .unwrap_or_else(|| env_or("TELEGRAM_ID", "0").parse().unwrap_or(0)),
            local_sim: saved.local_sim
                .unwrap_or_else(|| env_or("LOCAL_SIM", "true").parse().unwrap_or(true)),

            roll_delay_ms: saved.roll_delay_ms
                .unwrap_or_else(|| env_or("ROLL_DELAY_MS", "1800").parse().unwrap_or(1800)),
            balance_sync_secs: saved.balance_sync_secs
                .unwrap_or_else(|| env_or("BALANCE_SYNC_SECS", "30").parse().unwrap_or(30)),
            starting_balance: saved.starting_balance
                .unwrap_or_else(|| env_or("STARTING_BALANCE", "50000").parse().unwrap_or(50000)),

            min_bet: saved.min_bet
                .unwrap_or_else(|| env_or("MIN_BET", "500").parse().unwrap_or(500)),
            max_bet: saved.max_bet
                .unwrap_or_else(|| env_or("MAX_BET", "100000").parse().unwrap_or(100_000)),
            payout_multiplier: decimal_env_or_saved(
                "PAYOUT_MULTIPLIER", "1.9", saved.payout_multiplier.as_deref())?,
            win_ratio: saved.win_ratio
                .unwrap_or_else(|| env_or("WIN_RATIO", "45").parse().unwrap_or(45))
                .min(100),

            console: env_or("CONSOLE", "false").parse().unwrap_or(false),
            log_level: env_or("LOG_LEVEL", "info"),

            http_port: env_or("HTTP_PORT", "3000").parse()?,
        })
    }

    pub fn persist(&self) {
        SavedSettings::from_config(self).save();
    }

    /// Table rules used when no backend settings are loaded:
    /// local sessions, and simulation before any session is open.
    pub fn house_defaults(&self) -> GameConfig {
        GameConfig {
            min_bet: self.min_bet,
            max_bet: self.max_bet,
            payout_multiplier: self.payout_multiplier,
            win_ratio: self.win_ratio,
            top_up_open: false,
        }
    }

    pub fn has_player(&self) -> bool {
        self.telegram_id != 0
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn decimal_env(key: &str, default: &str) -> Result<Decimal> {
    let raw = env_or(key, default);
    Decimal::from_str(&raw).with_context(|| format!("invalid decimal for {key}: {raw}"))
}

fn decimal_env_or_saved(key: &str, default: &str, saved: Option<&str>) -> Result<Decimal> {
    if let Some(s) = saved {
        if let Ok(d) = Decimal::from_str(s) {
            return Ok(d);
        }
    }
    decimal_env(key, default)
}
