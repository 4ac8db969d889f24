use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::types::{GameConfig, Side};

/// HTTP client for the casino backend. The upstream is unauthenticated and
/// loosely typed: numbers arrive as numbers or strings, booleans sometimes
/// as "true"/"false", so every response field is coerced, never trusted.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: String,
}

impl BackendClient {
    pub fn new(base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_settings(&self) -> Result<AdminSettings> {
        let url = format!("{}/admin/settings", self.base);
        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("settings fetch failed: {status} {body}");
        }

        let settings: AdminSettings = serde_json::from_str(&body)?;
        Ok(settings)
    }

    /// Two-step player lookup: resolve the internal id by telegram id,
    /// then fetch the full record for the balance.
    pub async fn fetch_player(&self, telegram_id: i64) -> Result<PlayerSnapshot> {
        let url = format!("{}/admin/by-telegram/{telegram_id}", self.base);
        let by_telegram: PlayerRecord = self.get_json(&url).await?;
        let id = by_telegram
            .id()
            .ok_or_else(|| anyhow::anyhow!("player record for {telegram_id} has no id"))?;

        let url = format!("{}/admin/users/{id}", self.base);
        let record: PlayerRecord = self.get_json(&url).await?;
        Ok(record.into_snapshot(id))
    }

    /// Delegate a round to the backend. The response is authoritative
    /// for win/lose, payout, and the new balance.
    pub async fn play(&self, request: &PlayRequest) -> Result<PlayResponse> {
        let url = format!("{}/game/high-low/play", self.base);
        let resp = self.http.post(&url).json(request).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("play delegation failed: {status} {body}");
        }

        let play: PlayResponse = serde_json::from_str(&body)?;
        Ok(play)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("GET {url} failed: {status} {body}");
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Game settings as the admin backend serves them
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub win_ratio: Option<Value>,
    pub min_bet: Option<Value>,
    pub max_bet: Option<Value>,
    pub payout_multiplier: Option<Value>,
    pub is_top_up_open: Option<Value>,
}

impl AdminSettings {
    /// Decode the blob field by field, falling back to the same defaults the
    /// admin dashboard assumes when a value is missing or garbled.
    pub fn into_game_config(self) -> GameConfig {
        GameConfig {
            min_bet: self.min_bet.as_ref().and_then(coerce_units).unwrap_or(500),
            max_bet: self.max_bet.as_ref().and_then(coerce_units).unwrap_or(100_000),
            payout_multiplier: self
                .payout_multiplier
                .as_ref()
                .and_then(coerce_decimal)
                .unwrap_or_else(|| Decimal::new(18, 1)),
            win_ratio: self
                .win_ratio
                .as_ref()
                .and_then(coerce_units)
                .map(|w| w.min(100) as u8)
                .unwrap_or(40),
            top_up_open: self
                .is_top_up_open
                .as_ref()
                .and_then(coerce_bool)
                .unwrap_or(false),
        }
    }
}

/// Player row from either admin lookup endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerRecord {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub balance: Option<Value>,
}

impl PlayerRecord {
    pub fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn balance_units(&self) -> u64 {
        self.balance.as_ref().and_then(coerce_units).unwrap_or(0)
    }

    /// Fold the record into a snapshot once the backend id is resolved
    pub fn into_snapshot(self, id: String) -> PlayerSnapshot {
        let balance = self.balance_units();
        PlayerSnapshot {
            id,
            name: self.name,
            balance,
        }
    }
}

/// Resolved player identity and bankroll for a live session
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: Option<String>,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub telegram_id: i64,
    pub amount: u64,
    pub choice: Side,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    pub result_num: Option<Value>,
    pub new_balance: Option<Value>,
    pub is_win: Option<Value>,
    pub payout: Option<Value>,
}

impl PlayResponse {
    /// Raw 0-99 settlement number
    pub fn result(&self) -> u8 {
        self.result_num
            .as_ref()
            .and_then(coerce_units)
            .map(|n| n.min(99) as u8)
            .unwrap_or(0)
    }

    /// Which half the settlement number landed in (50 and up is HIGH)
    pub fn landed(&self) -> Side {
        if self.result() >= 50 {
            Side::High
        } else {
            Side::Low
        }
    }

    pub fn won(&self) -> bool {
        self.is_win.as_ref().and_then(coerce_bool).unwrap_or(false)
    }

    pub fn payout_units(&self) -> u64 {
        self.payout.as_ref().and_then(coerce_units).unwrap_or(0)
    }

    /// Authoritative balance after the round, absent if the backend
    /// omitted it (the round is then treated as unsettled)
    pub fn balance_units(&self) -> Option<u64> {
        self.new_balance.as_ref().and_then(coerce_units)
    }
}

/// Coerce a number-or-string JSON value to whole currency units, half-up
pub(crate) fn coerce_units(v: &Value) -> Option<u64> {
    coerce_decimal(v)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
}

pub(crate) fn coerce_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

pub(crate) fn coerce_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}
