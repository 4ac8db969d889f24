use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which half of the 1-12 total the player backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Low,  // totals 1..=6
    High, // totals 7..=12
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Low => Side::High,
            Side::High => Side::Low,
        }
    }

    /// Parse a raw string into a side.
    /// Formats: "low"/"l", "high"/"h" (any case)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Some(Self::Low),
            "high" | "h" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Low => write!(f, "LOW"),
            Side::High => write!(f, "HIGH"),
        }
    }
}

/// Where the table is in the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Betting,
    Rolling,
    Result,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundPhase::Betting => write!(f, "betting"),
            RoundPhase::Rolling => write!(f, "rolling"),
            RoundPhase::Result => write!(f, "result"),
        }
    }
}

/// House rules for a table session. Amounts are integer MMK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub min_bet: u64,
    pub max_bet: u64,
    pub payout_multiplier: Decimal,
    pub win_ratio: u8, // 0..=100, percent chance the round resolves for the player
    pub top_up_open: bool,
}

impl GameConfig {
    /// Stake must clear the table limits and the player's balance
    /// before a round is allowed to start.
    pub fn validate_stake(&self, stake: u64, balance: u64) -> Result<(), BetError> {
        if stake < self.min_bet {
            return Err(BetError::BelowMinimum { min: self.min_bet });
        }
        if stake > self.max_bet {
            return Err(BetError::AboveMaximum { max: self.max_bet });
        }
        if stake > balance {
            return Err(BetError::InsufficientBalance { balance });
        }
        Ok(())
    }
}

/// Stake rejections, raised before any round state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BetError {
    #[error("stake below table minimum of {min}")]
    BelowMinimum { min: u64 },

    #[error("stake above table maximum of {max}")]
    AboveMaximum { max: u64 },

    #[error("stake exceeds balance of {balance}")]
    InsufficientBalance { balance: u64 },
}

/// What a settled round produced.
/// Locally settled rounds carry the 1-12 total plus the two die faces;
/// server-settled rounds carry the raw 0-99 result number and no faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    pub is_win: bool,
    pub total: u8,
    pub faces: Option<(u8, u8)>, // (1, 0) marks the blank-face presentation of total 1
    pub payout: u64,
}

/// The most recent settled round, held for display until reset
#[derive(Debug, Clone, Serialize)]
pub struct LastRound {
    pub round: u64,
    pub side: Side,
    pub stake: u64,
    pub outcome: RoundOutcome,
    pub simulated: bool,
    pub settled_at: String,
}

/// Console command for driving the table from stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play { side: Side, stake: u64 },
    Reset,
    Balance,
    Quit,
}

impl Command {
    /// Parse a console line.
    /// Formats: "low 500" / "h 1000", "reset", "balance", "quit"
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        match s.to_ascii_lowercase().as_str() {
            "reset" | "r" => return Some(Self::Reset),
            "balance" | "bal" => return Some(Self::Balance),
            "quit" | "q" | "exit" => return Some(Self::Quit),
            _ => {}
        }
        let mut parts = s.split_whitespace();
        let side = Side::parse(parts.next()?)?;
        let stake: u64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::Play { side, stake })
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Play { side, stake } => write!(f, "{} {stake}", side),
            Self::Reset => write!(f, "reset"),
            Self::Balance => write!(f, "balance"),
            Self::Quit => write!(f, "quit"),
        }
    }
}
