use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::types::{GameConfig, RoundOutcome, Side};

/// Settle one round. The win/lose decision is drawn first; the dice total is
/// then drawn from whichever band (1-6 or 7-12) agrees with that decision, so
/// the visible total never contradicts the result.
pub fn settle<R: Rng + ?Sized>(
    side: Side,
    stake: u64,
    config: &GameConfig,
    rng: &mut R,
) -> RoundOutcome {
    let chance: u8 = rng.gen_range(0..100);
    let is_win = chance < config.win_ratio;

    let landed = if is_win { side } else { side.other() };
    let total: u8 = match landed {
        Side::High => rng.gen_range(7..=12),
        Side::Low => rng.gen_range(1..=6),
    };

    let payout = if is_win {
        payout_amount(stake, config.payout_multiplier)
    } else {
        0
    };

    RoundOutcome {
        is_win,
        total,
        faces: Some(split_faces(total)),
        payout,
    }
}

/// Split a 1-12 total into two presentable die faces.
/// Total 1 renders as one live die and one blank: (1, 0).
pub(crate) fn split_faces(total: u8) -> (u8, u8) {
    if total == 1 {
        return (1, 0);
    }
    let mut face1 = (total / 2).clamp(1, 6);
    let mut face2 = total - face1;
    if face2 > 6 {
        face1 += face2 - 6;
        face2 = 6;
    }
    (face1, face2)
}

/// Winning payout in whole MMK: stake x multiplier, midpoints rounded up.
pub(crate) fn payout_amount(stake: u64, multiplier: Decimal) -> u64 {
    let gross = Decimal::from(stake) * multiplier;
    gross
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0)
}

/// Accounting from a batch of simulated rounds
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub rounds: u64,
    pub wins: u64,
    pub total_staked: u64,
    pub total_paid_out: u64,
    pub win_rate: Decimal,
    pub rtp: Decimal,
}

/// Run `rounds` settlements with a fixed side and stake, wallet untouched.
/// Used by the ops surface to sanity-check a win ratio / multiplier pair.
pub fn simulate<R: Rng + ?Sized>(
    side: Side,
    stake: u64,
    rounds: u64,
    config: &GameConfig,
    rng: &mut R,
) -> SimReport {
    let mut wins = 0u64;
    let mut paid = 0u64;
    for _ in 0..rounds {
        let outcome = settle(side, stake, config, rng);
        if outcome.is_win {
            wins += 1;
            paid = paid.saturating_add(outcome.payout);
        }
    }

    let staked = stake.saturating_mul(rounds);
    let (win_rate, rtp) = if rounds == 0 || staked == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            (Decimal::from(wins) / Decimal::from(rounds)).round_dp(4),
            (Decimal::from(paid) / Decimal::from(staked)).round_dp(4),
        )
    };

    SimReport {
        rounds,
        wins,
        total_staked: staked,
        total_paid_out: paid,
        win_rate,
        rtp,
    }
}
