/// Tests for bankroll accounting — debits, refunds, payouts, and
/// authoritative balance syncs.
use crate::wallet::{new_wallet, WalletInner};

fn wallet(balance: u64) -> WalletInner {
    WalletInner {
        balance,
        total_staked: 0,
        total_paid_out: 0,
        rounds_settled: 0,
    }
}

// ── debits and refunds ────────────────────────────────────────────────────

#[test]
fn debit_moves_the_stake_out_of_the_balance() {
    let mut w = wallet(50_000);
    w.debit_stake(1_000);
    assert_eq!(w.balance, 49_000);
    assert_eq!(w.total_staked, 1_000);
    assert_eq!(w.rounds_settled, 0);
}

#[test]
fn debit_saturates_at_zero() {
    let mut w = wallet(300);
    w.debit_stake(1_000);
    assert_eq!(w.balance, 0);
    assert_eq!(w.total_staked, 1_000);
}

#[test]
fn refund_undoes_a_debit() {
    let mut w = wallet(50_000);
    w.debit_stake(2_000);
    w.refund_stake(2_000);
    assert_eq!(w.balance, 50_000);
    assert_eq!(w.total_staked, 0);
    assert_eq!(w.rounds_settled, 0);
}

// ── settlement ────────────────────────────────────────────────────────────

#[test]
fn local_win_credits_the_payout() {
    let mut w = wallet(50_000);
    w.debit_stake(1_000);
    w.settle_local(1_900);
    // 50000 - 1000 + 1900
    assert_eq!(w.balance, 50_900);
    assert_eq!(w.total_staked, 1_000);
    assert_eq!(w.total_paid_out, 1_900);
    assert_eq!(w.rounds_settled, 1);
}

#[test]
fn local_loss_credits_nothing() {
    let mut w = wallet(50_000);
    w.debit_stake(1_000);
    w.settle_local(0);
    assert_eq!(w.balance, 49_000);
    assert_eq!(w.total_paid_out, 0);
    assert_eq!(w.rounds_settled, 1);
}

#[test]
fn remote_settlement_takes_the_backend_balance_verbatim() {
    let mut w = wallet(50_000);
    w.debit_stake(1_000);
    // the backend reports a balance our local arithmetic would not produce
    w.settle_remote(51_234, 1_900);
    assert_eq!(w.balance, 51_234);
    assert_eq!(w.total_paid_out, 1_900);
    assert_eq!(w.rounds_settled, 1);
}

#[test]
fn set_balance_touches_nothing_else() {
    let mut w = wallet(50_000);
    w.debit_stake(500);
    w.set_balance(70_000);
    assert_eq!(w.balance, 70_000);
    assert_eq!(w.total_staked, 500);
    assert_eq!(w.rounds_settled, 0);
}

// ── saturation ────────────────────────────────────────────────────────────

#[test]
fn credits_saturate_at_the_u64_ceiling() {
    let mut w = wallet(u64::MAX - 100);
    w.settle_local(1_000);
    assert_eq!(w.balance, u64::MAX);

    w.refund_stake(1_000);
    assert_eq!(w.balance, u64::MAX);
}

#[test]
fn session_totals_saturate_at_the_u64_ceiling() {
    let mut w = wallet(0);
    w.total_staked = u64::MAX - 100;
    w.total_paid_out = u64::MAX - 100;

    w.debit_stake(1_000);
    assert_eq!(w.total_staked, u64::MAX);

    w.settle_local(1_000);
    assert_eq!(w.total_paid_out, u64::MAX);

    w.settle_remote(500, 1_000);
    assert_eq!(w.total_paid_out, u64::MAX);
    assert_eq!(w.balance, 500);
}

// ── reporting ─────────────────────────────────────────────────────────────

#[test]
fn summary_lists_the_session_counters() {
    let mut w = wallet(50_000);
    w.debit_stake(500);
    w.settle_local(950);
    let summary = w.summary();
    assert!(summary.contains("balance=50450"), "got {summary}");
    assert!(summary.contains("staked=500"), "got {summary}");
    assert!(summary.contains("paid_out=950"), "got {summary}");
    assert!(summary.contains("rounds=1"), "got {summary}");
}

#[test]
fn shared_wallet_starts_with_the_opening_balance() {
    let shared = new_wallet(25_000);
    let w = shared.lock().unwrap();
    assert_eq!(w.balance, 25_000);
    assert_eq!(w.total_staked, 0);
    assert_eq!(w.total_paid_out, 0);
    assert_eq!(w.rounds_settled, 0);
}
