use std::sync::{Arc, Mutex};

/// Session bankroll in whole MMK
#[derive(Debug, Clone)]
pub struct WalletInner {
    pub balance: u64,
    pub total_staked: u64,
    pub total_paid_out: u64,
    pub rounds_settled: u64,
}

impl WalletInner {
    /// Optimistic debit the moment a round starts rolling
    pub fn debit_stake(&mut self, stake: u64) {
        self.balance = self.balance.saturating_sub(stake);
        self.total_staked = self.total_staked.saturating_add(stake);
    }

    /// Undo a debit for a round that never settled
    pub fn refund_stake(&mut self, stake: u64) {
        self.balance = self.balance.saturating_add(stake);
        self.total_staked = self.total_staked.saturating_sub(stake);
    }

    /// Record a locally settled round: credit the payout (zero on a loss)
    pub fn settle_local(&mut self, payout: u64) {
        self.balance = self.balance.saturating_add(payout);
        self.total_paid_out = self.total_paid_out.saturating_add(payout);
        self.rounds_settled += 1;
    }

    /// Record a server-settled round — the backend balance is authoritative
    pub fn settle_remote(&mut self, new_balance: u64, payout: u64) {
        self.balance = new_balance;
        self.total_paid_out = self.total_paid_out.saturating_add(payout);
        self.rounds_settled += 1;
    }

    /// Authoritative balance pull outside a round
    pub fn set_balance(&mut self, balance: u64) {
        self.balance = balance;
    }

    pub fn summary(&self) -> String {
        format!(
            "balance={} staked={} paid_out={} rounds={}",
            self.balance, self.total_staked, self.total_paid_out, self.rounds_settled
        )
    }
}

/// Thread-safe bankroll shared between the table loop and spawned settle tasks
pub type Wallet = Arc<Mutex<WalletInner>>;

pub fn new_wallet(starting_balance: u64) -> Wallet {
    Arc::new(Mutex::new(WalletInner {
        balance: starting_balance,
        total_staked: 0,
        total_paid_out: 0,
        rounds_settled: 0,
    }))
}
