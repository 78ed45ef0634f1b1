#![allow(dead_code)]

use payintel_core::loader::{
    SUBSCRIPTIONS, SUBSCRIPTION_COLUMNS, TRANSACTIONS, TRANSACTION_COLUMNS, USERS, USER_COLUMNS,
};
use payintel_core::{AnalyticsEngine, RawTable, TableSet};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds the three raw snapshot tables row by row.
pub struct Fixture {
    pub users:         RawTable,
    pub subscriptions: RawTable,
    pub transactions:  RawTable,
    next_tx:           usize,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            users:         RawTable::new(USER_COLUMNS),
            subscriptions: RawTable::new(SUBSCRIPTION_COLUMNS),
            transactions:  RawTable::new(TRANSACTION_COLUMNS),
            next_tx:       0,
        }
    }

    pub fn user(mut self, user_id: &str, country: &str, signup_date: &str) -> Self {
        self.users.push_row([user_id, country, signup_date, "false"]);
        self
    }

    pub fn sub(mut self, sub_id: &str, user_id: &str, mrr: &str, status: &str, start_date: &str) -> Self {
        self.subscriptions
            .push_row([sub_id, user_id, "Pro", mrr, status, start_date]);
        self
    }

    /// `n` transactions of 10.00 each. `outcome` is a status, optionally
    /// followed by `:error_code`. An empty country is stored as null.
    pub fn txs(
        mut self,
        n: usize,
        sub_id: &str,
        gateway: &str,
        country: &str,
        tx_date: &str,
        outcome: &str,
    ) -> Self {
        let (status, error_code) = outcome.split_once(':').unwrap_or((outcome, ""));
        for _ in 0..n {
            let tx_id = self.next_tx_id();
            self.transactions.push_row([
                tx_id.as_str(),
                sub_id,
                gateway,
                "USD",
                status,
                error_code,
                tx_date,
                "10.00",
                country,
            ]);
        }
        self
    }

    /// One successful Stripe/US payment of `amount`.
    pub fn paid(mut self, sub_id: &str, tx_date: &str, amount: &str) -> Self {
        let tx_id = self.next_tx_id();
        self.transactions.push_row([
            tx_id.as_str(),
            sub_id,
            "Stripe",
            "USD",
            "Success",
            "",
            tx_date,
            amount,
            "US",
        ]);
        self
    }

    fn next_tx_id(&mut self) -> String {
        self.next_tx += 1;
        format!("tx-{:05}", self.next_tx)
    }

    pub fn tables(&self) -> TableSet {
        TableSet::new()
            .with_table(USERS, self.users.clone())
            .with_table(SUBSCRIPTIONS, self.subscriptions.clone())
            .with_table(TRANSACTIONS, self.transactions.clone())
    }

    /// A test engine with this fixture loaded.
    pub fn engine(&self) -> AnalyticsEngine {
        init_logging();
        let mut engine = AnalyticsEngine::build_test();
        engine
            .load(&self.tables())
            .expect("fixture should load cleanly");
        engine
    }
}

/// One user, one subscription, one payment on `tx_date`.
pub fn minimal(tx_date: &str) -> Fixture {
    Fixture::new()
        .user("u1", "US", "2024-01-01")
        .sub("s1", "u1", "10.00", "Active", "2024-01-01")
        .paid("s1", tx_date, "10.00")
}
