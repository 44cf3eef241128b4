use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::types::Cash;

/// What a household needs from the fund it invests in. Same sign
/// convention as [`Ledger`]: `debit` adds, `credit` subtracts.
pub trait Fund {
    fn debit(&mut self, amount: Cash);
    fn credit(&mut self, amount: Cash);
    fn total_assets(&self) -> Cash;
}

/// Pooled-contribution fund holding nothing but cash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutualFund {
    ledger: Ledger,
}

impl MutualFund {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

impl Fund for MutualFund {
    fn debit(&mut self, amount: Cash) {
        self.ledger.debit(amount);
    }

    fn credit(&mut self, amount: Cash) {
        self.ledger.credit(amount);
    }

    fn total_assets(&self) -> Cash {
        self.ledger.cash()
    }
}
