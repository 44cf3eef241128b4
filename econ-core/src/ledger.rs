// Cash ledger owned by exactly one agent

use serde::{Deserialize, Serialize};

use crate::types::Cash;

/// Cash balance with the only two primitives allowed to change it.
///
/// Sign convention: `debit` adds to cash (inflows, loan draw-downs) and
/// `credit` subtracts from cash (outflows, repayments). Amounts are not
/// validated; any real number including zero and negatives is accepted.
///
/// Alongside the balance the ledger keeps cumulative debit and credit totals
/// so conservation can be audited: `cash == opening + debited - credited`
/// up to floating-point rounding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    cash: Cash,
    opening: Cash,
    debited: Cash,
    credited: Cash,
}

impl Ledger {
    pub fn new(opening: Cash) -> Self {
        Self {
            cash: opening,
            opening,
            debited: 0.0,
            credited: 0.0,
        }
    }

    /// cash += amount
    pub fn debit(&mut self, amount: Cash) {
        self.cash += amount;
        self.debited += amount;
    }

    /// cash -= amount
    pub fn credit(&mut self, amount: Cash) {
        self.cash -= amount;
        self.credited += amount;
    }

    pub fn cash(&self) -> Cash {
        self.cash
    }

    pub fn opening(&self) -> Cash {
        self.opening
    }

    pub fn total_debited(&self) -> Cash {
        self.debited
    }

    pub fn total_credited(&self) -> Cash {
        self.credited
    }

    /// Difference between the running balance and the balance implied by the
    /// audit totals. Zero up to rounding unless the balance was mutated
    /// outside `debit`/`credit`.
    pub fn drift(&self) -> Cash {
        self.cash - (self.opening + self.debited - self.credited)
    }
}
