use thiserror::Error;

use crate::agents::{Firm, Fund, Household};
use crate::inventory::Inventory;
use crate::ledger::Ledger;
use crate::types::{Cash, GoodId, Quantity};
use crate::world::Economy;

/// Relative tolerance for ledger audits and balance identities.
pub const AUDIT_TOLERANCE: f64 = 1e-9;

// === INVARIANTS ===

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("{owner} holds {quantity} of good {good}")]
    NegativeInventory {
        owner: String,
        good: GoodId,
        quantity: Quantity,
    },
    #[error("{owner} has negative loan balance {balance}")]
    NegativeLoan { owner: String, balance: Cash },
    #[error("{owner} ledger drifted by {drift} from its audit totals")]
    LedgerDrift { owner: String, drift: Cash },
    #[error("{owner} equity {equity} != assets {assets} - liabilities {liabilities}")]
    AssetIdentity {
        owner: String,
        assets: Cash,
        liabilities: Cash,
        equity: Cash,
    },
}

fn scale(ledger: &Ledger) -> f64 {
    1.0_f64
        .max(ledger.opening().abs())
        .max(ledger.total_debited().abs())
        .max(ledger.total_credited().abs())
}

fn check_ledger(owner: &str, ledger: &Ledger) -> Result<(), InvariantViolation> {
    let drift = ledger.drift();
    if drift.abs() > AUDIT_TOLERANCE * scale(ledger) {
        return Err(InvariantViolation::LedgerDrift {
            owner: owner.to_string(),
            drift,
        });
    }
    Ok(())
}

fn check_inventory(owner: &str, inventory: &Inventory) -> Result<(), InvariantViolation> {
    if let Some((good, quantity)) = inventory.find_negative() {
        return Err(InvariantViolation::NegativeInventory {
            owner: owner.to_string(),
            good,
            quantity,
        });
    }
    Ok(())
}

fn check_identity(
    owner: &str,
    assets: Cash,
    liabilities: Cash,
    equity: Cash,
    expected_equity: Cash,
) -> Result<(), InvariantViolation> {
    let tolerance = AUDIT_TOLERANCE * 1.0_f64.max(assets.abs()).max(liabilities.abs());
    if (equity - expected_equity).abs() > tolerance {
        return Err(InvariantViolation::AssetIdentity {
            owner: owner.to_string(),
            assets,
            liabilities,
            equity,
        });
    }
    Ok(())
}

pub fn check_firm(firm: &Firm) -> Result<(), InvariantViolation> {
    let owner = format!("firm {:?}", firm.id);
    check_inventory(&owner, firm.inventory())?;
    if firm.loans_to_pay() < 0.0 {
        return Err(InvariantViolation::NegativeLoan {
            owner,
            balance: firm.loans_to_pay(),
        });
    }
    check_ledger(&owner, firm.ledger())?;
    // Firm equity is reported gross of its loan.
    check_identity(
        &owner,
        firm.total_assets(),
        firm.total_liabilities(),
        firm.equity(),
        firm.total_assets(),
    )
}

pub fn check_household<F: Fund + ?Sized>(
    household: &Household,
    fund: &F,
) -> Result<(), InvariantViolation> {
    let owner = format!("household {:?}", household.id);
    check_inventory(&owner, household.inventory())?;
    check_ledger(&owner, household.ledger())?;
    let assets = household.total_assets(fund);
    let liabilities = household.total_liabilities();
    check_identity(
        &owner,
        assets,
        liabilities,
        household.equity(fund),
        assets - liabilities,
    )
}

/// Check every agent and the fund. Stops at the first violation.
pub fn check_economy(economy: &Economy) -> Result<(), InvariantViolation> {
    for firm in economy.firms.values() {
        check_firm(firm)?;
    }
    for household in economy.households.values() {
        check_household(household, &economy.fund)?;
    }
    check_ledger("fund", economy.fund.ledger())
}

// === STOCK-FLOW ===

/// Economy-wide stocks captured at a cycle boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EconomySnapshot {
    pub cycle: u64,
    pub firm_cash: Cash,
    pub household_cash: Cash,
    pub fund_assets: Cash,
    pub loans_outstanding: Cash,
    pub dividends_declared: Cash,
    pub firm_goods: Quantity,
    pub household_goods: Quantity,
    /// Cumulative ledger inflows across every agent and the fund.
    pub debited: Cash,
    /// Cumulative ledger outflows across every agent and the fund.
    pub credited: Cash,
}

impl EconomySnapshot {
    pub fn total_cash(&self) -> Cash {
        self.firm_cash + self.household_cash + self.fund_assets
    }
}

/// One cycle's stock-flow decomposition.
///
/// Fund contributions and withdrawals move cash between two ledgers inside
/// the economy, so they show up on both sides of `debited`/`credited`. The
/// net of the two is the cash that entered from loans, wages, sales and
/// left through repayments, dividends and purchases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleFlow {
    pub cycle: u64,
    pub cash_before: Cash,
    pub cash_after: Cash,
    pub cash_delta: Cash,
    pub inflow: Cash,
    pub outflow: Cash,
    /// `cash_delta - (inflow - outflow)`; zero up to rounding.
    pub residual: Cash,
    pub loans_delta: Cash,
    pub firm_goods_delta: Quantity,
    pub household_goods_delta: Quantity,
}

/// Capture the current economy-wide snapshot.
pub fn capture_snapshot(economy: &Economy) -> EconomySnapshot {
    let mut snapshot = EconomySnapshot {
        cycle: economy.cycle,
        fund_assets: economy.fund.total_assets(),
        debited: economy.fund.ledger().total_debited(),
        credited: economy.fund.ledger().total_credited(),
        ..Default::default()
    };

    for firm in economy.firms.values() {
        snapshot.firm_cash += firm.cash();
        snapshot.loans_outstanding += firm.loans_to_pay();
        snapshot.dividends_declared += firm.dividend_to_pay();
        snapshot.firm_goods += firm.inventory().total();
        snapshot.debited += firm.ledger().total_debited();
        snapshot.credited += firm.ledger().total_credited();
    }
    for household in economy.households.values() {
        snapshot.household_cash += household.cash();
        snapshot.household_goods += household.inventory().total();
        snapshot.debited += household.ledger().total_debited();
        snapshot.credited += household.ledger().total_credited();
    }

    snapshot
}

/// Decompose the change between two boundary snapshots.
pub fn decompose_cycle_flow(before: &EconomySnapshot, after: &EconomySnapshot) -> CycleFlow {
    let cash_before = before.total_cash();
    let cash_after = after.total_cash();
    let cash_delta = cash_after - cash_before;
    let inflow = after.debited - before.debited;
    let outflow = after.credited - before.credited;

    CycleFlow {
        cycle: after.cycle,
        cash_before,
        cash_after,
        cash_delta,
        inflow,
        outflow,
        residual: cash_delta - (inflow - outflow),
        loans_delta: after.loans_outstanding - before.loans_outstanding,
        firm_goods_delta: after.firm_goods - before.firm_goods,
        household_goods_delta: after.household_goods - before.household_goods,
    }
}
