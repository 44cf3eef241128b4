//! Cycle scheduler.
//!
//! The scheduler holds no agent state. It walks an [`Economy`] through
//! [`PHASES`] in order, feeding each phase the cycle's exogenous stimuli.
//! Reordering phases changes the economic outcome.

use serde::{Deserialize, Serialize};

use crate::market::{BuyerSettlingMarket, TwoSidedSettlingMarket};
use crate::scenario::{CycleStimuli, FirmStimulus, HouseholdStimulus, Scenario, ScenarioError};
use crate::types::CONSUMPTION_GOOD;
use crate::world::Economy;

// === PROTOCOL ===

/// When a firm sizes its dividend relative to repaying its loan.
///
/// In both orders the dividend is declared at end-of-cycle accounting, once
/// the cycle's liquidity target is posted, and paid at the start of the next
/// cycle. `DividendBeforeLoan` sizes it against pre-repayment cash, reserving
/// the loan liability with interest, and repays the loan next cycle.
/// `LoanBeforeDividend` repays the loan during accounting and sizes the
/// dividend against what is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SettlementOrder {
    #[default]
    DividendBeforeLoan,
    LoanBeforeDividend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    OfferGoods,
    ConsiderProduction,
    SettleObligations,
    Borrow,
    LabourMarket,
    Produce,
    GoodsMarket,
    Accounting,
    Flush,
}

/// Mandatory phase order of one cycle.
pub const PHASES: [Phase; 9] = [
    Phase::OfferGoods,
    Phase::ConsiderProduction,
    Phase::SettleObligations,
    Phase::Borrow,
    Phase::LabourMarket,
    Phase::Produce,
    Phase::GoodsMarket,
    Phase::Accounting,
    Phase::Flush,
];

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::OfferGoods => "offer_goods",
            Phase::ConsiderProduction => "consider_production",
            Phase::SettleObligations => "settle_obligations",
            Phase::Borrow => "borrow",
            Phase::LabourMarket => "labour_market",
            Phase::Produce => "produce",
            Phase::GoodsMarket => "goods_market",
            Phase::Accounting => "accounting",
            Phase::Flush => "flush",
        }
    }
}

// === FULL CYCLE ===

/// Advance the economy by one cycle.
pub fn run_cycle(economy: &mut Economy, stimuli: &CycleStimuli) {
    economy.cycle += 1;
    for phase in PHASES {
        #[cfg(feature = "instrument")]
        tracing::info!(target: "phase", cycle = economy.cycle, phase = phase.name());

        run_phase(economy, phase, stimuli);
    }
}

/// Run every cycle of a validated scenario, then settle what the last
/// cycle declared.
pub fn run_scenario(economy: &mut Economy, scenario: &Scenario) -> Result<(), ScenarioError> {
    scenario.validate()?;
    economy.settlement_order = scenario.settlement_order;
    for cycle in 0..scenario.cycles {
        run_cycle(economy, &scenario.stimuli(cycle));
    }
    settle_obligations(economy);
    Ok(())
}

pub fn run_phase(economy: &mut Economy, phase: Phase, stimuli: &CycleStimuli) {
    match phase {
        Phase::OfferGoods => {
            if let Some(s) = &stimuli.firm {
                offer_goods(economy, s);
            }
        }
        Phase::ConsiderProduction => {
            if let Some(s) = &stimuli.firm {
                consider_production(economy, s);
            }
        }
        Phase::SettleObligations => settle_obligations(economy),
        Phase::Borrow => {
            if let Some(s) = &stimuli.firm {
                borrow(economy, s);
            }
        }
        Phase::LabourMarket => {
            if let Some(s) = &stimuli.firm {
                clear_labour_markets(economy, s);
            }
            if let Some(s) = &stimuli.household {
                pay_household_wages(economy, s);
            }
        }
        Phase::Produce => {
            if stimuli.firm.is_some() {
                for firm in economy.firms.values_mut() {
                    firm.produce_goods();
                }
            }
        }
        Phase::GoodsMarket => {
            if let Some(s) = &stimuli.firm {
                clear_goods_markets(economy, s);
            }
            if let Some(s) = &stimuli.household {
                clear_consumer_market(economy, s);
            }
        }
        Phase::Accounting => accounting(economy, stimuli.firm.as_ref()),
        Phase::Flush => flush(economy, stimuli.firm.is_some()),
    }
}

// === PHASES ===

fn offer_goods(economy: &mut Economy, s: &FirmStimulus) {
    for firm in economy.firms.values_mut() {
        firm.set_selling_price(s.goods_price);
    }
}

fn consider_production(economy: &mut Economy, s: &FirmStimulus) {
    for firm in economy.firms.values_mut() {
        firm.set_target_production(s.target_production);
        firm.consider_production();
    }
}

/// Pay whatever loan and dividend are still outstanding from last cycle.
/// Never sizes a dividend: only accounting declares one.
pub fn settle_obligations(economy: &mut Economy) {
    for firm in economy.firms.values_mut() {
        firm.pay_loan();
        firm.pay_dividends();
    }
}

fn borrow(economy: &mut Economy, s: &FirmStimulus) {
    for firm in economy.firms.values_mut() {
        let principal = firm.commercial_loan_demand(s.wage);
        firm.give_loan(principal, s.loan_rate);
    }
}

fn clear_labour_markets(economy: &mut Economy, s: &FirmStimulus) {
    for (id, firm) in economy.firms.iter_mut() {
        let Some(market) = economy.labour_markets.get_mut(id) else {
            continue;
        };
        market.set_wage(s.wage);
        market.set_supply(s.labour_supply);
        market.process_trade(firm);
    }
}

/// Outside employer hires from every household at the scheduled wage.
fn pay_household_wages(economy: &mut Economy, s: &HouseholdStimulus) {
    for household in economy.households.values_mut() {
        let labour = s.labour_sold.min(household.labour_available()).max(0.0);
        household.employ(labour, s.wage);
    }
}

fn clear_goods_markets(economy: &mut Economy, s: &FirmStimulus) {
    for (id, firm) in economy.firms.iter_mut() {
        let Some(market) = economy.goods_markets.get_mut(id) else {
            continue;
        };
        market.set_demand(s.consumption_demand);
        market.process_trade(firm);
    }
}

/// Households buy from an outside seller in key order, each drawing down
/// what the previous ones left.
fn clear_consumer_market(economy: &mut Economy, s: &HouseholdStimulus) {
    let market = &mut economy.consumer_market;
    market.set_ask(CONSUMPTION_GOOD, s.goods_price);
    market.set_bid(CONSUMPTION_GOOD, s.goods_price);
    market.set_supply(CONSUMPTION_GOOD, s.goods_supply);

    for household in economy.households.values_mut() {
        let budget = household.compute_consumption_budget();
        let demand = if s.goods_price > 0.0 {
            budget / s.goods_price
        } else {
            0.0
        };
        market.set_demand(CONSUMPTION_GOOD, demand);
        let trade = market.process(CONSUMPTION_GOOD, household);
        let remaining = market.supply(CONSUMPTION_GOOD) - trade.quantity;
        market.set_supply(CONSUMPTION_GOOD, remaining.max(0.0));
    }
}

fn accounting(economy: &mut Economy, firm_stimulus: Option<&FirmStimulus>) {
    for household in economy.households.values_mut() {
        household.interact_with_fund(&mut economy.fund);
    }

    let Some(s) = firm_stimulus else {
        return;
    };
    let order = economy.settlement_order;
    for firm in economy.firms.values_mut() {
        firm.set_liquidity_target(s.liquidity_target);
        if order == SettlementOrder::LoanBeforeDividend {
            firm.pay_loan();
        }
        firm.compute_intended_dividend();
    }
}

/// Firms that sat the cycle out keep their stock.
fn flush(economy: &mut Economy, firms_active: bool) {
    if firms_active {
        for firm in economy.firms.values_mut() {
            firm.flush();
        }
    }
    for household in economy.households.values_mut() {
        household.flush();
    }
    for market in economy.goods_markets.values_mut() {
        market.clear();
    }
    for market in economy.labour_markets.values_mut() {
        market.clear();
    }
    economy.consumer_market.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Firm, Household, MutualFund};
    use crate::ledger::Ledger;
    use crate::scenario::{FirmSchedule, HouseholdSchedule};

    #[test]
    fn phases_follow_the_cycle_protocol() {
        assert_eq!(PHASES.len(), 9);
        assert_eq!(PHASES[0], Phase::OfferGoods);
        assert_eq!(PHASES[2], Phase::SettleObligations);
        assert_eq!(PHASES[4], Phase::LabourMarket);
        assert_eq!(PHASES[6], Phase::GoodsMarket);
        assert_eq!(PHASES[8], Phase::Flush);
    }

    #[test]
    fn cycle_counter_advances() {
        let mut economy = Economy::default();
        run_cycle(&mut economy, &CycleStimuli::default());
        run_cycle(&mut economy, &CycleStimuli::default());
        assert_eq!(economy.cycle, 2);
    }

    #[test]
    fn dividend_declared_in_accounting_is_paid_next_cycle() {
        let mut economy = Economy::default();
        let id = economy.add_firm(Firm::new(Ledger::new(10.0)));
        let stimuli = CycleStimuli {
            firm: FirmSchedule::reference().at(0),
            household: None,
        };

        run_cycle(&mut economy, &stimuli);
        let declared = economy.get_firm(id).map(Firm::dividend_to_pay).unwrap();
        assert!(declared > 0.0);

        economy.settle_obligations();
        let firm = economy.get_firm(id).unwrap();
        assert_eq!(firm.dividend_to_pay(), 0.0);
        assert_eq!(firm.loans_to_pay(), 0.0);
    }

    #[test]
    fn loan_first_order_repays_in_cycle_then_declares() {
        let mut economy =
            Economy::default().with_settlement_order(SettlementOrder::LoanBeforeDividend);
        let id = economy.add_firm(Firm::new(Ledger::new(10.0)));
        let stimuli = CycleStimuli {
            firm: FirmSchedule::reference().at(0),
            household: None,
        };

        run_cycle(&mut economy, &stimuli);
        let firm = economy.get_firm(id).unwrap();
        assert_eq!(firm.loans_to_pay(), 0.0);
        // 10 - wage bill 1, less the liquidity target 1.
        assert_eq!(firm.dividend_to_pay(), 8.0);
        assert_eq!(firm.cash(), 9.0);
    }

    #[test]
    fn first_settlement_pays_nothing_undeclared() {
        for order in [SettlementOrder::DividendBeforeLoan, SettlementOrder::LoanBeforeDividend] {
            let mut economy = Economy::default().with_settlement_order(order);
            let id = economy.add_firm(Firm::new(Ledger::new(0.5)).with_goods_owned(1.0));
            let stimuli = CycleStimuli {
                firm: FirmSchedule::reference().at(0),
                household: None,
            };

            for phase in &PHASES[..4] {
                run_phase(&mut economy, *phase, &stimuli);
            }

            let firm = economy.get_firm(id).unwrap();
            assert_eq!(firm.loans_to_pay(), 0.5, "{order:?}");
            assert_eq!(firm.cash(), 1.0, "{order:?}");
        }
    }

    #[test]
    fn idle_firm_keeps_its_stock() {
        let mut economy = Economy::default();
        let id = economy.add_firm(Firm::new(Ledger::new(2.0)).with_goods_owned(3.0));

        run_cycle(&mut economy, &CycleStimuli::default());

        let firm = economy.get_firm(id).unwrap();
        assert_eq!(firm.goods_owned(), 3.0);
        assert_eq!(firm.cash(), 2.0);
    }

    #[test]
    fn households_share_the_outside_supply() {
        let mut economy = Economy::new(MutualFund::default());
        let a = economy.add_household(Household::new(Ledger::new(100.0), 1.0));
        let b = economy.add_household(Household::new(Ledger::new(100.0), 1.0));
        let stimuli = CycleStimuli {
            firm: None,
            household: HouseholdSchedule::reference().at(3),
        };

        run_phase(&mut economy, Phase::GoodsMarket, &stimuli);

        let bought_a = economy.get_household(a).map(|h| h.goods(CONSUMPTION_GOOD));
        let bought_b = economy.get_household(b).map(|h| h.goods(CONSUMPTION_GOOD));
        assert_eq!(bought_a, Some(15.0));
        assert_eq!(bought_b, Some(0.0));
    }

    #[test]
    fn overdrawn_household_buys_nothing() {
        let mut economy = Economy::new(MutualFund::default());
        let h = economy.add_household(Household::new(Ledger::new(-20.0), 1.0));
        let stimuli = CycleStimuli {
            firm: None,
            household: HouseholdSchedule::reference().at(0),
        };

        run_phase(&mut economy, Phase::GoodsMarket, &stimuli);

        let household = economy.get_household(h).unwrap();
        assert_eq!(household.goods(CONSUMPTION_GOOD), 0.0);
        assert_eq!(household.cash(), -20.0);
    }

    #[test]
    fn flush_restores_labour_and_clears_markets() {
        let mut economy = Economy::new(MutualFund::default());
        let h = economy.add_household(Household::new(Ledger::new(0.0), 1.0));
        let stimuli = CycleStimuli {
            firm: None,
            household: HouseholdSchedule::reference().at(0),
        };

        run_phase(&mut economy, Phase::LabourMarket, &stimuli);
        assert_eq!(economy.get_household(h).map(Household::labour_available), Some(0.5));

        run_phase(&mut economy, Phase::GoodsMarket, &stimuli);
        run_phase(&mut economy, Phase::Flush, &stimuli);
        assert_eq!(economy.get_household(h).map(Household::labour_available), Some(1.0));
        assert_eq!(economy.consumer_market.supply(CONSUMPTION_GOOD), 0.0);
    }
}
