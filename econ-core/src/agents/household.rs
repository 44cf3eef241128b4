use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;
use crate::ledger::Ledger;
use crate::market::GoodsBuyer;
use crate::types::{Cash, GoodId, HouseholdId, Price, Quantity};

use super::fund::Fund;

// === DECISION RULES ===

/// Threshold rule for moving cash between a household and its fund.
///
/// Above `ceiling` the household pulls the fund back down to `target`.
/// Otherwise it invests `invest_fraction` of its cash, never pushing the
/// fund past `ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundRule {
    pub ceiling: Cash,
    pub target: Cash,
    pub invest_fraction: f64,
}

impl Default for FundRule {
    fn default() -> Self {
        Self {
            ceiling: 160.0,
            target: 150.0,
            invest_fraction: 0.1,
        }
    }
}

/// Fixed propensity to consume out of cash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRule {
    pub propensity: f64,
}

impl Default for ConsumptionRule {
    fn default() -> Self {
        Self { propensity: 0.9 }
    }
}

/// Which branch of the fund rule executed, and how much moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FundDecision {
    Withdraw(Cash),
    Invest(Cash),
}

// === HOUSEHOLD ===

/// Labour seller and consumer. Invests in exactly one fund it does not own;
/// the fund is passed in by whoever does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    ledger: Ledger,
    inventory: Inventory,
    labour_endowment: Quantity,
    labour_available: Quantity,
    pub fund_rule: FundRule,
    pub consumption_rule: ConsumptionRule,
}

impl Household {
    pub fn new(ledger: Ledger, labour_endowment: Quantity) -> Self {
        Self {
            id: HouseholdId::default(),
            ledger,
            inventory: Inventory::new(),
            labour_endowment,
            labour_available: labour_endowment,
            fund_rule: FundRule::default(),
            consumption_rule: ConsumptionRule::default(),
        }
    }

    pub fn with_fund_rule(mut self, rule: FundRule) -> Self {
        self.fund_rule = rule;
        self
    }

    pub fn with_consumption_rule(mut self, rule: ConsumptionRule) -> Self {
        self.consumption_rule = rule;
        self
    }

    pub fn debit(&mut self, amount: Cash) {
        self.ledger.debit(amount);
    }

    pub fn credit(&mut self, amount: Cash) {
        self.ledger.credit(amount);
    }

    /// Cash the household is prepared to spend this cycle. An overdrawn
    /// household spends nothing; a negative budget would post negative demand.
    pub fn compute_consumption_budget(&self) -> Cash {
        self.consumption_rule.propensity * self.cash().max(0.0)
    }

    /// Apply the fund rule once. Exactly one branch runs per call.
    pub fn interact_with_fund<F: Fund + ?Sized>(&mut self, fund: &mut F) -> FundDecision {
        let rule = self.fund_rule;
        let fund_assets = fund.total_assets();

        let decision = if fund_assets > rule.ceiling {
            let withdrawal = fund_assets - rule.target;
            fund.credit(withdrawal);
            self.ledger.debit(withdrawal);
            FundDecision::Withdraw(withdrawal)
        } else {
            let contribution = (rule.invest_fraction * self.cash())
                .min(rule.ceiling - fund_assets)
                .max(0.0);
            self.ledger.credit(contribution);
            fund.debit(contribution);
            FundDecision::Invest(contribution)
        };

        #[cfg(feature = "instrument")]
        {
            let (withdrawn, invested) = match decision {
                FundDecision::Withdraw(amount) => (amount, 0.0),
                FundDecision::Invest(amount) => (0.0, amount),
            };
            tracing::info!(
                target: "fund",
                household_id = crate::types::KeyToU64::to_u64(self.id),
                fund_before = fund_assets,
                withdrawn = withdrawn,
                invested = invested,
                fund_after = fund.total_assets(),
                cash_after = self.cash(),
            );
        }

        decision
    }

    /// Labour-seller side of employment: wages in, labour out.
    pub fn employ(&mut self, labour: Quantity, wage: Price) {
        self.ledger.debit(labour * wage);
        self.labour_available -= labour;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "wages",
            household_id = crate::types::KeyToU64::to_u64(self.id),
            labour = labour,
            wage = wage,
            cash_after = self.cash(),
        );
    }

    pub fn labour_available(&self) -> Quantity {
        self.labour_available
    }

    pub fn labour_endowment(&self) -> Quantity {
        self.labour_endowment
    }

    pub fn goods(&self, good: GoodId) -> Quantity {
        self.inventory.get(good)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Use up goods, clamped at what is held.
    pub fn consume(&mut self, good: GoodId, quantity: Quantity) {
        self.inventory.remove(good, quantity);
    }

    // === Balance sheet ===

    pub fn cash(&self) -> Cash {
        self.ledger.cash()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Cash plus the whole fund: the household is its sole beneficiary.
    pub fn total_assets<F: Fund + ?Sized>(&self, fund: &F) -> Cash {
        self.cash() + fund.total_assets()
    }

    pub fn total_liabilities(&self) -> Cash {
        0.0
    }

    pub fn equity<F: Fund + ?Sized>(&self, fund: &F) -> Cash {
        self.total_assets(fund) - self.total_liabilities()
    }

    /// Restore the labour endowment for the next cycle.
    pub fn flush(&mut self) {
        self.labour_available = self.labour_endowment;
    }
}

impl GoodsBuyer for Household {
    fn credit(&mut self, amount: Cash) {
        self.ledger.credit(amount);
    }

    fn receive_goods(&mut self, good: GoodId, quantity: Quantity) {
        self.inventory.add(good, quantity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fund::MutualFund;

    fn household(cash: Cash) -> Household {
        Household::new(Ledger::new(cash), 1.0)
    }

    fn fund(assets: Cash) -> MutualFund {
        MutualFund::new(Ledger::new(assets))
    }

    #[test]
    fn budget_is_ninety_percent_of_cash() {
        assert_eq!(household(100.0).compute_consumption_budget(), 90.0);
        assert_eq!(household(-5.0).compute_consumption_budget(), 0.0);
    }

    #[test]
    fn invests_a_tenth_of_cash_below_ceiling() {
        let mut h = household(100.0);
        let mut f = fund(20.0);
        let decision = h.interact_with_fund(&mut f);
        assert_eq!(decision, FundDecision::Invest(10.0));
        assert_eq!(h.cash(), 90.0);
        assert_eq!(f.total_assets(), 30.0);
    }

    #[test]
    fn withdraws_down_to_target_above_ceiling() {
        let mut h = household(10.0);
        let mut f = fund(170.0);
        let decision = h.interact_with_fund(&mut f);
        assert_eq!(decision, FundDecision::Withdraw(20.0));
        assert_eq!(h.cash(), 30.0);
        assert_eq!(f.total_assets(), 150.0);
    }

    #[test]
    fn exactly_at_ceiling_invests_nothing() {
        let mut h = household(500.0);
        let mut f = fund(160.0);
        assert_eq!(h.interact_with_fund(&mut f), FundDecision::Invest(0.0));
        assert_eq!(h.cash(), 500.0);
    }

    #[test]
    fn investment_never_crosses_ceiling() {
        let mut h = household(1_000.0);
        let mut f = fund(155.0);
        assert_eq!(h.interact_with_fund(&mut f), FundDecision::Invest(5.0));
        assert_eq!(f.total_assets(), 160.0);
    }

    #[test]
    fn fund_interaction_conserves_combined_wealth() {
        let mut h = household(42.0);
        let mut f = fund(300.0);
        let before = h.total_assets(&f);
        h.interact_with_fund(&mut f);
        h.interact_with_fund(&mut f);
        assert!((h.total_assets(&f) - before).abs() < 1e-12);
    }

    #[test]
    fn employment_pays_and_uses_labour() {
        let mut h = household(100.0);
        h.employ(0.5, 10.0);
        assert_eq!(h.cash(), 105.0);
        assert_eq!(h.labour_available(), 0.5);
        h.flush();
        assert_eq!(h.labour_available(), 1.0);
    }

    #[test]
    fn equity_counts_cash_and_fund() {
        let h = household(10.0);
        let f = fund(45.0);
        assert_eq!(h.total_assets(&f), 55.0);
        assert_eq!(h.equity(&f), 55.0);
        assert_eq!(h.total_liabilities(), 0.0);
    }

    #[test]
    fn consumption_clamps_inventory() {
        let mut h = household(0.0);
        h.receive_goods(3, 2.0);
        h.consume(3, 5.0);
        assert_eq!(h.goods(3), 0.0);
    }
}
