// Economy state: every agent and market one scheduler drives

use slotmap::{SecondaryMap, SlotMap};

use crate::agents::{Firm, Household, MutualFund};
use crate::market::{GoodsMarket, LabourMarket, Market};
use crate::tick::SettlementOrder;
use crate::types::{FirmId, HouseholdId};

/// Complete state of a closed economy of firms, households and one fund.
///
/// Each firm gets its own goods and labour market, keyed by the firm's id,
/// so the markets stay bound to one counterparty for their whole life.
/// Households share one buyer-settling consumer market.
#[derive(Debug, Clone, Default)]
pub struct Economy {
    pub cycle: u64,

    // Agents
    pub firms: SlotMap<FirmId, Firm>,
    pub households: SlotMap<HouseholdId, Household>,
    pub fund: MutualFund,

    // Markets
    pub goods_markets: SecondaryMap<FirmId, GoodsMarket>,
    pub labour_markets: SecondaryMap<FirmId, LabourMarket>,
    pub consumer_market: Market,

    pub settlement_order: SettlementOrder,
}

impl Economy {
    pub fn new(fund: MutualFund) -> Self {
        Self {
            fund,
            ..Self::default()
        }
    }

    pub fn with_settlement_order(mut self, order: SettlementOrder) -> Self {
        self.settlement_order = order;
        self
    }

    // === Firm Management ===

    /// Add a firm with fresh goods and labour markets, returns its ID
    pub fn add_firm(&mut self, mut firm: Firm) -> FirmId {
        let id = self.firms.insert_with_key(|id| {
            firm.id = id;
            firm
        });
        self.goods_markets.insert(id, GoodsMarket::new());
        self.labour_markets.insert(id, LabourMarket::new(0.0));
        id
    }

    pub fn get_firm(&self, id: FirmId) -> Option<&Firm> {
        self.firms.get(id)
    }

    pub fn get_firm_mut(&mut self, id: FirmId) -> Option<&mut Firm> {
        self.firms.get_mut(id)
    }

    // === Household Management ===

    pub fn add_household(&mut self, mut household: Household) -> HouseholdId {
        self.households.insert_with_key(|id| {
            household.id = id;
            household
        })
    }

    pub fn get_household(&self, id: HouseholdId) -> Option<&Household> {
        self.households.get(id)
    }

    pub fn get_household_mut(&mut self, id: HouseholdId) -> Option<&mut Household> {
        self.households.get_mut(id)
    }

    // === Reporting ===

    /// Equity of one household, valued against the shared fund.
    pub fn household_equity(&self, id: HouseholdId) -> Option<f64> {
        self.households.get(id).map(|h| h.equity(&self.fund))
    }

    pub fn firm_equity(&self, id: FirmId) -> Option<f64> {
        self.firms.get(id).map(Firm::equity)
    }

    /// Pay every obligation still declared after the final cycle, so a
    /// scheduled run ends with the same books as a run that settles within
    /// the cycle.
    pub fn settle_obligations(&mut self) {
        crate::tick::settle_obligations(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    #[test]
    fn firms_get_their_own_markets() {
        let mut economy = Economy::default();
        let a = economy.add_firm(Firm::new(Ledger::new(1.0)));
        let b = economy.add_firm(Firm::new(Ledger::new(2.0)));

        assert_ne!(a, b);
        assert_eq!(economy.get_firm(a).map(|f| f.id), Some(a));
        assert!(economy.goods_markets.contains_key(a));
        assert!(economy.labour_markets.contains_key(b));
        assert_eq!(economy.firm_equity(b), Some(2.0));
    }

    #[test]
    fn household_equity_includes_the_fund() {
        let mut economy = Economy::new(MutualFund::new(Ledger::new(20.0)));
        let h = economy.add_household(Household::new(Ledger::new(100.0), 1.0));
        assert_eq!(economy.household_equity(h), Some(120.0));
        assert_eq!(economy.get_household(h).map(|h| h.id), Some(h));
    }
}
