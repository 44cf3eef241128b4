use serde::{Deserialize, Serialize};

use crate::types::{GoodId, Price, Quantity, Trade};

use super::{BuyerSettlingMarket, GoodsBuyer, SignalMap, clearing_quantity};

/// Type-indexed double-sided market with buyer-only settlement.
///
/// Ask, bid, supply and demand are posted independently per commodity type
/// and default to 0. `process` settles at the ask/bid midpoint and books the
/// trade on the buyer alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    ask: SignalMap,
    bid: SignalMap,
    supply: SignalMap,
    demand: SignalMap,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ask(&mut self, good: GoodId, price: Price) {
        self.ask.set(good, price);
    }

    pub fn set_bid(&mut self, good: GoodId, price: Price) {
        self.bid.set(good, price);
    }

    pub fn set_supply(&mut self, good: GoodId, quantity: Quantity) {
        self.supply.set(good, quantity);
    }

    pub fn set_demand(&mut self, good: GoodId, quantity: Quantity) {
        self.demand.set(good, quantity);
    }

    pub fn ask(&self, good: GoodId) -> Price {
        self.ask.get(good)
    }

    pub fn bid(&self, good: GoodId) -> Price {
        self.bid.get(good)
    }

    pub fn supply(&self, good: GoodId) -> Quantity {
        self.supply.get(good)
    }

    pub fn demand(&self, good: GoodId) -> Quantity {
        self.demand.get(good)
    }

    /// Midpoint of the posted bid and ask. Independent of traded volume.
    pub fn price(&self, good: GoodId) -> Price {
        (self.bid(good) + self.ask(good)) / 2.0
    }

    /// Forget every posted signal.
    pub fn clear(&mut self) {
        self.ask.clear();
        self.bid.clear();
        self.supply.clear();
        self.demand.clear();
    }
}

impl BuyerSettlingMarket for Market {
    fn process<B: GoodsBuyer + ?Sized>(&self, good: GoodId, buyer: &mut B) -> Trade {
        let price = self.price(good);
        let quantity = clearing_quantity(self.demand(good), self.supply(good));
        buyer.credit(price * quantity);
        buyer.receive_goods(good, quantity);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "goods_purchase",
            good_id = good,
            ask = self.ask(good),
            bid = self.bid(good),
            supply = self.supply(good),
            demand = self.demand(good),
            quantity = quantity,
            price = price,
            cost = price * quantity,
        );

        Trade { quantity, price }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::Cash;

    const GRAIN: GoodId = 1;
    const CLOTH: GoodId = 2;

    #[derive(Default)]
    struct Buyer {
        cash: Cash,
        goods: HashMap<GoodId, Quantity>,
    }

    impl GoodsBuyer for Buyer {
        fn credit(&mut self, amount: Cash) {
            self.cash -= amount;
        }

        fn receive_goods(&mut self, good: GoodId, quantity: Quantity) {
            *self.goods.entry(good).or_insert(0.0) += quantity;
        }
    }

    #[test]
    fn settles_at_midpoint_for_the_short_side() {
        let mut market = Market::new();
        market.set_ask(GRAIN, 2.0);
        market.set_bid(GRAIN, 4.0);
        market.set_supply(GRAIN, 5.0);
        market.set_demand(GRAIN, 3.0);

        let mut buyer = Buyer {
            cash: 100.0,
            ..Default::default()
        };
        let trade = market.process(GRAIN, &mut buyer);

        assert_eq!(trade, Trade { quantity: 3.0, price: 3.0 });
        assert_eq!(buyer.cash, 91.0);
        assert_eq!(buyer.goods[&GRAIN], 3.0);
    }

    #[test]
    fn unposted_type_trades_nothing() {
        let mut market = Market::new();
        market.set_supply(GRAIN, 5.0);
        market.set_demand(GRAIN, 5.0);

        let mut buyer = Buyer::default();
        let trade = market.process(CLOTH, &mut buyer);

        assert_eq!(trade.quantity, 0.0);
        assert_eq!(trade.price, 0.0);
        assert_eq!(buyer.cash, 0.0);
    }

    #[test]
    fn clear_resets_all_signals() {
        let mut market = Market::new();
        market.set_ask(GRAIN, 1.0);
        market.set_bid(GRAIN, 1.0);
        market.set_supply(GRAIN, 1.0);
        market.set_demand(GRAIN, 1.0);
        market.clear();

        assert_eq!(market, Market::new());
        assert_eq!(market.price(GRAIN), 0.0);
    }
}
