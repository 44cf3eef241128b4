use serde::{Deserialize, Serialize};

use crate::types::{Price, Quantity, Trade};

use super::{Employer, GoodsSeller, TwoSidedSettlingMarket, clearing_quantity};

// === GOODS MARKET ===

/// Single-commodity goods market facing one seller.
///
/// Demand is posted from outside; supply and price are read from the seller
/// when the trade is processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodsMarket {
    demand: Quantity,
}

impl GoodsMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_demand(&mut self, demand: Quantity) {
        self.demand = demand;
    }

    pub fn demand(&self) -> Quantity {
        self.demand
    }

    pub fn clear(&mut self) {
        self.demand = 0.0;
    }
}

impl<S: GoodsSeller + ?Sized> TwoSidedSettlingMarket<S> for GoodsMarket {
    fn process_trade(&self, seller: &mut S) -> Trade {
        let supply = seller.goods_owned();
        let price = seller.selling_price();
        let quantity = clearing_quantity(self.demand, supply);
        seller.sell_goods(quantity, price);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "goods_market",
            supply = supply,
            demand = self.demand,
            quantity = quantity,
            cost = quantity * price,
        );

        Trade { quantity, price }
    }
}

// === LABOUR MARKET ===

/// Single-commodity labour market facing one employer at a posted wage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabourMarket {
    supply: Quantity,
    wage: Price,
}

impl LabourMarket {
    pub fn new(wage: Price) -> Self {
        Self { supply: 0.0, wage }
    }

    pub fn set_supply(&mut self, supply: Quantity) {
        self.supply = supply;
    }

    pub fn set_wage(&mut self, wage: Price) {
        self.wage = wage;
    }

    pub fn supply(&self) -> Quantity {
        self.supply
    }

    pub fn wage(&self) -> Price {
        self.wage
    }

    /// Drop the posted supply. The wage is kept until reposted.
    pub fn clear(&mut self) {
        self.supply = 0.0;
    }
}

impl<E: Employer + ?Sized> TwoSidedSettlingMarket<E> for LabourMarket {
    fn process_trade(&self, employer: &mut E) -> Trade {
        let demand = employer.labour_demand();
        let quantity = clearing_quantity(demand, self.supply);
        employer.employ(quantity, self.wage);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "labour_market",
            supply = self.supply,
            demand = demand,
            quantity = quantity,
            wage = self.wage,
        );

        Trade {
            quantity,
            price: self.wage,
        }
    }
}
