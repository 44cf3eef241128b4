// Market clearing venues
//
// Two settlement contracts share one clearing law (trade = min of the two
// posted quantities, price supplied from outside):
// - posted/   type-indexed market that settles the buyer only
// - direct/   single-commodity goods and labour markets that settle inside
//             their counterparty
// - signals   zero-defaulting per-type signal maps

pub mod direct;
pub mod posted;
pub mod signals;

pub use direct::*;
pub use posted::*;
pub use signals::*;

use crate::types::{Cash, GoodId, Price, Quantity, Trade};

/// Clearing quantity shared by every market: never more than either side
/// posted.
pub fn clearing_quantity(demand: Quantity, supply: Quantity) -> Quantity {
    demand.min(supply)
}

// === COUNTERPARTY CONTRACTS ===

/// Agent that pays for and receives goods from a buyer-settling market.
pub trait GoodsBuyer {
    fn credit(&mut self, amount: Cash);
    fn receive_goods(&mut self, good: GoodId, quantity: Quantity);
}

/// Seller side of a direct goods market.
pub trait GoodsSeller {
    fn goods_owned(&self) -> Quantity;
    fn selling_price(&self) -> Price;
    fn sell_goods(&mut self, quantity: Quantity, price: Price);
}

/// Hiring side of a direct labour market.
pub trait Employer {
    fn labour_demand(&self) -> Quantity;
    fn employ(&mut self, labour: Quantity, wage: Price);
}

// === SETTLEMENT CAPABILITIES ===

/// Market whose `process` mutates only the buyer. The seller is not
/// represented and must be settled elsewhere, or is a price-taking
/// environment with no books of its own.
pub trait BuyerSettlingMarket {
    fn process<B: GoodsBuyer + ?Sized>(&self, good: GoodId, buyer: &mut B) -> Trade;
}

/// Market bound to one counterparty whose own trade-execution method books
/// both the cash and the goods or labour side of the trade.
pub trait TwoSidedSettlingMarket<C: ?Sized> {
    fn process_trade(&self, counterparty: &mut C) -> Trade;
}
