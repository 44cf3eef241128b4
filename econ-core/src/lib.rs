//! Stock-flow consistent core of an agent-based macroeconomic model.
//!
//! Firms hire labour, borrow against the wage bill, produce, sell and pay
//! dividends. Households sell labour, consume and invest surplus cash in a
//! mutual fund. Every unit of cash moves through a [`Ledger`] and every good
//! through an [`Inventory`]. [`tick::run_cycle`] drives an [`Economy`]
//! through one cycle in a fixed phase order.

pub mod accounting;
pub mod agents;
pub mod inventory;
pub mod ledger;
pub mod market;
pub mod scenario;
pub mod tick;
pub mod types;
pub mod world;

pub use accounting::*;
pub use agents::*;
pub use inventory::*;
pub use ledger::*;
pub use market::*;
pub use scenario::*;
pub use tick::*;
pub use types::*;
pub use world::*;

#[cfg(feature = "instrument")]
pub use instrument;
