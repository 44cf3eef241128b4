use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;
use crate::ledger::Ledger;
use crate::market::{Employer, GoodsSeller};
use crate::types::{CONSUMPTION_GOOD, Cash, FirmId, GoodId, Price, Quantity};

/// A single-commodity producer that hires labour, borrows against its wage
/// bill, sells last cycle's output and pays out surplus cash as dividends.
///
/// Per-cycle call order is fixed:
/// `consider_production` → `commercial_loan_demand` → `give_loan` →
/// `employ` → `produce_goods` → `sell_goods` → `compute_intended_dividend`
/// → `pay_loan` → `pay_dividends` → `flush`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Firm {
    pub id: FirmId,
    ledger: Ledger,
    inventory: Inventory,
    good: GoodId,
    /// Goods produced this cycle, not yet owned or valued.
    goods_produced: Quantity,
    tfp: f64,
    labour: Quantity,
    labour_input_demand: Quantity,
    selling_price: Price,
    loans_to_pay: Cash,
    loan_interest_rate: f64,
    target_production: Quantity,
    liquidity_target: Cash,
    dividend_to_pay: Cash,
}

impl Firm {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            id: FirmId::default(),
            ledger,
            inventory: Inventory::new(),
            good: CONSUMPTION_GOOD,
            goods_produced: 0.0,
            tfp: 1.0,
            labour: 0.0,
            labour_input_demand: 0.0,
            selling_price: 0.0,
            loans_to_pay: 0.0,
            loan_interest_rate: 0.0,
            target_production: 0.0,
            liquidity_target: 0.0,
            dividend_to_pay: 0.0,
        }
    }

    pub fn with_tfp(mut self, tfp: f64) -> Self {
        self.tfp = tfp;
        self
    }

    pub fn with_goods_owned(mut self, goods: Quantity) -> Self {
        self.set_goods_owned(goods);
        self
    }

    pub fn with_good(mut self, good: GoodId) -> Self {
        let owned = self.goods_owned();
        self.inventory = Inventory::new();
        self.good = good;
        self.set_goods_owned(owned);
        self
    }

    // === Loans ===

    /// Replace any outstanding loan with a fresh one and receive the principal.
    pub fn give_loan(&mut self, principal: Cash, interest_rate: f64) {
        self.loans_to_pay = principal;
        self.loan_interest_rate = interest_rate;
        self.ledger.debit(principal);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "loan",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            principal = principal,
            interest_rate = interest_rate,
            cash_after = self.cash(),
        );
    }

    /// Repay principal plus interest, leaving no loan outstanding.
    pub fn pay_loan(&mut self) {
        let repayment = self.total_liabilities();
        self.ledger.credit(repayment);
        self.loans_to_pay = 0.0;
        self.loan_interest_rate = 0.0;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "loan_repayment",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            repayment = repayment,
            cash_after = self.cash(),
        );
    }

    /// Shortfall between the projected wage bill and cash on hand.
    pub fn commercial_loan_demand(&self, wage: Price) -> Cash {
        (self.labour_input_demand * wage - self.cash()).max(0.0)
    }

    // === Labour ===

    /// Pay `labour * wage` and add the hired labour.
    pub fn employ(&mut self, labour: Quantity, wage: Price) {
        self.ledger.credit(labour * wage);
        self.labour += labour;
    }

    /// Release labour without refunding wages.
    pub fn fire(&mut self, labour: Quantity) {
        self.labour -= labour;
        self.labour = self.labour.max(0.0);
    }

    pub fn labour(&self) -> Quantity {
        self.labour
    }

    pub fn labour_demand(&self) -> Quantity {
        self.labour_input_demand
    }

    // === Production and sales ===

    pub fn set_target_production(&mut self, target: Quantity) {
        self.target_production = target;
    }

    pub fn target_production(&self) -> Quantity {
        self.target_production
    }

    pub fn set_tfp(&mut self, tfp: f64) {
        self.tfp = tfp;
    }

    pub fn tfp(&self) -> f64 {
        self.tfp
    }

    /// Labour needed to hit the production target at current TFP.
    pub fn consider_production(&mut self) {
        self.labour_input_demand = self.target_production / self.tfp;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "production_plan",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            target = self.target_production,
            tfp = self.tfp,
            labour_required = self.labour_input_demand,
        );
    }

    /// Turn employed labour into output. Output stays pending until `flush`.
    pub fn produce_goods(&mut self) {
        self.goods_produced = self.labour * self.tfp;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "production",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            labour = self.labour,
            produced = self.goods_produced,
        );
    }

    pub fn set_production(&mut self, production: Quantity) {
        self.goods_produced = production;
    }

    pub fn goods_produced(&self) -> Quantity {
        self.goods_produced
    }

    pub fn set_goods_owned(&mut self, goods: Quantity) {
        self.inventory.set(self.good, goods);
    }

    pub fn goods_owned(&self) -> Quantity {
        self.inventory.get(self.good)
    }

    pub fn good(&self) -> GoodId {
        self.good
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn set_selling_price(&mut self, price: Price) {
        self.selling_price = price;
    }

    pub fn selling_price(&self) -> Price {
        self.selling_price
    }

    /// Receive `quantity * price` and hand over owned goods, clamped at zero.
    pub fn sell_goods(&mut self, quantity: Quantity, price: Price) {
        let income = quantity * price;
        self.ledger.debit(income);
        self.inventory.remove(self.good, quantity);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "goods_sale",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            quantity = quantity,
            price = price,
            income = income,
            goods_remaining = self.goods_owned(),
            cash_after = self.cash(),
        );
    }

    // === Dividends ===

    pub fn set_liquidity_target(&mut self, target: Cash) {
        self.liquidity_target = target;
    }

    pub fn liquidity_target(&self) -> Cash {
        self.liquidity_target
    }

    /// Surplus above the liquidity buffer and the loan liability with
    /// interest, floored at zero.
    pub fn compute_intended_dividend(&mut self) {
        self.dividend_to_pay =
            (self.cash() - self.liquidity_target - self.loans_to_pay * (1.0 + self.loan_interest_rate))
                .max(0.0);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "dividend_plan",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            cash = self.cash(),
            liquidity_target = self.liquidity_target,
            loan_debt = self.total_liabilities(),
            dividend = self.dividend_to_pay,
        );
    }

    pub fn pay_dividends(&mut self) {
        let dividend = self.dividend_to_pay;
        self.ledger.credit(dividend);
        self.dividend_to_pay = 0.0;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "dividend",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            dividend = dividend,
            cash_after = self.cash(),
        );
    }

    pub fn dividend_to_pay(&self) -> Cash {
        self.dividend_to_pay
    }

    // === Balance sheet ===

    pub fn cash(&self) -> Cash {
        self.ledger.cash()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn loans_to_pay(&self) -> Cash {
        self.loans_to_pay
    }

    pub fn loan_interest_rate(&self) -> f64 {
        self.loan_interest_rate
    }

    /// Cash plus owned goods at the selling price. Pending production is
    /// excluded: unsold output perishes before it can be valued.
    pub fn total_assets(&self) -> Cash {
        self.cash() + self.goods_owned() * self.selling_price
    }

    pub fn total_liabilities(&self) -> Cash {
        self.loans_to_pay * (1.0 + self.loan_interest_rate)
    }

    /// Equal to total assets; liabilities are not netted.
    pub fn equity(&self) -> Cash {
        self.total_assets()
    }

    // === Cycle roll ===

    /// Release labour and carry this cycle's output into owned inventory.
    pub fn flush(&mut self) {
        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "flush",
            firm_id = crate::types::KeyToU64::to_u64(self.id),
            unsold = self.goods_owned(),
            carried = self.goods_produced,
        );

        self.labour = 0.0;
        self.set_goods_owned(self.goods_produced);
        self.goods_produced = 0.0;
    }
}

impl GoodsSeller for Firm {
    fn goods_owned(&self) -> Quantity {
        Firm::goods_owned(self)
    }

    fn selling_price(&self) -> Price {
        Firm::selling_price(self)
    }

    fn sell_goods(&mut self, quantity: Quantity, price: Price) {
        Firm::sell_goods(self, quantity, price);
    }
}

impl Employer for Firm {
    fn labour_demand(&self) -> Quantity {
        Firm::labour_demand(self)
    }

    fn employ(&mut self, labour: Quantity, wage: Price) {
        Firm::employ(self, labour, wage);
    }
}
