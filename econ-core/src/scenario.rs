//! Exogenous per-cycle stimuli.
//!
//! Schedules are plain serde structs so an orchestration layer can hand them
//! over as JSON. Every sequence is indexed by cycle number and must be at
//! least as long as the number of cycles run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tick::SettlementOrder;
use crate::types::{Cash, Price, Quantity};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("malformed scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{schedule}.{field} has {len} entries but {cycles} cycles were requested")]
    ShortSchedule {
        schedule: &'static str,
        field: &'static str,
        len: usize,
        cycles: usize,
    },
}

fn default_labour_supply() -> Quantity {
    20.0
}

fn default_loan_rate() -> f64 {
    0.1
}

fn check_len(
    schedule: &'static str,
    field: &'static str,
    len: usize,
    cycles: usize,
) -> Result<(), ScenarioError> {
    if len < cycles {
        return Err(ScenarioError::ShortSchedule {
            schedule,
            field,
            len,
            cycles,
        });
    }
    Ok(())
}

// === FIRM STIMULI ===

/// Stimuli applied to every firm in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FirmStimulus {
    pub consumption_demand: Quantity,
    pub target_production: Quantity,
    pub goods_price: Price,
    pub wage: Price,
    pub liquidity_target: Cash,
    pub labour_supply: Quantity,
    pub loan_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmSchedule {
    pub consumption_demand: Vec<Quantity>,
    pub target_production: Vec<Quantity>,
    pub goods_price: Vec<Price>,
    pub wage: Vec<Price>,
    pub liquidity_target: Vec<Cash>,
    /// Labour offered to each firm's labour market, every cycle.
    #[serde(default = "default_labour_supply")]
    pub labour_supply: Quantity,
    /// Interest rate on commercial loans, every cycle.
    #[serde(default = "default_loan_rate")]
    pub loan_rate: f64,
}

impl FirmSchedule {
    /// Stimuli of the single-firm regression scenario.
    pub fn reference() -> Self {
        Self {
            consumption_demand: vec![0.5, 0.55, 0.6, 0.55, 0.5],
            target_production: vec![1.0, 2.0, 3.0, 2.0, 1.0],
            goods_price: vec![5.0, 6.0, 7.0, 6.0, 4.0],
            wage: vec![1.0, 0.9, 0.2, 0.8, 1.1],
            liquidity_target: vec![1.0, 0.8, 0.6, 0.7, 0.8],
            labour_supply: default_labour_supply(),
            loan_rate: default_loan_rate(),
        }
    }

    pub fn at(&self, cycle: usize) -> Option<FirmStimulus> {
        Some(FirmStimulus {
            consumption_demand: *self.consumption_demand.get(cycle)?,
            target_production: *self.target_production.get(cycle)?,
            goods_price: *self.goods_price.get(cycle)?,
            wage: *self.wage.get(cycle)?,
            liquidity_target: *self.liquidity_target.get(cycle)?,
            labour_supply: self.labour_supply,
            loan_rate: self.loan_rate,
        })
    }

    pub fn validate(&self, cycles: usize) -> Result<(), ScenarioError> {
        check_len("firm", "consumption_demand", self.consumption_demand.len(), cycles)?;
        check_len("firm", "target_production", self.target_production.len(), cycles)?;
        check_len("firm", "goods_price", self.goods_price.len(), cycles)?;
        check_len("firm", "wage", self.wage.len(), cycles)?;
        check_len("firm", "liquidity_target", self.liquidity_target.len(), cycles)?;
        Ok(())
    }
}

// === HOUSEHOLD STIMULI ===

/// Stimuli applied to every household in one cycle: work sold to an
/// outside employer, and goods offered by an outside seller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseholdStimulus {
    pub labour_sold: Quantity,
    pub wage: Price,
    pub goods_supply: Quantity,
    pub goods_price: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSchedule {
    pub labour_sold: Vec<Quantity>,
    pub wage: Vec<Price>,
    pub goods_supply: Vec<Quantity>,
    pub goods_price: Vec<Price>,
}

impl HouseholdSchedule {
    /// Stimuli of the single-household regression scenario.
    pub fn reference() -> Self {
        Self {
            labour_sold: vec![0.5, 0.5, 0.5, 0.5],
            wage: vec![10.0, 10.0, 40.0, 40.0],
            goods_supply: vec![0.0, 50.0, 50.0, 15.0],
            goods_price: vec![1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn at(&self, cycle: usize) -> Option<HouseholdStimulus> {
        Some(HouseholdStimulus {
            labour_sold: *self.labour_sold.get(cycle)?,
            wage: *self.wage.get(cycle)?,
            goods_supply: *self.goods_supply.get(cycle)?,
            goods_price: *self.goods_price.get(cycle)?,
        })
    }

    pub fn validate(&self, cycles: usize) -> Result<(), ScenarioError> {
        check_len("household", "labour_sold", self.labour_sold.len(), cycles)?;
        check_len("household", "wage", self.wage.len(), cycles)?;
        check_len("household", "goods_supply", self.goods_supply.len(), cycles)?;
        check_len("household", "goods_price", self.goods_price.len(), cycles)?;
        Ok(())
    }
}

// === SCENARIO ===

/// Stimuli for one cycle across both agent populations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleStimuli {
    pub firm: Option<FirmStimulus>,
    pub household: Option<HouseholdStimulus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub cycles: usize,
    #[serde(default)]
    pub settlement_order: SettlementOrder,
    #[serde(default)]
    pub firm: Option<FirmSchedule>,
    #[serde(default)]
    pub household: Option<HouseholdSchedule>,
}

impl Scenario {
    /// Parse and validate a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn to_json(&self) -> Result<String, ScenarioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if let Some(firm) = &self.firm {
            firm.validate(self.cycles)?;
        }
        if let Some(household) = &self.household {
            household.validate(self.cycles)?;
        }
        Ok(())
    }

    pub fn stimuli(&self, cycle: usize) -> CycleStimuli {
        CycleStimuli {
            firm: self.firm.as_ref().and_then(|s| s.at(cycle)),
            household: self.household.as_ref().and_then(|s| s.at(cycle)),
        }
    }
}
