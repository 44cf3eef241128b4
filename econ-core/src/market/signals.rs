use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::GoodId;

/// Per-commodity posted signal (price or quantity). Reading a type that was
/// never posted yields 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalMap {
    values: HashMap<GoodId, f64>,
}

impl SignalMap {
    pub fn get(&self, good: GoodId) -> f64 {
        self.values.get(&good).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, good: GoodId, value: f64) {
        self.values.insert(good, value);
    }

    pub fn contains(&self, good: GoodId) -> bool {
        self.values.contains_key(&good)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_reads_zero() {
        let mut signals = SignalMap::default();
        assert_eq!(signals.get(7), 0.0);
        signals.set(7, 1.5);
        assert_eq!(signals.get(7), 1.5);
        assert!(!signals.contains(8));
        signals.clear();
        assert!(signals.is_empty());
        assert_eq!(signals.get(7), 0.0);
    }
}
