//! City treasury and the derived economy snapshot.

use crate::{error::PlacementError, types::Tick};
use serde::{Deserialize, Serialize};

/// Aggregates recomputed every economy pass. Never authoritative;
/// always derivable from building data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub tick: Tick,
    pub total_population: u32,
    pub average_happiness: f64,
    pub total_jobs: f64,
    /// total_jobs minus total_population.
    pub job_balance: f64,
    pub last_income: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Economy {
    money: i64,
    pub snapshot: EconomySnapshot,
}

impl Economy {
    pub fn new(starting_money: i64) -> Self {
        Self {
            money: starting_money,
            snapshot: EconomySnapshot::default(),
        }
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn can_afford(&self, cost: i64) -> bool {
        self.money >= cost
    }

    /// Debit `cost`. The balance is untouched on refusal.
    pub fn spend(&mut self, cost: i64) -> Result<(), PlacementError> {
        if !self.can_afford(cost) {
            return Err(PlacementError::InsufficientFunds {
                cost,
                balance: self.money,
            });
        }
        self.money -= cost;
        Ok(())
    }

    pub fn credit(&mut self, amount: i64) {
        self.money += amount;
    }

    pub(crate) fn set_money(&mut self, money: i64) {
        self.money = money;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_spend_leaves_balance() {
        let mut e = Economy::new(100);
        assert!(e.spend(150).is_err());
        assert_eq!(e.money(), 100);
        e.spend(100).unwrap();
        assert_eq!(e.money(), 0);
    }
}
