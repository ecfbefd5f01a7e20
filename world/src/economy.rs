//! Money, base health and the wave counter.

use shape_defence_core::{EconomySnapshot, RejectReason};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Economy {
    money: u32,
    base_health: i32,
    next_wave: u32,
}

impl Economy {
    pub(crate) fn new(money: u32, base_health: i32) -> Self {
        Self {
            money,
            base_health,
            next_wave: 1,
        }
    }

    pub(crate) fn can_afford(&self, cost: u32) -> bool {
        self.money >= cost
    }

    /// Deducts `cost`, leaving the balance untouched when it falls short.
    pub(crate) fn spend(&mut self, cost: u32) -> Result<(), RejectReason> {
        self.money = self
            .money
            .checked_sub(cost)
            .ok_or(RejectReason::InsufficientFunds)?;
        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    /// Removes base health, returning `true` once the base is destroyed.
    pub(crate) fn damage_base(&mut self, amount: u32) -> bool {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.base_health = self.base_health.saturating_sub(amount);
        self.base_health <= 0
    }

    /// Claims the next wave number and advances the counter.
    pub(crate) fn start_wave(&mut self) -> u32 {
        let wave = self.next_wave;
        self.next_wave = self.next_wave.saturating_add(1);
        wave
    }

    /// Highest wave launched so far, never below one.
    pub(crate) fn final_wave(&self) -> u32 {
        self.next_wave.saturating_sub(1).max(1)
    }

    pub(crate) fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            money: self.money,
            base_health: self.base_health,
            wave: self.next_wave,
        }
    }
}
