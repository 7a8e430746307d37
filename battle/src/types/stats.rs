//! Boost stages.

use volley_protocol::Stat;

pub const MIN_STAGE: i8 = -6;
pub const MAX_STAGE: i8 = 6;

/// One stage per boostable stat, always within `MIN_STAGE..=MAX_STAGE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatStages([i8; Stat::ALL.len()]);

impl StatStages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: Stat) -> i8 {
        self.0[stat as usize]
    }

    pub fn set(&mut self, stat: Stat, stage: i8) {
        self.0[stat as usize] = stage.clamp(MIN_STAGE, MAX_STAGE);
    }

    /// Raise `stat` by `amount` stages and return how far it actually moved
    pub fn boost(&mut self, stat: Stat, amount: i8) -> i8 {
        let before = self.get(stat);
        self.set(stat, before.saturating_add(amount));
        self.get(stat) - before
    }

    pub fn unboost(&mut self, stat: Stat, amount: i8) -> i8 {
        self.boost(stat, amount.saturating_neg())
    }

    pub fn clear(&mut self) {
        self.0 = [0; Stat::ALL.len()];
    }

    /// Drop raised stages, keep lowered ones
    pub fn clear_positive(&mut self) {
        self.0.iter_mut().for_each(|stage| *stage = (*stage).min(0));
    }

    /// Drop lowered stages, keep raised ones
    pub fn clear_negative(&mut self) {
        self.0.iter_mut().for_each(|stage| *stage = (*stage).max(0));
    }

    /// Topsy-Turvy
    pub fn invert(&mut self) {
        self.0.iter_mut().for_each(|stage| *stage = -*stage);
    }

    pub fn is_clear(&self) -> bool {
        self.0.iter().all(|&stage| stage == 0)
    }

    pub fn in_bounds(&self) -> bool {
        self.0
            .iter()
            .all(|stage| (MIN_STAGE..=MAX_STAGE).contains(stage))
    }
}
