//! `Health`: hit points.

use serde::{Deserialize, Serialize};

/// Configuration for [`Health`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthInfo {
    /// Maximum (and starting) hit points.
    pub max_hp: u32,
}

impl Default for HealthInfo {
    fn default() -> Self {
        Self { max_hp: 100 }
    }
}

impl HealthInfo {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.max_hp == 0 {
            return Err("max_hp must be at least 1".to_owned());
        }
        Ok(())
    }
}

/// Current hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    hp: u32,
}

impl Health {
    /// Full health for `info`.
    pub const fn new(info: &HealthInfo) -> Self {
        Self { hp: info.max_hp }
    }

    /// Current hit points.
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Whether hit points are at the configured maximum.
    pub const fn is_full(&self, info: &HealthInfo) -> bool {
        self.hp >= info.max_hp
    }

    /// Set hit points, clamped to `1..=max_hp`.
    pub fn set_hp(&mut self, info: &HealthInfo, hp: u32) {
        self.hp = hp.clamp(1, info.max_hp);
    }

    /// Restore up to `amount` hit points and return how many were restored.
    pub fn heal(&mut self, info: &HealthInfo, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(info.max_hp);
        self.hp.saturating_sub(before)
    }

    /// Remove up to `amount` hit points. Returns `true` when none are left.
    pub const fn damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heal_stops_at_max() {
        let info = HealthInfo { max_hp: 50 };
        let mut health = Health::new(&info);
        assert!(!health.damage(20));
        assert_eq!(health.heal(&info, 15), 15);
        assert_eq!(health.heal(&info, 15), 5);
        assert!(health.is_full(&info));
    }

    #[test]
    fn set_hp_clamps() {
        let info = HealthInfo { max_hp: 50 };
        let mut health = Health::new(&info);
        health.set_hp(&info, 0);
        assert_eq!(health.hp(), 1);
        health.set_hp(&info, 80);
        assert_eq!(health.hp(), 50);
    }

    #[test]
    fn damage_reports_destruction() {
        let info = HealthInfo { max_hp: 10 };
        let mut health = Health::new(&info);
        assert!(health.damage(25));
        assert_eq!(health.hp(), 0);
    }
}
