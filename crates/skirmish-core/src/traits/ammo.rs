//! `AmmoPool`: a reloadable magazine. Actors may carry several, qualified.

use serde::{Deserialize, Serialize};

/// Configuration for [`AmmoPool`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmmoPoolInfo {
    /// Rounds the pool holds when full.
    pub capacity: u32,
    /// Ticks of rearming per round restored.
    pub reload_ticks: u32,
}

impl Default for AmmoPoolInfo {
    fn default() -> Self {
        Self {
            capacity: 1,
            reload_ticks: 1,
        }
    }
}

impl AmmoPoolInfo {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be at least 1".to_owned());
        }
        if self.reload_ticks == 0 {
            return Err("reload_ticks must be at least 1".to_owned());
        }
        Ok(())
    }
}

/// Rounds currently loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoPool {
    ammo: u32,
}

impl AmmoPool {
    /// A full pool.
    pub const fn new(info: &AmmoPoolInfo) -> Self {
        Self {
            ammo: info.capacity,
        }
    }

    /// Rounds currently loaded.
    pub const fn ammo(&self) -> u32 {
        self.ammo
    }

    /// Whether the pool is at capacity.
    pub const fn is_full(&self, info: &AmmoPoolInfo) -> bool {
        self.ammo >= info.capacity
    }

    /// Fire one round. Returns `false` when the pool is empty.
    pub const fn take_one(&mut self) -> bool {
        match self.ammo.checked_sub(1) {
            Some(left) => {
                self.ammo = left;
                true
            }
            None => false,
        }
    }

    /// Restore one round, up to capacity.
    pub fn reload_one(&mut self, info: &AmmoPoolInfo) {
        self.ammo = self.ammo.saturating_add(1).min(info.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_and_reload() {
        let info = AmmoPoolInfo {
            capacity: 2,
            reload_ticks: 3,
        };
        let mut pool = AmmoPool::new(&info);
        assert!(pool.take_one());
        assert!(pool.take_one());
        assert!(!pool.take_one());
        pool.reload_one(&info);
        pool.reload_one(&info);
        pool.reload_one(&info);
        assert_eq!(pool.ammo(), 2);
        assert!(pool.is_full(&info));
    }
}
