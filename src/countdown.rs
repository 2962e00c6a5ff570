//! Cancelable per-screen countdown.
//!
//! The controller owns at most one [`Countdown`]. The runtime delivers one
//! tick per second tagged with the generation the countdown was armed under;
//! ticks from a replaced or canceled countdown report [`Tick::Stale`], and a
//! countdown reports [`Tick::Expired`] exactly once.

use serde::{Deserialize, Serialize};

use crate::state_machine::Generation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tick {
    Remaining(u32),
    Expired,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    token: Generation,
    total_secs: u32,
    remaining_secs: u32,
    expired: bool,
}

impl Countdown {
    pub fn new(token: Generation, secs: u32) -> Self {
        Self {
            token,
            total_secs: secs,
            remaining_secs: secs,
            expired: false,
        }
    }

    pub fn token(&self) -> Generation {
        self.token
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn tick(&mut self, token: Generation) -> Tick {
        if token != self.token || self.expired {
            return Tick::Stale;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.expired = true;
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_then_expires_once() {
        let token = Generation::default().next();
        let mut countdown = Countdown::new(token, 3);
        assert_eq!(countdown.tick(token), Tick::Remaining(2));
        assert_eq!(countdown.tick(token), Tick::Remaining(1));
        assert_eq!(countdown.tick(token), Tick::Expired);
        assert!(countdown.is_expired());
        assert_eq!(countdown.tick(token), Tick::Stale);
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn foreign_token_is_stale() {
        let token = Generation::default().next();
        let mut countdown = Countdown::new(token, 5);
        assert_eq!(countdown.tick(token.next()), Tick::Stale);
        assert_eq!(countdown.remaining_secs(), 5);
    }

    #[test]
    fn zero_second_countdown_expires_on_first_tick() {
        let token = Generation::default();
        let mut countdown = Countdown::new(token, 0);
        assert_eq!(countdown.tick(token), Tick::Expired);
        assert_eq!(countdown.total_secs(), 0);
    }
}
