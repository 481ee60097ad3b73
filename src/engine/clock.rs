//! Per-color countdown clocks.
//!
//! Clocks are advisory state advanced by a once-per-second tick from outside
//! the move pipeline. A flag falls when the side to move reaches zero.

use serde::{Deserialize, Serialize};

use crate::engine::types::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clock {
    /// Seconds each side started with.
    pub initial: u32,
    pub white: u32,
    pub black: u32,
}

impl Clock {
    pub fn new(seconds: u32) -> Self {
        Clock {
            initial: seconds,
            white: seconds,
            black: seconds,
        }
    }

    pub fn remaining(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Take one second from `color`. Returns `true` once that side is at zero.
    pub fn tick(&mut self, color: Color) -> bool {
        let left = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        *left = left.saturating_sub(1);
        *left == 0
    }

    pub fn reset(&mut self) {
        *self = Clock::new(self.initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_only_the_given_side() {
        let mut c = Clock::new(10);
        assert!(!c.tick(Color::White));
        assert_eq!(c.remaining(Color::White), 9);
        assert_eq!(c.remaining(Color::Black), 10);
    }

    #[test]
    fn flag_falls_at_zero_and_stays_there() {
        let mut c = Clock::new(2);
        assert!(!c.tick(Color::Black));
        assert!(c.tick(Color::Black));
        assert!(c.tick(Color::Black));
        assert_eq!(c.black, 0);
    }

    #[test]
    fn reset_restores_initial() {
        let mut c = Clock::new(5);
        c.tick(Color::White);
        c.reset();
        assert_eq!(c, Clock::new(5));
    }
}
