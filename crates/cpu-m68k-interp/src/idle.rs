//! Spin-loop detection.
//!
//! Software waiting for an interrupt often parks on `BRA *` (or a `Bcc *`
//! whose condition cannot change). Such a loop touches nothing but the cycle
//! counter, so once it has been seen twice in a row at the same address the
//! run loop can jump straight to the end of its budget.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleDetector {
    pc: Option<u32>,
    cycle: u64,
    detected: bool,
}

impl IdleDetector {
    /// Record a taken branch-to-self at `pc`, `cycle` clocks into the run.
    /// Returns true when the loop is confirmed.
    pub fn observe(&mut self, pc: u32, cycle: u64) -> bool {
        self.detected = self.pc == Some(pc);
        self.pc = Some(pc);
        self.cycle = cycle;
        self.detected
    }

    /// Anything other than the spin branch executed.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Cycle stamp of the most recent observation.
    #[must_use]
    pub fn last_seen(&self) -> u64 {
        self.cycle
    }
}
