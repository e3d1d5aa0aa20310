//! Runtime configuration of a CPU instance.

use serde::{Deserialize, Serialize};

/// Behaviour switches fixed by the machine the CPU is built into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Raise address errors on odd word/long accesses. When off, odd
    /// accesses go straight to the memory map.
    pub address_errors: bool,
    /// Report function code changes through
    /// [`M68kHost::function_code_changed`](crate::M68kHost::function_code_changed).
    pub emulate_function_codes: bool,
    /// Fast-forward branch-to-self spin loops to the end of the budget.
    pub idle_loop_skip: bool,
    /// Master clocks per CPU clock. Budgets, results and totals are all
    /// counted in master clocks.
    pub clock_divider: u32,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            address_errors: true,
            emulate_function_codes: false,
            idle_loop_skip: true,
            clock_divider: 1,
        }
    }
}

impl CpuConfig {
    #[must_use]
    pub fn with_address_errors(mut self, enabled: bool) -> Self {
        self.address_errors = enabled;
        self
    }

    #[must_use]
    pub fn with_function_codes(mut self, enabled: bool) -> Self {
        self.emulate_function_codes = enabled;
        self
    }

    #[must_use]
    pub fn with_idle_loop_skip(mut self, enabled: bool) -> Self {
        self.idle_loop_skip = enabled;
        self
    }

    /// A divider of zero is treated as one.
    #[must_use]
    pub fn with_clock_divider(mut self, divider: u32) -> Self {
        self.clock_divider = divider.max(1);
        self
    }
}
