//! Shared types for CPU cores that execute in cycle budgets.
//!
//! A core is handed a budget of clock cycles, runs whole instructions until
//! the budget is met, and reports how many cycles it consumed. Everything
//! else in a machine (video, audio, timers) is scheduled from those counts.

mod cpu;
mod observable;
mod ticks;

pub use cpu::BudgetCpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
