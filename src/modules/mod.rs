//! Built-in test module implementations

mod simulated;

pub use simulated::{Journal, ModuleBehavior, ModuleSpec, SimulatedModule};
