pub mod controller;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{DashboardView, LiveDataController, SourceClients, StateUpdate};
pub use scheduler::RefreshScheduler;
