pub mod builder;
pub mod errors;
pub mod event;
pub mod event_scheduler;
pub mod execution;
pub mod inventory;
pub mod network;
pub mod replenishment;
pub mod sampling;
pub mod sink;
pub mod stats;
pub mod types;

#[cfg(test)]
mod tests;
