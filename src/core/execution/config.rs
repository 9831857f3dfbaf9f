//! Configuration for supply-chain simulation runs
//!
//! This module provides configuration types that control how a network is assembled
//! and executed, including seeding, tie-break rules and replication concurrency.

use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes for replications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Replications run one after another on the calling thread
    #[default]
    Sequential,
    /// Replications are spread over a Rayon thread pool
    Rayon,
}

/// Which inbound link a node orders over when it has several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SupplierSelection {
    /// Always the first declared link
    #[default]
    First,
    /// Uniformly at random from the engine RNG
    Random,
    /// Lowest per-shipment cost, earliest declared on ties
    Cheapest,
}

/// What happens to units that arrive at a full store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Recorded as overflow only
    #[default]
    Discard,
    /// Recorded as overflow and counted as waste
    CountAsWaste,
}

/// Which links the builder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopologyRules {
    /// Suppliers feed manufacturers only; everything else flows strictly downstream
    #[default]
    Strict,
    /// Any link except a self-link
    Permissive,
}

/// Configuration for simulation execution
///
/// This struct holds the options that control how a network is built and run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base seed for every sampler and the engine RNG; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// The concurrency mode to use for replications
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel replications
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
    pub supplier_selection: SupplierSelection,
    pub overflow_policy: OverflowPolicy,
    pub topology: TopologyRules,
    /// Spacing of the daily review, in logical days
    pub review_interval: f64,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration is seeded with 0, runs replications sequentially and
    /// reviews every logical day
    pub fn new() -> Self {
        Self {
            seed: Some(0),
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
            supplier_selection: SupplierSelection::default(),
            overflow_policy: OverflowPolicy::default(),
            topology: TopologyRules::default(),
            review_interval: 1.0,
        }
    }

    /// Set the base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed every sampler from OS entropy; runs are no longer reproducible
    pub fn unseeded(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Set the concurrency mode for replications
    ///
    /// # Arguments
    /// * `mode` - The concurrency mode to use
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel replications
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn with_supplier_selection(mut self, selection: SupplierSelection) -> Self {
        self.supplier_selection = selection;
        self
    }

    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn with_topology(mut self, rules: TopologyRules) -> Self {
        self.topology = rules;
        self
    }

    pub fn with_review_interval(mut self, interval: f64) -> Self {
        self.review_interval = interval;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.review_interval > 0.0) || !self.review_interval.is_finite() {
            return Err(format!(
                "review interval {} must be positive",
                self.review_interval
            ));
        }
        if self.thread_pool_size == Some(0) {
            return Err("thread pool size must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
